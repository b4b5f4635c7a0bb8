//! Extractors that report rejections through the response envelope.

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::extract::{ConnectInfo, FromRequest, FromRequestParts};
use axum::http::request::Parts;
use axum::http::{Extensions, HeaderMap};
use serde::Deserialize;
use taskhive_core::models::{Page, TaskFilter, TaskPriority, TaskStatus};

use crate::error::AppError;

/// JSON body extractor.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Path parameter extractor.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);

/// Query string extractor.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

/// Client address: first `X-Forwarded-For` entry, else the peer address.
#[derive(Debug, Clone)]
pub struct ClientIp(pub Option<String>);

impl<S: Send + Sync> FromRequestParts<S> for ClientIp {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(client_ip(&parts.headers, &parts.extensions)))
    }
}

pub fn client_ip(headers: &HeaderMap, extensions: &Extensions) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_string)
        .or_else(|| {
            extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        })
}

/// `?page=&limit=`
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl PageQuery {
    pub fn page(&self) -> Page {
        Page::new(self.page, self.limit)
    }
}

/// `?page=&limit=&status=&priority=`
#[derive(Debug, Default, Deserialize)]
pub struct TaskQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
}

impl TaskQuery {
    pub fn page(&self) -> Page {
        Page::new(self.page, self.limit)
    }

    pub fn filter(&self) -> TaskFilter {
        TaskFilter {
            status: self.status,
            priority: self.priority,
        }
    }
}
