//! Authentication middleware: Bearer token extraction and verification.

use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use taskhive_core::Caller;

use crate::AppState;
use crate::error::AppError;
use crate::extract::client_ip;

/// Verified caller stored in request extensions by [`require_auth`].
#[derive(Debug, Clone)]
pub struct AuthenticatedCaller(pub Caller);

/// Stored by [`optional_auth`]; `None` when the request carried no usable token.
#[derive(Debug, Clone)]
pub struct MaybeCaller(pub Option<Caller>);

fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let header = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing authorization header".into()))?;

    header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Unauthorized("Invalid authorization scheme".into()))
}

fn caller_from(state: &AppState, request: &Request) -> Result<Caller, AppError> {
    let token = bearer_token(request.headers())?;
    let principal = state.services.auth.authenticate(token)?;
    let ip = client_ip(request.headers(), request.extensions());
    Ok(Caller::new(principal, ip))
}

/// Axum middleware: extracts `Authorization: Bearer <token>`, verifies the JWT,
/// and injects [`AuthenticatedCaller`] into request extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let caller = caller_from(&state, &request)?;
    request.extensions_mut().insert(AuthenticatedCaller(caller));
    Ok(next.run(request).await)
}

/// Like [`require_auth`] but never rejects.
pub async fn optional_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let caller = caller_from(&state, &request).ok();
    request.extensions_mut().insert(MaybeCaller(caller));
    next.run(request).await
}
