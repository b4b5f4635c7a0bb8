//! JWT token issuance and verification.

use std::path::PathBuf;

use chrono::{TimeDelta, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::distr::Alphanumeric;
use rand::{Rng, rng};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::identity::Principal;
use crate::models::Role;

/// Default token lifetime: 24 hours.
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 24 * 60 * 60;

/// Longest accepted token lifetime: 365 days.
pub const MAX_TOKEN_TTL_SECS: i64 = 365 * DEFAULT_TOKEN_TTL_SECS;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("invalid token: {0}")]
    Invalid(String),

    #[error("token expired")]
    Expired,

    #[error("jwt encode: {0}")]
    Signing(String),
}

/// Signed identity claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenClaims {
    pub user_id: Uuid,
    pub tenant_id: Option<Uuid>,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

impl TokenClaims {
    pub fn principal(&self) -> Principal {
        Principal {
            user_id: self.user_id,
            tenant_id: self.tenant_id,
            role: self.role,
        }
    }
}

/// Issues and verifies signed identity claims.
pub trait TokenIssuer: Send + Sync {
    fn issue(&self, principal: &Principal, ttl_secs: i64) -> Result<String, TokenError>;
    fn verify(&self, token: &str) -> Result<TokenClaims, TokenError>;
}

/// HS256 [`TokenIssuer`] keyed by a shared secret.
#[derive(Clone)]
pub struct Hs256TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl std::fmt::Debug for Hs256TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hs256TokenIssuer").finish_non_exhaustive()
    }
}

impl Hs256TokenIssuer {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }
}

impl TokenIssuer for Hs256TokenIssuer {
    fn issue(&self, principal: &Principal, ttl_secs: i64) -> Result<String, TokenError> {
        let now = Utc::now();
        let exp = TimeDelta::try_seconds(ttl_secs)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .ok_or_else(|| {
                TokenError::Signing(format!("token lifetime out of range: {ttl_secs}s"))
            })?;
        let claims = TokenClaims {
            user_id: principal.user_id,
            tenant_id: principal.tenant_id,
            role: principal.role,
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    fn verify(&self, token: &str) -> Result<TokenClaims, TokenError> {
        let mut validation = Validation::default();
        validation.validate_exp = true;
        decode::<TokenClaims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(e.to_string()),
            })
    }
}

/// Resolve the JWT secret: env var `JWT_SECRET` → `AUTH_SECRET` → persisted file.
pub fn resolve_jwt_secret() -> String {
    if let Ok(secret) = std::env::var("JWT_SECRET")
        && !secret.is_empty()
    {
        return secret;
    }
    if let Ok(secret) = std::env::var("AUTH_SECRET")
        && !secret.is_empty()
    {
        return secret;
    }
    let secret_path = jwt_secret_path();
    if let Ok(existing) = std::fs::read_to_string(&secret_path) {
        let trimmed = existing.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }
    let secret: String = rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect();
    if let Some(parent) = secret_path.parent()
        && let Err(e) = std::fs::create_dir_all(parent)
    {
        warn!(error = %e, "could not create secret directory");
    }
    match std::fs::write(&secret_path, &secret) {
        Ok(()) => info!(path = %secret_path.display(), "generated new JWT secret"),
        Err(e) => warn!(error = %e, "generated JWT secret could not be persisted"),
    }
    secret
}

/// Path to the persisted JWT secret file.
fn jwt_secret_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("taskhive")
        .join("jwt-secret")
}
