//! Core error taxonomy.
//!
//! Every operation in this crate fails with a [`CoreError`]. The HTTP layer
//! maps each variant onto a status code; nothing below the boundary knows
//! about HTTP.

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

use crate::auth::jwt::TokenError;
use crate::auth::password::HashError;
use crate::store::StoreError;

/// Convenience alias for core operation results.
pub type CoreResult<T> = Result<T, CoreError>;

/// Message returned for every credential failure, whether or not the email
/// exists.
pub const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// Message returned when an email is tenant-bound but no tenant was supplied.
pub const TENANT_REQUIRED: &str =
    "This email is associated with a specific tenant. Please specify the tenant subdomain to login.";

/// Per-field validation messages, ordered by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message against a field.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Messages recorded for `field` (empty slice when none).
    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// `Ok(())` when nothing was recorded, otherwise a validation error.
    pub fn into_result(self) -> CoreResult<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(CoreError::Validation(self))
        }
    }
}

/// Failure kinds shared by every core operation.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid input")]
    Validation(FieldErrors),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{}", TENANT_REQUIRED)]
    TenantRequired,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn invalid_credentials() -> Self {
        Self::Unauthorized(INVALID_CREDENTIALS.into())
    }

    pub fn not_found(what: &str) -> Self {
        Self::NotFound(format!("{what} not found"))
    }

    /// Single-field validation failure.
    pub fn invalid_field(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.add(field, message);
        Self::Validation(errors)
    }
}

impl From<StoreError> for CoreError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::UniqueViolation(what) => CoreError::Conflict(format!("{what} already exists")),
            other => CoreError::Internal(other.to_string()),
        }
    }
}

impl From<HashError> for CoreError {
    fn from(e: HashError) -> Self {
        CoreError::Internal(e.to_string())
    }
}

impl From<TokenError> for CoreError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::Expired => CoreError::Unauthorized("Token has expired".into()),
            TokenError::Invalid(_) => CoreError::Unauthorized("Invalid or expired token".into()),
            TokenError::Signing(msg) => CoreError::Internal(msg),
        }
    }
}
