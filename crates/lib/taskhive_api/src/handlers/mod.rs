//! Request handlers.

pub mod auth;
pub mod health;
pub mod projects;
pub mod tasks;
pub mod tenants;
pub mod users;

use taskhive_core::CoreError;

use crate::error::AppError;

/// Envelope-shaped 404 for unmatched routes.
pub async fn fallback_handler() -> AppError {
    AppError::Core(CoreError::NotFound("Route not found".into()))
}
