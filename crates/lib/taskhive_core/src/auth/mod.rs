//! Authentication: tenant registration, login with tenant resolution and
//! session introspection.
//!
//! The collaborators (store, hasher, token issuer, audit sink) are injected so
//! the same flows run against Postgres in production and memory in tests.

pub mod jwt;
pub mod login;
pub mod password;
pub mod registration;
pub mod resolver;
pub mod session;

use std::sync::Arc;

use crate::audit::AuditLogger;
use crate::models::SubscriptionPlan;
use crate::plans::PlanCatalog;
use crate::store::Store;

pub use jwt::{Hs256TokenIssuer, TokenClaims, TokenError, TokenIssuer};
pub use login::{LoginInput, LoginOutcome, LoginUser};
pub use password::{BcryptHasher, CredentialHasher, HashError};
pub use registration::{RegisterTenantInput, Registration};
pub use session::{Profile, verify_session};

/// Tunables for the auth flows.
#[derive(Debug, Clone)]
pub struct AuthSettings {
    /// Token lifetime in seconds.
    pub token_ttl_secs: i64,
    /// Plan assigned to newly registered tenants.
    pub default_plan: SubscriptionPlan,
    pub plans: PlanCatalog,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            token_ttl_secs: jwt::DEFAULT_TOKEN_TTL_SECS,
            default_plan: SubscriptionPlan::Free,
            plans: PlanCatalog::default(),
        }
    }
}

/// Entry point for registration, login, `me` and logout.
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn Store>,
    hasher: Arc<dyn CredentialHasher>,
    tokens: Arc<dyn TokenIssuer>,
    audit: Arc<dyn AuditLogger>,
    settings: AuthSettings,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn Store>,
        hasher: Arc<dyn CredentialHasher>,
        tokens: Arc<dyn TokenIssuer>,
        audit: Arc<dyn AuditLogger>,
        settings: AuthSettings,
    ) -> Self {
        Self {
            store,
            hasher,
            tokens,
            audit,
            settings,
        }
    }

    pub fn settings(&self) -> &AuthSettings {
        &self.settings
    }

    pub fn tokens(&self) -> &Arc<dyn TokenIssuer> {
        &self.tokens
    }
}
