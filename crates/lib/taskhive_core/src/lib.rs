//! # taskhive_core
//!
//! Core domain logic for Taskhive.
//!
//! Everything here is transport-free: operations take explicit input structs
//! and return `Result<_, CoreError>`. Persistence, credential hashing, token
//! issuance and audit logging are collaborators behind traits so the HTTP
//! layer (or a test) can wire in whichever implementation it needs.

pub mod audit;
pub mod auth;
pub mod error;
pub mod identity;
pub mod models;
pub mod plans;
pub mod projects;
pub mod scope;
pub mod store;
pub mod tasks;
pub mod tenants;
pub mod validation;

use std::sync::Arc;

pub use error::{CoreError, CoreResult, FieldErrors};
pub use identity::{Caller, Principal, TenantHint, TenantScope};

use crate::audit::AuditLogger;
use crate::auth::{AuthService, AuthSettings, CredentialHasher, TokenIssuer};
use crate::projects::ProjectService;
use crate::store::Store;
use crate::tasks::TaskService;
use crate::tenants::TenantService;

/// All services wired to one set of collaborators.
#[derive(Clone)]
pub struct Services {
    pub auth: AuthService,
    pub tenants: TenantService,
    pub projects: ProjectService,
    pub tasks: TaskService,
}

impl Services {
    pub fn new(
        store: Arc<dyn Store>,
        audit: Arc<dyn AuditLogger>,
        hasher: Arc<dyn CredentialHasher>,
        tokens: Arc<dyn TokenIssuer>,
        settings: AuthSettings,
    ) -> Self {
        Self {
            auth: AuthService::new(
                store.clone(),
                hasher.clone(),
                tokens,
                audit.clone(),
                settings,
            ),
            tenants: TenantService::new(store.clone(), hasher, audit.clone()),
            projects: ProjectService::new(store.clone(), audit.clone()),
            tasks: TaskService::new(store, audit),
        }
    }
}

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
pub(crate) mod testing;
