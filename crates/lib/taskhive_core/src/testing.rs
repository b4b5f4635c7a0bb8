//! Shared fixtures for unit tests.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::Services;
use crate::audit::AuditLogger;
use crate::auth::{AuthSettings, BcryptHasher, CredentialHasher, Hs256TokenIssuer};
use crate::identity::{Caller, Principal};
use crate::models::{
    AuditEntry, NewTenant, NewUser, Role, SubscriptionPlan, Tenant, User, UserChanges,
};
use crate::plans::PlanCatalog;
use crate::store::{MemoryStore, StoreError, TenantStore, UserStore};

pub(crate) const PASSWORD: &str = "password123";

/// Services over a fresh in-memory store, plus the store for inspection.
pub(crate) struct Harness {
    pub store: MemoryStore,
    pub auth: crate::auth::AuthService,
    pub tenants: crate::tenants::TenantService,
    pub projects: crate::projects::ProjectService,
    pub tasks: crate::tasks::TaskService,
}

/// Audit sink that always fails.
pub(crate) struct FailingAudit;

#[async_trait]
impl AuditLogger for FailingAudit {
    async fn append(&self, _entry: AuditEntry) -> Result<(), StoreError> {
        Err(StoreError::Backend("audit sink offline".into()))
    }
}

fn hasher() -> BcryptHasher {
    BcryptHasher::with_cost(4)
}

fn build(settings: AuthSettings, audit: Option<Arc<dyn AuditLogger>>) -> Harness {
    let store = MemoryStore::new();
    let audit = audit.unwrap_or_else(|| Arc::new(store.clone()) as Arc<dyn AuditLogger>);
    let services = Services::new(
        Arc::new(store.clone()),
        audit,
        Arc::new(hasher()),
        Arc::new(Hs256TokenIssuer::new(b"test-secret")),
        settings,
    );
    Harness {
        store,
        auth: services.auth,
        tenants: services.tenants,
        projects: services.projects,
        tasks: services.tasks,
    }
}

pub(crate) fn harness() -> Harness {
    build(AuthSettings::default(), None)
}

pub(crate) fn harness_with_settings(settings: AuthSettings) -> Harness {
    build(settings, None)
}

pub(crate) fn harness_with_failing_audit() -> Harness {
    build(AuthSettings::default(), Some(Arc::new(FailingAudit)))
}

/// Tenant on the free plan with admin `admin@<subdomain>.com` / [`PASSWORD`].
pub(crate) async fn seed_tenant(store: &MemoryStore, subdomain: &str) -> (Tenant, User) {
    store
        .create_tenant_with_admin(
            NewTenant {
                name: subdomain.to_uppercase(),
                subdomain: subdomain.into(),
                plan: SubscriptionPlan::Free,
                limits: PlanCatalog::default().limits(SubscriptionPlan::Free),
            },
            NewUser {
                email: format!("admin@{subdomain}.com"),
                password_hash: hasher().hash(PASSWORD).unwrap(),
                full_name: "Admin".into(),
                role: Role::TenantAdmin,
                tenant_id: None,
            },
        )
        .await
        .unwrap()
}

pub(crate) async fn seed_member(store: &MemoryStore, tenant_id: Uuid, email: &str) -> User {
    store
        .create_user(NewUser {
            email: email.into(),
            password_hash: hasher().hash(PASSWORD).unwrap(),
            full_name: "Member".into(),
            role: Role::User,
            tenant_id: Some(tenant_id),
        })
        .await
        .unwrap()
}

pub(crate) async fn seed_super_admin(store: &MemoryStore, email: &str) -> User {
    store
        .create_user(NewUser {
            email: email.into(),
            password_hash: hasher().hash(PASSWORD).unwrap(),
            full_name: "Root".into(),
            role: Role::SuperAdmin,
            tenant_id: None,
        })
        .await
        .unwrap()
}

pub(crate) async fn deactivate(store: &MemoryStore, tenant_id: Uuid, user_id: Uuid) {
    store
        .update_user(
            tenant_id,
            user_id,
            UserChanges {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
}

/// Caller whose principal matches `user` as currently stored.
pub(crate) fn caller_for(user: &User) -> Caller {
    Caller::new(
        Principal {
            user_id: user.id,
            tenant_id: user.tenant_id,
            role: user.role,
        },
        Some("127.0.0.1".into()),
    )
}
