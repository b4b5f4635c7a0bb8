//! Persistence collaborator.
//!
//! Every project/task method takes the owning tenant id and filters by it, so
//! a row belonging to another tenant is indistinguishable from a missing one.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::identity::TenantScope;
use crate::models::{
    NewProject, NewTask, NewTenant, NewUser, Page, Paged, Project, ProjectChanges, Task,
    TaskChanges, TaskFilter, Tenant, TenantStats, TenantStatus, User, UserChanges,
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique constraint rejected the write; carries the offending entity
    /// name ("Subdomain", "Email").
    #[error("unique violation: {0}")]
    UniqueViolation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Store error: {0}")]
    Backend(String),
}

#[async_trait]
pub trait TenantStore: Send + Sync {
    /// Insert a tenant and its first admin atomically. The admin's tenant id
    /// is bound to the new tenant regardless of `admin.tenant_id`.
    async fn create_tenant_with_admin(
        &self,
        tenant: NewTenant,
        admin: NewUser,
    ) -> StoreResult<(Tenant, User)>;

    async fn tenant_by_id(&self, id: Uuid) -> StoreResult<Option<Tenant>>;

    /// `subdomain` must already be normalized.
    async fn tenant_by_subdomain(&self, subdomain: &str) -> StoreResult<Option<Tenant>>;

    async fn set_tenant_status(&self, id: Uuid, status: TenantStatus)
    -> StoreResult<Option<Tenant>>;

    async fn tenant_stats(&self, id: Uuid) -> StoreResult<TenantStats>;

    /// Connectivity check used by the health endpoint.
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create_user(&self, user: NewUser) -> StoreResult<User>;

    async fn user_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;

    /// Exact `(email, tenant)` lookup. `NoTenant` matches only tenant-less users.
    async fn user_by_email(&self, email: &str, scope: TenantScope) -> StoreResult<Option<User>>;

    async fn super_admin_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Whether any tenant has a user with this email.
    async fn email_bound_to_tenant(&self, email: &str) -> StoreResult<bool>;

    async fn list_users(&self, tenant_id: Uuid, page: Page) -> StoreResult<Paged<User>>;

    async fn count_users(&self, tenant_id: Uuid) -> StoreResult<i64>;

    async fn update_user(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        changes: UserChanges,
    ) -> StoreResult<Option<User>>;

    async fn delete_user(&self, tenant_id: Uuid, id: Uuid) -> StoreResult<bool>;
}

#[async_trait]
pub trait ProjectStore: Send + Sync {
    async fn insert_project(&self, project: NewProject) -> StoreResult<Project>;

    async fn project(&self, tenant_id: Uuid, id: Uuid) -> StoreResult<Option<Project>>;

    /// Creation order.
    async fn list_projects(&self, tenant_id: Uuid, page: Page) -> StoreResult<Paged<Project>>;

    async fn count_projects(&self, tenant_id: Uuid) -> StoreResult<i64>;

    async fn update_project(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        changes: ProjectChanges,
    ) -> StoreResult<Option<Project>>;

    /// Deletes the project and all of its tasks.
    async fn delete_project(&self, tenant_id: Uuid, id: Uuid) -> StoreResult<bool>;
}

/// Tasks carry no tenant column; every method scopes through the owning
/// project's tenant.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Callers must have checked that `task.project_id` belongs to the tenant.
    async fn insert_task(&self, task: NewTask) -> StoreResult<Task>;

    async fn task(&self, tenant_id: Uuid, id: Uuid) -> StoreResult<Option<Task>>;

    /// Creation order.
    async fn list_tasks(
        &self,
        tenant_id: Uuid,
        project_id: Uuid,
        filter: TaskFilter,
        page: Page,
    ) -> StoreResult<Paged<Task>>;

    async fn update_task(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        changes: TaskChanges,
    ) -> StoreResult<Option<Task>>;

    async fn delete_task(&self, tenant_id: Uuid, id: Uuid) -> StoreResult<bool>;
}

/// Everything the services need from persistence.
pub trait Store: TenantStore + UserStore + ProjectStore + TaskStore {}

impl<T: TenantStore + UserStore + ProjectStore + TaskStore> Store for T {}
