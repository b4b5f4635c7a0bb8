//! Domain models.
//!
//! Row structs derive `sqlx::FromRow` so the Postgres store can map query
//! results directly; enums derive `sqlx::Type` against the matching Postgres
//! enum types created by the migrations.

pub mod audit;
pub mod page;
pub mod project;
pub mod task;
pub mod tenant;
pub mod user;

pub use audit::{AuditAction, AuditEntity, AuditEntry, AuditRecord};
pub use page::{Page, Paged};
pub use project::{NewProject, Project, ProjectChanges, ProjectStatus};
pub use task::{NewTask, Task, TaskChanges, TaskFilter, TaskPriority, TaskStatus};
pub use tenant::{NewTenant, SubscriptionPlan, Tenant, TenantStats, TenantStatus, TenantSummary};
pub use user::{NewUser, Role, User, UserChanges, UserSummary};

use serde::{Deserialize, Deserializer};

/// Keeps an explicit JSON `null` apart from an absent field: absent stays
/// `None` (via `#[serde(default)]`), `null` becomes `Some(None)`.
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

