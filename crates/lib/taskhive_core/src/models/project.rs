//! Project domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Project status. Either value can be set from the other.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "project_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    #[default]
    Active,
    Archived,
}

/// Database row for `projects`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub status: ProjectStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to insert a project. `tenant_id` always comes from the
/// caller's identity.
#[derive(Debug, Clone)]
pub struct NewProject {
    pub tenant_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub status: ProjectStatus,
}

/// Field-level project update. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectChanges {
    pub name: Option<String>,
    /// `Some(None)` clears the description.
    #[serde(default, deserialize_with = "super::nullable")]
    pub description: Option<Option<String>>,
    pub status: Option<ProjectStatus>,
}
