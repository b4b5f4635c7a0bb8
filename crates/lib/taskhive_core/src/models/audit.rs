//! Audit trail models.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Security-relevant and state-changing events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    CreateTenant,
    Login,
    Logout,
    CreateUser,
    UpdateUser,
    DeleteUser,
    CreateProject,
    UpdateProject,
    DeleteProject,
    CreateTask,
    UpdateTask,
    DeleteTask,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::CreateTenant => "CREATE_TENANT",
            AuditAction::Login => "LOGIN",
            AuditAction::Logout => "LOGOUT",
            AuditAction::CreateUser => "CREATE_USER",
            AuditAction::UpdateUser => "UPDATE_USER",
            AuditAction::DeleteUser => "DELETE_USER",
            AuditAction::CreateProject => "CREATE_PROJECT",
            AuditAction::UpdateProject => "UPDATE_PROJECT",
            AuditAction::DeleteProject => "DELETE_PROJECT",
            AuditAction::CreateTask => "CREATE_TASK",
            AuditAction::UpdateTask => "UPDATE_TASK",
            AuditAction::DeleteTask => "DELETE_TASK",
        }
    }
}

/// Kind of entity an audit entry refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditEntity {
    Tenant,
    User,
    Project,
    Task,
}

impl AuditEntity {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditEntity::Tenant => "tenant",
            AuditEntity::User => "user",
            AuditEntity::Project => "project",
            AuditEntity::Task => "task",
        }
    }
}

/// An entry to append. Timestamps are assigned by the logger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEntry {
    pub tenant_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub action: AuditAction,
    pub entity_type: AuditEntity,
    pub entity_id: Option<Uuid>,
    pub ip_address: Option<String>,
}

/// A persisted audit entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    pub id: Uuid,
    pub tenant_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub action: AuditAction,
    pub entity_type: AuditEntity,
    pub entity_id: Option<Uuid>,
    pub ip_address: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AuditRecord {
    pub fn from_entry(entry: AuditEntry) -> Self {
        Self {
            id: Uuid::now_v7(),
            tenant_id: entry.tenant_id,
            user_id: entry.user_id,
            action: entry.action,
            entity_type: entry.entity_type,
            entity_id: entry.entity_id,
            ip_address: entry.ip_address,
            created_at: Utc::now(),
        }
    }
}
