//! Audit logging.
//!
//! Entries are appended after the primary write has succeeded. A failed
//! append is logged and swallowed so it never turns a committed operation
//! into an error response.

use async_trait::async_trait;
use tracing::warn;
use uuid::Uuid;

use crate::identity::Caller;
use crate::models::{AuditAction, AuditEntity};
use crate::store::StoreError;

pub use crate::models::AuditEntry;

/// Append-only sink for audit entries.
#[async_trait]
pub trait AuditLogger: Send + Sync {
    async fn append(&self, entry: AuditEntry) -> Result<(), StoreError>;
}

impl AuditEntry {
    pub fn new(action: AuditAction, entity_type: AuditEntity) -> Self {
        Self {
            tenant_id: None,
            user_id: None,
            action,
            entity_type,
            entity_id: None,
            ip_address: None,
        }
    }

    /// Entry attributed to `caller`'s tenant and user.
    pub fn by(caller: &Caller, action: AuditAction, entity_type: AuditEntity) -> Self {
        Self::new(action, entity_type)
            .tenant(caller.principal.tenant_id)
            .user(Some(caller.principal.user_id))
            .ip(caller.ip_address.clone())
    }

    pub fn tenant(mut self, tenant_id: Option<Uuid>) -> Self {
        self.tenant_id = tenant_id;
        self
    }

    pub fn user(mut self, user_id: Option<Uuid>) -> Self {
        self.user_id = user_id;
        self
    }

    pub fn entity(mut self, entity_id: Uuid) -> Self {
        self.entity_id = Some(entity_id);
        self
    }

    pub fn ip(mut self, ip_address: Option<String>) -> Self {
        self.ip_address = ip_address;
        self
    }
}

/// Append `entry`, logging instead of propagating a failure.
pub async fn record(logger: &dyn AuditLogger, entry: AuditEntry) {
    let action = entry.action.as_str();
    let entity_id = entry.entity_id;
    if let Err(e) = logger.append(entry).await {
        warn!(action, entity_id = ?entity_id, error = %e, "failed to write audit entry");
    }
}
