//! Session introspection and logout.
//!
//! Tokens are stateless: logout revokes nothing, it only leaves an audit
//! trail. Operations that act on tenant data call [`verify_session`] so a
//! token whose user was deleted, deactivated, moved or re-roled stops working
//! immediately rather than at expiry.

use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use super::AuthService;
use crate::audit::{self, AuditEntry};
use crate::error::{CoreError, CoreResult};
use crate::identity::{Caller, Principal};
use crate::models::{AuditAction, AuditEntity, Role, TenantSummary, User};
use crate::store::Store;

/// Message for a token that no longer matches the stored user.
pub const STALE_SESSION: &str = "Session is no longer valid";

/// Sanitized profile returned by `me`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    pub is_active: bool,
    pub tenant: Option<TenantSummary>,
}

/// Load the user behind `principal` and check the token still describes it.
pub async fn verify_session(store: &dyn Store, principal: &Principal) -> CoreResult<User> {
    let user = store
        .user_by_id(principal.user_id)
        .await?
        .ok_or_else(|| CoreError::Unauthorized(STALE_SESSION.into()))?;
    if !user.is_active || user.tenant_id != principal.tenant_id || user.role != principal.role {
        return Err(CoreError::Unauthorized(STALE_SESSION.into()));
    }
    Ok(user)
}

impl AuthService {
    /// Current profile of the caller. A user deleted since the token was
    /// issued yields `NotFound`.
    pub async fn me(&self, principal: &Principal) -> CoreResult<Profile> {
        let user = self
            .store
            .user_by_id(principal.user_id)
            .await?
            .ok_or_else(|| CoreError::not_found("User"))?;

        let tenant = match user.tenant_id {
            Some(id) => self.store.tenant_by_id(id).await?,
            None => None,
        };

        Ok(Profile {
            id: user.id,
            email: user.email,
            full_name: user.full_name,
            role: user.role,
            is_active: user.is_active,
            tenant: tenant.as_ref().map(|t| t.summary()),
        })
    }

    /// Record a logout. Always succeeds; `caller` is `None` for anonymous
    /// requests.
    pub async fn logout(&self, caller: Option<&Caller>, ip_address: Option<String>) {
        let principal = caller.map(|c| c.principal);
        let mut entry = AuditEntry::new(AuditAction::Logout, AuditEntity::User)
            .tenant(principal.and_then(|p| p.tenant_id))
            .user(principal.map(|p| p.user_id))
            .ip(ip_address);
        entry.entity_id = principal.map(|p| p.user_id);
        audit::record(self.audit.as_ref(), entry).await;
        info!(user_id = ?principal.map(|p| p.user_id), "logout");
    }

    /// Verify a bearer token and return the principal it asserts.
    pub fn authenticate(&self, token: &str) -> CoreResult<Principal> {
        Ok(self.tokens.verify(token)?.principal())
    }
}
