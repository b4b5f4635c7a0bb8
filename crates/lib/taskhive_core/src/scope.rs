//! Tenant scoping for resource operations.
//!
//! Every project, task and user-admin operation starts by turning the caller
//! into a [`TenantContext`]. The tenant id used for all reads and writes comes
//! from here, never from client input.

use uuid::Uuid;

use crate::auth::verify_session;
use crate::error::{CoreError, CoreResult};
use crate::identity::{Caller, Principal};
use crate::models::{Tenant, User};
use crate::store::Store;

/// The verified caller and the active tenant it acts in.
#[derive(Debug, Clone)]
pub struct TenantContext {
    pub tenant: Tenant,
    pub user: User,
}

impl TenantContext {
    pub fn tenant_id(&self) -> Uuid {
        self.tenant.id
    }

    pub fn user_id(&self) -> Uuid {
        self.user.id
    }

    pub fn is_admin(&self) -> bool {
        self.user.role == crate::models::Role::TenantAdmin
    }
}

/// Resolve the caller's tenant after re-checking the session.
///
/// Tenant-less principals (super admins) have no implicit scope here and are
/// rejected, as are members of a tenant that is no longer active.
pub async fn tenant_of(store: &dyn Store, caller: &Caller) -> CoreResult<TenantContext> {
    let user = verify_session(store, &caller.principal).await?;
    let tenant_id = user
        .tenant_id
        .ok_or_else(|| CoreError::Forbidden("Tenant context required".into()))?;
    let tenant = store
        .tenant_by_id(tenant_id)
        .await?
        .ok_or_else(|| CoreError::not_found("Tenant"))?;
    if !tenant.is_active() {
        return Err(CoreError::Forbidden("Tenant is not active".into()));
    }
    Ok(TenantContext { tenant, user })
}

/// Reject a request addressed to a tenant other than the caller's own.
pub fn check_tenant(principal: &Principal, tenant_id: Uuid) -> CoreResult<()> {
    if principal.tenant_id == Some(tenant_id) {
        Ok(())
    } else {
        Err(CoreError::Forbidden("Access denied to this tenant".into()))
    }
}

/// Require the `tenant_admin` role.
pub fn require_admin(ctx: &TenantContext) -> CoreResult<()> {
    if ctx.is_admin() {
        Ok(())
    } else {
        Err(CoreError::Forbidden("Only tenant admins can manage users".into()))
    }
}
