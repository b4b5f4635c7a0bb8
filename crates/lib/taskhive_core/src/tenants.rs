//! Tenant details and tenant user administration.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::audit::{self, AuditEntry, AuditLogger};
use crate::auth::{CredentialHasher, verify_session};
use crate::error::{CoreError, CoreResult, FieldErrors};
use crate::identity::{Caller, TenantScope};
use crate::models::{
    AuditAction, AuditEntity, NewUser, Page, Paged, Role, SubscriptionPlan, TenantStats,
    TenantStatus, UserChanges, UserSummary,
};
use crate::scope::{TenantContext, check_tenant, require_admin, tenant_of};
use crate::store::Store;
use crate::validation::{self, normalize};

/// Tenant record plus usage counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantDetails {
    pub id: Uuid,
    pub name: String,
    pub subdomain: String,
    pub status: TenantStatus,
    pub subscription_plan: SubscriptionPlan,
    pub max_users: i32,
    pub max_projects: i32,
    pub created_at: DateTime<Utc>,
    pub stats: TenantStats,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AddUser {
    pub email: String,
    pub password: String,
    pub full_name: String,
    /// Defaults to `user`.
    pub role: Option<Role>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUser {
    pub full_name: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

#[derive(Clone)]
pub struct TenantService {
    store: Arc<dyn Store>,
    hasher: Arc<dyn CredentialHasher>,
    audit: Arc<dyn AuditLogger>,
}

impl TenantService {
    pub fn new(
        store: Arc<dyn Store>,
        hasher: Arc<dyn CredentialHasher>,
        audit: Arc<dyn AuditLogger>,
    ) -> Self {
        Self {
            store,
            hasher,
            audit,
        }
    }

    /// Readable by members of the tenant and by super admins; everyone else
    /// gets `NotFound`.
    pub async fn get_tenant(&self, caller: &Caller, tenant_id: Uuid) -> CoreResult<TenantDetails> {
        let user = verify_session(self.store.as_ref(), &caller.principal).await?;
        if user.role != Role::SuperAdmin && user.tenant_id != Some(tenant_id) {
            return Err(CoreError::not_found("Tenant"));
        }
        let tenant = self
            .store
            .tenant_by_id(tenant_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Tenant"))?;
        let stats = self.store.tenant_stats(tenant.id).await?;

        Ok(TenantDetails {
            id: tenant.id,
            name: tenant.name,
            subdomain: tenant.subdomain,
            status: tenant.status,
            subscription_plan: tenant.subscription_plan,
            max_users: tenant.max_users,
            max_projects: tenant.max_projects,
            created_at: tenant.created_at,
            stats,
        })
    }

    async fn context_for(&self, caller: &Caller, tenant_id: Uuid) -> CoreResult<TenantContext> {
        check_tenant(&caller.principal, tenant_id)?;
        tenant_of(self.store.as_ref(), caller).await
    }

    /// Invite a member. Only tenant admins may do this, and only up to the
    /// plan's user limit.
    pub async fn add_user(
        &self,
        caller: &Caller,
        tenant_id: Uuid,
        input: AddUser,
    ) -> CoreResult<UserSummary> {
        let ctx = self.context_for(caller, tenant_id).await?;
        require_admin(&ctx)?;

        let mut errors = FieldErrors::new();
        validation::email(&mut errors, "email", &input.email);
        validation::new_password(&mut errors, "password", &input.password);
        validation::require(&mut errors, "fullName", &input.full_name);
        if input.role == Some(Role::SuperAdmin) {
            errors.add("role", "Invalid role");
        }
        errors.into_result()?;

        let email = normalize(&input.email);
        if self
            .store
            .user_by_email(&email, TenantScope::WithTenant(ctx.tenant_id()))
            .await?
            .is_some()
        {
            return Err(CoreError::Conflict("Email already exists".into()));
        }
        if self.store.count_users(ctx.tenant_id()).await? >= i64::from(ctx.tenant.max_users) {
            return Err(CoreError::Forbidden(
                "User limit reached for subscription plan".into(),
            ));
        }

        let user = self
            .store
            .create_user(NewUser {
                email,
                password_hash: self.hasher.hash(&input.password)?,
                full_name: input.full_name.trim().to_string(),
                role: input.role.unwrap_or(Role::User),
                tenant_id: Some(ctx.tenant_id()),
            })
            .await?;

        audit::record(
            self.audit.as_ref(),
            AuditEntry::by(caller, AuditAction::CreateUser, AuditEntity::User).entity(user.id),
        )
        .await;
        info!(tenant_id = %ctx.tenant_id(), user_id = %user.id, role = %user.role, "user added");
        Ok(user.summary())
    }

    pub async fn list_users(
        &self,
        caller: &Caller,
        tenant_id: Uuid,
        page: Page,
    ) -> CoreResult<Paged<UserSummary>> {
        let ctx = self.context_for(caller, tenant_id).await?;
        let users = self.store.list_users(ctx.tenant_id(), page).await?;
        Ok(users.map(|u| u.summary()))
    }

    /// Admins may change any field of any member except demoting or
    /// deactivating themselves. Plain users may only rename themselves.
    pub async fn update_user(
        &self,
        caller: &Caller,
        user_id: Uuid,
        input: UpdateUser,
    ) -> CoreResult<UserSummary> {
        let ctx = tenant_of(self.store.as_ref(), caller).await?;
        let target = self
            .store
            .user_by_id(user_id)
            .await?
            .filter(|u| u.tenant_id == Some(ctx.tenant_id()))
            .ok_or_else(|| CoreError::not_found("User"))?;
        let is_self = target.id == ctx.user_id();

        if ctx.is_admin() {
            let demotes = input.role.is_some_and(|r| r != Role::TenantAdmin);
            let deactivates = input.is_active == Some(false);
            if is_self && (demotes || deactivates) {
                return Err(CoreError::Forbidden(
                    "You cannot deactivate or demote yourself".into(),
                ));
            }
        } else if !is_self || input.role.is_some() || input.is_active.is_some() {
            return Err(CoreError::Forbidden("Insufficient permissions".into()));
        }

        let mut errors = FieldErrors::new();
        if let Some(name) = &input.full_name {
            validation::require(&mut errors, "fullName", name);
        }
        if input.role == Some(Role::SuperAdmin) {
            errors.add("role", "Invalid role");
        }
        errors.into_result()?;

        let updated = self
            .store
            .update_user(
                ctx.tenant_id(),
                target.id,
                UserChanges {
                    full_name: input.full_name.map(|n| n.trim().to_string()),
                    role: input.role,
                    is_active: input.is_active,
                },
            )
            .await?
            .ok_or_else(|| CoreError::not_found("User"))?;

        audit::record(
            self.audit.as_ref(),
            AuditEntry::by(caller, AuditAction::UpdateUser, AuditEntity::User).entity(updated.id),
        )
        .await;
        Ok(updated.summary())
    }

    pub async fn delete_user(&self, caller: &Caller, user_id: Uuid) -> CoreResult<()> {
        let ctx = tenant_of(self.store.as_ref(), caller).await?;
        require_admin(&ctx)?;
        if user_id == ctx.user_id() {
            return Err(CoreError::Forbidden(
                "You cannot delete your own account".into(),
            ));
        }
        if !self.store.delete_user(ctx.tenant_id(), user_id).await? {
            return Err(CoreError::not_found("User"));
        }

        audit::record(
            self.audit.as_ref(),
            AuditEntry::by(caller, AuditAction::DeleteUser, AuditEntity::User).entity(user_id),
        )
        .await;
        info!(tenant_id = %ctx.tenant_id(), user_id = %user_id, "user deleted");
        Ok(())
    }
}
