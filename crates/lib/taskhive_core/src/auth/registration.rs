//! Tenant self-registration.

use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use super::AuthService;
use crate::audit::{self, AuditEntry};
use crate::error::{CoreError, CoreResult, FieldErrors};
use crate::models::{AuditAction, AuditEntity, NewTenant, NewUser, Role, UserSummary};
use crate::validation::{self, normalize};

#[derive(Debug, Clone, Default)]
pub struct RegisterTenantInput {
    pub tenant_name: String,
    pub subdomain: String,
    pub admin_email: String,
    pub admin_password: String,
    pub admin_full_name: String,
    pub ip_address: Option<String>,
}

impl RegisterTenantInput {
    fn validate(&self) -> CoreResult<()> {
        let mut errors = FieldErrors::new();
        validation::require(&mut errors, "tenantName", &self.tenant_name);
        validation::subdomain(&mut errors, "subdomain", &self.subdomain);
        validation::email(&mut errors, "adminEmail", &self.admin_email);
        validation::new_password(&mut errors, "adminPassword", &self.admin_password);
        validation::require(&mut errors, "adminFullName", &self.admin_full_name);
        errors.into_result()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub tenant_id: Uuid,
    pub subdomain: String,
    pub max_users: i32,
    pub max_projects: i32,
    pub admin_user: UserSummary,
}

impl AuthService {
    /// Create a tenant on the configured default plan together with its first
    /// `tenant_admin`. Both rows are written in one store transaction.
    pub async fn register_tenant(&self, input: RegisterTenantInput) -> CoreResult<Registration> {
        input.validate()?;

        let subdomain = normalize(&input.subdomain);
        if self.store.tenant_by_subdomain(&subdomain).await?.is_some() {
            return Err(CoreError::Conflict("Subdomain already exists".into()));
        }

        let plan = self.settings.default_plan;
        let tenant = NewTenant {
            name: input.tenant_name.trim().to_string(),
            subdomain,
            plan,
            limits: self.settings.plans.limits(plan),
        };
        let admin = NewUser {
            email: normalize(&input.admin_email),
            password_hash: self.hasher.hash(&input.admin_password)?,
            full_name: input.admin_full_name.trim().to_string(),
            role: Role::TenantAdmin,
            tenant_id: None,
        };

        // A concurrent registration can still win the race; the unique
        // constraint reports it as a conflict.
        let (tenant, admin) = self.store.create_tenant_with_admin(tenant, admin).await?;

        audit::record(
            self.audit.as_ref(),
            AuditEntry::new(AuditAction::CreateTenant, AuditEntity::Tenant)
                .tenant(Some(tenant.id))
                .user(Some(admin.id))
                .entity(tenant.id)
                .ip(input.ip_address),
        )
        .await;
        info!(tenant_id = %tenant.id, subdomain = %tenant.subdomain, plan = plan.as_str(), "tenant registered");

        Ok(Registration {
            tenant_id: tenant.id,
            subdomain: tenant.subdomain,
            max_users: tenant.max_users,
            max_projects: tenant.max_projects,
            admin_user: admin.summary(),
        })
    }
}

impl AuthService {
    /// Create the tenant-less super admin unless one with this email exists.
    /// Returns the stored account either way.
    pub async fn ensure_super_admin(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> CoreResult<UserSummary> {
        let mut errors = FieldErrors::new();
        validation::email(&mut errors, "email", email);
        validation::new_password(&mut errors, "password", password);
        errors.into_result()?;

        let email = normalize(email);
        if let Some(existing) = self.store.super_admin_by_email(&email).await? {
            return Ok(existing.summary());
        }
        let user = self
            .store
            .create_user(NewUser {
                email,
                password_hash: self.hasher.hash(password)?,
                full_name: full_name.trim().to_string(),
                role: Role::SuperAdmin,
                tenant_id: None,
            })
            .await?;
        info!(user_id = %user.id, "super admin created");
        Ok(user.summary())
    }
}
