//! Login: tenant resolution, credential check and token issuance.

use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use super::AuthService;
use super::resolver::resolve_tenant;
use crate::audit::{self, AuditEntry};
use crate::error::{CoreError, CoreResult, FieldErrors};
use crate::identity::{Principal, TenantHint, TenantScope};
use crate::models::{AuditAction, AuditEntity, Role, TenantSummary, User};
use crate::validation::{self, normalize};

#[derive(Debug, Clone, Default)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
    pub tenant: Option<TenantHint>,
    pub ip_address: Option<String>,
}

/// Profile returned with a fresh token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginUser {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    pub tenant_id: Option<Uuid>,
    pub tenant: Option<TenantSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginOutcome {
    pub user: LoginUser,
    pub token: String,
    /// Token lifetime in seconds.
    pub expires_in: i64,
}

impl AuthService {
    /// Authenticate `email`/`password`, optionally within a tenant.
    ///
    /// Wrong password and unknown email fail identically. The one exception is
    /// a tenant-less attempt for an email registered under some tenant, which
    /// fails with [`CoreError::TenantRequired`] so the client can ask for the
    /// subdomain.
    pub async fn login(&self, input: LoginInput) -> CoreResult<LoginOutcome> {
        let mut errors = FieldErrors::new();
        validation::email(&mut errors, "email", &input.email);
        if input.password.is_empty() {
            errors.add("password", "Required");
        }
        errors.into_result()?;

        let email = normalize(&input.email);
        let tenant = resolve_tenant(self.store.as_ref(), input.tenant.as_ref()).await?;
        let scope = TenantScope::from(tenant.as_ref().map(|t| t.id));

        let user = match self.store.user_by_email(&email, scope).await? {
            Some(user) => {
                self.check_password(&input.password, &user)?;
                user
            }
            None if tenant.is_none() => self.tenantless_fallback(&email, &input.password).await?,
            None => return Err(CoreError::invalid_credentials()),
        };

        if !user.is_active {
            return Err(CoreError::Forbidden("User account is inactive".into()));
        }

        let principal = Principal {
            user_id: user.id,
            tenant_id: user.tenant_id,
            role: user.role,
        };
        let token = self
            .tokens
            .issue(&principal, self.settings.token_ttl_secs)?;

        audit::record(
            self.audit.as_ref(),
            AuditEntry::new(AuditAction::Login, AuditEntity::User)
                .tenant(user.tenant_id)
                .user(Some(user.id))
                .entity(user.id)
                .ip(input.ip_address),
        )
        .await;
        info!(user_id = %user.id, tenant_id = ?user.tenant_id, role = %user.role, "user logged in");

        Ok(LoginOutcome {
            user: LoginUser {
                id: user.id,
                email: user.email,
                full_name: user.full_name,
                role: user.role,
                tenant_id: user.tenant_id,
                tenant: tenant.as_ref().map(|t| t.summary()),
            },
            token,
            expires_in: self.settings.token_ttl_secs,
        })
    }

    /// No tenant was given and no tenant-less user matched: try the super
    /// admin path, then tell the caller whether a tenant hint would help.
    async fn tenantless_fallback(&self, email: &str, password: &str) -> CoreResult<User> {
        if let Some(admin) = self.store.super_admin_by_email(email).await? {
            self.check_password(password, &admin)?;
            return Ok(admin);
        }
        if self.store.email_bound_to_tenant(email).await? {
            debug!("login without tenant for tenant-bound email");
            return Err(CoreError::TenantRequired);
        }
        Err(CoreError::invalid_credentials())
    }

    fn check_password(&self, password: &str, user: &User) -> CoreResult<()> {
        if self.hasher.verify(password, &user.password_hash)? {
            Ok(())
        } else {
            Err(CoreError::invalid_credentials())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::INVALID_CREDENTIALS;
    use crate::models::TenantStatus;
    use crate::store::TenantStore;
    use crate::testing::{self, PASSWORD};

    fn input(email: &str, password: &str, subdomain: Option<&str>) -> LoginInput {
        LoginInput {
            email: email.into(),
            password: password.into(),
            tenant: TenantHint::from_parts(subdomain, None),
            ip_address: Some("10.0.0.1".into()),
        }
    }

    #[tokio::test]
    async fn login_with_subdomain_issues_tenant_token() {
        let h = testing::harness();
        let (tenant, admin) = testing::seed_tenant(&h.store, "acme").await;

        let out = h
            .auth
            .login(input(&admin.email, PASSWORD, Some("acme")))
            .await
            .unwrap();

        let claims = h.auth.tokens().verify(&out.token).unwrap();
        assert_eq!(claims.tenant_id, Some(tenant.id));
        assert_eq!(claims.role, Role::TenantAdmin);
        assert_eq!(out.expires_in, 86_400);
        assert_eq!(out.user.tenant.as_ref().map(|t| t.max_projects), Some(3));
    }

    #[tokio::test]
    async fn login_by_tenant_id() {
        let h = testing::harness();
        let (tenant, admin) = testing::seed_tenant(&h.store, "acme").await;
        let out = h
            .auth
            .login(LoginInput {
                email: admin.email.clone(),
                password: PASSWORD.into(),
                tenant: TenantHint::from_parts(None, Some(&tenant.id.to_string())),
                ip_address: None,
            })
            .await
            .unwrap();
        assert_eq!(out.user.tenant_id, Some(tenant.id));
    }

    #[tokio::test]
    async fn email_match_is_case_insensitive() {
        let h = testing::harness();
        testing::seed_tenant(&h.store, "acme").await;
        let out = h
            .auth
            .login(input("  ADMIN@acme.com ", PASSWORD, Some("acme")))
            .await;
        assert!(out.is_ok());
    }

    #[tokio::test]
    async fn tenant_bound_email_without_tenant_requires_tenant() {
        let h = testing::harness();
        let (_, admin) = testing::seed_tenant(&h.store, "acme").await;
        let err = h
            .auth
            .login(input(&admin.email, PASSWORD, None))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::TenantRequired));
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_look_identical() {
        let h = testing::harness();
        let (_, admin) = testing::seed_tenant(&h.store, "acme").await;

        let wrong_password = h
            .auth
            .login(input(&admin.email, "nope-nope", Some("acme")))
            .await
            .unwrap_err();
        let unknown_email = h
            .auth
            .login(input("ghost@acme.com", "nope-nope", Some("acme")))
            .await
            .unwrap_err();
        let unknown_tenantless = h
            .auth
            .login(input("ghost@acme.com", "nope-nope", None))
            .await
            .unwrap_err();

        for err in [wrong_password, unknown_email, unknown_tenantless] {
            assert!(matches!(err, CoreError::Unauthorized(ref m) if m == INVALID_CREDENTIALS));
        }
    }

    #[tokio::test]
    async fn inactive_tenant_is_forbidden_even_with_bad_password() {
        let h = testing::harness();
        let (tenant, admin) = testing::seed_tenant(&h.store, "acme").await;
        h.store
            .set_tenant_status(tenant.id, TenantStatus::Suspended)
            .await
            .unwrap();

        for password in [PASSWORD, "wrong-password"] {
            let err = h
                .auth
                .login(input(&admin.email, password, Some("acme")))
                .await
                .unwrap_err();
            assert!(matches!(err, CoreError::Forbidden(ref m) if m == "Tenant is not active"));
        }
    }

    #[tokio::test]
    async fn unknown_subdomain_is_not_found() {
        let h = testing::harness();
        let err = h
            .auth
            .login(input("a@acme.com", PASSWORD, Some("nowhere")))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn super_admin_gets_tenantless_token() {
        let h = testing::harness();
        let admin = testing::seed_super_admin(&h.store, "root@taskhive.io").await;

        let out = h
            .auth
            .login(input("root@taskhive.io", PASSWORD, None))
            .await
            .unwrap();
        let claims = h.auth.tokens().verify(&out.token).unwrap();
        assert_eq!(claims.user_id, admin.id);
        assert_eq!(claims.tenant_id, None);
        assert_eq!(claims.role, Role::SuperAdmin);
        assert!(out.user.tenant.is_none());
    }

    #[tokio::test]
    async fn super_admin_wrong_password_is_unauthorized() {
        let h = testing::harness();
        testing::seed_super_admin(&h.store, "root@taskhive.io").await;
        let err = h
            .auth
            .login(input("root@taskhive.io", "wrong-password", None))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn super_admin_cannot_log_in_through_a_tenant() {
        let h = testing::harness();
        testing::seed_tenant(&h.store, "acme").await;
        testing::seed_super_admin(&h.store, "root@taskhive.io").await;
        let err = h
            .auth
            .login(input("root@taskhive.io", PASSWORD, Some("acme")))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn inactive_user_is_forbidden() {
        let h = testing::harness();
        let (tenant, _) = testing::seed_tenant(&h.store, "acme").await;
        let member = testing::seed_member(&h.store, tenant.id, "m@acme.com").await;
        testing::deactivate(&h.store, tenant.id, member.id).await;

        let err = h
            .auth
            .login(input("m@acme.com", PASSWORD, Some("acme")))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Forbidden(ref m) if m == "User account is inactive"));
    }

    #[tokio::test]
    async fn malformed_input_is_validation_error() {
        let h = testing::harness();
        let err = h.auth.login(input("not-an-email", "", None)).await.unwrap_err();
        let CoreError::Validation(fields) = err else {
            panic!("expected validation error, got {err:?}");
        };
        assert!(!fields.get("email").is_empty());
        assert!(!fields.get("password").is_empty());
    }

    #[tokio::test]
    async fn login_is_audited() {
        let h = testing::harness();
        let (tenant, admin) = testing::seed_tenant(&h.store, "acme").await;
        h.auth
            .login(input(&admin.email, PASSWORD, Some("acme")))
            .await
            .unwrap();

        let entries = h.store.audit_entries().await;
        let login = entries
            .iter()
            .find(|e| e.action == AuditAction::Login)
            .unwrap();
        assert_eq!(login.tenant_id, Some(tenant.id));
        assert_eq!(login.user_id, Some(admin.id));
        assert_eq!(login.ip_address.as_deref(), Some("10.0.0.1"));
    }

    #[tokio::test]
    async fn audit_failure_does_not_fail_login() {
        let h = testing::harness_with_failing_audit();
        let (_, admin) = testing::seed_tenant(&h.store, "acme").await;
        assert!(
            h.auth
                .login(input(&admin.email, PASSWORD, Some("acme")))
                .await
                .is_ok()
        );
    }
}
