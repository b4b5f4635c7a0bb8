//! Authentication request handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Deserialize;
use taskhive_core::TenantHint;
use taskhive_core::auth::{LoginInput, LoginOutcome, Profile, RegisterTenantInput, Registration};

use crate::AppState;
use crate::envelope::ApiResponse;
use crate::error::AppResult;
use crate::extract::{ApiJson, ClientIp};
use crate::middleware::auth::{AuthenticatedCaller, MaybeCaller};

/// Body of `POST /api/auth/register-tenant`. Missing fields deserialize as
/// empty strings so they surface as field errors.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RegisterTenantRequest {
    pub tenant_name: String,
    pub subdomain: String,
    pub admin_email: String,
    pub admin_password: String,
    pub admin_full_name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    #[serde(alias = "tenantSubdomain")]
    pub subdomain: Option<String>,
    pub tenant_id: Option<String>,
}

/// `POST /api/auth/register-tenant`: create a tenant and its first admin.
pub async fn register_tenant_handler(
    State(state): State<AppState>,
    ClientIp(ip_address): ClientIp,
    ApiJson(body): ApiJson<RegisterTenantRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Registration>>)> {
    let registration = state
        .services
        .auth
        .register_tenant(RegisterTenantInput {
            tenant_name: body.tenant_name,
            subdomain: body.subdomain,
            admin_email: body.admin_email,
            admin_password: body.admin_password,
            admin_full_name: body.admin_full_name,
            ip_address,
        })
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(registration).with_message("Tenant registered successfully")),
    ))
}

/// `POST /api/auth/login`: authenticate, optionally within a tenant.
pub async fn login_handler(
    State(state): State<AppState>,
    ClientIp(ip_address): ClientIp,
    ApiJson(body): ApiJson<LoginRequest>,
) -> AppResult<Json<ApiResponse<LoginOutcome>>> {
    let tenant = TenantHint::from_parts(body.subdomain.as_deref(), body.tenant_id.as_deref());
    let outcome = state
        .services
        .auth
        .login(LoginInput {
            email: body.email,
            password: body.password,
            tenant,
            ip_address,
        })
        .await?;
    Ok(Json(ApiResponse::ok(outcome).with_message("Login successful")))
}

/// `GET /api/auth/me`
pub async fn me_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedCaller(caller)): Extension<AuthenticatedCaller>,
) -> AppResult<Json<ApiResponse<Profile>>> {
    let profile = state.services.auth.me(&caller.principal).await?;
    Ok(Json(ApiResponse::ok(profile)))
}

/// `POST /api/auth/logout`: always succeeds; tokens are not revoked.
pub async fn logout_handler(
    State(state): State<AppState>,
    ClientIp(ip_address): ClientIp,
    Extension(MaybeCaller(caller)): Extension<MaybeCaller>,
) -> Json<ApiResponse> {
    state.services.auth.logout(caller.as_ref(), ip_address).await;
    Json(ApiResponse::message("Logged out successfully"))
}
