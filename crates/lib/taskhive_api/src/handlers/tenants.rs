//! Tenant details and member administration handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use taskhive_core::models::{Paged, UserSummary};
use taskhive_core::tenants::{AddUser, TenantDetails};
use uuid::Uuid;

use crate::AppState;
use crate::envelope::ApiResponse;
use crate::error::AppResult;
use crate::extract::{ApiJson, ApiPath, ApiQuery, PageQuery};
use crate::middleware::auth::AuthenticatedCaller;

/// `GET /api/tenants/{tenantId}`
pub async fn get_tenant_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedCaller(caller)): Extension<AuthenticatedCaller>,
    ApiPath(tenant_id): ApiPath<Uuid>,
) -> AppResult<Json<ApiResponse<TenantDetails>>> {
    let details = state.services.tenants.get_tenant(&caller, tenant_id).await?;
    Ok(Json(ApiResponse::ok(details)))
}

/// `POST /api/tenants/{tenantId}/users`: tenant admins only.
pub async fn add_user_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedCaller(caller)): Extension<AuthenticatedCaller>,
    ApiPath(tenant_id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<AddUser>,
) -> AppResult<(StatusCode, Json<ApiResponse<UserSummary>>)> {
    let user = state
        .services
        .tenants
        .add_user(&caller, tenant_id, body)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(user).with_message("User created successfully")),
    ))
}

/// `GET /api/tenants/{tenantId}/users`
pub async fn list_users_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedCaller(caller)): Extension<AuthenticatedCaller>,
    ApiPath(tenant_id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> AppResult<Json<ApiResponse<Paged<UserSummary>>>> {
    let users = state
        .services
        .tenants
        .list_users(&caller, tenant_id, query.page())
        .await?;
    Ok(Json(ApiResponse::ok(users)))
}
