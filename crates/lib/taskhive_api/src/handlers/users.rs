//! User update/delete handlers.

use axum::extract::State;
use axum::{Extension, Json};
use taskhive_core::models::UserSummary;
use taskhive_core::tenants::UpdateUser;
use uuid::Uuid;

use crate::AppState;
use crate::envelope::ApiResponse;
use crate::error::AppResult;
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::auth::AuthenticatedCaller;

/// `PUT /api/users/{userId}`
pub async fn update_user_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedCaller(caller)): Extension<AuthenticatedCaller>,
    ApiPath(user_id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<UpdateUser>,
) -> AppResult<Json<ApiResponse<UserSummary>>> {
    let user = state
        .services
        .tenants
        .update_user(&caller, user_id, body)
        .await?;
    Ok(Json(ApiResponse::ok(user).with_message("User updated successfully")))
}

/// `DELETE /api/users/{userId}`: tenant admins only, never themselves.
pub async fn delete_user_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedCaller(caller)): Extension<AuthenticatedCaller>,
    ApiPath(user_id): ApiPath<Uuid>,
) -> AppResult<Json<ApiResponse>> {
    state.services.tenants.delete_user(&caller, user_id).await?;
    Ok(Json(ApiResponse::message("User deleted successfully")))
}
