//! Project request handlers.
//!
//! The owning tenant is always the caller's; a `{tenantId}` path segment
//! only has to agree with it.

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use taskhive_core::models::{Paged, Project, ProjectChanges};
use taskhive_core::projects::CreateProject;
use taskhive_core::scope::check_tenant;
use uuid::Uuid;

use crate::AppState;
use crate::envelope::ApiResponse;
use crate::error::AppResult;
use crate::extract::{ApiJson, ApiPath, ApiQuery, PageQuery};
use crate::middleware::auth::AuthenticatedCaller;

/// `POST /api/tenants/{tenantId}/projects`
pub async fn create_project_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedCaller(caller)): Extension<AuthenticatedCaller>,
    ApiPath(tenant_id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<CreateProject>,
) -> AppResult<(StatusCode, Json<ApiResponse<Project>>)> {
    check_tenant(&caller.principal, tenant_id)?;
    let project = state.services.projects.create(&caller, body).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(project).with_message("Project created successfully")),
    ))
}

/// `GET /api/tenants/{tenantId}/projects`
pub async fn list_projects_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedCaller(caller)): Extension<AuthenticatedCaller>,
    ApiPath(tenant_id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> AppResult<Json<ApiResponse<Paged<Project>>>> {
    check_tenant(&caller.principal, tenant_id)?;
    let projects = state.services.projects.list(&caller, query.page()).await?;
    Ok(Json(ApiResponse::ok(projects)))
}

/// `GET /api/projects/{projectId}`
pub async fn get_project_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedCaller(caller)): Extension<AuthenticatedCaller>,
    ApiPath(project_id): ApiPath<Uuid>,
) -> AppResult<Json<ApiResponse<Project>>> {
    let project = state.services.projects.get(&caller, project_id).await?;
    Ok(Json(ApiResponse::ok(project)))
}

/// `PUT /api/projects/{projectId}`
pub async fn update_project_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedCaller(caller)): Extension<AuthenticatedCaller>,
    ApiPath(project_id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<ProjectChanges>,
) -> AppResult<Json<ApiResponse<Project>>> {
    let project = state
        .services
        .projects
        .update(&caller, project_id, body)
        .await?;
    Ok(Json(ApiResponse::ok(project).with_message("Project updated successfully")))
}

/// `DELETE /api/projects/{projectId}`: removes the project's tasks too.
pub async fn delete_project_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedCaller(caller)): Extension<AuthenticatedCaller>,
    ApiPath(project_id): ApiPath<Uuid>,
) -> AppResult<Json<ApiResponse>> {
    state.services.projects.delete(&caller, project_id).await?;
    Ok(Json(ApiResponse::message("Project deleted successfully")))
}
