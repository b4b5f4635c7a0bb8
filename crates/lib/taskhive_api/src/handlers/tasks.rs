//! Task request handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use taskhive_core::models::{Paged, Task, TaskChanges};
use taskhive_core::tasks::CreateTask;
use uuid::Uuid;

use crate::AppState;
use crate::envelope::ApiResponse;
use crate::error::AppResult;
use crate::extract::{ApiJson, ApiPath, ApiQuery, TaskQuery};
use crate::middleware::auth::AuthenticatedCaller;

/// `POST /api/projects/{projectId}/tasks`
pub async fn create_task_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedCaller(caller)): Extension<AuthenticatedCaller>,
    ApiPath(project_id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<CreateTask>,
) -> AppResult<(StatusCode, Json<ApiResponse<Task>>)> {
    let task = state
        .services
        .tasks
        .create(&caller, project_id, body)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(task).with_message("Task created successfully")),
    ))
}

/// `GET /api/projects/{projectId}/tasks?status=&priority=&page=&limit=`
pub async fn list_tasks_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedCaller(caller)): Extension<AuthenticatedCaller>,
    ApiPath(project_id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<TaskQuery>,
) -> AppResult<Json<ApiResponse<Paged<Task>>>> {
    let tasks = state
        .services
        .tasks
        .list(&caller, project_id, query.filter(), query.page())
        .await?;
    Ok(Json(ApiResponse::ok(tasks)))
}

/// `GET /api/tasks/{taskId}`
pub async fn get_task_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedCaller(caller)): Extension<AuthenticatedCaller>,
    ApiPath(task_id): ApiPath<Uuid>,
) -> AppResult<Json<ApiResponse<Task>>> {
    let task = state.services.tasks.get(&caller, task_id).await?;
    Ok(Json(ApiResponse::ok(task)))
}

/// `PUT /api/tasks/{taskId}`
pub async fn update_task_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedCaller(caller)): Extension<AuthenticatedCaller>,
    ApiPath(task_id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<TaskChanges>,
) -> AppResult<Json<ApiResponse<Task>>> {
    let task = state.services.tasks.update(&caller, task_id, body).await?;
    Ok(Json(ApiResponse::ok(task).with_message("Task updated successfully")))
}

/// `DELETE /api/tasks/{taskId}`
pub async fn delete_task_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedCaller(caller)): Extension<AuthenticatedCaller>,
    ApiPath(task_id): ApiPath<Uuid>,
) -> AppResult<Json<ApiResponse>> {
    state.services.tasks.delete(&caller, task_id).await?;
    Ok(Json(ApiResponse::message("Task deleted successfully")))
}
