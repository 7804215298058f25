use std::sync::Arc;

use accounts::api::rest::auth::Authenticated;
use axum::{
    extract::{Extension, OriginalUri, Path},
    http::StatusCode,
    Json,
};
use modkit::api::{problem::ProblemResponse, ApiJson, Problem};
use tracing::{error, info};

use crate::api::rest::dto::{
    CreateTaskReq, MessageDto, TaskDto, TaskEnvelopeDto, TaskListDto, UpdateTaskReq,
};
use crate::api::rest::error::map_domain_error;
use crate::domain::service::{parse_task_id, Service};

/// List the caller's tasks, newest first
#[utoipa::path(
    get,
    path = "/api/tasks",
    tag = "tasks",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Tasks of the caller", body = TaskListDto),
        (status = 401, description = "Missing or invalid token", body = Problem),
        (status = 500, description = "Internal server error", body = Problem),
    )
)]
pub async fn list_tasks(
    OriginalUri(uri): OriginalUri,
    Extension(svc): Extension<Arc<Service>>,
    Authenticated(who): Authenticated,
) -> Result<Json<TaskListDto>, ProblemResponse> {
    match svc.list_tasks(who.id).await {
        Ok(tasks) => Ok(Json(TaskListDto {
            tasks: tasks.into_iter().map(TaskDto::from).collect(),
        })),
        Err(e) => {
            error!("Failed to list tasks: {}", e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

/// Create a task owned by the caller
#[utoipa::path(
    post,
    path = "/api/tasks",
    tag = "tasks",
    security(("bearer" = [])),
    request_body = CreateTaskReq,
    responses(
        (status = 201, description = "Created task", body = TaskEnvelopeDto),
        (status = 400, description = "Invalid title, status or priority", body = Problem),
        (status = 401, description = "Missing or invalid token", body = Problem),
        (status = 500, description = "Internal server error", body = Problem),
    )
)]
pub async fn create_task(
    OriginalUri(uri): OriginalUri,
    Extension(svc): Extension<Arc<Service>>,
    Authenticated(who): Authenticated,
    ApiJson(req_body): ApiJson<CreateTaskReq>,
) -> Result<(StatusCode, Json<TaskEnvelopeDto>), ProblemResponse> {
    info!("Creating task for user {}", who.id);

    match svc.create_task(who.id, req_body.into()).await {
        Ok(task) => Ok((
            StatusCode::CREATED,
            Json(TaskEnvelopeDto {
                message: "Task created.".to_string(),
                task: task.into(),
            }),
        )),
        Err(e) => {
            info!("Failed to create task: {}", e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

/// Update any subset of a task's fields
#[utoipa::path(
    put,
    path = "/api/tasks/{id}",
    tag = "tasks",
    security(("bearer" = [])),
    params(("id" = String, Path, description = "Task UUID")),
    request_body = UpdateTaskReq,
    responses(
        (status = 200, description = "Updated task", body = TaskEnvelopeDto),
        (status = 400, description = "Invalid id, title, status or priority", body = Problem),
        (status = 401, description = "Missing or invalid token", body = Problem),
        (status = 404, description = "No such task owned by the caller", body = Problem),
        (status = 500, description = "Internal server error", body = Problem),
    )
)]
pub async fn update_task(
    OriginalUri(uri): OriginalUri,
    Extension(svc): Extension<Arc<Service>>,
    Authenticated(who): Authenticated,
    Path(id): Path<String>,
    ApiJson(req_body): ApiJson<UpdateTaskReq>,
) -> Result<Json<TaskEnvelopeDto>, ProblemResponse> {
    info!("Updating task {}", id);

    let result = match parse_task_id(&id) {
        Ok(id) => svc.update_task(who.id, id, req_body.into()).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(task) => Ok(Json(TaskEnvelopeDto {
            message: "Task updated.".to_string(),
            task: task.into(),
        })),
        Err(e) => {
            info!("Failed to update task {}: {}", id, e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

/// Delete a task permanently
#[utoipa::path(
    delete,
    path = "/api/tasks/{id}",
    tag = "tasks",
    security(("bearer" = [])),
    params(("id" = String, Path, description = "Task UUID")),
    responses(
        (status = 200, description = "Task deleted", body = MessageDto),
        (status = 400, description = "Invalid id", body = Problem),
        (status = 401, description = "Missing or invalid token", body = Problem),
        (status = 404, description = "No such task owned by the caller", body = Problem),
        (status = 500, description = "Internal server error", body = Problem),
    )
)]
pub async fn delete_task(
    OriginalUri(uri): OriginalUri,
    Extension(svc): Extension<Arc<Service>>,
    Authenticated(who): Authenticated,
    Path(id): Path<String>,
) -> Result<Json<MessageDto>, ProblemResponse> {
    info!("Deleting task {}", id);

    let result = match parse_task_id(&id) {
        Ok(id) => svc.delete_task(who.id, id).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(()) => Ok(Json(MessageDto {
            message: "Task deleted.".to_string(),
        })),
        Err(e) => {
            info!("Failed to delete task {}: {}", id, e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}
