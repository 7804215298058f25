use std::sync::Arc;

use accounts::{api::rest::auth::require_identity, contract::AccountsApi};
use axum::{middleware, routing::get, routing::put, Extension, Router};
use modkit::api::Problem;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::api::rest::{dto, handlers};
use crate::contract::model::{Priority, TaskStatus};
use crate::domain::service::Service;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::list_tasks,
        handlers::create_task,
        handlers::update_task,
        handlers::delete_task
    ),
    components(schemas(
        dto::TaskDto,
        dto::CreateTaskReq,
        dto::UpdateTaskReq,
        dto::TaskListDto,
        dto::TaskEnvelopeDto,
        dto::MessageDto,
        TaskStatus,
        Priority,
        Problem
    )),
    modifiers(&BearerAuth),
    tags((name = "tasks", description = "Per-user task CRUD"))
)]
pub struct TasksApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(|| utoipa::openapi::ComponentsBuilder::new().build());
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

/// Mount the task routes; every one of them requires a bearer token.
pub fn register_routes(
    router: Router,
    service: Arc<Service>,
    accounts: Arc<dyn AccountsApi>,
) -> anyhow::Result<Router> {
    let routes = Router::new()
        .route("/tasks", get(handlers::list_tasks).post(handlers::create_task))
        .route(
            "/tasks/{id}",
            put(handlers::update_task).delete(handlers::delete_task),
        )
        .route_layer(middleware::from_fn_with_state(accounts, require_identity))
        .layer(Extension(service));

    Ok(router.merge(routes))
}
