use std::sync::Arc;

use axum::{routing::post, Extension, Router};
use modkit::api::Problem;
use utoipa::OpenApi;

use crate::api::rest::{dto, handlers};
use crate::domain::service::Service;

#[derive(OpenApi)]
#[openapi(
    paths(handlers::register, handlers::login),
    components(schemas(dto::CredentialsReq, dto::MessageDto, dto::LoginResp, Problem)),
    tags((name = "auth", description = "Registration and login"))
)]
pub struct AccountsApiDoc;

/// Mount `/register` and `/login` onto `router`.
pub fn register_routes(router: Router, service: Arc<Service>) -> anyhow::Result<Router> {
    let routes = Router::new()
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
        .layer(Extension(service));

    Ok(router.merge(routes))
}
