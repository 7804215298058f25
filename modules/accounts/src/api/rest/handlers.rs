use std::sync::Arc;

use axum::{
    extract::{Extension, OriginalUri},
    http::StatusCode,
    Json,
};
use modkit::api::{problem::ProblemResponse, ApiJson, Problem};
use tracing::{error, info};

use crate::api::rest::dto::{CredentialsReq, LoginResp, MessageDto};
use crate::api::rest::error::map_domain_error;
use crate::domain::error::DomainError;
use crate::domain::service::Service;

/// Register a new account
#[utoipa::path(
    post,
    path = "/api/register",
    tag = "auth",
    request_body = CredentialsReq,
    responses(
        (status = 201, description = "User registered", body = MessageDto),
        (status = 400, description = "Missing username or password", body = Problem),
        (status = 409, description = "Username already taken", body = Problem),
        (status = 500, description = "Internal server error", body = Problem),
    )
)]
pub async fn register(
    OriginalUri(uri): OriginalUri,
    Extension(svc): Extension<Arc<Service>>,
    ApiJson(req_body): ApiJson<CredentialsReq>,
) -> Result<(StatusCode, Json<MessageDto>), ProblemResponse> {
    info!("Registering user: {}", req_body);

    match svc.register(req_body.into()).await {
        Ok(_) => Ok((
            StatusCode::CREATED,
            Json(MessageDto::new("User registered successfully.")),
        )),
        Err(e) => {
            log_failure("register", &e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

/// Exchange credentials for a bearer token
#[utoipa::path(
    post,
    path = "/api/login",
    tag = "auth",
    request_body = CredentialsReq,
    responses(
        (status = 200, description = "Token issued", body = LoginResp),
        (status = 400, description = "Missing username or password", body = Problem),
        (status = 401, description = "Invalid username or password", body = Problem),
        (status = 500, description = "Internal server error", body = Problem),
    )
)]
pub async fn login(
    OriginalUri(uri): OriginalUri,
    Extension(svc): Extension<Arc<Service>>,
    ApiJson(req_body): ApiJson<CredentialsReq>,
) -> Result<Json<LoginResp>, ProblemResponse> {
    info!("Login: {}", req_body);

    match svc.login(req_body.into()).await {
        Ok(issued) => Ok(Json(LoginResp {
            message: "Login successful.".to_string(),
            token: issued.token,
        })),
        Err(e) => {
            log_failure("login", &e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

fn log_failure(op: &str, e: &DomainError) {
    match e {
        DomainError::Database { .. } | DomainError::Crypto { .. } => {
            error!("Failed to {}: {}", op, e)
        }
        _ => info!("Rejected {}: {}", op, e),
    }
}
