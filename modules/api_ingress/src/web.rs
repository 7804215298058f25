use axum::{
    http::{StatusCode, Uri},
    response::Json,
};
use modkit::api::problem::{from_parts, ProblemResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthDto {
    /// Always `ok` while the process serves requests.
    pub status: String,
    /// Server time, RFC 3339.
    pub time: String,
}

/// Liveness probe
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "system",
    responses((status = 200, description = "Server is up", body = HealthDto))
)]
pub async fn health_check() -> Json<HealthDto> {
    Json(HealthDto {
        status: "ok".to_string(),
        time: chrono::Utc::now().to_rfc3339(),
    })
}

pub async fn not_found(uri: Uri) -> ProblemResponse {
    from_parts(
        StatusCode::NOT_FOUND,
        "NOT_FOUND",
        "Not Found",
        "Route not found.",
        uri.path(),
    )
}
