use axum::http::StatusCode;
use modkit::api::problem::{from_parts, ProblemResponse};

use crate::domain::error::DomainError;

/// Map domain error to RFC9457 ProblemResponse
pub fn map_domain_error(e: &DomainError, instance: &str) -> ProblemResponse {
    match e {
        DomainError::TaskNotFound { .. } => from_parts(
            StatusCode::NOT_FOUND,
            "TASK_NOT_FOUND",
            "Not found",
            e.to_string(),
            instance,
        ),
        DomainError::TitleRequired
        | DomainError::EmptyTitle
        | DomainError::TitleTooLong { .. }
        | DomainError::InvalidStatus { .. }
        | DomainError::InvalidPriority { .. }
        | DomainError::InvalidTaskId { .. } => from_parts(
            StatusCode::BAD_REQUEST,
            "VALIDATION",
            "Validation error",
            e.to_string(),
            instance,
        ),
        DomainError::Database { .. } => {
            // Log the internal error details but don't expose them to the client
            tracing::error!(error = ?e, "Database error occurred");
            from_parts(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL",
                "Internal error",
                "Internal server error.",
                instance,
            )
        }
    }
}
