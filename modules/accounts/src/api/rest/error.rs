use axum::http::StatusCode;
use modkit::api::problem::{from_parts, ProblemResponse};

use crate::contract::error::AccountsError;
use crate::domain::error::DomainError;

/// Map domain error to RFC9457 ProblemResponse
pub fn map_domain_error(e: &DomainError, instance: &str) -> ProblemResponse {
    match e {
        DomainError::MissingCredentials => from_parts(
            StatusCode::BAD_REQUEST,
            "VALIDATION",
            "Validation error",
            e.to_string(),
            instance,
        ),
        DomainError::UsernameTaken { .. } => from_parts(
            StatusCode::CONFLICT,
            "USERNAME_TAKEN",
            "Conflict",
            e.to_string(),
            instance,
        ),
        DomainError::InvalidCredentials
        | DomainError::MissingToken
        | DomainError::InvalidToken
        | DomainError::InvalidTokenPayload => from_parts(
            StatusCode::UNAUTHORIZED,
            "UNAUTHORIZED",
            "Unauthorized",
            e.to_string(),
            instance,
        ),
        DomainError::Database { .. } | DomainError::Crypto { .. } => {
            // Log the internal error details but don't expose them to the client
            tracing::error!(error = ?e, "Internal error occurred");
            internal(instance)
        }
    }
}

/// Same mapping for callers that only see the public contract (other modules).
pub fn map_accounts_error(e: &AccountsError, instance: &str) -> ProblemResponse {
    match e {
        AccountsError::Validation { message } => from_parts(
            StatusCode::BAD_REQUEST,
            "VALIDATION",
            "Validation error",
            message.clone(),
            instance,
        ),
        AccountsError::Conflict { message } => from_parts(
            StatusCode::CONFLICT,
            "USERNAME_TAKEN",
            "Conflict",
            message.clone(),
            instance,
        ),
        AccountsError::Unauthorized { message } => from_parts(
            StatusCode::UNAUTHORIZED,
            "UNAUTHORIZED",
            "Unauthorized",
            message.clone(),
            instance,
        ),
        AccountsError::Internal => internal(instance),
    }
}

fn internal(instance: &str) -> ProblemResponse {
    from_parts(
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL",
        "Internal error",
        "Internal server error.",
        instance,
    )
}
