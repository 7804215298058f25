use thiserror::Error;

/// Errors that are safe to expose to other modules
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccountsError {
    #[error("{message}")]
    Validation { message: String },

    #[error("{message}")]
    Conflict { message: String },

    #[error("{message}")]
    Unauthorized { message: String },

    #[error("Internal server error.")]
    Internal,
}

impl AccountsError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }
}

impl From<crate::domain::error::DomainError> for AccountsError {
    fn from(domain_error: crate::domain::error::DomainError) -> Self {
        use crate::domain::error::DomainError::*;
        match domain_error {
            e @ MissingCredentials => Self::validation(e.to_string()),
            e @ UsernameTaken { .. } => Self::conflict(e.to_string()),
            e @ (InvalidCredentials | MissingToken | InvalidToken | InvalidTokenPayload) => {
                Self::unauthorized(e.to_string())
            }
            Database { .. } | Crypto { .. } => Self::Internal,
        }
    }
}
