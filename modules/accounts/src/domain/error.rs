use thiserror::Error;

/// Domain-specific errors using thiserror.
///
/// The `Display` strings are the messages shown to API clients, except for
/// `Database`/`Crypto` which are logged and replaced by a generic message.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Username and password are required.")]
    MissingCredentials,

    #[error("Username already taken.")]
    UsernameTaken { username: String },

    // Same message for unknown user and wrong password.
    #[error("Invalid username or password.")]
    InvalidCredentials,

    #[error("Missing token")]
    MissingToken,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Invalid token payload")]
    InvalidTokenPayload,

    #[error("Database error: {message}")]
    Database { message: String },

    #[error("Credential processing failed: {message}")]
    Crypto { message: String },
}

impl DomainError {
    pub fn username_taken(username: impl Into<String>) -> Self {
        Self::UsernameTaken {
            username: username.into(),
        }
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }

    pub fn crypto(message: impl Into<String>) -> Self {
        Self::Crypto {
            message: message.into(),
        }
    }
}
