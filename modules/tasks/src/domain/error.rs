use thiserror::Error;
use uuid::Uuid;

/// Domain-specific errors using thiserror.
///
/// `Display` is the message returned to API clients, except for `Database`.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Title is required.")]
    TitleRequired,

    #[error("Title must be a non-empty string.")]
    EmptyTitle,

    #[error("Title must be at most {max} characters.")]
    TitleTooLong { max: usize },

    #[error("Status must be 'pending' or 'completed'.")]
    InvalidStatus { value: String },

    #[error("Priority must be 'low', 'medium' or 'high'.")]
    InvalidPriority { value: String },

    #[error("Invalid task id.")]
    InvalidTaskId { value: String },

    #[error("Task not found.")]
    TaskNotFound { id: Uuid },

    #[error("Database error: {message}")]
    Database { message: String },
}

impl DomainError {
    pub fn task_not_found(id: Uuid) -> Self {
        Self::TaskNotFound { id }
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }
}
