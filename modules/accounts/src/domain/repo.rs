use crate::contract::model::User;
use async_trait::async_trait;

/// Port for the domain layer: persistence operations the domain needs.
#[async_trait]
pub trait UsersRepository: Send + Sync {
    /// Load a user by exact username.
    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<User>>;
    /// Check uniqueness by username.
    async fn username_exists(&self, username: &str) -> anyhow::Result<bool>;
    /// Insert a fully-formed user.
    ///
    /// Returns `false` when the unique username index rejected the row, which
    /// covers a concurrent registration racing past `username_exists`.
    async fn insert(&self, user: User) -> anyhow::Result<bool>;
}
