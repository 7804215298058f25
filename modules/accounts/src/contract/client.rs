use async_trait::async_trait;

use crate::contract::{
    error::AccountsError,
    model::{Credentials, Identity, IssuedToken},
};

/// Public API of the accounts module for in-process consumers.
#[async_trait]
pub trait AccountsApi: Send + Sync {
    /// Create an account.
    async fn register(&self, credentials: Credentials) -> Result<Identity, AccountsError>;

    /// Check credentials and issue a bearer token.
    async fn login(&self, credentials: Credentials) -> Result<IssuedToken, AccountsError>;

    /// Verify a raw bearer token (without the `Bearer ` prefix).
    async fn authenticate(&self, token: &str) -> Result<Identity, AccountsError>;
}
