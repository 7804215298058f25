use async_trait::async_trait;
use std::sync::Arc;

use crate::contract::{
    client::AccountsApi,
    error::AccountsError,
    model::{Credentials, Identity, IssuedToken},
};
use crate::domain::service::Service;

/// Local implementation of the AccountsApi trait that delegates to the domain service
pub struct AccountsLocalClient {
    service: Arc<Service>,
}

impl AccountsLocalClient {
    pub fn new(service: Arc<Service>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl AccountsApi for AccountsLocalClient {
    async fn register(&self, credentials: Credentials) -> Result<Identity, AccountsError> {
        self.service.register(credentials).await.map_err(Into::into)
    }

    async fn login(&self, credentials: Credentials) -> Result<IssuedToken, AccountsError> {
        self.service.login(credentials).await.map_err(Into::into)
    }

    async fn authenticate(&self, token: &str) -> Result<Identity, AccountsError> {
        self.service.authenticate(token).await.map_err(Into::into)
    }
}
