use std::sync::Arc;

use async_trait::async_trait;
use modkit::{DbModule, RestfulModule};
use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use tracing::{debug, info};
use utoipa::OpenApi;

use crate::api::rest::routes::{self, AccountsApiDoc};
use crate::config::AccountsConfig;
use crate::contract::client::AccountsApi;
use crate::domain::service::Service;
use crate::domain::token::TokenCodec;
use crate::gateways::local::AccountsLocalClient;
use crate::infra::storage::sea_orm_repo::SeaOrmUsersRepository;

/// Accounts module: users, credentials and bearer tokens.
#[derive(Clone)]
pub struct Accounts {
    service: Arc<Service>,
}

impl Accounts {
    pub const NAME: &'static str = "accounts";

    /// Wire repository (infra) to domain service (port).
    pub fn new(db: DatabaseConnection, cfg: AccountsConfig) -> anyhow::Result<Self> {
        if cfg.jwt_secret.is_empty() {
            anyhow::bail!("modules.accounts.jwt_secret must be set");
        }
        if cfg.token_ttl_hours <= 0 {
            anyhow::bail!(
                "modules.accounts.token_ttl_hours must be positive, got {}",
                cfg.token_ttl_hours
            );
        }
        debug!("Loaded accounts config: token_ttl_hours={}", cfg.token_ttl_hours);

        let tokens = TokenCodec::new(&cfg.jwt_secret, chrono::Duration::hours(cfg.token_ttl_hours));
        let repo = SeaOrmUsersRepository::new(db);
        let service = Service::new(Arc::new(repo), tokens);

        info!("Accounts module initialized");
        Ok(Self {
            service: Arc::new(service),
        })
    }

    /// In-process client for other modules (used by the auth middleware).
    pub fn client(&self) -> Arc<dyn AccountsApi> {
        Arc::new(AccountsLocalClient::new(self.service.clone()))
    }
}

#[async_trait]
impl DbModule for Accounts {
    async fn migrate(&self, db: &DatabaseConnection) -> anyhow::Result<()> {
        info!("Running accounts database migrations");
        crate::infra::storage::migrations::Migrator::up(db, None).await?;
        info!("Accounts database migrations completed successfully");
        Ok(())
    }
}

impl RestfulModule for Accounts {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn register_rest(&self, router: axum::Router) -> anyhow::Result<axum::Router> {
        info!("Registering accounts REST routes");
        routes::register_routes(router, self.service.clone())
    }

    fn openapi(&self) -> utoipa::openapi::OpenApi {
        AccountsApiDoc::openapi()
    }
}
