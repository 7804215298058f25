use std::sync::Arc;

use accounts::contract::AccountsApi;
use async_trait::async_trait;
use modkit::{DbModule, RestfulModule};
use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use tracing::{debug, info};
use utoipa::OpenApi;

use crate::api::rest::routes::{self, TasksApiDoc};
use crate::config::TasksConfig;
use crate::domain::service::{Service, ServiceConfig};
use crate::infra::storage::sea_orm_repo::SeaOrmTasksRepository;

/// Tasks module: per-user task storage and REST endpoints.
#[derive(Clone)]
pub struct Tasks {
    service: Arc<Service>,
    accounts: Arc<dyn AccountsApi>,
}

impl Tasks {
    pub const NAME: &'static str = "tasks";

    pub fn new(
        db: DatabaseConnection,
        cfg: TasksConfig,
        accounts: Arc<dyn AccountsApi>,
    ) -> anyhow::Result<Self> {
        if cfg.max_title_length == 0 {
            anyhow::bail!("modules.tasks.max_title_length must be positive");
        }
        debug!("Loaded tasks config: max_title_length={}", cfg.max_title_length);

        let repo = SeaOrmTasksRepository::new(db);
        let service = Service::new(
            Arc::new(repo),
            ServiceConfig {
                max_title_length: cfg.max_title_length,
            },
        );

        info!("Tasks module initialized");
        Ok(Self {
            service: Arc::new(service),
            accounts,
        })
    }
}

#[async_trait]
impl DbModule for Tasks {
    async fn migrate(&self, db: &DatabaseConnection) -> anyhow::Result<()> {
        info!("Running tasks database migrations");
        crate::infra::storage::migrations::Migrator::up(db, None).await?;
        info!("Tasks database migrations completed successfully");
        Ok(())
    }
}

impl RestfulModule for Tasks {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn register_rest(&self, router: axum::Router) -> anyhow::Result<axum::Router> {
        info!("Registering tasks REST routes");
        routes::register_routes(router, self.service.clone(), self.accounts.clone())
    }

    fn openapi(&self) -> utoipa::openapi::OpenApi {
        TasksApiDoc::openapi()
    }
}
