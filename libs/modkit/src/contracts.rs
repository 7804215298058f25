use async_trait::async_trait;
use axum::Router;
use sea_orm::DatabaseConnection;

/// A module owning tables. Runs BEFORE routes are registered.
#[async_trait]
pub trait DbModule: Send + Sync {
    async fn migrate(&self, db: &DatabaseConnection) -> anyhow::Result<()>;
}

/// A module exposing REST endpoints. Pure wiring; must be sync.
///
/// Routes are registered with paths relative to the API root (`/tasks`,
/// not `/api/tasks`); the ingress nests them.
pub trait RestfulModule: Send + Sync {
    /// Stable module name used in logs and configuration.
    fn name(&self) -> &'static str;

    fn register_rest(&self, router: Router) -> anyhow::Result<Router>;

    /// OpenAPI fragment describing the module's operations.
    fn openapi(&self) -> utoipa::openapi::OpenApi;
}
