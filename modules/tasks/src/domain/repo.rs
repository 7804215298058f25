use async_trait::async_trait;
use uuid::Uuid;

use crate::contract::model::Task;

/// Port for the domain layer. Every lookup is owner-scoped: a task that
/// exists but belongs to someone else is reported as absent.
#[async_trait]
pub trait TasksRepository: Send + Sync {
    /// All tasks of `owner`, newest first.
    async fn list_by_owner(&self, owner: Uuid) -> anyhow::Result<Vec<Task>>;
    async fn find_owned(&self, id: Uuid, owner: Uuid) -> anyhow::Result<Option<Task>>;
    async fn insert(&self, task: Task) -> anyhow::Result<()>;
    /// `false` when the row is gone.
    async fn update(&self, task: Task) -> anyhow::Result<bool>;
    /// `true` when a row was removed.
    async fn delete_owned(&self, id: Uuid, owner: Uuid) -> anyhow::Result<bool>;
}
