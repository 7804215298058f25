//! SeaORM-backed repository implementation for the domain port.

use anyhow::Context;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
};
use uuid::Uuid;

use crate::contract::model::Task;
use crate::domain::repo::TasksRepository;
use crate::infra::storage::entity::{Column, Entity as TaskEntity};
use crate::infra::storage::mapper::{contract_to_active, entity_to_contract};

/// SeaORM repository impl.
/// Holds a connection object; its lifetime/ownership is up to the caller.
pub struct SeaOrmTasksRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    conn: C,
}

impl<C> SeaOrmTasksRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    pub fn new(conn: C) -> Self {
        Self { conn }
    }
}

#[async_trait::async_trait]
impl<C> TasksRepository for SeaOrmTasksRepository<C>
where
    C: ConnectionTrait + Send + Sync + 'static,
{
    async fn list_by_owner(&self, owner: Uuid) -> anyhow::Result<Vec<Task>> {
        let rows = TaskEntity::find()
            .filter(Column::OwnerId.eq(owner))
            .order_by_desc(Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("list_by_owner failed")?;
        rows.into_iter().map(entity_to_contract).collect()
    }

    async fn find_owned(&self, id: Uuid, owner: Uuid) -> anyhow::Result<Option<Task>> {
        let found = TaskEntity::find_by_id(id)
            .filter(Column::OwnerId.eq(owner))
            .one(&self.conn)
            .await
            .context("find_owned failed")?;
        found.map(entity_to_contract).transpose()
    }

    async fn insert(&self, t: Task) -> anyhow::Result<()> {
        let _ = contract_to_active(t)
            .insert(&self.conn)
            .await
            .context("insert failed")?;
        Ok(())
    }

    async fn update(&self, t: Task) -> anyhow::Result<bool> {
        match contract_to_active(t).update(&self.conn).await {
            Ok(_) => Ok(true),
            Err(DbErr::RecordNotUpdated) => Ok(false),
            Err(e) => Err(anyhow::Error::new(e).context("update failed")),
        }
    }

    async fn delete_owned(&self, id: Uuid, owner: Uuid) -> anyhow::Result<bool> {
        let res = TaskEntity::delete_many()
            .filter(Column::Id.eq(id))
            .filter(Column::OwnerId.eq(owner))
            .exec(&self.conn)
            .await
            .context("delete_owned failed")?;
        Ok(res.rows_affected > 0)
    }
}
