use anyhow::Context;
use sea_orm::Set;

use crate::contract::model::Task;
use crate::infra::storage::entity::{ActiveModel, Model};

/// Convert a database row to a contract model. Fails on unknown enum text.
pub fn entity_to_contract(row: Model) -> anyhow::Result<Task> {
    Ok(Task {
        status: row
            .status
            .parse()
            .with_context(|| format!("task {} has bad status", row.id))?,
        priority: row
            .priority
            .parse()
            .with_context(|| format!("task {} has bad priority", row.id))?,
        id: row.id,
        title: row.title,
        description: row.description,
        owner_id: row.owner_id,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

pub fn contract_to_active(t: Task) -> ActiveModel {
    ActiveModel {
        id: Set(t.id),
        title: Set(t.title),
        description: Set(t.description),
        status: Set(t.status.as_str().to_string()),
        priority: Set(t.priority.as_str().to_string()),
        owner_id: Set(t.owner_id),
        created_at: Set(t.created_at),
        updated_at: Set(t.updated_at),
    }
}
