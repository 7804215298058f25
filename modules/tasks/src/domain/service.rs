use std::str::FromStr;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::contract::model::{NewTask, Priority, Task, TaskPatch, TaskStatus};
use crate::domain::error::DomainError;
use crate::domain::repo::TasksRepository;

/// Domain service with business rules for task management.
#[derive(Clone)]
pub struct Service {
    repo: Arc<dyn TasksRepository>,
    config: ServiceConfig,
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub max_title_length: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            max_title_length: 200,
        }
    }
}

/// Parse a task id taken from a request path.
pub fn parse_task_id(raw: &str) -> Result<Uuid, DomainError> {
    Uuid::parse_str(raw).map_err(|_| DomainError::InvalidTaskId {
        value: raw.to_string(),
    })
}

impl Service {
    pub fn new(repo: Arc<dyn TasksRepository>, config: ServiceConfig) -> Self {
        Self { repo, config }
    }

    #[instrument(name = "tasks.service.list_tasks", skip(self), fields(owner_id = %owner))]
    pub async fn list_tasks(&self, owner: Uuid) -> Result<Vec<Task>, DomainError> {
        let tasks = self
            .repo
            .list_by_owner(owner)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;
        debug!("Listed {} tasks", tasks.len());
        Ok(tasks)
    }

    #[instrument(name = "tasks.service.create_task", skip(self, new_task), fields(owner_id = %owner))]
    pub async fn create_task(&self, owner: Uuid, new_task: NewTask) -> Result<Task, DomainError> {
        info!("Creating new task");

        let title = new_task.title.trim();
        if title.is_empty() {
            return Err(DomainError::TitleRequired);
        }
        self.check_title_length(title)?;
        let status = parse_status(new_task.status.as_deref())?.unwrap_or_default();
        let priority = parse_priority(new_task.priority.as_deref())?.unwrap_or_default();

        let now = Utc::now();
        let task = Task {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: new_task
                .description
                .as_deref()
                .map(str::trim)
                .unwrap_or_default()
                .to_string(),
            status,
            priority,
            owner_id: owner,
            created_at: now,
            updated_at: now,
        };

        self.repo
            .insert(task.clone())
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;

        info!("Successfully created task with id={}", task.id);
        Ok(task)
    }

    #[instrument(
        name = "tasks.service.update_task",
        skip(self, patch),
        fields(owner_id = %owner, task_id = %id)
    )]
    pub async fn update_task(
        &self,
        owner: Uuid,
        id: Uuid,
        patch: TaskPatch,
    ) -> Result<Task, DomainError> {
        info!("Updating task");

        // Validate everything before touching the store.
        let title = match patch.title.as_deref().map(str::trim) {
            Some("") => return Err(DomainError::EmptyTitle),
            Some(t) => {
                self.check_title_length(t)?;
                Some(t.to_string())
            }
            None => None,
        };
        let status = parse_status(patch.status.as_deref())?;
        let priority = parse_priority(patch.priority.as_deref())?;

        let mut current = self
            .repo
            .find_owned(id, owner)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?
            .ok_or_else(|| DomainError::task_not_found(id))?;

        if let Some(title) = title {
            current.title = title;
        }
        if let Some(description) = patch.description {
            current.description = description.trim().to_string();
        }
        if let Some(status) = status {
            current.status = status;
        }
        if let Some(priority) = priority {
            current.priority = priority;
        }
        current.updated_at = Utc::now();

        let updated = self
            .repo
            .update(current.clone())
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;
        if !updated {
            return Err(DomainError::task_not_found(id));
        }

        info!("Successfully updated task");
        Ok(current)
    }

    #[instrument(
        name = "tasks.service.delete_task",
        skip(self),
        fields(owner_id = %owner, task_id = %id)
    )]
    pub async fn delete_task(&self, owner: Uuid, id: Uuid) -> Result<(), DomainError> {
        info!("Deleting task");

        let deleted = self
            .repo
            .delete_owned(id, owner)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;
        if !deleted {
            return Err(DomainError::task_not_found(id));
        }

        info!("Successfully deleted task");
        Ok(())
    }

    fn check_title_length(&self, title: &str) -> Result<(), DomainError> {
        if title.chars().count() > self.config.max_title_length {
            return Err(DomainError::TitleTooLong {
                max: self.config.max_title_length,
            });
        }
        Ok(())
    }
}

fn parse_status(raw: Option<&str>) -> Result<Option<TaskStatus>, DomainError> {
    raw.map(|s| {
        TaskStatus::from_str(s).map_err(|_| DomainError::InvalidStatus {
            value: s.to_string(),
        })
    })
    .transpose()
}

fn parse_priority(raw: Option<&str>) -> Result<Option<Priority>, DomainError> {
    raw.map(|s| {
        Priority::from_str(s).map_err(|_| DomainError::InvalidPriority {
            value: s.to_string(),
        })
    })
    .transpose()
}
