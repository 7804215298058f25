use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::contract::model::{NewTask, Priority, Task, TaskPatch, TaskStatus};

/// REST DTO for task representation
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TaskDto {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: Priority,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// REST DTO for creating a task
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct CreateTaskReq {
    /// Required; surrounding whitespace is dropped.
    #[serde(default)]
    pub title: String,
    pub description: Option<String>,
    /// `pending` (default) or `completed`
    pub status: Option<String>,
    /// `low` (default), `medium` or `high`
    pub priority: Option<String>,
}

/// REST DTO for updating a task (partial)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct UpdateTaskReq {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TaskListDto {
    pub tasks: Vec<TaskDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TaskEnvelopeDto {
    pub message: String,
    pub task: TaskDto,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageDto {
    pub message: String,
}

impl From<Task> for TaskDto {
    fn from(t: Task) -> Self {
        Self {
            id: t.id,
            title: t.title,
            description: t.description,
            status: t.status,
            priority: t.priority,
            owner_id: t.owner_id,
            created_at: t.created_at,
            updated_at: t.updated_at,
        }
    }
}

impl From<CreateTaskReq> for NewTask {
    fn from(req: CreateTaskReq) -> Self {
        Self {
            title: req.title,
            description: req.description,
            status: req.status,
            priority: req.priority,
        }
    }
}

impl From<UpdateTaskReq> for TaskPatch {
    fn from(req: UpdateTaskReq) -> Self {
        Self {
            title: req.title,
            description: req.description,
            status: req.status,
            priority: req.priority,
        }
    }
}
