//! Optimistic board commands.
//!
//! A command changes the [`Board`] before the server answers, then either
//! folds the server's answer in ([`Command::confirm`]) or reverts its own
//! change ([`Command::undo`]). The board lock is held only inside the sync
//! hooks, never across [`Command::commit`].

use std::time::Duration;

use async_trait::async_trait;

use crate::api::ApiClient;
use crate::board::Board;
use crate::error::ClientError;
use crate::model::{NewTask, Priority, Task, TaskPatch, TaskStatus};
use crate::session::Session;

/// Visual delay before a delete is sent.
pub const DEFAULT_DELETE_DELAY: Duration = Duration::from_millis(260);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing to do; the board was left untouched.
    Skipped,
    /// The server accepted the change.
    Applied,
}

#[async_trait]
pub trait Command: Send {
    fn name(&self) -> &'static str;

    /// Apply the optimistic change. `false` means there is nothing to do.
    fn apply(&mut self, board: &mut Board) -> bool;

    async fn commit(&mut self, api: &ApiClient, session: &Session) -> Result<(), ClientError>;

    /// Fold the confirmed result into the board.
    fn confirm(&mut self, board: &mut Board);

    /// Revert what `apply` did.
    fn undo(&mut self, board: &mut Board);

    /// Whether a failed commit leaves the board stale enough to re-fetch.
    fn resync_on_failure(&self) -> bool {
        false
    }
}

/// Insert a placeholder at the head, replaced by the server's task.
pub struct CreateTask {
    title: String,
    temp_id: Option<String>,
    created: Option<Task>,
}

impl CreateTask {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into().trim().to_owned(),
            temp_id: None,
            created: None,
        }
    }
}

#[async_trait]
impl Command for CreateTask {
    fn name(&self) -> &'static str {
        "create"
    }

    fn apply(&mut self, board: &mut Board) -> bool {
        if self.title.is_empty() {
            return false;
        }
        let temp = Task::placeholder(&self.title);
        self.temp_id = Some(temp.id.clone());
        board.push_front(temp);
        true
    }

    async fn commit(&mut self, api: &ApiClient, session: &Session) -> Result<(), ClientError> {
        let new = NewTask {
            title: self.title.clone(),
            ..NewTask::default()
        };
        self.created = Some(api.create_task(session, &new).await?);
        Ok(())
    }

    fn confirm(&mut self, board: &mut Board) {
        if let (Some(temp_id), Some(task)) = (self.temp_id.as_deref(), self.created.clone()) {
            // A refresh may already have brought the stored task in.
            if board.get(&task.id).is_some() {
                board.remove(temp_id);
            } else if !board.replace(temp_id, task.clone()) {
                board.push_front(task);
            }
        }
    }

    fn undo(&mut self, board: &mut Board) {
        if let Some(temp_id) = self.temp_id.as_deref() {
            board.remove(temp_id);
        }
    }
}

/// Optimistic single-task edit with snapshot rollback.
struct Edit {
    id: String,
    snapshot: Option<Task>,
    saved: Option<Task>,
}

impl Edit {
    fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            snapshot: None,
            saved: None,
        }
    }

    fn take_snapshot(&mut self, board: &Board) -> Option<&Task> {
        self.snapshot = board.get(&self.id).cloned();
        self.snapshot.as_ref()
    }

    async fn save(
        &mut self,
        api: &ApiClient,
        session: &Session,
        patch: &TaskPatch,
    ) -> Result<(), ClientError> {
        self.saved = Some(api.update_task(session, &self.id, patch).await?);
        Ok(())
    }

    fn confirm(&mut self, board: &mut Board, marked: bool) {
        if let Some(task) = self.saved.take() {
            board.replace(&self.id, task);
        }
        if marked {
            board.set_updating(&self.id, false);
        }
    }

    fn rollback(&mut self, board: &mut Board, marked: bool) {
        if let Some(task) = self.snapshot.take() {
            board.replace(&self.id, task);
        }
        if marked {
            board.set_updating(&self.id, false);
        }
    }
}

/// Flip `pending <-> completed`. Ignored while the task is already updating.
pub struct ToggleStatus {
    edit: Edit,
    next: TaskStatus,
}

impl ToggleStatus {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            edit: Edit::new(id),
            next: TaskStatus::Completed,
        }
    }
}

#[async_trait]
impl Command for ToggleStatus {
    fn name(&self) -> &'static str {
        "toggle"
    }

    fn apply(&mut self, board: &mut Board) -> bool {
        if board.is_updating(&self.edit.id) {
            return false;
        }
        let Some(current) = self.edit.take_snapshot(board) else {
            return false;
        };
        self.next = current.status.toggled();
        let next = self.next;
        board.update(&self.edit.id, |t| t.status = next);
        board.set_updating(&self.edit.id, true);
        true
    }

    async fn commit(&mut self, api: &ApiClient, session: &Session) -> Result<(), ClientError> {
        let patch = TaskPatch::status(self.next);
        self.edit.save(api, session, &patch).await
    }

    fn confirm(&mut self, board: &mut Board) {
        self.edit.confirm(board, true);
    }

    fn undo(&mut self, board: &mut Board) {
        self.edit.rollback(board, true);
    }
}

/// Change the title. Empty or unchanged titles are a no-op.
pub struct RenameTask {
    edit: Edit,
    title: String,
}

impl RenameTask {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            edit: Edit::new(id),
            title: title.into().trim().to_owned(),
        }
    }
}

#[async_trait]
impl Command for RenameTask {
    fn name(&self) -> &'static str {
        "rename"
    }

    fn apply(&mut self, board: &mut Board) -> bool {
        if board.editing() == Some(self.edit.id.as_str()) {
            board.stop_edit();
        }
        if self.title.is_empty() {
            return false;
        }
        match self.edit.take_snapshot(board) {
            Some(current) if current.title != self.title => {}
            _ => return false,
        }
        let title = self.title.clone();
        board.update(&self.edit.id, |t| t.title = title);
        true
    }

    async fn commit(&mut self, api: &ApiClient, session: &Session) -> Result<(), ClientError> {
        let patch = TaskPatch::title(self.title.clone());
        self.edit.save(api, session, &patch).await
    }

    fn confirm(&mut self, board: &mut Board) {
        self.edit.confirm(board, false);
    }

    fn undo(&mut self, board: &mut Board) {
        self.edit.rollback(board, false);
    }
}

/// Advance priority `low -> medium -> high -> low`.
pub struct CyclePriority {
    edit: Edit,
    next: Priority,
}

impl CyclePriority {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            edit: Edit::new(id),
            next: Priority::Low,
        }
    }
}

#[async_trait]
impl Command for CyclePriority {
    fn name(&self) -> &'static str {
        "cycle_priority"
    }

    fn apply(&mut self, board: &mut Board) -> bool {
        if board.is_updating(&self.edit.id) {
            return false;
        }
        let Some(current) = self.edit.take_snapshot(board) else {
            return false;
        };
        self.next = current.priority.next();
        let next = self.next;
        board.update(&self.edit.id, |t| t.priority = next);
        board.set_updating(&self.edit.id, true);
        true
    }

    async fn commit(&mut self, api: &ApiClient, session: &Session) -> Result<(), ClientError> {
        let patch = TaskPatch::priority(self.next);
        self.edit.save(api, session, &patch).await
    }

    fn confirm(&mut self, board: &mut Board) {
        self.edit.confirm(board, true);
    }

    fn undo(&mut self, board: &mut Board) {
        self.edit.rollback(board, true);
    }
}

/// Mark, wait, delete. The task leaves the board only once the server agrees.
pub struct DeleteTask {
    id: String,
    delay: Duration,
}

impl DeleteTask {
    pub fn new(id: impl Into<String>) -> Self {
        Self::with_delay(id, DEFAULT_DELETE_DELAY)
    }

    pub fn with_delay(id: impl Into<String>, delay: Duration) -> Self {
        Self {
            id: id.into(),
            delay,
        }
    }
}

#[async_trait]
impl Command for DeleteTask {
    fn name(&self) -> &'static str {
        "delete"
    }

    fn apply(&mut self, board: &mut Board) -> bool {
        if board.get(&self.id).is_none() || board.is_deleting(&self.id) {
            return false;
        }
        board.set_deleting(&self.id, true);
        true
    }

    async fn commit(&mut self, api: &ApiClient, session: &Session) -> Result<(), ClientError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        api.delete_task(session, &self.id).await.map(|_| ())
    }

    fn confirm(&mut self, board: &mut Board) {
        board.remove(&self.id);
    }

    fn undo(&mut self, board: &mut Board) {
        board.set_deleting(&self.id, false);
    }

    fn resync_on_failure(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board_with(title: &str) -> (Board, String) {
        let mut b = Board::new();
        let mut t = Task::placeholder(title);
        t.id = "0b6c1f7e-7a53-4d0b-9a55-1d2b2f3c4d5e".into();
        let id = t.id.clone();
        b.replace_all(vec![t]);
        (b, id)
    }

    #[test]
    fn create_with_blank_title_is_skipped() {
        let mut b = Board::new();
        assert!(!CreateTask::new("   ").apply(&mut b));
        assert!(b.tasks().is_empty());
    }

    #[test]
    fn create_undo_removes_placeholder() {
        let mut b = Board::new();
        let mut cmd = CreateTask::new("  buy milk ");
        assert!(cmd.apply(&mut b));
        assert_eq!(b.tasks()[0].title, "buy milk");
        assert!(b.tasks()[0].is_temp());
        cmd.undo(&mut b);
        assert!(b.tasks().is_empty());
    }

    #[test]
    fn create_confirm_after_refresh_keeps_one_copy() {
        let mut b = Board::new();
        let mut cmd = CreateTask::new("buy milk");
        assert!(cmd.apply(&mut b));

        let mut stored = Task::placeholder("buy milk");
        stored.id = "0b6c1f7e-7a53-4d0b-9a55-1d2b2f3c4d5e".into();
        b.replace_all(vec![stored.clone()]);
        assert_eq!(b.tasks().len(), 2);

        cmd.created = Some(stored.clone());
        cmd.confirm(&mut b);

        let ids: Vec<&str> = b.tasks().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec![stored.id.as_str()]);
        assert_eq!(b.summary().total, 1);
    }

    #[test]
    fn toggle_applies_and_rolls_back() {
        let (mut b, id) = board_with("x");
        let mut cmd = ToggleStatus::new(&id);
        assert!(cmd.apply(&mut b));
        assert_eq!(b.get(&id).unwrap().status, TaskStatus::Completed);
        assert!(b.is_updating(&id));

        // a second toggle while the first is in flight is ignored
        assert!(!ToggleStatus::new(&id).apply(&mut b));

        cmd.undo(&mut b);
        assert_eq!(b.get(&id).unwrap().status, TaskStatus::Pending);
        assert!(!b.is_updating(&id));
    }

    #[test]
    fn rename_noop_cases() {
        let (mut b, id) = board_with("same");
        assert!(!RenameTask::new(&id, "  ").apply(&mut b));
        assert!(!RenameTask::new(&id, " same ").apply(&mut b));
        assert!(!RenameTask::new("missing", "new").apply(&mut b));
    }

    #[test]
    fn rename_ends_inline_edit() {
        let (mut b, id) = board_with("old");
        b.start_edit(&id);
        let mut cmd = RenameTask::new(&id, "new");
        assert!(cmd.apply(&mut b));
        assert!(b.editing().is_none());
        assert_eq!(b.get(&id).unwrap().title, "new");
        cmd.undo(&mut b);
        assert_eq!(b.get(&id).unwrap().title, "old");
    }

    #[test]
    fn cycle_priority_advances() {
        let (mut b, id) = board_with("x");
        let mut cmd = CyclePriority::new(&id);
        assert!(cmd.apply(&mut b));
        assert_eq!(b.get(&id).unwrap().priority, Priority::Medium);
        cmd.undo(&mut b);
        assert_eq!(b.get(&id).unwrap().priority, Priority::Low);
    }

    #[test]
    fn delete_marks_and_unmarks() {
        let (mut b, id) = board_with("x");
        let mut cmd = DeleteTask::new(&id);
        assert!(cmd.apply(&mut b));
        assert!(b.is_deleting(&id));
        assert!(!DeleteTask::new(&id).apply(&mut b));
        cmd.undo(&mut b);
        assert!(!b.is_deleting(&id));
        assert!(b.get(&id).is_some());
        assert!(cmd.resync_on_failure());
    }
}
