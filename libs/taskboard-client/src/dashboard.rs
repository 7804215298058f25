use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;

use crate::api::ApiClient;
use crate::board::Board;
use crate::commands::{
    Command, CreateTask, CyclePriority, DeleteTask, Outcome, RenameTask, ToggleStatus,
};
use crate::error::ClientError;
use crate::session::Session;

/// A logged-in view of the board. Cheap to clone; clones share the board.
#[derive(Clone)]
pub struct Dashboard {
    api: ApiClient,
    session: Session,
    board: Arc<Mutex<Board>>,
    revision: Arc<watch::Sender<u64>>,
}

impl Dashboard {
    pub fn new(api: ApiClient, session: Session) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            api,
            session,
            board: Arc::new(Mutex::new(Board::new())),
            revision: Arc::new(revision),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Copy of the current board.
    pub fn snapshot(&self) -> Board {
        self.board.lock().clone()
    }

    /// Run `f` against the board under the lock.
    pub fn with_board<R>(&self, f: impl FnOnce(&mut Board) -> R) -> R {
        let result = f(&mut self.board.lock());
        self.bump();
        result
    }

    /// Bumped after every board change.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    fn bump(&self) {
        self.revision.send_modify(|r| *r = r.wrapping_add(1));
    }

    /// Replace the board with the server's list.
    #[tracing::instrument(name = "client.refresh", skip(self), fields(user = %self.session.username))]
    pub async fn refresh(&self) -> Result<usize, ClientError> {
        let tasks = self.api.list_tasks(&self.session).await?;
        let count = tasks.len();
        self.with_board(|b| b.replace_all(tasks));
        Ok(count)
    }

    /// Apply, commit, then confirm or undo.
    pub async fn execute<C: Command>(&self, mut cmd: C) -> Result<Outcome, ClientError> {
        if !self.with_board(|b| cmd.apply(b)) {
            tracing::debug!(command = cmd.name(), "command skipped");
            return Ok(Outcome::Skipped);
        }

        match cmd.commit(&self.api, &self.session).await {
            Ok(()) => {
                self.with_board(|b| cmd.confirm(b));
                Ok(Outcome::Applied)
            }
            Err(err) => {
                tracing::warn!(command = cmd.name(), error = %err, "command rejected, reverting");
                self.with_board(|b| cmd.undo(b));
                if cmd.resync_on_failure() {
                    if let Err(e) = self.refresh().await {
                        tracing::warn!(error = %e, "resync after failed command");
                    }
                }
                Err(err)
            }
        }
    }

    pub async fn create(&self, title: &str) -> Result<Outcome, ClientError> {
        self.execute(CreateTask::new(title)).await
    }

    pub async fn toggle(&self, id: &str) -> Result<Outcome, ClientError> {
        self.execute(ToggleStatus::new(id)).await
    }

    pub async fn rename(&self, id: &str, title: &str) -> Result<Outcome, ClientError> {
        self.execute(RenameTask::new(id, title)).await
    }

    pub async fn cycle_priority(&self, id: &str) -> Result<Outcome, ClientError> {
        self.execute(CyclePriority::new(id)).await
    }

    pub async fn delete(&self, id: &str) -> Result<Outcome, ClientError> {
        self.execute(DeleteTask::new(id)).await
    }
}
