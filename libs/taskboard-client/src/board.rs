//! Dashboard view state.

use std::collections::HashSet;

use crate::model::Task;

/// Completion summary shown above the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Summary {
    pub total: usize,
    pub completed: usize,
    pub remaining: usize,
    /// Rounded to the nearest whole percent; 0 for an empty board.
    pub percent: u8,
}

/// Task list plus the transient markers the UI renders.
#[derive(Debug, Clone, Default)]
pub struct Board {
    tasks: Vec<Task>,
    editing: Option<String>,
    updating: HashSet<String>,
    deleting: HashSet<String>,
    loaded: bool,
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Replace the list with a fresh server listing. Tasks still waiting for a
    /// create confirmation stay at the head; markers of vanished tasks are
    /// dropped.
    pub fn replace_all(&mut self, fetched: Vec<Task>) {
        let mut tasks: Vec<Task> = self.tasks.drain(..).filter(Task::is_temp).collect();
        tasks.extend(fetched);
        self.tasks = tasks;

        let ids: HashSet<&str> = self.tasks.iter().map(|t| t.id.as_str()).collect();
        self.updating.retain(|id| ids.contains(id.as_str()));
        self.deleting.retain(|id| ids.contains(id.as_str()));
        if self
            .editing
            .as_deref()
            .is_some_and(|id| !ids.contains(id))
        {
            self.editing = None;
        }
        self.loaded = true;
    }

    pub fn push_front(&mut self, task: Task) {
        self.tasks.insert(0, task);
    }

    /// Swap the task with `id` for `task`, keeping its position.
    pub fn replace(&mut self, id: &str, task: Task) -> bool {
        match self.tasks.iter_mut().find(|t| t.id == id) {
            Some(slot) => {
                *slot = task;
                true
            }
            None => false,
        }
    }

    pub fn update(&mut self, id: &str, f: impl FnOnce(&mut Task)) -> bool {
        match self.tasks.iter_mut().find(|t| t.id == id) {
            Some(task) => {
                f(task);
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<Task> {
        let pos = self.tasks.iter().position(|t| t.id == id)?;
        self.updating.remove(id);
        self.deleting.remove(id);
        Some(self.tasks.remove(pos))
    }

    pub fn is_updating(&self, id: &str) -> bool {
        self.updating.contains(id)
    }

    pub fn set_updating(&mut self, id: &str, on: bool) {
        if on {
            self.updating.insert(id.to_owned());
        } else {
            self.updating.remove(id);
        }
    }

    pub fn is_deleting(&self, id: &str) -> bool {
        self.deleting.contains(id)
    }

    pub fn set_deleting(&mut self, id: &str, on: bool) {
        if on {
            self.deleting.insert(id.to_owned());
        } else {
            self.deleting.remove(id);
        }
    }

    pub fn editing(&self) -> Option<&str> {
        self.editing.as_deref()
    }

    pub fn start_edit(&mut self, id: &str) -> bool {
        if self.get(id).is_none() {
            return false;
        }
        self.editing = Some(id.to_owned());
        true
    }

    pub fn stop_edit(&mut self) -> Option<String> {
        self.editing.take()
    }

    pub fn summary(&self) -> Summary {
        let total = self.tasks.len();
        let completed = self.tasks.iter().filter(|t| t.is_completed()).count();
        let percent = if total == 0 {
            0
        } else {
            ((completed as f64 / total as f64) * 100.0).round() as u8
        };
        Summary {
            total,
            completed,
            remaining: total - completed,
            percent,
        }
    }

    /// Resolve a user-supplied reference: a 1-based position, a full id, or
    /// an unambiguous id prefix.
    pub fn resolve(&self, reference: &str) -> Option<&Task> {
        if let Ok(n) = reference.parse::<usize>() {
            if n >= 1 && n <= self.tasks.len() && reference.len() < 8 {
                return self.tasks.get(n - 1);
            }
        }
        if let Some(t) = self.get(reference) {
            return Some(t);
        }
        let mut hits = self.tasks.iter().filter(|t| t.id.starts_with(reference));
        match (hits.next(), hits.next()) {
            (Some(t), None) => Some(t),
            _ => None,
        }
    }
}
