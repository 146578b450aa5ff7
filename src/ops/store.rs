use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::model::task::{CompletedTask, Priority, Task, TaskId};
use crate::ops::capacity::{self, CapacityDenied, Container, MAX_SLOTS};
use crate::ops::completion::breaking_time;

/// Error type for store operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("{0}")]
    CapacityExceeded(CapacityDenied),
    #[error("task not found: {0}")]
    NotFound(String),
    #[error("id prefix '{prefix}' matches {matches} tasks; use more characters")]
    Ambiguous { prefix: String, matches: usize },
    #[error("the chest is already empty")]
    EmptyCollection,
    #[error("{0}")]
    Validation(String),
}

impl From<CapacityDenied> for StoreError {
    fn from(denied: CapacityDenied) -> Self {
        StoreError::CapacityExceeded(denied)
    }
}

impl fmt::Display for CapacityDenied {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.container {
            Container::Inventory => write!(
                f,
                "inventory is full ({}/{}): break some blocks to free a slot",
                self.current, self.limit
            ),
            Container::Chest if self.pending == 0 => write!(
                f,
                "chest is full ({}/{}): delete or restore some tasks first",
                self.current, self.limit
            ),
            Container::Chest => write!(
                f,
                "not enough room in the chest: {} stored, {} breaking, {} free of {}",
                self.current,
                self.pending,
                capacity::chest_headroom(self.current, self.pending),
                self.limit
            ),
        }
    }
}

/// Partial edit of an active task. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskUpdate {
    pub name: Option<String>,
    pub priority: Option<Priority>,
    /// `Some(None)` clears the deadline
    pub deadline: Option<Option<DateTime<Utc>>>,
}

impl TaskUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.priority.is_none() && self.deadline.is_none()
    }
}

/// Permission to start breaking a task. Issued without touching either collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionTicket {
    pub id: TaskId,
    pub priority: Priority,
    pub duration: Duration,
}

/// The inventory (active tasks) and the chest (completed tasks)
#[derive(Debug, Clone, Default)]
pub struct TaskStore {
    active: IndexMap<TaskId, Task>,
    completed: IndexMap<TaskId, CompletedTask>,
}

fn validate_name(name: &str) -> Result<String, StoreError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(StoreError::Validation("task name cannot be empty".into()));
    }
    Ok(trimmed.to_string())
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a store from loaded lists. Ids found in both lists keep only the
    /// chest copy; blank names and anything beyond the slot limit are dropped.
    pub fn from_parts(active: Vec<Task>, completed: Vec<CompletedTask>) -> Self {
        let mut store = TaskStore::new();
        for done in completed {
            if done.task.name.trim().is_empty() {
                warn!(id = %done.id(), "chest task has a blank name on load, dropping task");
                continue;
            }
            if store.completed.len() >= MAX_SLOTS {
                warn!(id = %done.id(), "chest over capacity on load, dropping task");
                continue;
            }
            store.completed.insert(done.id().clone(), done);
        }
        for task in active {
            if task.name.trim().is_empty() {
                warn!(id = %task.id, "task has a blank name on load, dropping task");
                continue;
            }
            if store.completed.contains_key(&task.id) {
                warn!(
                    id = %task.id,
                    "task present in both inventory and chest, keeping chest copy"
                );
                continue;
            }
            if store.active.len() >= MAX_SLOTS {
                warn!(id = %task.id, "inventory over capacity on load, dropping task");
                continue;
            }
            store.active.insert(
                task.id.clone(),
                Task {
                    is_done: false,
                    ..task
                },
            );
        }
        store
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Active tasks in insertion order
    pub fn active(&self) -> impl ExactSizeIterator<Item = &Task> {
        self.active.values()
    }

    /// Completed tasks in the order they entered the chest
    pub fn completed(&self) -> impl ExactSizeIterator<Item = &CompletedTask> {
        self.completed.values()
    }

    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    pub fn completed_len(&self) -> usize {
        self.completed.len()
    }

    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.active.get(id)
    }

    pub fn get_completed(&self, id: &TaskId) -> Option<&CompletedTask> {
        self.completed.get(id)
    }

    /// Resolve a unique id prefix among active tasks
    pub fn resolve_active(&self, prefix: &str) -> Result<TaskId, StoreError> {
        resolve_prefix(self.active.keys(), prefix)
    }

    /// Resolve a unique id prefix among chest tasks
    pub fn resolve_completed(&self, prefix: &str) -> Result<TaskId, StoreError> {
        resolve_prefix(self.completed.keys(), prefix)
    }

    // -----------------------------------------------------------------------
    // Inventory operations
    // -----------------------------------------------------------------------

    /// Append a new task to the inventory
    pub fn create(
        &mut self,
        name: &str,
        priority: Priority,
        deadline: Option<DateTime<Utc>>,
    ) -> Result<Task, StoreError> {
        let name = validate_name(name)?;
        capacity::check_inventory(self.active.len())?;
        let task = Task::new(name, priority, deadline);
        debug!(id = %task.id, priority = %priority, "created task");
        self.active.insert(task.id.clone(), task.clone());
        Ok(task)
    }

    /// Replace the given fields of an active task in place
    pub fn update(&mut self, id: &TaskId, update: TaskUpdate) -> Result<&Task, StoreError> {
        let name = update.name.as_deref().map(validate_name).transpose()?;
        let task = self
            .active
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        if let Some(name) = name {
            task.name = name;
        }
        if let Some(priority) = update.priority {
            task.priority = priority;
        }
        if let Some(deadline) = update.deadline {
            task.deadline = deadline;
        }
        debug!(%id, "updated task");
        Ok(task)
    }

    /// Remove a task from the inventory
    pub fn delete(&mut self, id: &TaskId) -> Result<Task, StoreError> {
        self.active
            .shift_remove(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    // -----------------------------------------------------------------------
    // Completion
    // -----------------------------------------------------------------------

    /// Check that a completion may start. `pending` is the number of
    /// completions already in flight. Nothing is mutated.
    pub fn request_complete(
        &self,
        id: &TaskId,
        pending: usize,
    ) -> Result<CompletionTicket, StoreError> {
        let task = self
            .active
            .get(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        capacity::check_chest(self.completed.len(), pending)?;
        Ok(CompletionTicket {
            id: id.clone(),
            priority: task.priority,
            duration: breaking_time(task.priority),
        })
    }

    /// Move a task from the inventory to the chest, stamping the completion time
    pub fn finalize_complete(&mut self, id: &TaskId) -> Result<CompletedTask, StoreError> {
        let task = self
            .active
            .shift_remove(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        let done = CompletedTask::from_task(task, Utc::now());
        debug!(%id, "moved task to chest");
        self.completed.insert(id.clone(), done.clone());
        Ok(done)
    }

    // -----------------------------------------------------------------------
    // Chest operations
    // -----------------------------------------------------------------------

    /// Move a chest task back into the inventory
    pub fn restore(&mut self, id: &TaskId) -> Result<Task, StoreError> {
        if !self.completed.contains_key(id) {
            return Err(StoreError::NotFound(id.to_string()));
        }
        capacity::check_inventory(self.active.len())?;
        let done = self
            .completed
            .shift_remove(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        let task = done.into_task();
        debug!(%id, "restored task from chest");
        self.active.insert(task.id.clone(), task.clone());
        Ok(task)
    }

    pub fn delete_completed(&mut self, id: &TaskId) -> Result<CompletedTask, StoreError> {
        self.completed
            .shift_remove(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    /// Empty the chest. Returns how many tasks were removed.
    pub fn clear_completed(&mut self) -> Result<usize, StoreError> {
        if self.completed.is_empty() {
            return Err(StoreError::EmptyCollection);
        }
        let count = self.completed.len();
        self.completed.clear();
        debug!(count, "cleared chest");
        Ok(count)
    }
}

fn resolve_prefix<'a>(
    ids: impl Iterator<Item = &'a TaskId>,
    prefix: &str,
) -> Result<TaskId, StoreError> {
    let prefix = prefix.trim();
    if prefix.is_empty() {
        return Err(StoreError::NotFound(String::new()));
    }
    let matches: Vec<&TaskId> = ids.filter(|id| id.as_str().starts_with(prefix)).collect();
    match matches.as_slice() {
        [] => Err(StoreError::NotFound(prefix.to_string())),
        [one] => Ok((*one).clone()),
        many => {
            // An exact match wins over longer ids sharing the prefix
            if let Some(exact) = many.iter().find(|id| id.as_str() == prefix) {
                return Ok((*exact).clone());
            }
            Err(StoreError::Ambiguous {
                prefix: prefix.to_string(),
                matches: many.len(),
            })
        }
    }
}
