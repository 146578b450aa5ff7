use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::model::task::{BlockType, CompletedTask, Priority, TaskId};
use crate::ops::capacity;
use crate::ops::store::{StoreError, TaskStore};

/// How long a block takes to break, by block type
pub fn breaking_time(priority: Priority) -> Duration {
    let ms = match priority.block() {
        BlockType::Dirt => 1000,
        BlockType::Wood => 1500,
        BlockType::Stone => 2000,
        BlockType::Iron => 3000,
        BlockType::Obsidian => 4000,
    };
    Duration::from_millis(ms)
}

/// Lifecycle of one completion request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakState {
    Idle,
    Breaking,
    Completed,
    Cancelled,
}

/// Result of asking to break a block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakStart {
    /// A new timer was started
    Started { duration: Duration },
    /// The task was already breaking; nothing changed
    AlreadyBreaking,
}

/// What happened when a breaking timer fired
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionOutcome {
    /// The task moved into the chest
    Completed(CompletedTask),
    /// The task was gone by the time the timer fired
    Vanished(TaskId),
}

#[derive(Debug, Clone, Copy)]
struct Breaking {
    started_at: Instant,
    due: Instant,
    duration: Duration,
}

/// Drives the deferred move from inventory to chest.
///
/// Each task id is `Idle` until a completion is requested, `Breaking` while
/// its timer runs, then `Completed` (or `Cancelled` if the task was deleted or
/// edited mid-break). Timers are plain deadlines checked by [`tick`]; nothing
/// fires on its own.
///
/// [`tick`]: CompletionCoordinator::tick
#[derive(Debug, Default)]
pub struct CompletionCoordinator {
    breaking: HashMap<TaskId, Breaking>,
    /// Ids holding a chest reservation
    pending: HashSet<TaskId>,
    /// Terminal state of the last break per id
    finished: HashMap<TaskId, BreakState>,
}

impl CompletionCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start breaking `id`. Reserves a chest slot through the store's capacity
    /// check; on denial nothing starts and the error is returned.
    pub fn request(
        &mut self,
        store: &TaskStore,
        id: &TaskId,
        now: Instant,
    ) -> Result<BreakStart, StoreError> {
        if self.breaking.contains_key(id) {
            debug!(%id, "ignoring duplicate completion request");
            return Ok(BreakStart::AlreadyBreaking);
        }
        let ticket = store.request_complete(id, self.pending.len())?;
        self.finished.remove(id);
        self.pending.insert(id.clone());
        self.breaking.insert(
            id.clone(),
            Breaking {
                started_at: now,
                due: now + ticket.duration,
                duration: ticket.duration,
            },
        );
        debug!(%id, duration_ms = ticket.duration.as_millis() as u64, "started breaking");
        Ok(BreakStart::Started {
            duration: ticket.duration,
        })
    }

    /// Fire every timer due at `now`, earliest first, moving those tasks into the chest.
    pub fn tick(&mut self, store: &mut TaskStore, now: Instant) -> Vec<CompletionOutcome> {
        let mut due: Vec<(TaskId, Instant)> = self
            .breaking
            .iter()
            .filter(|(_, b)| b.due <= now)
            .map(|(id, b)| (id.clone(), b.due))
            .collect();
        if due.is_empty() {
            return Vec::new();
        }
        due.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));

        let mut outcomes = Vec::with_capacity(due.len());
        for (id, _) in due {
            self.breaking.remove(&id);
            self.pending.remove(&id);
            match store.finalize_complete(&id) {
                Ok(done) => {
                    info!(%id, "task completed");
                    self.finished.insert(id, BreakState::Completed);
                    outcomes.push(CompletionOutcome::Completed(done));
                }
                Err(e) => {
                    warn!(%id, error = %e, "breaking finished but task is gone");
                    self.finished.insert(id.clone(), BreakState::Cancelled);
                    outcomes.push(CompletionOutcome::Vanished(id));
                }
            }
        }
        outcomes
    }

    /// Abandon an in-flight completion. Returns false if `id` was not breaking.
    pub fn cancel(&mut self, id: &TaskId) -> bool {
        if self.breaking.remove(id).is_none() {
            return false;
        }
        self.pending.remove(id);
        self.finished.insert(id.clone(), BreakState::Cancelled);
        debug!(%id, "cancelled breaking");
        true
    }

    /// The particle effect for `id` has finished. Releases the chest
    /// reservation unless a newer break of the same task is still running.
    pub fn effect_finished(&mut self, id: &TaskId) {
        if !self.breaking.contains_key(id) {
            self.pending.remove(id);
        }
    }

    pub fn state(&self, id: &TaskId) -> BreakState {
        if self.breaking.contains_key(id) {
            return BreakState::Breaking;
        }
        self.finished.get(id).copied().unwrap_or(BreakState::Idle)
    }

    pub fn is_breaking(&self, id: &TaskId) -> bool {
        self.breaking.contains_key(id)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn is_pending(&self, id: &TaskId) -> bool {
        self.pending.contains(id)
    }

    /// Elapsed fraction of the break, clamped to 1.0
    pub fn progress(&self, id: &TaskId, now: Instant) -> Option<f32> {
        let b = self.breaking.get(id)?;
        let elapsed = now.saturating_duration_since(b.started_at);
        Some((elapsed.as_secs_f32() / b.duration.as_secs_f32()).min(1.0))
    }

    /// Reconcile with collections reloaded from disk. Breaks whose task is
    /// still active keep running, earliest due first, while the chest has
    /// room for them; the rest are cancelled and returned.
    pub fn retain_present(&mut self, store: &TaskStore) -> Vec<TaskId> {
        let mut running: Vec<(TaskId, Instant)> = self
            .breaking
            .iter()
            .map(|(id, b)| (id.clone(), b.due))
            .collect();
        running.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));

        self.pending.clear();
        let mut dropped = Vec::new();
        for (id, _) in running {
            let fits = capacity::check_chest(store.completed_len(), self.pending.len()).is_ok();
            if store.get(&id).is_some() && fits {
                self.pending.insert(id);
            } else {
                self.breaking.remove(&id);
                self.finished.insert(id.clone(), BreakState::Cancelled);
                dropped.push(id);
            }
        }
        self.forget_missing(store);
        dropped
    }

    /// Drop terminal states of ids that are in neither collection
    pub fn forget_missing(&mut self, store: &TaskStore) {
        self.finished
            .retain(|id, _| store.get(id).is_some() || store.get_completed(id).is_some());
    }
}
