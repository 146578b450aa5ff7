use std::time::Instant;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::model::task::{CompletedTask, Priority, Task, TaskId};
use crate::ops::capacity::{self, MAX_SLOTS};
use crate::ops::completion::{BreakStart, CompletionCoordinator, CompletionOutcome};
use crate::ops::crack::CrackAnimator;
use crate::ops::deadline;
use crate::ops::particles::{EffectId, ParticleEngine, Point};
use crate::ops::sort::{SortMode, sort_tasks};
use crate::ops::store::{StoreError, TaskStore, TaskUpdate};

/// Something the front-end should react to after a tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorldEvent {
    /// A breaking timer fired and the task is now in the chest
    Completed(CompletedTask),
    /// A breaking timer fired for a task that no longer exists
    Vanished(TaskId),
    /// A particle burst finished; the renderer can retire it
    EffectFinished { effect_id: EffectId, task_id: TaskId },
}

/// Everything a front-end needs to draw one frame
#[derive(Debug)]
pub struct WorldSnapshot<'a> {
    /// Active tasks in display order
    pub active: Vec<&'a Task>,
    pub completed: Vec<&'a CompletedTask>,
    pub sort_mode: SortMode,
    pub active_count: usize,
    pub completed_count: usize,
    pub pending_count: usize,
    pub chest_headroom: usize,
    pub overdue: usize,
    pub urgent: usize,
    pub limit: usize,
}

impl WorldSnapshot<'_> {
    /// `inventory 3/27 · chest 5+1/27 · overdue 1 · urgent 0`
    pub fn counters(&self) -> String {
        let chest = if self.pending_count > 0 {
            format!("{}+{}", self.completed_count, self.pending_count)
        } else {
            self.completed_count.to_string()
        };
        format!(
            "inventory {}/{} \u{b7} chest {}/{} \u{b7} overdue {} \u{b7} urgent {}",
            self.active_count, self.limit, chest, self.limit, self.overdue, self.urgent
        )
    }
}

/// The single owner of all task state. Front-ends send intents here and
/// read snapshots back; nothing else mutates the collections.
pub struct World {
    store: TaskStore,
    completion: CompletionCoordinator,
    cracks: CrackAnimator,
    particles: ParticleEngine,
    sort_mode: SortMode,
    dirty: bool,
}

impl World {
    pub fn new(store: TaskStore) -> Self {
        Self::with_particles(store, ParticleEngine::new())
    }

    pub fn with_particles(store: TaskStore, particles: ParticleEngine) -> Self {
        World {
            store,
            completion: CompletionCoordinator::new(),
            cracks: CrackAnimator::new(),
            particles,
            sort_mode: SortMode::None,
            dirty: false,
        }
    }

    // -----------------------------------------------------------------------
    // Intents
    // -----------------------------------------------------------------------

    pub fn create_task(
        &mut self,
        name: &str,
        priority: Priority,
        deadline: Option<DateTime<Utc>>,
    ) -> Result<Task, StoreError> {
        let task = self.store.create(name, priority, deadline)?;
        self.dirty = true;
        Ok(task)
    }

    /// Edit an active task. Editing a block mid-break cancels the break.
    pub fn edit_task(&mut self, id: &TaskId, update: TaskUpdate) -> Result<Task, StoreError> {
        let task = self.store.update(id, update)?.clone();
        self.interrupt(id);
        self.dirty = true;
        Ok(task)
    }

    /// Delete an active task. Deleting a block mid-break cancels the break.
    pub fn delete_task(&mut self, id: &TaskId) -> Result<Task, StoreError> {
        let task = self.store.delete(id)?;
        self.completion.forget_missing(&self.store);
        self.interrupt(id);
        self.dirty = true;
        Ok(task)
    }

    /// Start breaking a block. `anchor` is where its particles burst from.
    pub fn request_complete(
        &mut self,
        id: &TaskId,
        anchor: Point,
        now: Instant,
    ) -> Result<BreakStart, StoreError> {
        let start = self.completion.request(&self.store, id, now)?;
        if let BreakStart::Started { duration } = start {
            let block = self
                .store
                .get(id)
                .map(|t| t.block())
                .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
            self.cracks.start(id.clone(), now, duration);
            self.particles
                .add_effect(id.clone(), block, anchor, now, duration);
        }
        Ok(start)
    }

    /// Complete immediately, with the same capacity rules but no animation
    pub fn complete_now(&mut self, id: &TaskId) -> Result<CompletedTask, StoreError> {
        if self.completion.is_breaking(id) {
            return Err(StoreError::Validation(format!(
                "task {} is already breaking",
                id.short()
            )));
        }
        self.store
            .request_complete(id, self.completion.pending_count())?;
        let done = self.store.finalize_complete(id)?;
        self.dirty = true;
        Ok(done)
    }

    pub fn restore_completed(&mut self, id: &TaskId) -> Result<Task, StoreError> {
        let task = self.store.restore(id)?;
        self.dirty = true;
        Ok(task)
    }

    pub fn delete_completed(&mut self, id: &TaskId) -> Result<CompletedTask, StoreError> {
        let done = self.store.delete_completed(id)?;
        self.completion.forget_missing(&self.store);
        self.dirty = true;
        Ok(done)
    }

    pub fn clear_completed(&mut self) -> Result<usize, StoreError> {
        let count = self.store.clear_completed()?;
        self.completion.forget_missing(&self.store);
        self.dirty = true;
        Ok(count)
    }

    pub fn set_sort_mode(&mut self, mode: SortMode) {
        self.sort_mode = mode;
    }

    /// Advance every timer to `now`
    pub fn tick(&mut self, now: Instant) -> Vec<WorldEvent> {
        let mut events = Vec::new();

        self.cracks.sample(now);

        for outcome in self.completion.tick(&mut self.store, now) {
            match outcome {
                CompletionOutcome::Completed(done) => {
                    self.dirty = true;
                    events.push(WorldEvent::Completed(done));
                }
                CompletionOutcome::Vanished(id) => {
                    self.cracks.remove(&id);
                    events.push(WorldEvent::Vanished(id));
                }
            }
        }

        for finished in self.particles.update(now) {
            self.completion.effect_finished(&finished.task_id);
            events.push(WorldEvent::EffectFinished {
                effect_id: finished.effect_id,
                task_id: finished.task_id,
            });
        }

        events
    }

    fn interrupt(&mut self, id: &TaskId) {
        if self.completion.cancel(id) {
            self.cracks.remove(id);
            debug!(%id, "break interrupted");
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn snapshot(&self, now: DateTime<Utc>) -> WorldSnapshot<'_> {
        let active = sort_tasks(self.store.active(), self.sort_mode, now);
        let (overdue, urgent) = deadline::count_statuses(self.store.active(), now);
        let pending = self.completion.pending_count();
        WorldSnapshot {
            active,
            completed: self.store.completed().collect(),
            sort_mode: self.sort_mode,
            active_count: self.store.active_len(),
            completed_count: self.store.completed_len(),
            pending_count: pending,
            chest_headroom: capacity::chest_headroom(self.store.completed_len(), pending),
            overdue,
            urgent,
            limit: MAX_SLOTS,
        }
    }

    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    pub fn sort_mode(&self) -> SortMode {
        self.sort_mode
    }

    pub fn crack_level(&self, id: &TaskId) -> u8 {
        self.cracks.level(id)
    }

    pub fn is_breaking(&self, id: &TaskId) -> bool {
        self.completion.is_breaking(id)
    }

    /// Elapsed fraction of a running break
    pub fn break_progress(&self, id: &TaskId, now: Instant) -> Option<f32> {
        self.completion.progress(id, now)
    }

    pub fn pending_count(&self) -> usize {
        self.completion.pending_count()
    }

    pub fn particles(&self) -> &ParticleEngine {
        &self.particles
    }

    /// True while any timer or animation is live
    pub fn is_animating(&self) -> bool {
        self.completion.pending_count() > 0 || !self.cracks.is_empty() || !self.particles.is_idle()
    }

    /// Whether state changed since the last save
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_saved(&mut self) {
        self.dirty = false;
    }

    /// Swap in collections reloaded from disk. Breaks on tasks that are still
    /// in the inventory keep running; the others are cancelled and returned.
    pub fn replace_store(&mut self, store: TaskStore) -> Vec<TaskId> {
        self.store = store;
        let dropped = self.completion.retain_present(&self.store);
        for id in &dropped {
            self.cracks.remove(id);
            debug!(%id, "break dropped by reload");
        }
        self.dirty = false;
        dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::completion::BreakState;
    use std::time::Duration;

    fn p(n: u8) -> Priority {
        Priority::new(n).unwrap()
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn world() -> World {
        World::with_particles(TaskStore::new(), ParticleEngine::seeded(11))
    }

    fn assert_disjoint(world: &World) {
        let store = world.store();
        assert!(store.active_len() <= MAX_SLOTS);
        assert!(store.completed_len() <= MAX_SLOTS);
        for task in store.active() {
            assert!(store.get_completed(&task.id).is_none(), "{} in both", task.id);
        }
    }

    #[test]
    fn obsidian_break_cracks_then_lands_in_chest() {
        let mut world = world();
        let before = Utc::now();
        let id = world.create_task("Defeat the dragon", p(5), None).unwrap().id;
        world.mark_saved();
        let t0 = Instant::now();

        let start = world.request_complete(&id, Point::default(), t0).unwrap();
        assert_eq!(start, BreakStart::Started { duration: ms(4000) });
        assert_eq!(world.crack_level(&id), 1);
        assert!(!world.is_dirty());

        world.tick(t0 + ms(3400));
        assert_eq!(world.crack_level(&id), 5);
        assert!(world.store().get(&id).is_some());

        let events = world.tick(t0 + ms(4000));
        let done = events
            .iter()
            .find_map(|e| match e {
                WorldEvent::Completed(done) => Some(done),
                _ => None,
            })
            .expect("completion event");
        assert_eq!(done.task.id, id);
        assert!(done.completed_at >= before);
        assert!(world.is_dirty());
        assert_eq!(world.pending_count(), 0);
        assert_disjoint(&world);
    }

    #[test]
    fn effect_finishes_after_completion() {
        let mut world = world();
        let id = world.create_task("Plant wheat", p(1), None).unwrap().id;
        let t0 = Instant::now();
        world.request_complete(&id, Point { x: 10.0, y: 10.0 }, t0).unwrap();

        let mut completed_at = None;
        let mut finished_at = None;
        let mut t = Duration::ZERO;
        while t <= ms(5000) {
            for event in world.tick(t0 + t) {
                match event {
                    WorldEvent::Completed(_) => completed_at = Some(t),
                    WorldEvent::EffectFinished { task_id, .. } => {
                        assert_eq!(task_id, id);
                        assert!(finished_at.is_none(), "effect finished twice");
                        finished_at = Some(t);
                    }
                    WorldEvent::Vanished(_) => panic!("task vanished"),
                }
            }
            t += ms(16);
        }
        let completed_at = completed_at.expect("completed");
        let finished_at = finished_at.expect("effect finished");
        assert!(completed_at >= ms(1000));
        assert!(finished_at >= completed_at);
        assert!(!world.is_animating());
    }

    #[test]
    fn delete_while_breaking_cancels() {
        let mut world = world();
        let id = world.create_task("Dig", p(3), None).unwrap().id;
        let t0 = Instant::now();
        world.request_complete(&id, Point::default(), t0).unwrap();
        assert_eq!(world.pending_count(), 1);

        world.delete_task(&id).unwrap();
        assert_eq!(world.pending_count(), 0);
        assert_eq!(world.crack_level(&id), 0);
        assert_eq!(world.completion.state(&id), BreakState::Cancelled);

        let events = world.tick(t0 + ms(2000));
        assert!(!events.iter().any(|e| matches!(e, WorldEvent::Completed(_))));
        assert_eq!(world.store().completed_len(), 0);
    }

    #[test]
    fn edit_while_breaking_cancels() {
        let mut world = world();
        let id = world.create_task("Fish", p(2), None).unwrap().id;
        let t0 = Instant::now();
        world.request_complete(&id, Point::default(), t0).unwrap();

        let update = TaskUpdate {
            name: Some("Fish for treasure".into()),
            ..Default::default()
        };
        world.edit_task(&id, update).unwrap();
        world.tick(t0 + ms(5000));
        assert_eq!(world.store().get(&id).map(|t| t.name.as_str()), Some("Fish for treasure"));
        assert_eq!(world.store().completed_len(), 0);
    }

    #[test]
    fn failed_edit_keeps_breaking() {
        let mut world = world();
        let id = world.create_task("Fish", p(1), None).unwrap().id;
        let t0 = Instant::now();
        world.request_complete(&id, Point::default(), t0).unwrap();
        let blank = TaskUpdate {
            name: Some(String::new()),
            ..Default::default()
        };
        assert!(world.edit_task(&id, blank).is_err());
        assert!(world.is_breaking(&id));
    }

    #[test]
    fn concurrent_breaks_complete_once_each() {
        let mut world = world();
        let a = world.create_task("a", p(2), None).unwrap().id;
        let b = world.create_task("b", p(1), None).unwrap().id;
        let t0 = Instant::now();
        world.request_complete(&a, Point::default(), t0).unwrap();
        world.request_complete(&b, Point::default(), t0 + ms(200)).unwrap();

        let mut completed = Vec::new();
        let mut t = Duration::ZERO;
        while t <= ms(3000) {
            for event in world.tick(t0 + t) {
                if let WorldEvent::Completed(done) = event {
                    completed.push(done.task.id);
                }
            }
            t += ms(16);
        }
        assert_eq!(completed, vec![b, a]);
        assert_eq!(world.store().completed_len(), 2);
        assert_eq!(world.pending_count(), 0);
        assert_disjoint(&world);
    }

    #[test]
    fn restore_when_inventory_full_leaves_chest_alone() {
        let mut world = world();
        let id = world.create_task("done", p(1), None).unwrap().id;
        world.complete_now(&id).unwrap();
        for i in 0..MAX_SLOTS {
            world.create_task(&format!("t{}", i), p(1), None).unwrap();
        }
        assert!(matches!(
            world.restore_completed(&id),
            Err(StoreError::CapacityExceeded(_))
        ));
        assert_eq!(world.store().completed_len(), 1);
        assert_disjoint(&world);
    }

    #[test]
    fn snapshot_reflects_sort_and_counters() {
        let mut world = world();
        world.create_task("low", p(1), None).unwrap();
        let high = world.create_task("high", p(5), None).unwrap().id;
        world.create_task("overdue", p(2), Some(Utc::now() - chrono::Duration::hours(1))).unwrap();
        world.set_sort_mode(SortMode::Priority);
        world
            .request_complete(&high, Point::default(), Instant::now())
            .unwrap();

        let snap = world.snapshot(Utc::now());
        let names: Vec<&str> = snap.active.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["high", "overdue", "low"]);
        assert_eq!(snap.active_count, 3);
        assert_eq!(snap.pending_count, 1);
        assert_eq!(snap.chest_headroom, 26);
        assert_eq!(snap.overdue, 1);
        assert_eq!(snap.limit, 27);
        assert_eq!(
            snap.counters(),
            "inventory 3/27 · chest 0+1/27 · overdue 1 · urgent 0"
        );
    }

    #[test]
    fn complete_now_respects_chest_capacity() {
        let mut world = world();
        for i in 0..MAX_SLOTS {
            let id = world.create_task(&format!("d{}", i), p(1), None).unwrap().id;
            world.complete_now(&id).unwrap();
        }
        let id = world.create_task("extra", p(1), None).unwrap().id;
        assert!(matches!(
            world.complete_now(&id),
            Err(StoreError::CapacityExceeded(_))
        ));
        assert!(world.store().get(&id).is_some());
    }

    #[test]
    fn clear_twice_is_safe() {
        let mut world = world();
        let id = world.create_task("x", p(1), None).unwrap().id;
        world.complete_now(&id).unwrap();
        assert_eq!(world.clear_completed(), Ok(1));
        assert_eq!(world.clear_completed(), Err(StoreError::EmptyCollection));
    }

    #[test]
    fn reload_keeps_surviving_breaks() {
        let mut world = world();
        let kept = world.create_task("Shear sheep", p(2), None).unwrap().id;
        let gone = world.create_task("Milk cow", p(4), None).unwrap().id;
        let t0 = Instant::now();
        world.request_complete(&kept, Point::default(), t0).unwrap();
        world.request_complete(&gone, Point::default(), t0).unwrap();

        let mut on_disk = world.store().clone();
        on_disk.delete(&gone).unwrap();
        on_disk.create("from elsewhere", p(1), None).unwrap();
        let dropped = world.replace_store(on_disk);

        assert_eq!(dropped, vec![gone.clone()]);
        assert_eq!(world.pending_count(), 1);
        assert_eq!(world.crack_level(&gone), 0);
        assert!(world.crack_level(&kept) > 0);
        assert!(!world.is_dirty());

        world.tick(t0 + ms(1500));
        assert!(world.store().get_completed(&kept).is_some());
        assert_eq!(world.store().active_len(), 1);
        assert_disjoint(&world);
    }

    #[test]
    fn removed_tasks_leave_no_break_history() {
        let mut world = world();
        let mut now = Instant::now();
        let mut ids = Vec::new();
        for i in 0..40 {
            let id = world.create_task(&format!("t{}", i), p(1), None).unwrap().id;
            world.request_complete(&id, Point::default(), now).unwrap();
            now += ms(1000);
            world.tick(now);
            assert_eq!(world.completion.state(&id), BreakState::Completed);
            world.delete_completed(&id).unwrap();
            ids.push(id);
        }
        assert!(ids.iter().all(|id| world.completion.state(id) == BreakState::Idle));
    }
}
