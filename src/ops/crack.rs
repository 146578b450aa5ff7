use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::model::task::TaskId;

/// How long a fully cracked record lingers before it is dropped
const GRACE: Duration = Duration::from_millis(100);

/// Map an elapsed fraction of the breaking time to a crack level 1–5.
pub fn crack_level(fraction: f32) -> u8 {
    if fraction >= 0.8 {
        5
    } else if fraction >= 0.6 {
        4
    } else if fraction >= 0.4 {
        3
    } else if fraction >= 0.2 {
        2
    } else {
        1
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrackState {
    pub level: u8,
    pub started_at: Instant,
    pub duration: Duration,
}

impl CrackState {
    fn fraction(&self, now: Instant) -> f32 {
        let elapsed = now.saturating_duration_since(self.started_at);
        (elapsed.as_secs_f32() / self.duration.as_secs_f32()).min(1.0)
    }
}

/// Per-task crack overlays. Purely cosmetic; never touches task data.
#[derive(Debug, Default)]
pub struct CrackAnimator {
    states: HashMap<TaskId, CrackState>,
}

impl CrackAnimator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, id: TaskId, now: Instant, duration: Duration) {
        self.states.insert(
            id,
            CrackState {
                level: 1,
                started_at: now,
                duration,
            },
        );
    }

    /// Recompute every level for `now` and drop records finished for longer than the grace delay
    pub fn sample(&mut self, now: Instant) {
        self.states.retain(|_, state| {
            state.level = crack_level(state.fraction(now));
            now.saturating_duration_since(state.started_at) < state.duration + GRACE
        });
    }

    /// Current level, or 0 when the block is not cracking
    pub fn level(&self, id: &TaskId) -> u8 {
        self.states.get(id).map_or(0, |s| s.level)
    }

    pub fn remove(&mut self, id: &TaskId) {
        self.states.remove(id);
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn clear(&mut self) {
        self.states.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_thresholds() {
        let cases = [
            (0.0, 1),
            (0.19, 1),
            (0.2, 2),
            (0.39, 2),
            (0.4, 3),
            (0.6, 4),
            (0.79, 4),
            (0.8, 5),
            (0.85, 5),
            (1.0, 5),
        ];
        for (fraction, expected) in cases {
            assert_eq!(crack_level(fraction), expected, "fraction {}", fraction);
        }
    }

    #[test]
    fn obsidian_reads_level_five_at_085() {
        let mut cracks = CrackAnimator::new();
        let id = TaskId::from("obsidian");
        let t0 = Instant::now();
        cracks.start(id.clone(), t0, Duration::from_millis(4000));
        assert_eq!(cracks.level(&id), 1);

        cracks.sample(t0 + Duration::from_millis(3400));
        assert_eq!(cracks.level(&id), 5);
    }

    #[test]
    fn record_removed_after_grace() {
        let mut cracks = CrackAnimator::new();
        let id = TaskId::from("dirt");
        let t0 = Instant::now();
        cracks.start(id.clone(), t0, Duration::from_millis(1000));

        cracks.sample(t0 + Duration::from_millis(1050));
        assert_eq!(cracks.level(&id), 5);

        cracks.sample(t0 + Duration::from_millis(1100));
        assert_eq!(cracks.level(&id), 0);
        assert!(cracks.is_empty());
    }

    #[test]
    fn unknown_task_has_no_crack() {
        let cracks = CrackAnimator::new();
        assert_eq!(cracks.level(&TaskId::from("x")), 0);
    }
}
