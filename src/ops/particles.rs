use std::collections::HashSet;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::trace;

use crate::model::task::{BlockType, TaskId};

/// Fixed simulation step
pub const FRAME: Duration = Duration::from_millis(16);

const JITTER: f32 = 8.0;
const GRAVITY: f32 = 0.4;
const DRAG: f32 = 0.98;
const MAX_LIFE: u32 = 60;
const MIN_PARTICLES: u64 = 15;
const MAX_PARTICLES: u64 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EffectId(u64);

/// A point in particle space (roughly pixels: 8 per terminal column, 16 per row)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

/// One burst, tied to one completion
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleEffect {
    pub id: EffectId,
    pub task_id: TaskId,
    pub block: BlockType,
    pub anchor: Point,
    pub created_at: Instant,
    pub duration: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub size: f32,
    pub color: (u8, u8, u8),
    pub life: u32,
    pub max_life: u32,
    pub effect_id: EffectId,
}

impl Particle {
    /// Advance one frame: move, fall, slow down horizontally, age
    pub fn step(&mut self) {
        self.x += self.vx;
        self.y += self.vy;
        self.vy += GRAVITY;
        self.vx *= DRAG;
        self.life = self.life.saturating_sub(1);
    }

    /// Remaining life as a 0..=1 fraction
    pub fn opacity(&self) -> f32 {
        if self.max_life == 0 {
            return 0.0;
        }
        self.life as f32 / self.max_life as f32
    }
}

/// Emitted once per effect when its time is up and its last particle is gone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectComplete {
    pub effect_id: EffectId,
    pub task_id: TaskId,
}

#[derive(Debug, Clone, Copy)]
struct Spawn {
    effect_id: EffectId,
    at: Instant,
}

/// Number of particles in a burst lasting `duration`
pub fn particle_count(duration: Duration) -> u64 {
    (duration.as_millis() as u64 / 100).clamp(MIN_PARTICLES, MAX_PARTICLES)
}

/// Lifetime in frames of each particle in a burst lasting `duration`
pub fn particle_life(duration: Duration) -> u32 {
    (duration.as_millis() as u64 / 16).min(MAX_LIFE as u64) as u32
}

/// Cosmetic particle simulation for breaking blocks
pub struct ParticleEngine {
    effects: Vec<ParticleEffect>,
    spawns: Vec<Spawn>,
    particles: Vec<Particle>,
    /// Effects whose completion has been emitted this update
    emitted: HashSet<EffectId>,
    rng: StdRng,
    next_id: u64,
    last_step: Option<Instant>,
}

impl Default for ParticleEngine {
    fn default() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }
}

impl ParticleEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deterministic engine for tests and replays
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        ParticleEngine {
            effects: Vec::new(),
            spawns: Vec::new(),
            particles: Vec::new(),
            emitted: HashSet::new(),
            rng,
            next_id: 1,
            last_step: None,
        }
    }

    /// Start a burst and schedule its spawns evenly over `duration`
    pub fn add_effect(
        &mut self,
        task_id: TaskId,
        block: BlockType,
        anchor: Point,
        now: Instant,
        duration: Duration,
    ) -> EffectId {
        let id = EffectId(self.next_id);
        self.next_id += 1;

        let count = particle_count(duration);
        for i in 0..count {
            let offset = duration.mul_f64(i as f64 / count as f64);
            self.spawns.push(Spawn {
                effect_id: id,
                at: now + offset,
            });
        }
        if self.last_step.is_none() {
            self.last_step = Some(now);
        }
        trace!(effect = id.0, %task_id, count, "added particle effect");
        self.effects.push(ParticleEffect {
            id,
            task_id,
            block,
            anchor,
            created_at: now,
            duration,
        });
        id
    }

    /// Advance the simulation to `now`: step live particles by whole frames,
    /// spawn anything due, and report effects that just finished.
    pub fn update(&mut self, now: Instant) -> Vec<EffectComplete> {
        self.advance_frames(now);
        self.spawn_due(now);
        self.collect_finished(now)
    }

    fn advance_frames(&mut self, now: Instant) {
        let Some(last) = self.last_step else {
            self.last_step = Some(now);
            return;
        };
        let elapsed = now.saturating_duration_since(last);
        let frames = (elapsed.as_nanos() / FRAME.as_nanos()) as u32;
        if frames == 0 {
            return;
        }
        self.last_step = Some(last + FRAME * frames);

        // Past MAX_LIFE frames every particle is dead anyway
        for _ in 0..frames.min(MAX_LIFE + 1) {
            if self.particles.is_empty() {
                break;
            }
            for particle in &mut self.particles {
                particle.step();
            }
            self.particles.retain(|p| p.life > 0);
        }
    }

    fn spawn_due(&mut self, now: Instant) {
        let mut due = Vec::new();
        self.spawns.retain(|s| {
            if s.at <= now {
                due.push(*s);
                false
            } else {
                true
            }
        });
        for spawn in due {
            let Some(effect) = self.effects.iter().find(|e| e.id == spawn.effect_id) else {
                continue;
            };
            let palette = effect.block.palette();
            let life = particle_life(effect.duration);
            let anchor = effect.anchor;
            let rng = &mut self.rng;
            let particle = Particle {
                x: anchor.x + (rng.random::<f32>() - 0.5) * 2.0 * JITTER,
                y: anchor.y + (rng.random::<f32>() - 0.5) * 2.0 * JITTER,
                vx: (rng.random::<f32>() - 0.5) * 12.0,
                vy: -rng.random::<f32>() * 8.0 - 3.0,
                size: rng.random::<f32>() * 5.0 + 2.0,
                color: palette[rng.random_range(0..palette.len())],
                life,
                max_life: life,
                effect_id: spawn.effect_id,
            };
            self.particles.push(particle);
        }
    }

    fn collect_finished(&mut self, now: Instant) -> Vec<EffectComplete> {
        let mut events = Vec::new();
        for effect in &self.effects {
            if self.emitted.contains(&effect.id) {
                continue;
            }
            let expired = now.saturating_duration_since(effect.created_at) >= effect.duration;
            let spawning = self.spawns.iter().any(|s| s.effect_id == effect.id);
            let live = self.particles.iter().any(|p| p.effect_id == effect.id);
            if expired && !spawning && !live {
                self.emitted.insert(effect.id);
                events.push(EffectComplete {
                    effect_id: effect.id,
                    task_id: effect.task_id.clone(),
                });
            }
        }
        if !self.emitted.is_empty() {
            let emitted = &self.emitted;
            self.effects.retain(|e| !emitted.contains(&e.id));
            self.emitted.clear();
        }
        events
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// True when nothing is animating
    pub fn is_idle(&self) -> bool {
        self.effects.is_empty() && self.particles.is_empty()
    }
}
