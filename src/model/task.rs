use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque task identity (a v4 UUID string). Stable for the task's lifetime,
/// including across completion and restore.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Generate a fresh random id
    pub fn generate() -> Self {
        TaskId(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 8 characters, for compact display
    pub fn short(&self) -> &str {
        let end = self.0.char_indices().nth(8).map_or(self.0.len(), |(i, _)| i);
        &self.0[..end]
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        TaskId(s.to_string())
    }
}

impl From<String> for TaskId {
    fn from(s: String) -> Self {
        TaskId(s)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Task priority, 1 (lowest) to 5 (highest)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Priority(u8);

impl Priority {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(value: u8) -> Option<Self> {
        (Self::MIN..=Self::MAX).contains(&value).then_some(Priority(value))
    }

    /// Clamp an arbitrary number into range. Used when loading hand-edited data.
    pub fn clamped(value: i64) -> Self {
        Priority(value.clamp(Self::MIN as i64, Self::MAX as i64) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn block(self) -> BlockType {
        BlockType::from_priority(self.0)
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority(3)
    }
}

impl TryFrom<u8> for Priority {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Priority::new(value).ok_or_else(|| format!("priority must be 1-5, got {}", value))
    }
}

impl From<Priority> for u8 {
    fn from(p: Priority) -> u8 {
        p.0
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Visual block kind, derived from priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockType {
    Dirt,
    Wood,
    Stone,
    Iron,
    Obsidian,
}

impl BlockType {
    /// Map a raw priority number to its block. Anything out of range is stone.
    pub fn from_priority(priority: u8) -> Self {
        match priority {
            1 => BlockType::Dirt,
            2 => BlockType::Wood,
            3 => BlockType::Stone,
            4 => BlockType::Iron,
            5 => BlockType::Obsidian,
            _ => BlockType::Stone,
        }
    }

    /// Human-readable block name
    pub fn name(self) -> &'static str {
        match self {
            BlockType::Dirt => "Dirt",
            BlockType::Wood => "Wood Planks",
            BlockType::Stone => "Stone",
            BlockType::Iron => "Iron Ore",
            BlockType::Obsidian => "Obsidian",
        }
    }

    /// Lowercase key, used in config and JSON output
    pub fn key(self) -> &'static str {
        match self {
            BlockType::Dirt => "dirt",
            BlockType::Wood => "wood",
            BlockType::Stone => "stone",
            BlockType::Iron => "iron",
            BlockType::Obsidian => "obsidian",
        }
    }

    /// Two-cell glyph drawn inside an inventory slot
    pub fn glyph(self) -> &'static str {
        match self {
            BlockType::Dirt => "░░",
            BlockType::Wood => "▤▤",
            BlockType::Stone => "▒▒",
            BlockType::Iron => "▓▓",
            BlockType::Obsidian => "██",
        }
    }

    /// Four RGB colours sampled from the block's texture; particles draw from these.
    pub fn palette(self) -> [(u8, u8, u8); 4] {
        match self {
            BlockType::Dirt => [
                (0x8B, 0x45, 0x13),
                (0xA0, 0x52, 0x2D),
                (0x65, 0x43, 0x21),
                (0xD2, 0xB4, 0x8C),
            ],
            BlockType::Wood => [
                (0xDE, 0xB8, 0x87),
                (0xF4, 0xA4, 0x60),
                (0xD2, 0x69, 0x1E),
                (0xCD, 0x85, 0x3F),
            ],
            BlockType::Stone => [
                (0x80, 0x80, 0x80),
                (0xA9, 0xA9, 0xA9),
                (0x69, 0x69, 0x69),
                (0xDC, 0xDC, 0xDC),
            ],
            BlockType::Iron => [
                (0xC0, 0xC0, 0xC0),
                (0xA8, 0xA8, 0xA8),
                (0xD3, 0xD3, 0xD3),
                (0xB8, 0xB8, 0xB8),
            ],
            BlockType::Obsidian => [
                (0x2F, 0x2F, 0x2F),
                (0x1A, 0x1A, 0x1A),
                (0x40, 0x40, 0x40),
                (0x55, 0x55, 0x55),
            ],
        }
    }
}

/// An active (not yet completed) task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub name: String,
    /// Always false while the task sits in the inventory
    pub is_done: bool,
    pub priority: Priority,
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,
}

impl Task {
    /// Create a new task with a fresh id
    pub fn new(name: String, priority: Priority, deadline: Option<DateTime<Utc>>) -> Self {
        Task {
            id: TaskId::generate(),
            name,
            is_done: false,
            priority,
            deadline,
        }
    }

    pub fn block(&self) -> BlockType {
        self.priority.block()
    }
}

/// A task that has been moved into the chest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedTask {
    #[serde(flatten)]
    pub task: Task,
    pub completed_at: DateTime<Utc>,
}

impl CompletedTask {
    /// Snapshot an active task at the moment of completion
    pub fn from_task(task: Task, completed_at: DateTime<Utc>) -> Self {
        CompletedTask {
            task: Task {
                is_done: true,
                ..task
            },
            completed_at,
        }
    }

    /// Turn back into an active task, discarding the completion stamp
    pub fn into_task(self) -> Task {
        Task {
            is_done: false,
            ..self.task
        }
    }

    pub fn id(&self) -> &TaskId {
        &self.task.id
    }
}
