use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::task::Task;

/// How the inventory grid is ordered for display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    /// Insertion order
    #[default]
    None,
    /// Overdue first, then soonest; no deadline last
    Deadline,
    /// Highest priority first
    Priority,
}

impl SortMode {
    pub fn as_str(self) -> &'static str {
        match self {
            SortMode::None => "none",
            SortMode::Deadline => "deadline",
            SortMode::Priority => "priority",
        }
    }

    /// Next mode in the TUI's `s` cycle
    pub fn next(self) -> Self {
        match self {
            SortMode::None => SortMode::Deadline,
            SortMode::Deadline => SortMode::Priority,
            SortMode::Priority => SortMode::None,
        }
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(SortMode::None),
            "deadline" => Ok(SortMode::Deadline),
            "priority" => Ok(SortMode::Priority),
            other => Err(format!(
                "unknown sort mode '{}' (expected none, deadline or priority)",
                other
            )),
        }
    }
}

/// Order tasks for display. Never reorders the underlying collection; the
/// result borrows from the input. Stable for equal keys.
pub fn sort_tasks<'a, I>(tasks: I, mode: SortMode, now: DateTime<Utc>) -> Vec<&'a Task>
where
    I: IntoIterator<Item = &'a Task>,
{
    let mut view: Vec<&Task> = tasks.into_iter().collect();
    match mode {
        SortMode::None => {}
        SortMode::Priority => view.sort_by(|a, b| b.priority.cmp(&a.priority)),
        SortMode::Deadline => view.sort_by(|a, b| compare_deadlines(a, b, now)),
    }
    view
}

fn compare_deadlines(a: &Task, b: &Task, now: DateTime<Utc>) -> Ordering {
    match (a.deadline, b.deadline) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(da), Some(db)) => {
            let a_overdue = da < now;
            let b_overdue = db < now;
            // Overdue group first; ascending deadline inside each group
            b_overdue.cmp(&a_overdue).then(da.cmp(&db))
        }
    }
}
