use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::task::{CompletedTask, Task};
use crate::ops::deadline::{self, DeadlineStatus};
use crate::ops::world::WorldSnapshot;
use crate::util::time::{format_local, format_relative};
use crate::util::unicode::fit_to_width;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct TaskJson {
    pub id: String,
    pub name: String,
    pub priority: u8,
    pub block: &'static str,
    pub deadline: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline_status: Option<&'static str>,
}

#[derive(Serialize)]
pub struct CompletedJson {
    #[serde(flatten)]
    pub task: TaskJson,
    pub completed_at: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct StatsJson {
    pub inventory: usize,
    pub chest: usize,
    pub pending: usize,
    pub limit: usize,
    pub overdue: usize,
    pub urgent: usize,
    pub sort: String,
}

#[derive(Serialize)]
pub struct ClearedJson {
    pub cleared: usize,
}

fn status_key(status: DeadlineStatus) -> Option<&'static str> {
    match status {
        DeadlineStatus::None => None,
        DeadlineStatus::Ok => Some("ok"),
        DeadlineStatus::Urgent => Some("urgent"),
        DeadlineStatus::Overdue => Some("overdue"),
    }
}

pub fn task_to_json(task: &Task, now: DateTime<Utc>) -> TaskJson {
    TaskJson {
        id: task.id.to_string(),
        name: task.name.clone(),
        priority: task.priority.value(),
        block: task.block().key(),
        deadline: task.deadline,
        deadline_status: status_key(deadline::active_status(task, now)),
    }
}

pub fn completed_to_json(done: &CompletedTask) -> CompletedJson {
    let task = &done.task;
    CompletedJson {
        task: TaskJson {
            id: task.id.to_string(),
            name: task.name.clone(),
            priority: task.priority.value(),
            block: task.block().key(),
            deadline: task.deadline,
            deadline_status: status_key(deadline::completed_status(done)),
        },
        completed_at: done.completed_at,
    }
}

pub fn stats_to_json(snapshot: &WorldSnapshot<'_>) -> StatsJson {
    StatsJson {
        inventory: snapshot.active_count,
        chest: snapshot.completed_count,
        pending: snapshot.pending_count,
        limit: snapshot.limit,
        overdue: snapshot.overdue,
        urgent: snapshot.urgent,
        sort: snapshot.sort_mode.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Text output
// ---------------------------------------------------------------------------

const NAME_WIDTH: usize = 32;

fn deadline_cell(
    deadline: Option<DateTime<Utc>>,
    status: DeadlineStatus,
    now: DateTime<Utc>,
) -> String {
    let Some(d) = deadline else {
        return String::new();
    };
    let marker = match status {
        DeadlineStatus::Overdue => "  OVERDUE",
        DeadlineStatus::Urgent => "  soon",
        _ => "",
    };
    format!("{} ({}){}", format_local(d), format_relative(d, now), marker)
}

/// One inventory row: `1a2b3c4d  ▓▓ P4  Mine diamonds   2025-06-01 14:30 (in 3h)`
pub fn format_task_line(task: &Task, now: DateTime<Utc>) -> String {
    let status = deadline::active_status(task, now);
    format!(
        "{}  {} P{}  {}  {}",
        task.id.short(),
        task.block().glyph(),
        task.priority.value(),
        fit_to_width(&task.name, NAME_WIDTH),
        deadline_cell(task.deadline, status, now),
    )
    .trim_end()
    .to_string()
}

/// One chest row, with the completion time and a late marker
pub fn format_completed_line(done: &CompletedTask) -> String {
    let task = &done.task;
    let late = if deadline::completed_status(done) == DeadlineStatus::Overdue {
        "  late"
    } else {
        ""
    };
    format!(
        "{}  {} P{}  {}  done {}{}",
        task.id.short(),
        task.block().glyph(),
        task.priority.value(),
        fit_to_width(&task.name, NAME_WIDTH),
        format_local(done.completed_at),
        late,
    )
}
