use chrono::{DateTime, Duration, Utc};

use crate::model::task::{CompletedTask, Task};

/// Window before a deadline in which a task counts as urgent
pub const URGENT_WINDOW_HOURS: i64 = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeadlineStatus {
    /// No deadline set
    None,
    Ok,
    /// Due within the next 24 hours
    Urgent,
    Overdue,
}

impl DeadlineStatus {
    pub fn label(self) -> &'static str {
        match self {
            DeadlineStatus::None => "",
            DeadlineStatus::Ok => "on track",
            DeadlineStatus::Urgent => "due within 24h",
            DeadlineStatus::Overdue => "overdue",
        }
    }
}

/// Status of an active task relative to `now`
pub fn active_status(task: &Task, now: DateTime<Utc>) -> DeadlineStatus {
    match task.deadline {
        None => DeadlineStatus::None,
        Some(d) if d < now => DeadlineStatus::Overdue,
        Some(d) if d <= now + Duration::hours(URGENT_WINDOW_HOURS) => DeadlineStatus::Urgent,
        Some(_) => DeadlineStatus::Ok,
    }
}

/// A chest task is overdue if it was finished after its deadline
pub fn completed_status(done: &CompletedTask) -> DeadlineStatus {
    match done.task.deadline {
        None => DeadlineStatus::None,
        Some(d) if done.completed_at > d => DeadlineStatus::Overdue,
        Some(_) => DeadlineStatus::Ok,
    }
}

/// (overdue, urgent) counts across active tasks
pub fn count_statuses<'a>(
    tasks: impl IntoIterator<Item = &'a Task>,
    now: DateTime<Utc>,
) -> (usize, usize) {
    tasks
        .into_iter()
        .fold((0, 0), |(overdue, urgent), t| match active_status(t, now) {
            DeadlineStatus::Overdue => (overdue + 1, urgent),
            DeadlineStatus::Urgent => (overdue, urgent + 1),
            _ => (overdue, urgent),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::task::Priority;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 10, 9, 0, 0).unwrap()
    }

    fn with_deadline(hours: Option<i64>) -> Task {
        Task::new(
            "t".into(),
            Priority::default(),
            hours.map(|h| now() + Duration::hours(h)),
        )
    }

    #[test]
    fn active_classification() {
        assert_eq!(active_status(&with_deadline(None), now()), DeadlineStatus::None);
        assert_eq!(active_status(&with_deadline(Some(-1)), now()), DeadlineStatus::Overdue);
        assert_eq!(active_status(&with_deadline(Some(3)), now()), DeadlineStatus::Urgent);
        assert_eq!(active_status(&with_deadline(Some(24)), now()), DeadlineStatus::Urgent);
        assert_eq!(active_status(&with_deadline(Some(25)), now()), DeadlineStatus::Ok);
    }

    #[test]
    fn completed_late_is_overdue() {
        let task = with_deadline(Some(1));
        let late = CompletedTask::from_task(task.clone(), now() + Duration::hours(2));
        let early = CompletedTask::from_task(task, now());
        assert_eq!(completed_status(&late), DeadlineStatus::Overdue);
        assert_eq!(completed_status(&early), DeadlineStatus::Ok);
    }

    #[test]
    fn counts() {
        let tasks = vec![
            with_deadline(Some(-5)),
            with_deadline(Some(-1)),
            with_deadline(Some(2)),
            with_deadline(Some(100)),
            with_deadline(None),
        ];
        assert_eq!(count_statuses(&tasks, now()), (2, 1));
    }
}
