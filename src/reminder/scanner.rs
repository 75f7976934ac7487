//! Due-window scan over a task snapshot

use chrono::{Duration, NaiveDateTime};
use thiserror::Error;
use tracing::warn;

use crate::task::{LoadWarning, Task, TaskId};

pub const DEFAULT_HORIZON_HOURS: i64 = 24;

pub fn default_horizon() -> Duration {
    Duration::hours(DEFAULT_HORIZON_HOURS)
}

/// A row left out of a scan
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Task {id}: cannot parse due '{due_date} {due_time}': {source}")]
    ParseFailure {
        id: TaskId,
        due_date: String,
        due_time: String,
        #[source]
        source: chrono::ParseError,
    },
}

/// A pending task inside the reminder horizon
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpcomingTask {
    pub task: Task,
    pub due_at: NaiveDateTime,
    /// Due instant already passed at scan time
    pub overdue: bool,
}

#[derive(Debug, Default)]
pub struct ScanReport {
    pub upcoming: Vec<UpcomingTask>,
    pub skipped: Vec<ScanError>,
    /// Set when the scanned snapshot came from a store that could not be read
    pub warning: Option<LoadWarning>,
}

impl ScanReport {
    pub fn is_empty(&self) -> bool {
        self.upcoming.is_empty()
    }

    pub fn ids(&self) -> Vec<TaskId> {
        self.upcoming.iter().map(|u| u.task.id).collect()
    }
}

/// Select pending tasks whose due instant is less than `horizon` after `now`.
///
/// There is no lower bound: a pending task that is already overdue is
/// selected on every scan until it is completed or deleted. Rows whose due
/// fields do not parse are reported in `skipped` and the scan carries on.
pub fn scan(tasks: &[Task], now: NaiveDateTime, horizon: Duration) -> ScanReport {
    let mut report = ScanReport::default();

    for task in tasks.iter().filter(|t| t.is_pending()) {
        let due_at = match task.due_at() {
            Ok(due_at) => due_at,
            Err(source) => {
                let err = ScanError::ParseFailure {
                    id: task.id,
                    due_date: task.due_date.clone(),
                    due_time: task.due_time.clone(),
                    source,
                };
                warn!("Skipping task in reminder scan: {}", err);
                report.skipped.push(err);
                continue;
            }
        };

        if due_at - now < horizon {
            report.upcoming.push(UpcomingTask {
                task: task.clone(),
                due_at,
                overdue: due_at < now,
            });
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{NewTask, TaskStatus};
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 7, 10)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn task_due(id: u64, offset: Duration) -> Task {
        let due = now() + offset;
        Task::new(
            TaskId(id),
            NewTask::new(
                format!("task {id}"),
                "",
                due.format("%Y-%m-%d").to_string(),
                due.format("%H:%M").to_string(),
            ),
            now(),
        )
    }

    #[test]
    fn test_due_soon_is_upcoming() {
        let report = scan(&[task_due(1, Duration::hours(2))], now(), default_horizon());
        assert_eq!(report.ids(), vec![TaskId(1)]);
        assert!(!report.upcoming[0].overdue);
    }

    #[test]
    fn test_due_beyond_horizon_is_not_upcoming() {
        let report = scan(&[task_due(1, Duration::hours(30))], now(), default_horizon());
        assert!(report.is_empty());
    }

    #[test]
    fn test_overdue_pending_task_is_included() {
        let report = scan(&[task_due(1, Duration::hours(-5))], now(), default_horizon());
        assert_eq!(report.ids(), vec![TaskId(1)]);
        assert!(report.upcoming[0].overdue);
    }

    #[test]
    fn test_long_overdue_task_is_still_included() {
        let report = scan(&[task_due(1, Duration::days(-40))], now(), default_horizon());
        assert_eq!(report.ids(), vec![TaskId(1)]);
    }

    #[test]
    fn test_horizon_boundary_is_exclusive() {
        let tasks = [
            task_due(1, Duration::hours(24)),
            task_due(2, Duration::hours(24) - Duration::minutes(1)),
        ];
        let report = scan(&tasks, now(), default_horizon());
        assert_eq!(report.ids(), vec![TaskId(2)]);
    }

    #[test]
    fn test_completed_tasks_are_ignored() {
        let mut task = task_due(1, Duration::hours(1));
        task.status = TaskStatus::Completed;
        assert!(scan(&[task], now(), default_horizon()).is_empty());
    }

    #[test]
    fn test_bad_row_does_not_abort_scan() {
        let mut broken = task_due(1, Duration::hours(1));
        broken.due_date = "someday".to_string();
        let tasks = [broken, task_due(2, Duration::hours(3))];

        let report = scan(&tasks, now(), default_horizon());
        assert_eq!(report.ids(), vec![TaskId(2)]);
        assert_eq!(report.skipped.len(), 1);
        assert!(matches!(
            report.skipped[0],
            ScanError::ParseFailure { id: TaskId(1), .. }
        ));
    }

    #[test]
    fn test_custom_horizon() {
        let tasks = [task_due(1, Duration::hours(2)), task_due(2, Duration::hours(30))];
        let report = scan(&tasks, now(), Duration::hours(48));
        assert_eq!(report.ids(), vec![TaskId(1), TaskId(2)]);

        let report = scan(&tasks, now(), Duration::hours(1));
        assert!(report.is_empty());
    }
}
