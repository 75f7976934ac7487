//! Task data model

use chrono::{NaiveDateTime, ParseResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stored format of `due_date`.
pub const DATE_FORMAT: &str = "%Y-%m-%d";
/// Stored format of `due_time`.
pub const TIME_FORMAT: &str = "%H:%M";
/// Stored format of `created_at`, also used for `current_time`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Store-assigned task identifier, starting at 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub u64);

impl TaskId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for TaskId {
    fn from(n: u64) -> Self {
        Self(n)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Task status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Completed,
}

impl TaskStatus {
    /// Parse status from its stored label
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Caller-supplied fields of a task about to be added
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTask {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub due_date: String,
    pub due_time: String,
}

impl NewTask {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        due_date: impl Into<String>,
        due_time: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            due_date: due_date.into(),
            due_time: due_time.into(),
        }
    }
}

/// A task row as persisted
///
/// Due date and time are kept as the text the caller supplied. A row whose
/// due fields do not parse is still stored and listed; it is only left out
/// of reminder scans.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,

    pub title: String,

    #[serde(default)]
    pub description: String,

    pub due_date: String,

    pub due_time: String,

    pub status: TaskStatus,

    /// Creation time, `YYYY-MM-DD HH:MM:SS`; never rewritten
    pub created_at: String,
}

impl Task {
    /// Build a pending task from caller input
    pub fn new(id: TaskId, new: NewTask, created_at: NaiveDateTime) -> Self {
        Self {
            id,
            title: new.title,
            description: new.description,
            due_date: new.due_date,
            due_time: new.due_time,
            status: TaskStatus::Pending,
            created_at: created_at.format(TIMESTAMP_FORMAT).to_string(),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == TaskStatus::Pending
    }

    /// Combined due instant
    pub fn due_at(&self) -> ParseResult<NaiveDateTime> {
        let combined = format!("{} {}", self.due_date.trim(), self.due_time.trim());
        NaiveDateTime::parse_from_str(&combined, &format!("{DATE_FORMAT} {TIME_FORMAT}"))
    }

    /// Mark the task completed. Returns false when it already was.
    pub fn complete(&mut self) -> bool {
        if self.status == TaskStatus::Completed {
            return false;
        }
        self.status = TaskStatus::Completed;
        true
    }

    /// One-line human readable form
    pub fn to_line(&self) -> String {
        let mut line = format!(
            "#{} [{}] {} (due: {} {})",
            self.id, self.status, self.title, self.due_date, self.due_time
        );
        if !self.description.is_empty() {
            line.push_str(&format!(" - {}", self.description));
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn created() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 2, 14)
            .unwrap()
            .and_hms_opt(8, 30, 5)
            .unwrap()
    }

    fn sample(due_date: &str, due_time: &str) -> Task {
        Task::new(
            TaskId(1),
            NewTask::new("Pay rent", "landlord transfer", due_date, due_time),
            created(),
        )
    }

    #[test]
    fn test_new_task_is_pending_with_timestamp() {
        let task = sample("2026-02-15", "09:00");
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.created_at, "2026-02-14 08:30:05");
    }

    #[test]
    fn test_task_status_parse() {
        assert_eq!(TaskStatus::parse("pending"), Some(TaskStatus::Pending));
        assert_eq!(TaskStatus::parse(" Completed "), Some(TaskStatus::Completed));
        assert_eq!(TaskStatus::parse("done"), None);
    }

    #[test]
    fn test_due_at_parses_date_and_time() {
        let task = sample("2026-02-15", "09:45");
        let expected = NaiveDate::from_ymd_opt(2026, 2, 15)
            .unwrap()
            .and_hms_opt(9, 45, 0)
            .unwrap();
        assert_eq!(task.due_at().unwrap(), expected);
    }

    #[test]
    fn test_due_at_rejects_malformed_values() {
        assert!(sample("tomorrow", "09:00").due_at().is_err());
        assert!(sample("2026-02-15", "9am").due_at().is_err());
        assert!(sample("2026-02-30", "09:00").due_at().is_err());
    }

    #[test]
    fn test_complete_is_idempotent() {
        let mut task = sample("2026-02-15", "09:00");
        assert!(task.complete());
        assert!(!task.complete());
        assert_eq!(task.status, TaskStatus::Completed);
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let task = sample("2026-02-15", "09:00");
        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["status"], "pending");
        assert_eq!(json["id"], 1);
    }

    #[test]
    fn test_to_line() {
        let line = sample("2026-02-15", "09:00").to_line();
        assert!(line.contains("#1"));
        assert!(line.contains("[pending]"));
        assert!(line.contains("2026-02-15 09:00"));
        assert!(line.contains("landlord transfer"));
    }
}
