//! Reminder digest composition and best-effort delivery

use chrono::Duration;
use std::sync::Arc;
use tracing::{info, warn};

use super::notifier::{Notifier, NotifyError};
use super::scanner::{default_horizon, UpcomingTask};

pub const REMINDER_SUBJECT: &str = "Todo Reminder - Tasks Due Soon";

const DEFAULT_SEND_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

/// "24 hours", "1 hour", "90 minutes"
pub fn describe_horizon(horizon: Duration) -> String {
    let minutes = horizon.num_minutes();
    if minutes % 60 == 0 {
        let hours = minutes / 60;
        if hours == 1 {
            "1 hour".to_string()
        } else {
            format!("{} hours", hours)
        }
    } else if minutes == 1 {
        "1 minute".to_string()
    } else {
        format!("{} minutes", minutes)
    }
}

/// One message listing every flagged task.
pub fn compose_digest(tasks: &[UpcomingTask], horizon: Duration) -> String {
    let mut body = format!(
        "Hello! You have the following tasks due within the next {}:\n\n",
        describe_horizon(horizon)
    );

    for upcoming in tasks {
        let task = &upcoming.task;
        body.push_str(&format!("• {}\n", task.title));
        body.push_str(&format!("  Description: {}\n", task.description));
        body.push_str(&format!("  Due: {} at {}", task.due_date, task.due_time));
        if upcoming.overdue {
            body.push_str(" (overdue)");
        }
        body.push_str("\n\n");
    }

    body.push_str("Don't forget to complete them on time!");
    body
}

/// Sends through a [`Notifier`], never letting a slow or failing channel
/// reach the caller: every send is time-bounded, failures are logged and
/// reported as `false`, nothing is retried.
pub struct NotificationDispatcher {
    notifier: Arc<dyn Notifier>,
    timeout: std::time::Duration,
    horizon: Duration,
}

impl NotificationDispatcher {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self {
            notifier,
            timeout: DEFAULT_SEND_TIMEOUT,
            horizon: default_horizon(),
        }
    }

    pub fn with_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Horizon named in the digest text
    pub fn with_horizon(mut self, horizon: Duration) -> Self {
        self.horizon = horizon;
        self
    }

    /// Send one digest for `tasks`. Returns whether it was delivered; an
    /// empty list sends nothing.
    pub async fn notify(&self, tasks: &[UpcomingTask]) -> bool {
        if tasks.is_empty() {
            return false;
        }

        let body = compose_digest(tasks, self.horizon);
        let sent = self.send(REMINDER_SUBJECT, &body).await;
        if sent {
            info!("Reminder sent for {} tasks", tasks.len());
        }
        sent
    }

    pub async fn send(&self, subject: &str, body: &str) -> bool {
        let result = match tokio::time::timeout(self.timeout, self.notifier.send(subject, body)).await
        {
            Ok(result) => result,
            Err(_) => Err(NotifyError::TimedOut(self.timeout)),
        };

        match result {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to send '{}': {}", subject, e);
                false
            }
        }
    }
}
