//! Reminder module
//!
//! - Due-window scan of pending tasks (overdue tasks included)
//! - Digest composition and time-bounded dispatch through a notifier
//! - Notifier channels (log, webhook)

pub mod dispatcher;
pub mod notifier;
pub mod scanner;

pub use dispatcher::{compose_digest, NotificationDispatcher, REMINDER_SUBJECT};
pub use notifier::{LogNotifier, Notifier, NotifyError, WebhookNotifier};
pub use scanner::{default_horizon, scan, ScanError, ScanReport, UpcomingTask};
