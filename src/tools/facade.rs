//! The operation surface offered to calling agents
//!
//! Dependencies are built once at startup and injected; the facade holds
//! them for its whole lifetime.

use anyhow::Result;
use chrono::Duration;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use crate::clock::{Clock, SystemClock};
use crate::config::{Config, NotifierKind};
use crate::events::{EventBus, NewTaskNotice, TaskEvent};
use crate::reminder::dispatcher::describe_horizon;
use crate::reminder::{
    default_horizon, LogNotifier, NotificationDispatcher, Notifier, UpcomingTask, WebhookNotifier,
};
use crate::task::model::TIMESTAMP_FORMAT;
use crate::task::{
    CompleteOutcome, DeleteOutcome, LoadWarning, NewTask, StoreError, TaskId, TaskListing,
    TaskStatus, TaskStore,
};

/// Listing plus the load warning, if the store could not be read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskList {
    pub listing: TaskListing,
    pub warning: Option<LoadWarning>,
}

/// Result of a reminder check
#[derive(Debug, Clone, Default)]
pub struct UpcomingCheck {
    pub upcoming: Vec<UpcomingTask>,
    /// Whether the reminder reached the notifier
    pub sent: bool,
    /// Summary, only when asked for
    pub text: Option<String>,
    /// Rows left out because their due fields do not parse
    pub skipped: Vec<String>,
    pub warning: Option<LoadWarning>,
}

pub struct ToolFacade {
    store: Arc<TaskStore>,
    dispatcher: Arc<NotificationDispatcher>,
    events: EventBus,
    clock: Arc<dyn Clock>,
    horizon: Duration,
}

impl ToolFacade {
    pub fn new(
        store: Arc<TaskStore>,
        dispatcher: Arc<NotificationDispatcher>,
        events: EventBus,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            dispatcher,
            events,
            clock,
            horizon: default_horizon(),
        }
    }

    pub fn with_horizon(mut self, horizon: Duration) -> Self {
        self.horizon = horizon;
        self
    }

    /// Wire store, notifier and subscribers from configuration.
    pub fn from_config(config: &Config, dir: &Path) -> Result<Self> {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        let store = Arc::new(TaskStore::with_clock(config.store_path(dir), clock.clone()));
        store.ensure_initialized()?;

        let notifier: Arc<dyn Notifier> = match (config.notifier.kind, &config.notifier.webhook_url) {
            (NotifierKind::Webhook, Some(url)) => Arc::new(WebhookNotifier::new(url.clone())?),
            (NotifierKind::Webhook, None) => {
                anyhow::bail!("notifier.kind = \"webhook\" requires notifier.webhook_url")
            }
            (NotifierKind::Log, _) => Arc::new(LogNotifier),
        };
        debug!("Using {:?} notifier", config.notifier.kind);

        let dispatcher = Arc::new(
            NotificationDispatcher::new(notifier)
                .with_timeout(config.notify_timeout())
                .with_horizon(config.horizon()),
        );

        let mut events = EventBus::new();
        if config.notifier.notify_on_add {
            events.subscribe(Arc::new(NewTaskNotice::new(dispatcher.clone())));
        }

        Ok(Self::new(store, dispatcher, events, clock).with_horizon(config.horizon()))
    }

    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    pub fn horizon(&self) -> Duration {
        self.horizon
    }

    /// Store a new pending task and publish `TaskEvent::Added`.
    ///
    /// The locked store cycle runs on the blocking pool. Subscribers are
    /// awaited before returning, each bounded by the dispatcher timeout.
    pub async fn add_task(
        &self,
        title: &str,
        description: &str,
        due_date: &str,
        due_time: &str,
    ) -> Result<TaskId, StoreError> {
        let store = self.store.clone();
        let new = NewTask::new(title, description, due_date, due_time);
        let task = tokio::task::spawn_blocking(move || store.insert(new)).await??;
        let id = task.id;
        self.events.publish(&TaskEvent::Added(task)).await;
        Ok(id)
    }

    pub fn list_tasks(&self, status: Option<TaskStatus>) -> TaskList {
        let snapshot = self.store.load();
        TaskList {
            listing: snapshot.listing(status),
            warning: snapshot.warning,
        }
    }

    pub fn complete_task(&self, id: TaskId) -> Result<CompleteOutcome, StoreError> {
        self.store.complete(id)
    }

    pub fn delete_task(&self, id: TaskId) -> Result<DeleteOutcome, StoreError> {
        self.store.delete(id)
    }

    /// Scan for tasks inside the horizon and send one reminder if any are
    /// flagged. `want_text` only decides whether a summary is returned; the
    /// reminder goes out either way. An unreadable store and unparseable rows
    /// are reported in the result and in the summary.
    pub async fn check_upcoming(&self, want_text: bool) -> UpcomingCheck {
        let report = self.store.get_upcoming(self.clock.now(), self.horizon);
        let window = describe_horizon(self.horizon);
        let skipped: Vec<String> = report.skipped.iter().map(ToString::to_string).collect();

        let sent = if report.is_empty() {
            debug!("No tasks due within {}", window);
            false
        } else {
            let sent = self.dispatcher.notify(&report.upcoming).await;
            info!(
                "{} tasks due within {} (reminder sent: {})",
                report.upcoming.len(),
                window,
                sent
            );
            sent
        };

        let text = want_text.then(|| {
            let mut text = if report.is_empty() {
                format!("No todos due within the next {}.", window)
            } else {
                let delivery = if sent {
                    "Reminders sent."
                } else {
                    "The reminder could not be delivered."
                };
                format!(
                    "You have {} todos upcoming within {}. {}",
                    report.upcoming.len(),
                    window,
                    delivery
                )
            };
            if !skipped.is_empty() {
                text.push_str(&format!(
                    " {} todos were skipped because their due date or time could not be read.",
                    skipped.len()
                ));
            }
            if let Some(warning) = &report.warning {
                text.push_str(&format!(" Warning: {}.", warning));
            }
            text
        });

        UpcomingCheck {
            upcoming: report.upcoming,
            sent,
            text,
            skipped,
            warning: report.warning,
        }
    }

    pub fn current_time(&self) -> String {
        self.clock.now().format(TIMESTAMP_FORMAT).to_string()
    }
}
