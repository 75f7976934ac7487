//! Task lifecycle events
//!
//! Side effects of a successful store operation (such as announcing a new
//! task) are subscribers on an [`EventBus`]. The operation is already
//! persisted when an event is published, and a failing subscriber affects
//! neither the operation's result nor the other subscribers.

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::reminder::NotificationDispatcher;
use crate::task::Task;

pub const NEW_TASK_SUBJECT: &str = "New Todo Added";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskEvent {
    Added(Task),
}

#[async_trait]
pub trait EventSubscriber: Send + Sync {
    fn name(&self) -> &str;

    async fn handle(&self, event: &TaskEvent) -> Result<()>;
}

#[derive(Default)]
pub struct EventBus {
    subscribers: Vec<Arc<dyn EventSubscriber>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, subscriber: Arc<dyn EventSubscriber>) {
        self.subscribers.push(subscriber);
    }

    pub fn with_subscriber(mut self, subscriber: Arc<dyn EventSubscriber>) -> Self {
        self.subscribe(subscriber);
        self
    }

    /// Deliver `event` to every subscriber in order. Returns how many handled it.
    pub async fn publish(&self, event: &TaskEvent) -> usize {
        let mut handled = 0;
        for subscriber in &self.subscribers {
            match subscriber.handle(event).await {
                Ok(()) => {
                    debug!("{} handled {:?}", subscriber.name(), event);
                    handled += 1;
                }
                Err(e) => warn!("Subscriber {} failed: {:#}", subscriber.name(), e),
            }
        }
        handled
    }
}

/// Announces every newly added task through the notifier.
pub struct NewTaskNotice {
    dispatcher: Arc<NotificationDispatcher>,
}

impl NewTaskNotice {
    pub fn new(dispatcher: Arc<NotificationDispatcher>) -> Self {
        Self { dispatcher }
    }
}

pub fn new_task_body(task: &Task) -> String {
    format!(
        "A new todo has been added:\n\nTask: {}\nDescription: {}\nDue Date: {}\nDue Time: {}",
        task.title, task.description, task.due_date, task.due_time
    )
}

#[async_trait]
impl EventSubscriber for NewTaskNotice {
    fn name(&self) -> &str {
        "new-task-notice"
    }

    async fn handle(&self, event: &TaskEvent) -> Result<()> {
        let TaskEvent::Added(task) = event;
        if !self.dispatcher.send(NEW_TASK_SUBJECT, &new_task_body(task)).await {
            bail!("notice for task {} was not delivered", task.id);
        }
        Ok(())
    }
}
