//! Notifier doubles shared by unit and integration tests.
//!
//! Compiled for `cargo test` and behind the `test-support` feature so that
//! integration tests in `tests/` can reach them.

use async_trait::async_trait;
use std::sync::{Mutex, PoisonError};

use crate::reminder::{Notifier, NotifyError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub subject: String,
    pub body: String,
}

/// Accepts every message and keeps a copy.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<SentMessage>>,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<SentMessage> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn subjects(&self) -> Vec<String> {
        self.messages().into_iter().map(|m| m.subject).collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, subject: &str, body: &str) -> Result<(), NotifyError> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(SentMessage {
                subject: subject.to_string(),
                body: body.to_string(),
            });
        Ok(())
    }
}

/// Fails every send.
#[derive(Debug, Default)]
pub struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn send(&self, _subject: &str, _body: &str) -> Result<(), NotifyError> {
        Err(NotifyError::Channel("channel unavailable".to_string()))
    }
}

/// Never completes a send within any reasonable timeout.
#[derive(Debug, Default)]
pub struct StalledNotifier;

#[async_trait]
impl Notifier for StalledNotifier {
    async fn send(&self, _subject: &str, _body: &str) -> Result<(), NotifyError> {
        tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
        Ok(())
    }
}
