//! todo-reminder library - task store, due-window reminders and the tool
//! surface that agent runtimes call.

pub mod cli;
pub mod clock;
pub mod config;
pub mod events;
pub mod reminder;
pub mod task;
pub mod tools;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
