//! Task management module
//!
//! - Task record and status state machine (pending -> completed)
//! - JSON-backed store with serialized writers and a monotonic id counter

pub mod error;
pub mod model;
pub mod store;

pub use error::StoreError;
pub use model::{NewTask, Task, TaskId, TaskStatus};
pub use store::{CompleteOutcome, DeleteOutcome, LoadWarning, Snapshot, TaskListing, TaskStore};
