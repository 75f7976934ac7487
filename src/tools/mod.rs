//! Tool surface for agent runtimes
//!
//! `facade` holds the typed operations; `request` maps named calls with
//! JSON keyword arguments onto them.

pub mod facade;
pub mod request;

pub use facade::{TaskList, ToolFacade, UpcomingCheck};
pub use request::{dispatch, ToolCall, ToolError, ToolOutput};
