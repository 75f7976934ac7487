//! Name-based tool invocation
//!
//! A calling runtime names an operation and passes keyword arguments as a
//! JSON object. Every call produces a [`ToolOutput`]; failures are returned
//! as the `error` variant rather than escaping.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::facade::ToolFacade;
use crate::task::{CompleteOutcome, DeleteOutcome, StoreError, Task, TaskId, TaskListing, TaskStatus};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub tool: String,
    #[serde(default)]
    pub arguments: Value,
}

impl ToolCall {
    pub fn new(tool: impl Into<String>, arguments: Value) -> Self {
        Self {
            tool: tool.into(),
            arguments,
        }
    }
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments for {tool}: {source}")]
    InvalidArguments {
        tool: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid status '{0}', expected 'pending' or 'completed'")]
    InvalidStatus(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ToolOutput {
    Added {
        id: TaskId,
        message: String,
    },
    Tasks {
        tasks: Vec<Task>,
    },
    /// The store holds no tasks at all
    NoTasks {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        warning: Option<String>,
    },
    /// Tasks exist, but none with the requested status
    NoMatches {
        message: String,
    },
    Completed {
        id: TaskId,
        message: String,
    },
    Deleted {
        id: TaskId,
        message: String,
    },
    NotFound {
        id: TaskId,
        message: String,
    },
    Upcoming {
        #[serde(skip_serializing_if = "Option::is_none")]
        text: Option<String>,
        /// Rows the scan could not read
        #[serde(skip_serializing_if = "Vec::is_empty")]
        skipped: Vec<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        warning: Option<String>,
    },
    CurrentTime {
        now: String,
    },
    Error {
        message: String,
    },
}

#[derive(Deserialize)]
struct AddArgs {
    #[serde(alias = "task")]
    title: String,
    #[serde(default)]
    description: String,
    due_date: String,
    due_time: String,
}

#[derive(Deserialize)]
struct ListArgs {
    #[serde(default)]
    status: Option<String>,
}

#[derive(Deserialize)]
struct IdArgs {
    #[serde(alias = "todo_id")]
    id: u64,
}

#[derive(Deserialize)]
struct CheckArgs {
    #[serde(default, alias = "response")]
    want_text: bool,
}

/// Canonical tool names. Each also answers to the name older agent
/// prompts used for it.
const TOOL_NAMES: &[(&str, &str)] = &[
    ("add_task", "add_todo_task"),
    ("list_tasks", "list_all_todos"),
    ("complete_task", "complete_todo_task"),
    ("delete_task", "delete_todo_task"),
    ("check_upcoming", "check_upcoming_todos_task"),
    ("current_time", "get_current_date"),
];

fn canonical_name(tool: &str) -> Option<&'static str> {
    TOOL_NAMES
        .iter()
        .find(|(name, alias)| *name == tool || *alias == tool)
        .map(|(name, _)| *name)
}

fn parse_args<T: DeserializeOwned>(tool: &'static str, arguments: Value) -> Result<T, ToolError> {
    let arguments = if arguments.is_null() {
        Value::Object(Default::default())
    } else {
        arguments
    };
    serde_json::from_value(arguments).map_err(|source| ToolError::InvalidArguments { tool, source })
}

pub fn parse_status(status: Option<&str>) -> Result<Option<TaskStatus>, ToolError> {
    match status.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => TaskStatus::parse(s)
            .map(Some)
            .ok_or_else(|| ToolError::InvalidStatus(s.to_string())),
    }
}

/// Run one call against the facade.
pub async fn dispatch(facade: &ToolFacade, call: ToolCall) -> ToolOutput {
    match run(facade, call).await {
        Ok(output) => output,
        Err(e) => ToolOutput::Error {
            message: e.to_string(),
        },
    }
}

async fn run(facade: &ToolFacade, call: ToolCall) -> Result<ToolOutput, ToolError> {
    let tool = canonical_name(&call.tool).ok_or_else(|| ToolError::UnknownTool(call.tool.clone()))?;

    let output = match tool {
        "add_task" => {
            let args: AddArgs = parse_args(tool, call.arguments)?;
            let id = facade
                .add_task(&args.title, &args.description, &args.due_date, &args.due_time)
                .await?;
            ToolOutput::Added {
                id,
                message: format!("Todo '{}' added successfully with ID {}", args.title, id),
            }
        }
        "list_tasks" => {
            let args: ListArgs = parse_args(tool, call.arguments)?;
            let status = parse_status(args.status.as_deref())?;
            let list = facade.list_tasks(status);
            match list.listing {
                TaskListing::Empty => ToolOutput::NoTasks {
                    message: "No todos found".to_string(),
                    warning: list.warning.map(|w| w.to_string()),
                },
                TaskListing::NoMatches => ToolOutput::NoMatches {
                    message: format!(
                        "No {} todos found",
                        status.map(|s| s.label()).unwrap_or_default()
                    ),
                },
                TaskListing::Tasks(tasks) => ToolOutput::Tasks { tasks },
            }
        }
        "complete_task" => {
            let IdArgs { id } = parse_args(tool, call.arguments)?;
            let id = TaskId(id);
            match facade.complete_task(id)? {
                CompleteOutcome::Updated => ToolOutput::Completed {
                    id,
                    message: format!("Todo with ID {} marked as completed", id),
                },
                CompleteOutcome::AlreadyCompleted => ToolOutput::Completed {
                    id,
                    message: format!("Todo with ID {} was already completed", id),
                },
                CompleteOutcome::NotFound => not_found(id),
            }
        }
        "delete_task" => {
            let IdArgs { id } = parse_args(tool, call.arguments)?;
            let id = TaskId(id);
            match facade.delete_task(id)? {
                DeleteOutcome::Deleted => ToolOutput::Deleted {
                    id,
                    message: format!("Todo with ID {} deleted successfully", id),
                },
                DeleteOutcome::NotFound => not_found(id),
            }
        }
        "check_upcoming" => {
            let args: CheckArgs = parse_args(tool, call.arguments)?;
            let check = facade.check_upcoming(args.want_text).await;
            ToolOutput::Upcoming {
                text: check.text,
                skipped: check.skipped,
                warning: check.warning.map(|w| w.to_string()),
            }
        }
        "current_time" => ToolOutput::CurrentTime {
            now: facade.current_time(),
        },
        other => return Err(ToolError::UnknownTool(other.to_string())),
    };

    Ok(output)
}

fn not_found(id: TaskId) -> ToolOutput {
    ToolOutput::NotFound {
        id,
        message: format!("Todo with ID {} not found", id),
    }
}
