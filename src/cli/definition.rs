//! Command-line interface definition

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use super::task::{AddArgs, CheckArgs, IdArgs, ListArgs};

#[derive(Parser)]
#[command(name = "todo-reminder")]
#[command(about = "Track todos with due times and send reminders for tasks due soon")]
#[command(version)]
pub struct Cli {
    /// Directory holding config.toml and the task store
    #[arg(long, global = true, env = "TODO_REMINDER_DIR")]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add a new todo
    Add(AddArgs),

    /// List todos
    List(ListArgs),

    /// Mark a todo as completed
    Complete(IdArgs),

    /// Delete a todo
    Delete(IdArgs),

    /// Check for todos due soon and send a reminder
    Check(CheckArgs),

    /// Print the current date and time
    Now,

    /// Answer JSON tool calls on stdin, one per line
    Serve,

    /// Generate shell completions
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}
