//! Todo CLI commands

use anyhow::{bail, Context, Result};
use clap::Args;

use super::truncate;
use crate::task::{CompleteOutcome, DeleteOutcome, Task, TaskId, TaskListing};
use crate::tools::request::parse_status;
use crate::tools::ToolFacade;

const TABLE_COL_ID: usize = 6;
const TABLE_COL_STATUS: usize = 10;
const TABLE_COL_DUE: usize = 17;
const TABLE_COL_TITLE: usize = 30;

#[derive(Args)]
pub struct AddArgs {
    /// Short title for the todo
    title: String,

    /// Additional details
    #[arg(short, long, default_value = "")]
    description: String,

    /// Due date (YYYY-MM-DD)
    #[arg(long)]
    due_date: String,

    /// Due time (HH:MM)
    #[arg(long)]
    due_time: String,
}

#[derive(Args)]
pub struct ListArgs {
    /// Filter by status (pending, completed)
    #[arg(short, long)]
    status: Option<String>,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
pub struct IdArgs {
    /// Todo ID
    id: u64,
}

#[derive(Args)]
pub struct CheckArgs {
    /// Send the reminder without printing a summary
    #[arg(short, long)]
    quiet: bool,
}

pub async fn run_add(facade: &ToolFacade, args: AddArgs) -> Result<()> {
    let id = facade
        .add_task(&args.title, &args.description, &args.due_date, &args.due_time)
        .await
        .context("Failed to add todo")?;
    println!("Todo '{}' added successfully with ID {}", args.title, id);
    Ok(())
}

fn print_table_header() {
    println!(
        "{:<width_id$} {:<width_status$} {:<width_due$} TITLE",
        "ID",
        "STATUS",
        "DUE",
        width_id = TABLE_COL_ID,
        width_status = TABLE_COL_STATUS,
        width_due = TABLE_COL_DUE,
    );
    println!(
        "{}",
        "-".repeat(TABLE_COL_ID + TABLE_COL_STATUS + TABLE_COL_DUE + TABLE_COL_TITLE + 3)
    );
}

fn print_table_row(task: &Task) {
    let due = truncate(&format!("{} {}", task.due_date, task.due_time), TABLE_COL_DUE);
    println!(
        "{:<width_id$} {:<width_status$} {:<width_due$} {}",
        task.id,
        task.status.label(),
        due,
        truncate(&task.title, TABLE_COL_TITLE),
        width_id = TABLE_COL_ID,
        width_status = TABLE_COL_STATUS,
        width_due = TABLE_COL_DUE,
    );
}

pub async fn run_list(facade: &ToolFacade, args: ListArgs) -> Result<()> {
    let status = parse_status(args.status.as_deref())?;
    let list = facade.list_tasks(status);

    if let Some(warning) = &list.warning {
        eprintln!("Warning: {}", warning);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(list.listing.tasks())?);
        return Ok(());
    }

    let tasks = match &list.listing {
        TaskListing::Empty => {
            println!("No todos found");
            return Ok(());
        }
        TaskListing::NoMatches => {
            println!("No todos match that status");
            return Ok(());
        }
        TaskListing::Tasks(tasks) => tasks,
    };

    print_table_header();
    for task in tasks {
        print_table_row(task);
    }
    println!("\nTotal: {} todos", tasks.len());
    Ok(())
}

pub async fn run_complete(facade: &ToolFacade, args: IdArgs) -> Result<()> {
    let id = TaskId(args.id);
    match facade.complete_task(id)? {
        CompleteOutcome::Updated => println!("Todo with ID {} marked as completed", id),
        CompleteOutcome::AlreadyCompleted => println!("Todo with ID {} was already completed", id),
        CompleteOutcome::NotFound => bail!("Todo with ID {} not found", id),
    }
    Ok(())
}

pub async fn run_delete(facade: &ToolFacade, args: IdArgs) -> Result<()> {
    let id = TaskId(args.id);
    match facade.delete_task(id)? {
        DeleteOutcome::Deleted => println!("Todo with ID {} deleted successfully", id),
        DeleteOutcome::NotFound => bail!("Todo with ID {} not found", id),
    }
    Ok(())
}

pub async fn run_check(facade: &ToolFacade, args: CheckArgs) -> Result<()> {
    let check = facade.check_upcoming(!args.quiet).await;
    match &check.text {
        Some(text) => {
            println!("{}", text);
            for upcoming in &check.upcoming {
                let marker = if upcoming.overdue { "overdue" } else { "due" };
                println!("  {:<8}{}", marker, upcoming.task.to_line());
            }
        }
        None => {
            if let Some(warning) = &check.warning {
                eprintln!("Warning: {}", warning);
            }
        }
    }
    Ok(())
}

pub fn run_now(facade: &ToolFacade) {
    println!("{}", facade.current_time());
}
