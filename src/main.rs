//! todo-reminder - todos with due-window reminders for agents and humans

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use todo_reminder::cli::{self, Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    if std::env::var("TODO_REMINDER_DEBUG").is_ok() {
        tracing_subscriber::fmt()
            .with_env_filter("todo_reminder=debug")
            .with_writer(std::io::stderr)
            .init();
    }

    let cli = Cli::parse();
    let data_dir = cli.data_dir;
    let open = || cli::open_facade(data_dir.clone());

    match cli.command {
        Commands::Add(args) => cli::task::run_add(&open()?, args).await,
        Commands::List(args) => cli::task::run_list(&open()?, args).await,
        Commands::Complete(args) => cli::task::run_complete(&open()?, args).await,
        Commands::Delete(args) => cli::task::run_delete(&open()?, args).await,
        Commands::Check(args) => cli::task::run_check(&open()?, args).await,
        Commands::Now => {
            cli::task::run_now(&open()?);
            Ok(())
        }
        Commands::Serve => cli::serve::run(&open()?).await,
        // Completions need neither config nor a store.
        Commands::Completion { shell } => {
            generate(shell, &mut Cli::command(), "todo-reminder", &mut std::io::stdout());
            Ok(())
        }
    }
}
