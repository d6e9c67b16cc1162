//! Interactive task console binary.
//!
//! Resolves configuration, installs logging, opens the task database and
//! runs the menu on stdin/stdout.

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use task_console::config::AppConfig;
use task_console::console::Console;
use task_console::tasks::{SqliteTaskStore, TaskManager, TaskWorker};
use task_console::{logging, Result};

/// A menu-driven task tracker.
#[derive(Debug, Parser)]
#[command(name = "task-console", version, about)]
struct Args {
    /// Directory holding `task-console.yaml` (defaults to the current directory).
    #[arg(long, value_name = "DIR")]
    config_dir: Option<PathBuf>,

    /// Database file to use instead of the configured one.
    #[arg(long, value_name = "FILE")]
    database: Option<PathBuf>,

    /// Log at debug level.
    #[arg(short, long)]
    verbose: bool,

    /// Run mutations through the serializing worker.
    #[arg(long)]
    worker: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    if let Err(e) = run(args) {
        eprintln!("Error: {e}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

fn run(args: Args) -> Result<()> {
    let config_dir = match args.config_dir {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };
    let mut config = AppConfig::resolve(&config_dir)?;
    if let Some(database) = args.database {
        config.database_path = Some(database);
    }
    config.use_worker |= args.worker;

    logging::init(&config.log_level, args.verbose)?;

    let store = SqliteTaskStore::from_config(&config)?;
    tracing::info!(database = %store.db_path().display(), worker = config.use_worker, "starting");

    let stdin = io::stdin().lock();
    let stdout = io::stdout().lock();
    let mut console = Console::new(stdin, stdout, TaskManager::new(store.clone()), config.app_name);
    if config.use_worker {
        console = console.with_worker(TaskWorker::spawn(TaskManager::new(store))?);
    }
    console.run()
}
