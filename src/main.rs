//! # Taskboard
//!
//! A small task tracker for the terminal. Every signed-in user keeps their own
//! list of tasks, each with a name, a stakeholder, a due date and a status
//! (`Pending`, `Incomplete` or `Completed`). The dashboard stays live: it
//! subscribes to the user's tasks and redraws whenever the store changes.
//!
//! ## Usage
//!
//! ### Interactive Mode (TUI)
//!
//! ```bash
//! taskboard
//! # or explicitly
//! taskboard ui
//! ```
//!
//! **Key Bindings**
//! *   `q`: Quit
//! *   `a`: Add new task (name, stakeholder, due date, status)
//! *   `Space` / `Enter`: Move selected task to the next status
//! *   `s`: Type a status for the selected task
//! *   `o`: Sign out (`s` signs back in)
//!
//! ### Command Line Interface (CLI)
//!
//! ```bash
//! taskboard add "Draft spec" --stakeholder Alice --due 2024-05-01
//! taskboard list
//! taskboard status <ID> Completed
//! ```
//!
//! ## Data Storage
//!
//! Tasks are saved in your local data directory:
//! *   Linux: `~/.local/share/taskboard/tasks.json`
//! *   macOS: `~/Library/Application Support/taskboard/tasks.json`
//! *   Windows: `%APPDATA%\taskboard\tasks.json`
//!
//! Override it with `--db` or the `TASKBOARD_DB` environment variable. Logs
//! are written to `taskboard.log` next to the database.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use taskboard::access::TaskAccess;
use taskboard::commands::{cmd_add, cmd_list, cmd_status};
use taskboard::config::Config;
use taskboard::dashboard::Dashboard;
use taskboard::models::Status;
use taskboard::notify::{ConsoleNotifier, StatusLine};
use taskboard::session::{AuthProvider, LocalAuth};
use taskboard::storage::LocalStore;
use taskboard::tui::run_tui;

#[derive(Parser)]
#[command(name = "taskboard")]
#[command(version, about = "Live task dashboard", long_about = None)]
struct Cli {
    /// Path to the tasks database
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// User id to sign in as
    #[arg(short, long, global = true)]
    user: Option<String>,

    /// Email shown for the signed-in user
    #[arg(long, global = true)]
    email: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a new task
    Add {
        /// Task name (quoted if it has spaces)
        name: String,
        /// Who the task is for
        #[arg(short, long)]
        stakeholder: String,
        /// Due date in YYYY-MM-DD
        #[arg(short, long)]
        due: String,
        /// Initial status (Pending, Incomplete, Completed)
        #[arg(long, default_value = "Pending")]
        status: Status,
    },
    /// List your tasks with the completion percentage
    List,
    /// Set the status of a task
    Status {
        id: String,
        /// Pending, Incomplete or Completed
        status: String,
    },
    /// Generate shell completions
    Completions {
        shell: Shell,
    },
    /// Open interactive TUI
    Ui,
}

fn init_logging(config: &Config) -> Result<()> {
    if let Some(dir) = config.log_path.parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
        }
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_path)
        .with_context(|| format!("opening log file {}", config.log_path.display()))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .init();
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(Commands::Completions { shell }) = &cli.command {
        let mut cmd = Cli::command();
        generate(*shell, &mut cmd, "taskboard", &mut io::stdout());
        return Ok(());
    }

    let config = Config::resolve(cli.db, cli.user, cli.email, cli.log_level);
    init_logging(&config)?;
    tracing::info!(db = %config.db_path.display(), uid = %config.user.uid, "starting");

    let store = LocalStore::open(&config.db_path)
        .with_context(|| format!("opening task database {}", config.db_path.display()))?;
    let access = TaskAccess::new(Arc::new(store));
    let auth = Arc::new(LocalAuth::new(config.user.clone()));

    match cli.command {
        Some(Commands::Ui) | None => {
            let status_line = StatusLine::default();
            let (dashboard, events) = Dashboard::new(access, auth.clone(), Arc::new(status_line.clone()));
            run_tui(dashboard, events, auth, status_line).await
        }
        Some(command) => {
            let notifier = Arc::new(ConsoleNotifier { silent: false });
            let (mut dashboard, mut events) = Dashboard::new(access, auth.clone(), notifier);
            let session = auth.session().borrow().clone();
            dashboard.set_session(session).await;
            match command {
                Commands::Add { name, stakeholder, due, status } => cmd_add(&mut dashboard, name, stakeholder, due, status).await,
                Commands::List => cmd_list(&mut dashboard, &mut events).await,
                Commands::Status { id, status } => cmd_status(&mut dashboard, id, &status).await,
                Commands::Completions { .. } | Commands::Ui => Ok(()),
            }
        }
    }
}
