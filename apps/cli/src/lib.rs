//! # Botica CLI Library
//!
//! Command tree and startup for the `botica` binary.
//!
//! ## Module Organization
//! ```text
//! botica_cli/
//! ├── lib.rs          ◄─── You are here (argument tree & run)
//! ├── state/
//! │   ├── mod.rs      ◄─── State type exports
//! │   ├── app.rs      ◄─── AppState (database, config, clock)
//! │   └── config.rs   ◄─── Layered configuration
//! ├── commands/
//! │   ├── mod.rs      ◄─── Dispatch, output, shared helpers
//! │   ├── client.rs   ◄─── client add/edit/show/list/delete
//! │   ├── order.rs    ◄─── order add/edit/lines/list/show/delete
//! │   ├── visit.rs    ◄─── visit log/list/quick-order
//! │   ├── target.rs   ◄─── quarterly targets and uplift
//! │   ├── dashboard.rs◄─── projection + due clients
//! │   └── transfer.rs ◄─── CSV import/export, JSON backup/restore
//! └── error.rs        ◄─── CliError and exit codes
//! ```
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. Parse arguments (clap)                                              │
//! │  2. Initialize logging (stderr, RUST_LOG or -v)                         │
//! │  3. Load AppConfig: defaults ◄── botica.toml ◄── BOTICA_* env            │
//! │  4. Pick the clock: --as-of DATE (noon UTC) or the system clock         │
//! │  5. Open the database (--db, config, or platform data dir)              │
//! │     • SQLite with WAL mode, migrations applied                          │
//! │  6. Dispatch the command, print text or --json                          │
//! │  7. Close the pool                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod commands;
pub mod error;
pub mod state;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use botica_core::{Clock, FixedClock, SystemClock};
use commands::client::ClientCommand;
use commands::order::OrderCommand;
use commands::target::TargetCommand;
use commands::transfer::{ExportCommand, ImportCommand};
use commands::visit::VisitCommand;
use error::CliResult;
use state::{AppConfig, AppState};

/// Pharmacy client, order and visit ledger.
#[derive(Debug, Parser)]
#[command(name = "botica", version, about)]
pub struct Cli {
    /// Configuration file (default: <config dir>/botica.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Database file, overriding the configuration
    #[arg(long, global = true, value_name = "PATH")]
    pub db: Option<PathBuf>,

    /// Evaluate dates as if today were DATE
    #[arg(long, global = true, value_name = "YYYY-MM-DD")]
    pub as_of: Option<NaiveDate>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage pharmacies
    #[command(subcommand)]
    Client(ClientCommand),
    /// Record and inspect orders
    #[command(subcommand)]
    Order(OrderCommand),
    /// Log sales visits
    #[command(subcommand)]
    Visit(VisitCommand),
    /// Quarterly targets and desired uplift
    #[command(subcommand)]
    Target(TargetCommand),
    /// Quarter progress and clients due to order
    Dashboard,
    /// Import CSV files
    #[command(subcommand)]
    Import(ImportCommand),
    /// Export CSV files
    #[command(subcommand)]
    Export(ExportCommand),
    /// Write a full JSON backup
    Backup { file: PathBuf },
    /// Restore (merge) a JSON backup
    Restore { file: PathBuf },
}

/// Runs one invocation.
pub async fn run(cli: Cli) -> CliResult<()> {
    let config = AppConfig::load(cli.config.as_deref())?;

    let clock: Arc<dyn Clock> = match cli.as_of {
        Some(date) => {
            info!(%date, "Using fixed date");
            Arc::new(FixedClock::at_date(date))
        }
        None => Arc::new(SystemClock),
    };

    let db_path = match cli.db {
        Some(path) => path,
        None => config.resolve_database_path()?,
    };

    let state = AppState::open(config, db_path, clock).await?;
    let result = commands::dispatch(&state, cli.command, cli.json).await;
    state.db.close().await;
    result
}

/// Initializes the tracing subscriber. Logs go to stderr so stdout stays
/// parseable.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=botica=trace` - Show trace for botica crates only
/// - Default: warnings, plus INFO from botica (`-v`: DEBUG)
pub fn init_tracing(verbose: bool) {
    let default = if verbose {
        "warn,botica=debug,sqlx=warn"
    } else {
        "warn,botica=info,sqlx=warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
