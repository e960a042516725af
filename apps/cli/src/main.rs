//! # Botica Entry Point
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  argv ──► Cli::parse ──► init_tracing ──► run ──► stdout                │
//! │                                            │                            │
//! │                                            └─ error ──► stderr          │
//! │                                               exit 2 (invalid input)    │
//! │                                               exit 3 (not found)        │
//! │                                               exit 1 (anything else)    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::process::ExitCode;

use botica_cli::{init_tracing, run, Cli};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", err);
            err.exit_code()
        }
    }
}
