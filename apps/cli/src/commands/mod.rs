//! # Commands
//!
//! One module per command group. Each exposes:
//! - a clap `Subcommand` enum
//! - plain async functions (`add_client`, `dashboard`, ...) taking
//!   `&AppState` and returning a serializable response, tested directly
//! - a `run` function wiring the two together
//!
//! ## Output
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  command fn ──► Response (Serialize + Render)                           │
//! │                        │                                                │
//! │            ┌───────────┴───────────┐                                    │
//! │            ▼                       ▼                                    │
//! │     --json: pretty JSON      default: render_text()                     │
//! │            │                       │                                    │
//! │            └───────► stdout ◄──────┘       (logs go to stderr)          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod client;
pub mod dashboard;
pub mod order;
pub mod target;
pub mod transfer;
pub mod visit;

use serde::Serialize;

use crate::error::CliResult;
use crate::state::{AppConfig, AppState};
use crate::Command;
use botica_core::import::parse_line_spec;
use botica_core::validation::validate_lines;
use botica_core::{Client, CoreError, LineInput, OrderLine};

/// Text rendering of a command response.
pub trait Render: Serialize {
    fn render_text(&self, config: &AppConfig) -> String;
}

/// Prints a response as JSON or text.
pub fn emit<T: Render>(value: &T, config: &AppConfig, json: bool) -> CliResult<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        println!("{}", value.render_text(config));
    }
    Ok(())
}

/// Runs one top-level command.
pub async fn dispatch(state: &AppState, command: Command, json: bool) -> CliResult<()> {
    match command {
        Command::Client(cmd) => client::run(state, cmd, json).await,
        Command::Order(cmd) => order::run(state, cmd, json).await,
        Command::Visit(cmd) => visit::run(state, cmd, json).await,
        Command::Target(cmd) => target::run(state, cmd, json).await,
        Command::Dashboard => {
            let response = dashboard::dashboard(state).await?;
            emit(&response, &state.config, json)
        }
        Command::Import(cmd) => transfer::run_import(state, cmd, json).await,
        Command::Export(cmd) => transfer::run_export(state, cmd, json).await,
        Command::Backup { file } => {
            let response = transfer::backup(state, &file).await?;
            emit(&response, &state.config, json)
        }
        Command::Restore { file } => {
            let response = transfer::restore(state, &file).await?;
            emit(&response, &state.config, json)
        }
    }
}

// =============================================================================
// Shared Helpers
// =============================================================================

/// Finds a client by id or code.
pub(crate) async fn resolve_client(state: &AppState, id_or_code: &str) -> CliResult<Client> {
    state
        .db
        .clients()
        .find(id_or_code)
        .await?
        .ok_or_else(|| CoreError::ClientNotFound(id_or_code.trim().to_string()).into())
}

/// Parses and validates `product:qty:price[:disc]` specs into priced lines.
pub(crate) fn parse_lines(specs: &[String]) -> CliResult<Vec<OrderLine>> {
    if specs.is_empty() {
        return Err(CoreError::EmptyOrder.into());
    }

    let inputs = specs
        .iter()
        .map(|spec| parse_line_spec(spec))
        .collect::<Result<Vec<LineInput>, CoreError>>()?;
    validate_lines(&inputs)?;

    Ok(inputs.into_iter().map(OrderLine::from).collect())
}

/// Response for deletions.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Deleted {
    pub entity: &'static str,
    pub id: String,
}

impl Render for Deleted {
    fn render_text(&self, _config: &AppConfig) -> String {
        format!("✓ {} {} deleted", self.entity, self.id)
    }
}

/// Blank input clears an optional field.
pub(crate) fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Shortens ids for tables.
pub(crate) fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}
