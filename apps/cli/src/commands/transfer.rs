//! # Import / Export Commands
//!
//! `botica import clients|orders <FILE>`, `botica export clients|orders <FILE>`,
//! `botica backup <FILE>`, `botica restore <FILE>`.
//!
//! File I/O happens here; parsing and merging live in `botica_db::transfer`.

use clap::Subcommand;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use super::{emit, Render};
use crate::error::{CliError, CliResult, ErrorCode};
use crate::state::{AppConfig, AppState};
use botica_db::{
    export_clients_csv, export_json, export_orders_csv, import_clients_csv, import_orders_csv,
    restore_json, ImportReport, RestoreReport,
};

#[derive(Debug, Subcommand)]
pub enum ImportCommand {
    /// Import clients from CSV (upsert by code)
    Clients { file: PathBuf },
    /// Import orders from CSV, one row per line
    Orders { file: PathBuf },
}

#[derive(Debug, Subcommand)]
pub enum ExportCommand {
    /// Export clients to CSV
    Clients { file: PathBuf },
    /// Export orders to CSV, one row per line
    Orders { file: PathBuf },
}

// =============================================================================
// Responses
// =============================================================================

impl Render for ImportReport {
    fn render_text(&self, _config: &AppConfig) -> String {
        let mut out = format!(
            "✓ Import finished: {} created, {} updated, {} skipped",
            self.created, self.updated, self.skipped
        );
        if self.clients_created > 0 {
            out.push_str(&format!(
                "\n  {} placeholder clients created for unknown codes",
                self.clients_created
            ));
        }
        out
    }
}

impl Render for RestoreReport {
    fn render_text(&self, _config: &AppConfig) -> String {
        let section = |name: &str, r: &ImportReport| {
            format!(
                "\n  {:<8} {} created, {} updated, {} skipped",
                name, r.created, r.updated, r.skipped
            )
        };
        let mut out = "✓ Restore finished".to_string();
        out.push_str(&section("clients", &self.clients));
        out.push_str(&section("orders", &self.orders));
        out.push_str(&section("visits", &self.visits));
        if self.settings_restored {
            out.push_str("\n  settings restored");
        }
        out
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDto {
    pub path: PathBuf,
    pub count: usize,
}

impl Render for ExportDto {
    fn render_text(&self, _config: &AppConfig) -> String {
        format!("✓ {} records written to {}", self.count, self.path.display())
    }
}

// =============================================================================
// Commands
// =============================================================================

fn read_text(path: &Path) -> CliResult<String> {
    fs::read_to_string(path).map_err(|e| {
        CliError::new(
            ErrorCode::IoError,
            format!("Cannot read {}: {}", path.display(), e),
        )
    })
}

fn write_text(path: &Path, text: &str) -> CliResult<()> {
    fs::write(path, text).map_err(|e| {
        CliError::new(
            ErrorCode::IoError,
            format!("Cannot write {}: {}", path.display(), e),
        )
    })
}

pub async fn import_clients(state: &AppState, path: &Path) -> CliResult<ImportReport> {
    let text = read_text(path)?;
    Ok(import_clients_csv(&state.db, &text, state.now()).await?)
}

pub async fn import_orders(state: &AppState, path: &Path) -> CliResult<ImportReport> {
    let text = read_text(path)?;
    Ok(import_orders_csv(&state.db, &text, state.now()).await?)
}

pub async fn export_clients(state: &AppState, path: &Path) -> CliResult<ExportDto> {
    let (text, count) = export_clients_csv(&state.db).await?;
    write_text(path, &text)?;
    info!(path = %path.display(), count, "Clients exported");
    Ok(ExportDto {
        path: path.to_path_buf(),
        count,
    })
}

pub async fn export_orders(state: &AppState, path: &Path) -> CliResult<ExportDto> {
    let (text, count) = export_orders_csv(&state.db).await?;
    write_text(path, &text)?;
    info!(path = %path.display(), count, "Orders exported");
    Ok(ExportDto {
        path: path.to_path_buf(),
        count,
    })
}

/// Writes the whole database as JSON.
pub async fn backup(state: &AppState, path: &Path) -> CliResult<ExportDto> {
    let snapshot = state.db.snapshot().await?;
    let count = snapshot.clients.len() + snapshot.orders.len() + snapshot.visits.len();

    let text = export_json(&state.db, state.now()).await?;
    write_text(path, &text)?;
    info!(path = %path.display(), count, "Backup written");
    Ok(ExportDto {
        path: path.to_path_buf(),
        count,
    })
}

/// Upserts every record of a JSON backup.
pub async fn restore(state: &AppState, path: &Path) -> CliResult<RestoreReport> {
    let text = read_text(path)?;
    Ok(restore_json(&state.db, &text, state.now()).await?)
}

pub async fn run_import(state: &AppState, command: ImportCommand, json: bool) -> CliResult<()> {
    let report = match command {
        ImportCommand::Clients { file } => import_clients(state, &file).await?,
        ImportCommand::Orders { file } => import_orders(state, &file).await?,
    };
    emit(&report, &state.config, json)
}

pub async fn run_export(state: &AppState, command: ExportCommand, json: bool) -> CliResult<()> {
    let response = match command {
        ExportCommand::Clients { file } => export_clients(state, &file).await?,
        ExportCommand::Orders { file } => export_orders(state, &file).await?,
    };
    emit(&response, &state.config, json)
}
