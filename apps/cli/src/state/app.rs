//! # Application State
//!
//! Database handle, configuration and clock for one invocation.

use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use super::AppConfig;
use crate::error::CliResult;
use botica_core::Clock;
use botica_db::{Database, DbConfig};

/// Shared state handed to every command.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: AppConfig,
    clock: Arc<dyn Clock>,
}

impl AppState {
    /// Opens (creating and migrating if needed) the database at `db_path`.
    pub async fn open(
        config: AppConfig,
        db_path: PathBuf,
        clock: Arc<dyn Clock>,
    ) -> CliResult<Self> {
        info!(?db_path, "Opening database");
        let db = Database::new(DbConfig::new(db_path)).await?;
        Ok(AppState::new(db, config, clock))
    }

    /// Wraps an already open database.
    pub fn new(db: Database, config: AppConfig, clock: Arc<dyn Clock>) -> Self {
        AppState { db, config, clock }
    }

    /// The instant commands treat as "now".
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Default row limit for list commands.
    pub fn limit(&self, requested: Option<u32>) -> u32 {
        requested.unwrap_or(self.config.default_list_limit).clamp(1, 10_000)
    }
}
