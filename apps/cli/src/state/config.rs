//! # Configuration
//!
//! Application configuration loaded at startup.
//!
//! ## Configuration Sources (Priority Order)
//! 1. Environment variables (`BOTICA_*`, e.g. `BOTICA_DUE_SOON_DAYS=10`)
//! 2. Config file (`--config <path>`, else `<config dir>/botica.toml` if present)
//! 3. Defaults (this file)
//!
//! `--db` on the command line beats all three for the database path.
//!
//! ## Example `botica.toml`
//! ```toml
//! database_path = "/home/ana/botica/botica.db"
//! currency_symbol = "€"
//! due_soon_days = 10
//! ```

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::CliResult;
use botica_core::{Money, Percentage};

const CONFIG_FILE: &str = "botica.toml";
const DATABASE_FILE: &str = "botica.db";

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Database file. Default: platform data dir, `botica.db`.
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// Currency symbol (for display)
    pub currency_symbol: String,

    /// Number of decimal places for currency
    pub currency_decimals: u8,

    /// `12.50 €` rather than `€12.50`
    pub symbol_after_amount: bool,

    /// Clients whose next order falls within this many days are "due soon"
    pub due_soon_days: i64,

    /// Rows shown by list commands when `--limit` is not given
    pub default_list_limit: u32,
}

impl Default for AppConfig {
    /// ## Default Values
    /// - Currency: € after the amount, 2 decimals
    /// - Due soon: 7 days
    /// - Lists: 50 rows
    fn default() -> Self {
        AppConfig {
            database_path: None,
            currency_symbol: "€".to_string(),
            currency_decimals: 2,
            symbol_after_amount: true,
            due_soon_days: 7,
            default_list_limit: 50,
        }
    }
}

impl AppConfig {
    /// Loads defaults, then the config file, then `BOTICA_*` variables.
    ///
    /// An explicit `config_file` must exist; the default location is optional.
    pub fn load(config_file: Option<&Path>) -> CliResult<Self> {
        let defaults = AppConfig::default();

        let mut builder = config::Config::builder()
            .set_default("currency_symbol", defaults.currency_symbol)?
            .set_default("currency_decimals", defaults.currency_decimals as i64)?
            .set_default("symbol_after_amount", defaults.symbol_after_amount)?
            .set_default("due_soon_days", defaults.due_soon_days)?
            .set_default("default_list_limit", defaults.default_list_limit as i64)?;

        match config_file {
            Some(path) => {
                builder = builder.add_source(config::File::from(path).required(true));
            }
            None => {
                if let Some(path) = default_config_file() {
                    builder = builder.add_source(config::File::from(path).required(false));
                }
            }
        }

        let config: AppConfig = builder
            .add_source(config::Environment::with_prefix("BOTICA").try_parsing(true))
            .build()?
            .try_deserialize()?;

        tracing::debug!(?config, "Configuration loaded");
        Ok(config)
    }

    /// The configured database path, or the platform data directory.
    ///
    /// ## Platform-Specific Paths
    /// - **macOS**: `~/Library/Application Support/com.botica.botica/botica.db`
    /// - **Windows**: `%APPDATA%\botica\botica\data\botica.db`
    /// - **Linux**: `~/.local/share/botica/botica.db`
    pub fn resolve_database_path(&self) -> CliResult<PathBuf> {
        if let Some(path) = &self.database_path {
            return Ok(path.clone());
        }

        let dirs = project_dirs().ok_or_else(|| {
            crate::error::CliError::new(
                crate::error::ErrorCode::ConfigError,
                "Could not determine app data directory; set BOTICA_DATABASE_PATH",
            )
        })?;

        let data_dir = dirs.data_dir();
        std::fs::create_dir_all(data_dir)?;

        Ok(data_dir.join(DATABASE_FILE))
    }

    /// Formats an amount for display.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let config = AppConfig::default();
    /// assert_eq!(config.format_money(Money::from_cents(123456)), "1234.56 €");
    /// ```
    pub fn format_money(&self, amount: Money) -> String {
        let cents = amount.cents();
        let number = if self.currency_decimals >= 2 {
            format!("{}{}.{:02}", sign(cents), (cents / 100).abs(), (cents % 100).abs())
        } else {
            // Rounded to whole units
            let whole = Money::from_cents(cents).divide_by(100).cents();
            format!("{}{}", sign(whole), whole.abs())
        };

        if self.symbol_after_amount {
            format!("{} {}", number, self.currency_symbol)
        } else {
            format!("{}{}", self.currency_symbol, number)
        }
    }

    /// `12.5%`, `10%`.
    pub fn format_percentage(&self, pct: Percentage) -> String {
        let bps = pct.bps();
        if bps % 100 == 0 {
            format!("{}%", bps / 100)
        } else {
            format!("{}%", pct.percentage())
        }
    }
}

fn sign(value: i64) -> &'static str {
    if value < 0 {
        "-"
    } else {
        ""
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "botica", "botica")
}

fn default_config_file() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_money() {
        let config = AppConfig::default();
        assert_eq!(config.format_money(Money::from_cents(123456)), "1234.56 €");
        assert_eq!(config.format_money(Money::from_cents(5)), "0.05 €");
        assert_eq!(config.format_money(Money::from_cents(-250)), "-2.50 €");
    }

    #[test]
    fn test_format_money_symbol_first() {
        let config = AppConfig {
            currency_symbol: "$".to_string(),
            symbol_after_amount: false,
            ..AppConfig::default()
        };
        assert_eq!(config.format_money(Money::from_cents(1234)), "$12.34");
    }

    #[test]
    fn test_format_money_whole_units() {
        let config = AppConfig {
            currency_decimals: 0,
            ..AppConfig::default()
        };
        assert_eq!(config.format_money(Money::from_cents(1250)), "13 €");
    }

    #[test]
    fn test_format_percentage() {
        let config = AppConfig::default();
        assert_eq!(config.format_percentage(Percentage::from_bps(1000)), "10%");
        assert_eq!(config.format_percentage(Percentage::from_bps(1250)), "12.5%");
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("botica-test-{}.toml", std::process::id()));
        std::fs::write(&path, "due_soon_days = 12\ncurrency_symbol = \"EUR\"\n").unwrap();

        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.due_soon_days, 12);
        assert_eq!(config.currency_symbol, "EUR");
        assert_eq!(config.default_list_limit, 50);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_missing_explicit_file_fails() {
        let missing = Path::new("/nonexistent/botica.toml");
        assert!(AppConfig::load(Some(missing)).is_err());
    }
}
