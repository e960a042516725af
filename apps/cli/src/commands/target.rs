//! # Target Commands
//!
//! `botica target set|uplift|show`
//!
//! Targets are stored per quarter key (`1T26`, `2T26`, ...). Setting a
//! target of zero clears it. The desired uplift applies to every quarter.

use clap::Subcommand;
use serde::Serialize;
use tracing::info;

use super::{emit, Render};
use crate::error::{CliError, CliResult};
use crate::state::{AppConfig, AppState};
use botica_core::coerce::parse_cents;
use botica_core::validation::{validate_target_cents, validate_uplift};
use botica_core::{Money, Percentage, QuarterKey, Settings};

#[derive(Debug, Subcommand)]
pub enum TargetCommand {
    /// Set the sales target of a quarter (0 clears it)
    Set {
        /// Quarter key, e.g. 3T26
        quarter: QuarterKey,
        /// Amount, e.g. 45000 or "45.000,00"
        amount: String,
    },
    /// Set the desired uplift over every target, in percent
    Uplift { percent: f64 },
    /// Show targets and the desired uplift
    Show,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetRow {
    pub quarter: QuarterKey,
    pub target_cents: i64,
    pub desired_target_cents: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetsDto {
    /// Oldest quarter first.
    pub targets: Vec<TargetRow>,
    pub desired_uplift_bps: u32,
}

impl From<&Settings> for TargetsDto {
    fn from(settings: &Settings) -> Self {
        let uplift = settings.desired_uplift;
        TargetsDto {
            targets: settings
                .quarterly_targets
                .iter()
                .map(|(quarter, target)| TargetRow {
                    quarter: *quarter,
                    target_cents: target.cents(),
                    desired_target_cents: target.apply_uplift(uplift).cents(),
                })
                .collect(),
            desired_uplift_bps: uplift.bps(),
        }
    }
}

impl Render for TargetsDto {
    fn render_text(&self, config: &AppConfig) -> String {
        let uplift = Percentage::from_bps(self.desired_uplift_bps);
        let mut out = format!("Desired uplift: {}", config.format_percentage(uplift));
        if self.targets.is_empty() {
            out.push_str("\nNo quarterly targets set");
        }
        for row in &self.targets {
            out.push_str(&format!(
                "\n  {:<5} {:>14}   desired {:>14}",
                row.quarter.to_string(),
                config.format_money(Money::from_cents(row.target_cents)),
                config.format_money(Money::from_cents(row.desired_target_cents))
            ));
        }
        out
    }
}

pub async fn set_target(
    state: &AppState,
    quarter: QuarterKey,
    amount: &str,
) -> CliResult<TargetsDto> {
    let cents = parse_cents(amount)
        .ok_or_else(|| CliError::validation(format!("Not an amount: {}", amount.trim())))?;
    validate_target_cents(cents)?;

    let settings = state
        .db
        .settings()
        .set_quarter_target(quarter, Money::from_cents(cents), state.now())
        .await?;

    info!(%quarter, target_cents = cents, "Quarter target set");
    Ok(TargetsDto::from(&settings))
}

pub async fn set_uplift(state: &AppState, percent: f64) -> CliResult<TargetsDto> {
    if !percent.is_finite() || percent < 0.0 {
        return Err(CliError::validation(format!(
            "Uplift must be a non-negative percentage, got {}",
            percent
        )));
    }
    let uplift = Percentage::from_percentage(percent);
    validate_uplift(uplift)?;

    let settings = state
        .db
        .settings()
        .set_desired_uplift(uplift, state.now())
        .await?;

    info!(uplift_bps = uplift.bps(), "Desired uplift set");
    Ok(TargetsDto::from(&settings))
}

pub async fn show_targets(state: &AppState) -> CliResult<TargetsDto> {
    let settings = state.db.settings().load().await?;
    Ok(TargetsDto::from(&settings))
}

pub async fn run(state: &AppState, command: TargetCommand, json: bool) -> CliResult<()> {
    let response = match command {
        TargetCommand::Set { quarter, amount } => set_target(state, quarter, &amount).await?,
        TargetCommand::Uplift { percent } => set_uplift(state, percent).await?,
        TargetCommand::Show => show_targets(state).await?,
    };
    emit(&response, &state.config, json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::state::testing::{day, state_at};

    fn q(key: &str) -> QuarterKey {
        key.parse().unwrap()
    }

    #[tokio::test]
    async fn test_set_and_clear_targets() {
        let state = state_at(day(2026, 5, 20)).await;

        set_target(&state, q("3T26"), "45.000,00").await.unwrap();
        let dto = set_target(&state, q("2T26"), "30000").await.unwrap();
        assert_eq!(dto.targets.len(), 2);
        assert_eq!(dto.targets[0].quarter, q("2T26"));
        assert_eq!(dto.targets[1].target_cents, 4_500_000);

        let dto = set_target(&state, q("3T26"), "0").await.unwrap();
        assert_eq!(dto.targets.len(), 1);
    }

    #[tokio::test]
    async fn test_uplift_applies_to_desired_target() {
        let state = state_at(day(2026, 5, 20)).await;
        set_target(&state, q("2T26"), "1000").await.unwrap();

        let dto = set_uplift(&state, 10.0).await.unwrap();
        assert_eq!(dto.desired_uplift_bps, 1000);
        assert_eq!(dto.targets[0].desired_target_cents, 110_000);

        let shown = show_targets(&state).await.unwrap();
        assert_eq!(shown.desired_uplift_bps, 1000);
        assert!(shown.render_text(&state.config).contains("10%"));
    }

    #[tokio::test]
    async fn test_rejects_bad_values() {
        let state = state_at(day(2026, 5, 20)).await;

        let err = set_target(&state, q("2T26"), "lots").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        let err = set_target(&state, q("2T26"), "-5").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        assert!(set_uplift(&state, -1.0).await.is_err());
        assert!(set_uplift(&state, 250.0).await.is_err());
        assert_eq!(show_targets(&state).await.unwrap().desired_uplift_bps, 0);
    }
}
