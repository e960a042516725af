//! # Settings Repository
//!
//! Sales settings stored as key/value JSON in the `settings` table.
//!
//! | key                 | value                              |
//! |---------------------|------------------------------------|
//! | `quarterly_targets` | `{"1T26": 5000000, "2T26": ...}`   |
//! | `desired_uplift`    | basis points, e.g. `1000` (10%)    |
//!
//! Reading is lenient: an unparseable quarter key is skipped and a
//! non-numeric amount reads as zero, both with a warning.

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::SqlitePool;
use tracing::{debug, warn};

use crate::error::DbResult;
use botica_core::coerce;
use botica_core::{Money, Percentage, QuarterKey, Settings};

const TARGETS_KEY: &str = "quarterly_targets";
const UPLIFT_KEY: &str = "desired_uplift";

/// Repository for settings.
#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
}

impl SettingsRepository {
    /// Creates a new SettingsRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SettingsRepository { pool }
    }

    /// Loads the settings; missing keys read as defaults.
    pub async fn load(&self) -> DbResult<Settings> {
        let rows: Vec<(String, String)> = sqlx::query_as("SELECT key, value FROM settings")
            .fetch_all(&self.pool)
            .await?;

        let mut settings = Settings::default();

        for (key, raw) in rows {
            let value: Value = match serde_json::from_str(&raw) {
                Ok(value) => value,
                Err(err) => {
                    warn!(key = %key, error = %err, "Ignoring unreadable setting");
                    continue;
                }
            };

            match key.as_str() {
                TARGETS_KEY => read_targets(&value, &mut settings),
                UPLIFT_KEY => settings.desired_uplift = read_bps(&value),
                other => debug!(key = %other, "Ignoring unknown setting"),
            }
        }

        Ok(settings)
    }

    /// Saves every setting.
    pub async fn save(&self, settings: &Settings, now: DateTime<Utc>) -> DbResult<()> {
        debug!(
            targets = settings.quarterly_targets.len(),
            uplift_bps = settings.desired_uplift.bps(),
            "Saving settings"
        );

        let targets = serde_json::to_string(&settings.quarterly_targets)?;
        let uplift = serde_json::to_string(&settings.desired_uplift.bps())?;

        let mut tx = self.pool.begin().await?;
        for (key, value) in [(TARGETS_KEY, targets), (UPLIFT_KEY, uplift)] {
            sqlx::query(
                r#"
                INSERT INTO settings (key, value, updated_at) VALUES (?1, ?2, ?3)
                ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
                "#,
            )
            .bind(key)
            .bind(value)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        Ok(())
    }

    /// Sets (zero clears) the target of one quarter and saves.
    pub async fn set_quarter_target(
        &self,
        quarter: QuarterKey,
        target: Money,
        now: DateTime<Utc>,
    ) -> DbResult<Settings> {
        let mut settings = self.load().await?;
        settings.set_target(quarter, target);
        self.save(&settings, now).await?;
        Ok(settings)
    }

    /// Sets the desired uplift and saves.
    pub async fn set_desired_uplift(
        &self,
        uplift: Percentage,
        now: DateTime<Utc>,
    ) -> DbResult<Settings> {
        let mut settings = self.load().await?;
        settings.desired_uplift = uplift;
        self.save(&settings, now).await?;
        Ok(settings)
    }
}

/// Overlays a settings JSON object (`{"quarterly_targets": .., "desired_uplift": ..}`)
/// onto `settings`. Absent keys leave the current values alone.
pub(crate) fn overlay_json(value: &Value, settings: &mut Settings) {
    if let Some(targets) = value.get(TARGETS_KEY) {
        read_targets(targets, settings);
    }
    if let Some(uplift) = value.get(UPLIFT_KEY) {
        settings.desired_uplift = read_bps(uplift);
    }
}

fn read_targets(value: &Value, settings: &mut Settings) {
    let Some(map) = value.as_object() else {
        warn!("quarterly_targets is not an object; ignoring");
        return;
    };

    for (key, amount) in map {
        match key.parse::<QuarterKey>() {
            Ok(quarter) => settings.set_target(quarter, Money::from_cents(read_i64(amount))),
            Err(err) => warn!(key = %key, error = %err, "Skipping target with bad quarter key"),
        }
    }
}

fn read_i64(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.round() as i64))
            .unwrap_or(0),
        Value::String(s) => coerce::coerce_i64(s),
        _ => 0,
    }
}

fn read_bps(value: &Value) -> Percentage {
    Percentage::from_bps(read_i64(value).clamp(0, u32::MAX as i64) as u32)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    #[tokio::test]
    async fn test_defaults_when_empty() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let settings = db.settings().load().await.unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.settings();
        let q: QuarterKey = "3T26".parse().unwrap();

        repo.set_quarter_target(q, Money::from_cents(4_500_000), now())
            .await
            .unwrap();
        repo.set_desired_uplift(Percentage::from_percentage(12.5), now())
            .await
            .unwrap();

        let loaded = repo.load().await.unwrap();
        assert_eq!(loaded.target_for(q).cents(), 4_500_000);
        assert_eq!(loaded.desired_uplift.bps(), 1250);

        // zero clears
        let cleared = repo.set_quarter_target(q, Money::zero(), now()).await.unwrap();
        assert!(cleared.quarterly_targets.is_empty());
        assert!(repo.load().await.unwrap().quarterly_targets.is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_values_are_tolerated() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        for (key, value) in [
            (TARGETS_KEY, r#"{"1T26": "12,50", "banana": 100, "2T26": 300}"#),
            (UPLIFT_KEY, r#""diez""#),
            ("theme", "not json"),
        ] {
            sqlx::query("INSERT INTO settings (key, value, updated_at) VALUES (?1, ?2, ?3)")
                .bind(key)
                .bind(value)
                .bind(now())
                .execute(db.pool())
                .await
                .unwrap();
        }

        let settings = db.settings().load().await.unwrap();
        // stored amounts are cents: "12,50" rounds to 13
        assert_eq!(settings.quarterly_targets.len(), 2);
        assert_eq!(settings.target_for("1T26".parse().unwrap()).cents(), 13);
        assert_eq!(settings.target_for("2T26".parse().unwrap()).cents(), 300);
        assert!(settings.desired_uplift.is_zero());
    }
}
