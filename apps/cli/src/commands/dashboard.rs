//! # Dashboard
//!
//! One screen: how the current quarter is going and who should be ordering.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Snapshot ──► project_for_settings ──► quarter progress / pacing        │
//! │      │                                                                  │
//! │      └──► orders_by_client ──► estimate ──► status ──► due list         │
//! │                                              (overdue, due soon)        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use super::Render;
use crate::error::CliResult;
use crate::state::{AppConfig, AppState};
use botica_core::{estimate, project_for_settings, CadenceStatus, Money, QuarterProjection};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DueClient {
    pub client_id: String,
    pub label: String,
    pub status: CadenceStatus,
    pub next_date: Option<DateTime<Utc>>,
    /// Negative when overdue.
    pub days_until_next: Option<i64>,
    pub avg_interval_days: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardDto {
    pub as_of: DateTime<Utc>,
    pub projection: QuarterProjection,
    /// Overdue and due-soon clients, earliest expected order first.
    pub due: Vec<DueClient>,
    pub on_track: usize,
    /// Clients with too few confirmed orders to estimate.
    pub no_estimate: usize,
}

impl Render for DashboardDto {
    fn render_text(&self, config: &AppConfig) -> String {
        let p = &self.projection;
        let money = |m: Money| config.format_money(m);

        let mut out = format!(
            "Quarter {} (as of {})\n  sales:   {} of {} ({}%)",
            p.quarter,
            self.as_of.format("%Y-%m-%d"),
            money(p.sales_so_far),
            money(p.target),
            p.progress_pct
        );
        if p.target.is_zero() {
            out.push_str("\n  no target set");
        } else if p.on_target() {
            out.push_str("\n  ✓ target reached");
        } else {
            out.push_str(&format!(
                "\n  missing: {}  ({} / day, {} / week, {} days left)",
                money(p.shortfall),
                money(p.per_day),
                money(p.per_week),
                p.days_left
            ));
        }
        if p.desired_target != p.target {
            out.push_str(&format!(
                "\n  desired: {} ({}%), missing {}  ({} / week)",
                money(p.desired_target),
                p.progress_pct_desired,
                money(p.desired_shortfall),
                money(p.per_week_desired)
            ));
        }

        out.push_str(&format!(
            "\n\nDue clients: {}   on track: {}   no estimate: {}",
            self.due.len(),
            self.on_track,
            self.no_estimate
        ));
        for due in &self.due {
            let when = match (due.next_date, due.days_until_next) {
                (Some(date), Some(days)) if days < 0 => {
                    format!("{} ({} days late)", date.format("%Y-%m-%d"), -days)
                }
                (Some(date), Some(days)) => format!("{} (in {} days)", date.format("%Y-%m-%d"), days),
                _ => String::new(),
            };
            out.push_str(&format!(
                "\n  {:<9} {:<36} {}",
                due.status.label(),
                due.label,
                when
            ));
        }
        out
    }
}

/// Builds the dashboard as of the state's clock.
pub async fn dashboard(state: &AppState) -> CliResult<DashboardDto> {
    let now = state.now();
    let snapshot = state.db.snapshot().await?;
    let projection = project_for_settings(now, &snapshot.settings, &snapshot.orders);

    let by_client = snapshot.orders_by_client();
    let mut due = Vec::new();
    let mut on_track = 0;
    let mut no_estimate = 0;

    for client in &snapshot.clients {
        let orders = by_client
            .get(client.id.as_str())
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        let cadence = estimate(orders);

        match cadence.status(now, state.config.due_soon_days) {
            CadenceStatus::Unknown => no_estimate += 1,
            CadenceStatus::OnTrack => on_track += 1,
            status => due.push(DueClient {
                client_id: client.id.clone(),
                label: client.label(),
                status,
                next_date: cadence.next_date,
                days_until_next: cadence.days_until_next(now),
                avg_interval_days: cadence.avg_interval_days,
            }),
        }
    }

    due.sort_by(|a, b| a.next_date.cmp(&b.next_date).then_with(|| a.label.cmp(&b.label)));

    debug!(due = due.len(), on_track, no_estimate, "dashboard command");
    Ok(DashboardDto {
        as_of: now,
        projection,
        due,
        on_track,
        no_estimate,
    })
}
