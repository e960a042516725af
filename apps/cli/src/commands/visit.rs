//! # Visit Commands
//!
//! `botica visit log|list|quick-order`
//!
//! A visit can carry at most one order. `quick-order` creates the order at
//! the visit's date and links it in one step:
//!
//! ```text
//!   visit (no order) ──quick-order──► order inserted ──► visit.order_id set
//!                                           │                   │
//!                                           │          link fails│
//!                                           └──── deleted ◄──────┘
//! ```

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use clap::Subcommand;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::order::{load_order, OrderDto};
use super::{emit, non_blank, parse_lines, resolve_client, short_id, Render};
use crate::error::CliResult;
use crate::state::{AppConfig, AppState};
use botica_core::merge::random_key;
use botica_core::{CoreError, Order, OrderStatus, Visit};

#[derive(Debug, Subcommand)]
pub enum VisitCommand {
    /// Log a visit to a client
    Log {
        /// Client id or code
        client: String,
        #[arg(long)]
        notes: Option<String>,
        /// e.g. "order", "no stock needed", "call back"
        #[arg(long)]
        outcome: Option<String>,
        #[arg(long, value_name = "YYYY-MM-DD")]
        date: Option<NaiveDate>,
    },
    /// List visits, newest first
    List {
        /// Only this client (id or code)
        #[arg(long)]
        client: Option<String>,
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Record the order taken during a visit
    QuickOrder {
        /// Visit id
        visit: String,
        /// product:quantity:price[:discount]
        #[arg(long = "line", required = true)]
        lines: Vec<String>,
        #[arg(long)]
        reference: Option<String>,
        #[arg(long)]
        draft: bool,
    },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitDto {
    pub id: String,
    pub client_id: String,
    pub date: DateTime<Utc>,
    pub notes: Option<String>,
    pub outcome: Option<String>,
    pub order_id: Option<String>,
}

impl From<Visit> for VisitDto {
    fn from(v: Visit) -> Self {
        VisitDto {
            id: v.id,
            client_id: v.client_id,
            date: v.date,
            notes: v.notes,
            outcome: v.outcome,
            order_id: v.order_id,
        }
    }
}

impl VisitDto {
    pub(crate) fn row(&self) -> String {
        let order = match &self.order_id {
            Some(id) => format!("order {}", short_id(id)),
            None => "-".to_string(),
        };
        format!(
            "{}  {:<8}  {:<20}  {:<14}  {}",
            self.date.format("%Y-%m-%d"),
            short_id(&self.id),
            self.outcome.as_deref().unwrap_or(""),
            order,
            self.notes.as_deref().unwrap_or("")
        )
    }
}

impl Render for VisitDto {
    fn render_text(&self, _config: &AppConfig) -> String {
        format!("✓ Visit {} logged\n  {}", self.id, self.row())
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct VisitList(pub Vec<VisitDto>);

impl Render for VisitList {
    fn render_text(&self, _config: &AppConfig) -> String {
        if self.0.is_empty() {
            return "No visits".to_string();
        }
        self.0.iter().map(VisitDto::row).collect::<Vec<_>>().join("\n")
    }
}

/// Visit together with the order created for it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickOrderResult {
    pub visit_id: String,
    pub order: OrderDto,
}

impl Render for QuickOrderResult {
    fn render_text(&self, config: &AppConfig) -> String {
        format!(
            "{}\n  linked to visit {}",
            self.order.render_text(config),
            self.visit_id
        )
    }
}

// =============================================================================
// Commands
// =============================================================================

pub async fn log_visit(
    state: &AppState,
    client: &str,
    notes: Option<String>,
    outcome: Option<String>,
    date: Option<NaiveDate>,
) -> CliResult<VisitDto> {
    let client = resolve_client(state, client).await?;
    let now = state.now();

    let visit = Visit {
        id: random_key(),
        client_id: client.id,
        date: date
            .map(|d| Utc.from_utc_datetime(&d.and_time(NaiveTime::MIN)))
            .unwrap_or(now),
        notes: notes.and_then(non_blank),
        outcome: outcome.and_then(non_blank),
        order_id: None,
        created_at: now,
    };
    state.db.visits().insert(&visit).await?;

    info!(id = %visit.id, client_id = %visit.client_id, "Visit logged");
    Ok(visit.into())
}

pub async fn list_visits(
    state: &AppState,
    client: Option<&str>,
    limit: Option<u32>,
) -> CliResult<VisitList> {
    let limit = state.limit(limit);
    let visits = match client {
        Some(key) => {
            let client = resolve_client(state, key).await?;
            let mut visits = state.db.visits().list_for_client(&client.id).await?;
            visits.truncate(limit as usize);
            visits
        }
        None => state.db.visits().list_recent(limit).await?,
    };

    debug!(count = visits.len(), "list_visits command");
    Ok(VisitList(visits.into_iter().map(VisitDto::from).collect()))
}

/// Creates an order at the visit's date and links it to the visit.
pub async fn quick_order(
    state: &AppState,
    visit_id: &str,
    specs: &[String],
    reference: Option<String>,
    draft: bool,
) -> CliResult<QuickOrderResult> {
    let visit = state
        .db
        .visits()
        .get(visit_id.trim())
        .await?
        .ok_or_else(|| CoreError::VisitNotFound(visit_id.trim().to_string()))?;

    if let Some(order_id) = visit.order_id {
        return Err(CoreError::VisitAlreadyOrdered {
            visit_id: visit.id,
            order_id,
        }
        .into());
    }

    let lines = parse_lines(specs)?;
    let now = state.now();
    let status = if draft {
        OrderStatus::Draft
    } else {
        OrderStatus::Confirmed
    };

    let mut order = Order::new(random_key(), &visit.client_id, visit.date, status, lines, now);
    order.reference = reference.and_then(non_blank);
    let saved = state.db.orders().insert(&order).await?;

    if let Err(err) = state.db.visits().link_order(&visit.id, &saved.id).await {
        warn!(visit_id = %visit.id, order_id = %saved.id, "Linking failed, removing order");
        state.db.orders().delete(&saved.id).await?;
        return Err(err.into());
    }

    info!(visit_id = %visit.id, order_id = %saved.id, "Quick order recorded");
    let order = load_order(state, &saved.id).await?;
    Ok(QuickOrderResult {
        visit_id: visit.id,
        order: order.into(),
    })
}

pub async fn run(state: &AppState, command: VisitCommand, json: bool) -> CliResult<()> {
    let config = &state.config;
    match command {
        VisitCommand::Log {
            client,
            notes,
            outcome,
            date,
        } => emit(
            &log_visit(state, &client, notes, outcome, date).await?,
            config,
            json,
        ),
        VisitCommand::List { client, limit } => {
            emit(&list_visits(state, client.as_deref(), limit).await?, config, json)
        }
        VisitCommand::QuickOrder {
            visit,
            lines,
            reference,
            draft,
        } => emit(
            &quick_order(state, &visit, &lines, reference, draft).await?,
            config,
            json,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::client::{add_client, ClientFields};
    use crate::error::ErrorCode;
    use crate::state::testing::{day, state_at};

    async fn with_client() -> AppState {
        let state = state_at(day(2026, 5, 20)).await;
        let fields = ClientFields {
            code: Some("F-01".to_string()),
            ..Default::default()
        };
        add_client(&state, "Farmacia Sol".to_string(), fields)
            .await
            .unwrap();
        state
    }

    #[tokio::test]
    async fn test_log_and_list() {
        let state = with_client().await;
        log_visit(&state, "F-01", Some("  ".to_string()), None, Some(day(2026, 5, 1)))
            .await
            .unwrap();
        let latest = log_visit(&state, "F-01", Some("stock ok".to_string()), None, None)
            .await
            .unwrap();

        assert_eq!(latest.date, state.now());

        let listed = list_visits(&state, Some("F-01"), None).await.unwrap();
        assert_eq!(listed.0.len(), 2);
        assert_eq!(listed.0[0].id, latest.id);
        assert_eq!(listed.0[1].notes, None);

        let recent = list_visits(&state, None, Some(1)).await.unwrap();
        assert_eq!(recent.0.len(), 1);
    }

    #[tokio::test]
    async fn test_quick_order_links_once() {
        let state = with_client().await;
        let visit = log_visit(&state, "F-01", None, None, Some(day(2026, 5, 12)))
            .await
            .unwrap();
        let specs = vec!["Gasas:10:0.80".to_string()];

        let result = quick_order(&state, &visit.id, &specs, None, false)
            .await
            .unwrap();
        assert_eq!(result.order.total_cents, 800);
        assert_eq!(result.order.date, visit.date);

        let stored = state.db.visits().get(&visit.id).await.unwrap().unwrap();
        assert_eq!(stored.order_id.as_deref(), Some(result.order.id.as_str()));

        let err = quick_order(&state, &visit.id, &specs, None, false)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::BusinessLogic);
        assert_eq!(state.db.orders().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_quick_order_unknown_visit() {
        let state = with_client().await;
        let err = quick_order(&state, "nope", &["A:1:1".to_string()], None, false)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
