//! # Order Commands
//!
//! `botica order add|edit|lines|list|show|delete`
//!
//! ## Line Specs
//! Lines are typed as `product:quantity:price[:discount%]`:
//! ```text
//! botica order add F-01 --line "Ibuprofeno 600:12:2,35" --line "Gasas:20:0.80:5"
//!                               └── product ──┘ qty price     └ 5% discount
//! ```
//! Line totals and the order total are always recomputed; they are never
//! typed in.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use clap::Subcommand;
use serde::Serialize;
use tracing::{debug, info};

use super::{emit, parse_lines, resolve_client, short_id, Deleted, Render};
use crate::error::CliResult;
use crate::state::{AppConfig, AppState};
use botica_core::merge::random_key;
use botica_core::{CoreError, Money, Order, OrderLine, OrderStatus, QuarterKey};

// =============================================================================
// Arguments
// =============================================================================

#[derive(Debug, Subcommand)]
pub enum OrderCommand {
    /// Record an order
    Add {
        /// Client id or code
        client: String,
        /// Order date (default: today)
        #[arg(long, value_name = "YYYY-MM-DD")]
        date: Option<NaiveDate>,
        /// Keep as draft (not counted in analytics)
        #[arg(long)]
        draft: bool,
        /// Delivery note or ERP reference
        #[arg(long)]
        reference: Option<String>,
        #[arg(long)]
        notes: Option<String>,
        /// product:quantity:price[:discount]
        #[arg(long = "line", required = true)]
        lines: Vec<String>,
    },
    /// Change date, status, reference or notes (blank clears text)
    Edit {
        /// Order id
        order: String,
        #[arg(long, value_name = "YYYY-MM-DD")]
        date: Option<NaiveDate>,
        /// Mark as draft
        #[arg(long, conflicts_with = "confirm")]
        draft: bool,
        /// Mark as confirmed
        #[arg(long)]
        confirm: bool,
        #[arg(long)]
        reference: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Replace every line of an order
    Lines {
        /// Order id
        order: String,
        /// product:quantity:price[:discount]
        #[arg(long = "line", required = true)]
        lines: Vec<String>,
    },
    /// List orders, newest first
    List {
        /// Only this client (id or code)
        #[arg(long)]
        client: Option<String>,
        /// Only this quarter, e.g. 2T26
        #[arg(long)]
        quarter: Option<QuarterKey>,
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Show an order with its lines
    Show {
        /// Order id
        order: String,
    },
    /// Delete an order
    Delete {
        /// Order id
        order: String,
    },
}

/// Input for [`add_order`].
#[derive(Debug, Clone, Default)]
pub struct NewOrder {
    pub client: String,
    pub date: Option<NaiveDate>,
    pub draft: bool,
    pub reference: Option<String>,
    pub notes: Option<String>,
    pub lines: Vec<String>,
}

// =============================================================================
// Responses
// =============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineDto {
    pub product: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub discount_bps: u32,
    pub line_total_cents: i64,
}

impl From<&OrderLine> for LineDto {
    fn from(l: &OrderLine) -> Self {
        LineDto {
            product: l.product.clone(),
            quantity: l.quantity,
            unit_price_cents: l.unit_price.cents(),
            discount_bps: l.discount.bps(),
            line_total_cents: l.line_total.cents(),
        }
    }
}

/// Order with its lines.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDto {
    pub id: String,
    pub client_id: String,
    pub date: DateTime<Utc>,
    pub status: OrderStatus,
    pub reference: Option<String>,
    pub notes: Option<String>,
    pub lines: Vec<LineDto>,
    pub units: i64,
    pub total_cents: i64,
}

impl From<Order> for OrderDto {
    fn from(o: Order) -> Self {
        OrderDto {
            lines: o.lines.iter().map(LineDto::from).collect(),
            units: o.unit_count(),
            id: o.id,
            client_id: o.client_id,
            date: o.date,
            status: o.status,
            reference: o.reference,
            notes: o.notes,
            total_cents: o.total.cents(),
        }
    }
}

impl Render for OrderDto {
    fn render_text(&self, config: &AppConfig) -> String {
        let mut out = format!(
            "✓ Order {} ({})\n  date: {}",
            self.id,
            self.status.as_str(),
            self.date.format("%Y-%m-%d")
        );
        if let Some(reference) = &self.reference {
            out.push_str(&format!("\n  reference: {}", reference));
        }
        if let Some(notes) = &self.notes {
            out.push_str(&format!("\n  notes: {}", notes));
        }
        for line in &self.lines {
            let discount = if line.discount_bps > 0 {
                format!(" -{}", config.format_percentage(botica_core::Percentage::from_bps(line.discount_bps)))
            } else {
                String::new()
            };
            out.push_str(&format!(
                "\n  {:>5} × {:<32} {:>12}{} = {}",
                line.quantity,
                line.product,
                config.format_money(Money::from_cents(line.unit_price_cents)),
                discount,
                config.format_money(Money::from_cents(line.line_total_cents))
            ));
        }
        out.push_str(&format!(
            "\n  total: {} ({} units)",
            config.format_money(Money::from_cents(self.total_cents)),
            self.units
        ));
        out
    }
}

/// One row of an order list.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub id: String,
    pub client_id: String,
    pub date: DateTime<Utc>,
    pub status: OrderStatus,
    pub reference: Option<String>,
    pub line_count: usize,
    pub total_cents: i64,
}

impl From<&Order> for OrderSummary {
    fn from(o: &Order) -> Self {
        OrderSummary {
            id: o.id.clone(),
            client_id: o.client_id.clone(),
            date: o.date,
            status: o.status,
            reference: o.reference.clone(),
            line_count: o.lines.len(),
            total_cents: o.total.cents(),
        }
    }
}

impl OrderSummary {
    pub(crate) fn row(&self, config: &AppConfig) -> String {
        format!(
            "{}  {:<8}  {:<9}  {:>3} lines  {:>14}  {}",
            self.date.format("%Y-%m-%d"),
            short_id(&self.id),
            self.status.as_str(),
            self.line_count,
            config.format_money(Money::from_cents(self.total_cents)),
            self.reference.as_deref().unwrap_or("")
        )
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderList {
    pub orders: Vec<OrderSummary>,
    /// Sum over confirmed orders in the list.
    pub confirmed_total_cents: i64,
}

impl Render for OrderList {
    fn render_text(&self, config: &AppConfig) -> String {
        if self.orders.is_empty() {
            return "No orders".to_string();
        }
        let mut out = self
            .orders
            .iter()
            .map(|o| o.row(config))
            .collect::<Vec<_>>()
            .join("\n");
        out.push_str(&format!(
            "\n{} orders, confirmed total {}",
            self.orders.len(),
            config.format_money(Money::from_cents(self.confirmed_total_cents))
        ));
        out
    }
}

// =============================================================================
// Commands
// =============================================================================

/// Midnight UTC on `date`, matching imported dates.
fn order_date(date: Option<NaiveDate>, now: DateTime<Utc>) -> DateTime<Utc> {
    match date {
        Some(d) => Utc.from_utc_datetime(&d.and_time(NaiveTime::MIN)),
        None => now,
    }
}

pub(crate) async fn load_order(state: &AppState, id: &str) -> CliResult<Order> {
    state
        .db
        .orders()
        .get(id.trim())
        .await?
        .ok_or_else(|| CoreError::OrderNotFound(id.trim().to_string()).into())
}

/// Header changes for [`edit_order`]. `None` leaves a field alone.
#[derive(Debug, Clone, Default)]
pub struct OrderEdit {
    pub date: Option<NaiveDate>,
    pub status: Option<OrderStatus>,
    pub reference: Option<String>,
    pub notes: Option<String>,
}

/// Records a new order for a client.
pub async fn add_order(state: &AppState, input: NewOrder) -> CliResult<OrderDto> {
    debug!(client = %input.client, lines = input.lines.len(), "add_order command");

    let lines = parse_lines(&input.lines)?;
    let client = resolve_client(state, &input.client).await?;
    let now = state.now();

    let status = if input.draft {
        OrderStatus::Draft
    } else {
        OrderStatus::Confirmed
    };

    let mut order = Order::new(
        random_key(),
        client.id,
        order_date(input.date, now),
        status,
        lines,
        now,
    );
    order.reference = input.reference.and_then(super::non_blank);
    order.notes = input.notes.and_then(super::non_blank);

    let saved = state.db.orders().insert(&order).await?;

    info!(id = %saved.id, total_cents = saved.total.cents(), "Order added");
    Ok(saved.into())
}

/// Edits the header of an order; lines and totals are untouched.
pub async fn edit_order(state: &AppState, order_id: &str, edit: OrderEdit) -> CliResult<OrderDto> {
    debug!(order = %order_id, "edit_order command");

    let mut order = load_order(state, order_id).await?;
    let now = state.now();

    if let Some(date) = edit.date {
        order.date = order_date(Some(date), now);
    }
    if let Some(status) = edit.status {
        order.status = status;
    }
    if let Some(reference) = edit.reference {
        order.reference = super::non_blank(reference);
    }
    if let Some(notes) = edit.notes {
        order.notes = super::non_blank(notes);
    }
    order.updated_at = now;

    state.db.orders().update_header(&order).await?;

    info!(id = %order.id, status = order.status.as_str(), "Order updated");
    Ok(order.into())
}

/// Replaces all lines of an order.
pub async fn replace_order_lines(
    state: &AppState,
    order_id: &str,
    specs: &[String],
) -> CliResult<OrderDto> {
    debug!(order = %order_id, lines = specs.len(), "replace_order_lines command");

    let lines = parse_lines(specs)?;
    let order = load_order(state, order_id).await?;
    let saved = state
        .db
        .orders()
        .replace_lines(&order.id, lines, state.now())
        .await?;

    info!(id = %saved.id, total_cents = saved.total.cents(), "Order lines replaced");
    Ok(saved.into())
}

/// Lists orders, optionally for one client and/or one quarter.
pub async fn list_orders(
    state: &AppState,
    client: Option<&str>,
    quarter: Option<QuarterKey>,
    limit: Option<u32>,
) -> CliResult<OrderList> {
    let orders = state.db.orders();

    let mut found = match (client, quarter) {
        (Some(key), _) => {
            let client = resolve_client(state, key).await?;
            orders.list_for_client(&client.id).await?
        }
        (None, Some(q)) => orders.list_between(q.start(), q.end_exclusive()).await?,
        (None, None) => orders.list_all().await?,
    };

    if let Some(q) = quarter {
        found.retain(|o| q.contains(o.date));
    }
    found.truncate(state.limit(limit) as usize);

    let confirmed_total: Money = found
        .iter()
        .filter(|o| o.is_confirmed())
        .map(|o| o.total)
        .sum();

    debug!(count = found.len(), "list_orders command");
    Ok(OrderList {
        orders: found.iter().map(OrderSummary::from).collect(),
        confirmed_total_cents: confirmed_total.cents(),
    })
}

pub async fn show_order(state: &AppState, order_id: &str) -> CliResult<OrderDto> {
    Ok(load_order(state, order_id).await?.into())
}

/// Deletes an order. A visit that carried it keeps existing, unlinked.
pub async fn delete_order(state: &AppState, order_id: &str) -> CliResult<Deleted> {
    let order = load_order(state, order_id).await?;
    state.db.orders().delete(&order.id).await?;

    info!(id = %order.id, "Order deleted");
    Ok(Deleted {
        entity: "order",
        id: order.id,
    })
}

pub async fn run(state: &AppState, command: OrderCommand, json: bool) -> CliResult<()> {
    let config = &state.config;
    match command {
        OrderCommand::Add {
            client,
            date,
            draft,
            reference,
            notes,
            lines,
        } => {
            let input = NewOrder {
                client,
                date,
                draft,
                reference,
                notes,
                lines,
            };
            emit(&add_order(state, input).await?, config, json)
        }
        OrderCommand::Edit {
            order,
            date,
            draft,
            confirm,
            reference,
            notes,
        } => {
            let status = match (draft, confirm) {
                (true, _) => Some(OrderStatus::Draft),
                (_, true) => Some(OrderStatus::Confirmed),
                _ => None,
            };
            let edit = OrderEdit {
                date,
                status,
                reference,
                notes,
            };
            emit(&edit_order(state, &order, edit).await?, config, json)
        }
        OrderCommand::Lines { order, lines } => {
            emit(&replace_order_lines(state, &order, &lines).await?, config, json)
        }
        OrderCommand::List {
            client,
            quarter,
            limit,
        } => emit(
            &list_orders(state, client.as_deref(), quarter, limit).await?,
            config,
            json,
        ),
        OrderCommand::Show { order } => emit(&show_order(state, &order).await?, config, json),
        OrderCommand::Delete { order } => emit(&delete_order(state, &order).await?, config, json),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
