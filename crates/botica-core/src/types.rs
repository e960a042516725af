//! # Domain Types
//!
//! Core domain types used throughout Botica.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     Client      │   │      Order      │   │     Visit       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │◄──│  client_id (FK) │   │  client_id (FK) │       │
//! │  │  code (import)  │   │  date, status   │◄──│  order_id (opt) │       │
//! │  │  name, address  │   │  lines, total   │   │  notes, outcome │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   Percentage    │   │   OrderStatus   │   │    Settings     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  bps (u32)      │   │  Confirmed      │   │  targets by     │       │
//! │  │  1250 = 12.5%   │   │  Draft          │   │  QuarterKey     │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! - Clients imported from a spreadsheet carry `code`; their `id` is derived
//!   from it (see [`crate::merge::client_key`]) so re-imports upsert.
//! - Manually created clients get a random UUID v4.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::coerce;
use crate::money::Money;
use crate::quarter::QuarterKey;

// =============================================================================
// Percentage
// =============================================================================

/// A percentage stored in basis points (1 bp = 0.01%).
///
/// Used for line discounts and the desired uplift over a quarterly target.
/// Negative inputs clamp to zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Percentage(u32);

impl Percentage {
    /// Creates a percentage from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        Percentage(bps)
    }

    /// Creates a percentage from a human value (`12.5` = 12.5%).
    pub fn from_percentage(pct: f64) -> Self {
        if !pct.is_finite() || pct <= 0.0 {
            return Percentage(0);
        }
        Percentage((pct * 100.0).round().min(u32::MAX as f64) as u32)
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the value as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Percentage(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for Percentage {
    fn default() -> Self {
        Percentage::zero()
    }
}

// =============================================================================
// Order Status
// =============================================================================

/// Lifecycle label of an order. Only confirmed orders count toward
/// analytics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Settled sale.
    Confirmed,
    /// Being prepared; ignored by cadence and projections.
    Draft,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Draft => "draft",
        }
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Confirmed
    }
}

// =============================================================================
// Order Line
// =============================================================================

/// Input for a single order line, before its total is computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineInput {
    pub product: String,
    pub quantity: i64,
    pub unit_price: Money,
    #[serde(default)]
    pub discount: Percentage,
}

/// A priced line of an order.
///
/// `line_total` is always `round2(quantity × unit_price × (1 − discount))`;
/// construct through [`OrderLine::new`] to keep it that way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    #[serde(default)]
    pub product: String,
    #[serde(default, deserialize_with = "coerce::lenient_i64")]
    pub quantity: i64,
    #[serde(default, deserialize_with = "coerce::lenient_money")]
    pub unit_price: Money,
    #[serde(default, deserialize_with = "coerce::lenient_percentage")]
    pub discount: Percentage,
    #[serde(default, deserialize_with = "coerce::lenient_money")]
    pub line_total: Money,
}

impl OrderLine {
    /// Builds a line and computes its total.
    ///
    /// ```rust
    /// use botica_core::money::Money;
    /// use botica_core::types::{OrderLine, Percentage};
    ///
    /// let line = OrderLine::new("Ibuprofeno 600", 4, Money::from_cents(325), Percentage::from_percentage(5.0));
    /// assert_eq!(line.line_total.cents(), 1235);
    /// ```
    pub fn new(
        product: impl Into<String>,
        quantity: i64,
        unit_price: Money,
        discount: Percentage,
    ) -> Self {
        let line_total = Self::compute_total(quantity, unit_price, discount);
        OrderLine {
            product: product.into(),
            quantity,
            unit_price,
            discount,
            line_total,
        }
    }

    /// `quantity × unit_price × (1 − discount/100)`, rounded to the cent.
    pub fn compute_total(quantity: i64, unit_price: Money, discount: Percentage) -> Money {
        unit_price.multiply_quantity(quantity).apply_discount(discount)
    }

    /// Recomputes `line_total` from the other fields.
    pub fn recompute(&mut self) {
        self.line_total = Self::compute_total(self.quantity, self.unit_price, self.discount);
    }
}

impl From<LineInput> for OrderLine {
    fn from(input: LineInput) -> Self {
        OrderLine::new(input.product, input.quantity, input.unit_price, input.discount)
    }
}

// =============================================================================
// Order
// =============================================================================

/// An order placed by a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub client_id: String,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub status: OrderStatus,
    /// External reference (delivery note, ERP number) when imported.
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub lines: Vec<OrderLine>,
    #[serde(default, deserialize_with = "coerce::lenient_money")]
    pub total: Money,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Creates an order and computes its total from `lines`.
    pub fn new(
        id: impl Into<String>,
        client_id: impl Into<String>,
        date: DateTime<Utc>,
        status: OrderStatus,
        lines: Vec<OrderLine>,
        now: DateTime<Utc>,
    ) -> Self {
        let mut order = Order {
            id: id.into(),
            client_id: client_id.into(),
            date,
            status,
            reference: None,
            notes: None,
            lines,
            total: Money::zero(),
            created_at: now,
            updated_at: now,
        };
        order.recompute_totals();
        order
    }

    /// Recomputes every line total and the order total.
    pub fn recompute_totals(&mut self) {
        for line in &mut self.lines {
            line.recompute();
        }
        self.total = self.lines.iter().map(|l| l.line_total).sum();
    }

    /// Replaces all lines and recomputes totals.
    pub fn replace_lines(&mut self, lines: Vec<OrderLine>, now: DateTime<Utc>) {
        self.lines = lines;
        self.recompute_totals();
        self.updated_at = now;
    }

    #[inline]
    pub fn is_confirmed(&self) -> bool {
        self.status == OrderStatus::Confirmed
    }

    /// Total units across all lines.
    pub fn unit_count(&self) -> i64 {
        self.lines
            .iter()
            .fold(0_i64, |units, l| units.saturating_add(l.quantity))
    }
}

// =============================================================================
// Client
// =============================================================================

/// A pharmacy the representative sells to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: String,
    /// Code from the distributor's spreadsheet; the natural key for imports.
    #[serde(default)]
    pub code: Option<String>,
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub province: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub contact_person: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Client {
    /// Creates a client with only identity and name set.
    pub fn new(id: impl Into<String>, name: impl Into<String>, now: DateTime<Utc>) -> Self {
        Client {
            id: id.into(),
            code: None,
            name: name.into(),
            address: None,
            city: None,
            province: None,
            postal_code: None,
            phone: None,
            email: None,
            contact_person: None,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// `"NAME (CODE)"` or just the name.
    pub fn label(&self) -> String {
        match &self.code {
            Some(code) => format!("{} ({})", self.name, code),
            None => self.name.clone(),
        }
    }
}

// =============================================================================
// Visit
// =============================================================================

/// A sales visit to a pharmacy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Visit {
    pub id: String,
    pub client_id: String,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub outcome: Option<String>,
    /// Order placed during the visit, if any.
    #[serde(default)]
    pub order_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Settings
// =============================================================================

/// Process-wide sales settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Target per quarter, keyed by `"<q>T<yy>"`.
    #[serde(default)]
    pub quarterly_targets: BTreeMap<QuarterKey, Money>,
    /// Stretch goal on top of the target.
    #[serde(default, deserialize_with = "coerce::lenient_percentage")]
    pub desired_uplift: Percentage,
}

impl Settings {
    /// Target for `quarter`, zero when unset.
    pub fn target_for(&self, quarter: QuarterKey) -> Money {
        self.quarterly_targets
            .get(&quarter)
            .copied()
            .unwrap_or_default()
    }

    /// Sets (or clears, when zero) the target for `quarter`.
    pub fn set_target(&mut self, quarter: QuarterKey, target: Money) {
        if target.is_zero() {
            self.quarterly_targets.remove(&quarter);
        } else {
            self.quarterly_targets.insert(quarter, target);
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 4, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_percentage_from_percentage() {
        assert_eq!(Percentage::from_percentage(12.5).bps(), 1250);
        assert_eq!(Percentage::from_percentage(-3.0).bps(), 0);
        assert_eq!(Percentage::from_percentage(f64::NAN).bps(), 0);
        assert!((Percentage::from_bps(825).percentage() - 8.25).abs() < 0.001);
    }

    #[test]
    fn test_order_total_is_sum_of_lines() {
        let lines = vec![
            OrderLine::new("A", 3, Money::from_cents(333), Percentage::from_percentage(15.0)),
            OrderLine::new("B", 2, Money::from_cents(1000), Percentage::zero()),
        ];
        let order = Order::new("o1", "c1", ts(), OrderStatus::Confirmed, lines, ts());

        assert_eq!(order.lines[0].line_total.cents(), 849);
        assert_eq!(order.total.cents(), 849 + 2000);
        assert_eq!(order.unit_count(), 5);
    }

    #[test]
    fn test_replace_lines_recomputes() {
        let mut order = Order::new("o1", "c1", ts(), OrderStatus::Confirmed, vec![], ts());
        assert!(order.total.is_zero());

        let mut stale = OrderLine::new("A", 1, Money::from_cents(500), Percentage::zero());
        stale.line_total = Money::from_cents(1);
        order.replace_lines(vec![stale], ts());

        assert_eq!(order.lines[0].line_total.cents(), 500);
        assert_eq!(order.total.cents(), 500);
    }

    #[test]
    fn test_order_status_default() {
        assert_eq!(OrderStatus::default(), OrderStatus::Confirmed);
        assert_eq!(OrderStatus::Draft.as_str(), "draft");
    }

    #[test]
    fn test_settings_target_lookup() {
        let mut settings = Settings::default();
        let q: QuarterKey = "2T26".parse().unwrap();

        assert!(settings.target_for(q).is_zero());
        settings.set_target(q, Money::from_cents(5_000_000));
        assert_eq!(settings.target_for(q).cents(), 5_000_000);
        settings.set_target(q, Money::zero());
        assert!(settings.quarterly_targets.is_empty());
    }

    #[test]
    fn test_settings_json_uses_quarter_keys() {
        let mut settings = Settings::default();
        settings.set_target("1T26".parse().unwrap(), Money::from_cents(100));
        settings.desired_uplift = Percentage::from_percentage(10.0);

        let json = serde_json::to_string(&settings).unwrap();
        assert_eq!(json, r#"{"quarterly_targets":{"1T26":100},"desired_uplift":1000}"#);
    }

    #[test]
    fn test_corrupt_line_fields_coerce_to_zero() {
        let line: OrderLine =
            serde_json::from_str(r#"{"product":"X","quantity":"abc","unit_price":null}"#).unwrap();
        assert_eq!(line.quantity, 0);
        assert!(line.unit_price.is_zero());
        assert!(line.discount.is_zero());
    }

    #[test]
    fn test_client_label() {
        let mut client = Client::new("id", "Farmacia Sol", ts());
        assert_eq!(client.label(), "Farmacia Sol");
        client.code = Some("F-001".to_string());
        assert_eq!(client.label(), "Farmacia Sol (F-001)");
    }
}
