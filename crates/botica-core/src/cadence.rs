//! # Cadence Estimator
//!
//! Estimates when a pharmacy will order next from the rhythm of its past
//! confirmed orders.
//!
//! ```text
//!  confirmed orders (any order)        most recent 10, ascending
//!  ─────────────────────────────       ─────────────────────────────
//!  o7  o2  o9  o1 ...          ──►     d1 ─ d2 ─ d3 ─ ... ─ d10
//!                                          g1   g2   ...   g9      gaps in days
//!                                                │
//!                         drop g ≤ 0 and g ≥ 3650│
//!                                                ▼
//!                                  avg = mean(surviving gaps)
//!                                  next = d10 + avg
//! ```
//!
//! The estimate is a pure function of history: it never looks at "now".
//! Comparing the estimate with a given instant is a separate step
//! ([`CadenceEstimate::status`]).

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::types::Order;

/// Below this many confirmed orders there is not enough signal.
pub const MIN_CONFIRMED_ORDERS: usize = 3;

/// Only the most recent orders shape the average.
pub const HISTORY_WINDOW: usize = 10;

/// Gaps this long or longer are treated as corrupt dates.
pub const MAX_GAP_DAYS: f64 = 3650.0;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Result of [`estimate`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CadenceEstimate {
    pub has_estimate: bool,
    /// Mean days between consecutive orders.
    pub avg_interval_days: Option<f64>,
    /// Date of the most recent confirmed order (set whenever one exists).
    pub last_date: Option<DateTime<Utc>>,
    /// `last_date + avg_interval_days`.
    pub next_date: Option<DateTime<Utc>>,
    /// Number of confirmed orders considered.
    pub count: usize,
}

impl CadenceEstimate {
    fn insufficient(count: usize, last_date: Option<DateTime<Utc>>) -> Self {
        CadenceEstimate {
            has_estimate: false,
            avg_interval_days: None,
            last_date,
            next_date: None,
            count,
        }
    }

    /// Whole days from `now` until the estimated next order, rounded up.
    /// Negative when the date has passed.
    pub fn days_until_next(&self, now: DateTime<Utc>) -> Option<i64> {
        let next = self.next_date?;
        let millis = (next - now).num_milliseconds() as f64;
        Some((millis / MILLIS_PER_DAY).ceil() as i64)
    }

    /// Classifies the client relative to `now`.
    pub fn status(&self, now: DateTime<Utc>, due_soon_days: i64) -> CadenceStatus {
        match self.next_date {
            None => CadenceStatus::Unknown,
            Some(next) if next < now => CadenceStatus::Overdue,
            Some(next) if next <= now + Duration::days(due_soon_days) => CadenceStatus::DueSoon,
            Some(_) => CadenceStatus::OnTrack,
        }
    }
}

/// Where a client stands against its own ordering rhythm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CadenceStatus {
    Overdue,
    DueSoon,
    OnTrack,
    Unknown,
}

impl CadenceStatus {
    pub fn label(&self) -> &'static str {
        match self {
            CadenceStatus::Overdue => "overdue",
            CadenceStatus::DueSoon => "due soon",
            CadenceStatus::OnTrack => "on track",
            CadenceStatus::Unknown => "no estimate",
        }
    }
}

/// Estimates the next order date from a client's order history.
///
/// `orders` may contain any statuses in any sequence; it is not modified.
///
/// ```rust
/// use botica_core::cadence::estimate;
///
/// let estimate = estimate(&[]);
/// assert!(!estimate.has_estimate);
/// assert_eq!(estimate.count, 0);
/// ```
pub fn estimate(orders: &[Order]) -> CadenceEstimate {
    let mut dates: Vec<DateTime<Utc>> = orders
        .iter()
        .filter(|o| o.is_confirmed())
        .map(|o| o.date)
        .collect();
    dates.sort_unstable();

    let count = dates.len();
    let last_date = dates.last().copied();

    if count < MIN_CONFIRMED_ORDERS {
        return CadenceEstimate::insufficient(count, last_date);
    }

    let recent = &dates[count.saturating_sub(HISTORY_WINDOW)..];

    let gaps: Vec<f64> = recent
        .windows(2)
        .map(|pair| (pair[1] - pair[0]).num_milliseconds() as f64 / MILLIS_PER_DAY)
        .filter(|gap| *gap > 0.0 && *gap < MAX_GAP_DAYS)
        .collect();

    let Some(last) = last_date else {
        return CadenceEstimate::insufficient(count, last_date);
    };
    if gaps.is_empty() {
        return CadenceEstimate::insufficient(count, last_date);
    }

    let avg = gaps.iter().sum::<f64>() / gaps.len() as f64;
    let next = last + Duration::milliseconds((avg * MILLIS_PER_DAY).round() as i64);

    CadenceEstimate {
        has_estimate: true,
        avg_interval_days: Some(avg),
        last_date: Some(last),
        next_date: Some(next),
        count,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::types::{OrderLine, OrderStatus, Percentage};
    use chrono::TimeZone;

    fn day(n: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap() + Duration::days(n)
    }

    fn order(id: &str, at: DateTime<Utc>, status: OrderStatus) -> Order {
        let line = OrderLine::new("X", 1, Money::from_cents(100), Percentage::zero());
        Order::new(id, "c1", at, status, vec![line], at)
    }

    fn confirmed(days: &[i64]) -> Vec<Order> {
        days.iter()
            .enumerate()
            .map(|(i, d)| order(&format!("o{}", i), day(*d), OrderStatus::Confirmed))
            .collect()
    }

    #[test]
    fn test_fewer_than_three_orders_has_no_estimate() {
        for history in [vec![], vec![0], vec![0, 10]] {
            let result = estimate(&confirmed(&history));
            assert!(!result.has_estimate);
            assert_eq!(result.count, history.len());
            assert!(result.next_date.is_none());
        }
    }

    #[test]
    fn test_drafts_do_not_count() {
        let mut orders = confirmed(&[0, 10]);
        orders.push(order("draft", day(20), OrderStatus::Draft));

        let result = estimate(&orders);
        assert!(!result.has_estimate);
        assert_eq!(result.count, 2);
        assert_eq!(result.last_date, Some(day(10)));
    }

    #[test]
    fn test_three_orders_ten_days_apart() {
        let result = estimate(&confirmed(&[0, 10, 20]));

        assert!(result.has_estimate);
        assert_eq!(result.avg_interval_days, Some(10.0));
        assert_eq!(result.last_date, Some(day(20)));
        assert_eq!(result.next_date, Some(day(30)));
        assert_eq!(result.count, 3);
    }

    #[test]
    fn test_input_order_is_irrelevant() {
        let result = estimate(&confirmed(&[20, 0, 10]));
        assert_eq!(result.next_date, Some(day(30)));
    }

    #[test]
    fn test_duplicate_dates_are_ignored() {
        // one 0-day duplicate and two 30-day gaps
        let result = estimate(&confirmed(&[0, 0, 30, 60]));
        assert_eq!(result.avg_interval_days, Some(30.0));
        assert_eq!(result.next_date, Some(day(90)));
    }

    #[test]
    fn test_decade_gaps_are_ignored() {
        let result = estimate(&confirmed(&[-4000, 0, 14, 28]));
        assert_eq!(result.avg_interval_days, Some(14.0));
    }

    #[test]
    fn test_all_gaps_discarded_has_no_estimate() {
        let result = estimate(&confirmed(&[5, 5, 5]));
        assert!(!result.has_estimate);
        assert_eq!(result.count, 3);
        assert_eq!(result.last_date, Some(day(5)));
    }

    #[test]
    fn test_only_last_ten_orders_shape_average() {
        // early orders every 100 days, then ten orders every 7 days
        let mut days = vec![-400, -300, -200];
        days.extend((0..10).map(|i| i * 7));
        let result = estimate(&confirmed(&days));

        assert_eq!(result.count, 13);
        assert_eq!(result.avg_interval_days, Some(7.0));
        assert_eq!(result.next_date, Some(day(70)));
    }

    #[test]
    fn test_fractional_intervals() {
        let orders = vec![
            order("a", day(0), OrderStatus::Confirmed),
            order("b", day(10), OrderStatus::Confirmed),
            order("c", day(21), OrderStatus::Confirmed),
        ];
        let result = estimate(&orders);
        assert_eq!(result.avg_interval_days, Some(10.5));
        assert_eq!(result.next_date, Some(day(31) + Duration::hours(12)));
    }

    #[test]
    fn test_input_is_not_mutated_and_result_is_repeatable() {
        let orders = confirmed(&[30, 0, 10, 20]);
        let before = orders.clone();

        let first = estimate(&orders);
        let second = estimate(&orders);

        assert_eq!(orders, before);
        assert_eq!(first, second);
    }

    #[test]
    fn test_status() {
        let result = estimate(&confirmed(&[0, 10, 20])); // next = day 30

        assert_eq!(result.status(day(31), 7), CadenceStatus::Overdue);
        assert_eq!(result.status(day(25), 7), CadenceStatus::DueSoon);
        assert_eq!(result.status(day(10), 7), CadenceStatus::OnTrack);
        assert_eq!(result.days_until_next(day(25)), Some(5));
        assert_eq!(result.days_until_next(day(32)), Some(-2));

        let none = estimate(&[]);
        assert_eq!(none.status(day(0), 7), CadenceStatus::Unknown);
        assert_eq!(none.days_until_next(day(0)), None);
    }
}
