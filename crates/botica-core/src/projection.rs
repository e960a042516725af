//! # Quarterly Target Projector
//!
//! How far along the active quarter's sales target is, and how fast the
//! representative must sell to close the gap.
//!
//! ```text
//!  quarter start                 now                 pacing end  quarter end
//!  │─────────────────────────────│───────────────────│──────────│
//!  ◄──── confirmed sales ────────►◄──── days_left ───►  last day
//!
//!  shortfall          = max(0, target − sales)
//!  desired_target     = target × (1 + uplift)
//!  desired_shortfall  = max(0, desired_target − sales)
//!  per_week           = shortfall / max(ceil(days_left / 7), 1)
//!  per_day            = shortfall / max(days_left, 1)
//! ```
//!
//! The projector never fails. A zero target gives 0% progress, an empty
//! history gives zero sales, and the last day of the quarter gives
//! `days_left == 0` with one week of pacing left.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::money::Money;
use crate::quarter::QuarterKey;
use crate::types::{Order, Percentage, Settings};

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Progress of the quarter containing `now` against its target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuarterProjection {
    pub quarter: QuarterKey,
    pub sales_so_far: Money,
    pub target: Money,
    pub desired_target: Money,
    pub shortfall: Money,
    pub desired_shortfall: Money,
    pub days_left: i64,
    pub weeks_left: i64,
    pub per_day: Money,
    pub per_week: Money,
    pub per_day_desired: Money,
    pub per_week_desired: Money,
    /// Whole percent of `target` already sold.
    pub progress_pct: i64,
    /// Whole percent of `desired_target` already sold.
    pub progress_pct_desired: i64,
}

impl QuarterProjection {
    /// Target reached.
    pub fn on_target(&self) -> bool {
        self.shortfall.is_zero()
    }
}

/// Whole days from `now` to the quarter's pacing end, rounded up and never
/// negative.
pub fn days_left(now: DateTime<Utc>, quarter: QuarterKey) -> i64 {
    let millis = (quarter.pacing_end() - now).num_milliseconds() as f64;
    ((millis / MILLIS_PER_DAY).ceil() as i64).max(0)
}

/// Sum of confirmed order totals dated inside `quarter`.
pub fn quarter_sales(quarter: QuarterKey, orders: &[Order]) -> Money {
    orders
        .iter()
        .filter(|o| o.is_confirmed() && quarter.contains(o.date))
        .map(|o| o.total)
        .sum()
}

/// Projects the quarter containing `now`.
///
/// ```rust
/// use botica_core::money::Money;
/// use botica_core::projection::project;
/// use botica_core::types::Percentage;
/// use chrono::{TimeZone, Utc};
///
/// let now = Utc.with_ymd_and_hms(2026, 8, 14, 10, 0, 0).unwrap();
/// let p = project(now, Money::from_cents(100_000), Percentage::zero(), &[]);
/// assert_eq!(p.quarter.to_string(), "3T26");
/// assert_eq!(p.shortfall.cents(), 100_000);
/// assert_eq!(p.progress_pct, 0);
/// ```
pub fn project(
    now: DateTime<Utc>,
    target: Money,
    desired_uplift: Percentage,
    orders: &[Order],
) -> QuarterProjection {
    let quarter = QuarterKey::from_datetime(now);
    let sales_so_far = quarter_sales(quarter, orders);
    let desired_target = target.apply_uplift(desired_uplift);

    let shortfall = (target - sales_so_far).non_negative();
    let desired_shortfall = (desired_target - sales_so_far).non_negative();

    let days_left = days_left(now, quarter);
    let weeks_left = ((days_left + 6) / 7).max(1);
    let pacing_days = days_left.max(1);

    QuarterProjection {
        quarter,
        sales_so_far,
        target,
        desired_target,
        shortfall,
        desired_shortfall,
        days_left,
        weeks_left,
        per_day: shortfall.divide_by(pacing_days),
        per_week: shortfall.divide_by(weeks_left),
        per_day_desired: desired_shortfall.divide_by(pacing_days),
        per_week_desired: desired_shortfall.divide_by(weeks_left),
        progress_pct: sales_so_far.percent_of(target),
        progress_pct_desired: sales_so_far.percent_of(desired_target),
    }
}

/// [`project`] with the target looked up for the active quarter.
pub fn project_for_settings(
    now: DateTime<Utc>,
    settings: &Settings,
    orders: &[Order],
) -> QuarterProjection {
    let target = settings.target_for(QuarterKey::from_datetime(now));
    project(now, target, settings.desired_uplift, orders)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{OrderLine, OrderStatus};
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 10, 0, 0).unwrap()
    }

    fn sale(id: &str, date: DateTime<Utc>, cents: i64, status: OrderStatus) -> Order {
        let line = OrderLine::new("X", 1, Money::from_cents(cents), Percentage::zero());
        Order::new(id, "c1", date, status, vec![line], date)
    }

    #[test]
    fn test_target_met_with_uplift() {
        let now = at(2026, 5, 10);
        let orders = vec![sale("a", at(2026, 4, 2), 100_000, OrderStatus::Confirmed)];

        let p = project(now, Money::from_cents(100_000), Percentage::from_percentage(10.0), &orders);

        assert_eq!(p.sales_so_far.cents(), 100_000);
        assert_eq!(p.desired_target.cents(), 110_000);
        assert!(p.shortfall.is_zero());
        assert_eq!(p.desired_shortfall.cents(), 10_000);
        assert_eq!(p.progress_pct, 100);
        assert_eq!(p.progress_pct_desired, 91);
        assert!(p.on_target());
    }

    #[test]
    fn test_zero_target() {
        let orders = vec![sale("a", at(2026, 4, 2), 5_000, OrderStatus::Confirmed)];
        let p = project(at(2026, 5, 10), Money::zero(), Percentage::zero(), &orders);

        assert_eq!(p.progress_pct, 0);
        assert_eq!(p.progress_pct_desired, 0);
        assert!(p.shortfall.is_zero());
        assert!(p.per_day.is_zero());
    }

    #[test]
    fn test_last_day_of_quarter() {
        let now = at(2026, 6, 30);
        let p = project(now, Money::from_cents(70_000), Percentage::zero(), &[]);

        assert_eq!(p.days_left, 0);
        assert_eq!(p.weeks_left, 1);
        assert_eq!(p.per_week, p.shortfall);
        assert_eq!(p.per_day, p.shortfall);
    }

    #[test]
    fn test_days_left_rounds_up() {
        // 2026-06-29 10:00 → pacing end 2026-06-30 00:00 is 14h away
        assert_eq!(days_left(at(2026, 6, 29), QuarterKey::from_datetime(at(2026, 6, 29))), 1);

        // first instant of the quarter: Apr 1 → Jun 30 is 90 days
        let start = Utc.with_ymd_and_hms(2026, 4, 1, 0, 0, 0).unwrap();
        assert_eq!(days_left(start, QuarterKey::from_datetime(start)), 90);
    }

    #[test]
    fn test_pacing_split() {
        // 2026-09-16 10:00 → pacing end Sep 30: 13.58 days → 14 days, 2 weeks
        let p = project(at(2026, 9, 16), Money::from_cents(140_000), Percentage::zero(), &[]);
        assert_eq!(p.days_left, 14);
        assert_eq!(p.weeks_left, 2);
        assert_eq!(p.per_day.cents(), 10_000);
        assert_eq!(p.per_week.cents(), 70_000);
    }

    #[test]
    fn test_only_confirmed_sales_inside_quarter() {
        let orders = vec![
            sale("in", at(2026, 7, 1), 1_000, OrderStatus::Confirmed),
            sale("draft", at(2026, 7, 2), 9_999, OrderStatus::Draft),
            sale("before", at(2026, 6, 30), 7_777, OrderStatus::Confirmed),
            sale("after", at(2026, 10, 1), 5_555, OrderStatus::Confirmed),
        ];
        let p = project(at(2026, 8, 1), Money::from_cents(10_000), Percentage::zero(), &orders);

        assert_eq!(p.sales_so_far.cents(), 1_000);
        assert_eq!(p.shortfall.cents(), 9_000);
        assert_eq!(p.progress_pct, 10);
    }

    #[test]
    fn test_project_for_settings_uses_active_quarter() {
        let mut settings = Settings::default();
        settings.set_target("3T26".parse().unwrap(), Money::from_cents(50_000));
        settings.desired_uplift = Percentage::from_percentage(20.0);

        let p = project_for_settings(at(2026, 8, 1), &settings, &[]);
        assert_eq!(p.target.cents(), 50_000);
        assert_eq!(p.desired_target.cents(), 60_000);

        let other = project_for_settings(at(2026, 11, 1), &settings, &[]);
        assert!(other.target.is_zero());
    }

    #[test]
    fn test_projection_is_repeatable() {
        let orders = vec![sale("a", at(2026, 2, 3), 1_234, OrderStatus::Confirmed)];
        let now = at(2026, 2, 20);
        let target = Money::from_cents(9_876);
        let uplift = Percentage::from_percentage(7.5);

        assert_eq!(project(now, target, uplift, &orders), project(now, target, uplift, &orders));
    }
}
