//! # Numeric Coercion
//!
//! Spreadsheet cells and old backups carry numbers in every shape:
//! `"12,50"`, `"1.234,56 €"`, `"n/a"`, `null`. Nothing here fails; any value
//! that cannot be read as a number becomes 0 so one corrupt record never
//! aborts a computation.
//!
//! Two entry points:
//! - `coerce_*` functions for text cells (CSV import).
//! - `lenient_*` serde deserializers for JSON fields, used with
//!   `#[serde(default, deserialize_with = "...")]`.

use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer};

use crate::money::Money;
use crate::types::Percentage;

/// Normalizes thousands/decimal separators to a plain `1234.56` form.
///
/// The right-most of `.`/`,` is the decimal separator when both appear; a
/// separator repeated more than once is a thousands separator.
fn normalize_numeric(raw: &str) -> Option<String> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '€' | '$' | '%' | '\''))
        .collect();

    if cleaned.is_empty() {
        return None;
    }

    let last_dot = cleaned.rfind('.');
    let last_comma = cleaned.rfind(',');

    let normalized = match (last_dot, last_comma) {
        (Some(dot), Some(comma)) if comma > dot => cleaned.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => cleaned.replace(',', ""),
        (None, Some(_)) if cleaned.matches(',').count() > 1 => cleaned.replace(',', ""),
        (None, Some(_)) => cleaned.replace(',', "."),
        (Some(_), None) if cleaned.matches('.').count() > 1 => cleaned.replace('.', ""),
        _ => cleaned,
    };

    Some(normalized)
}

/// Parses a decimal amount into cents without going through floats.
/// The third decimal rounds half away from zero.
///
/// ```rust
/// use botica_core::coerce::parse_cents;
///
/// assert_eq!(parse_cents("12,50"), Some(1250));
/// assert_eq!(parse_cents("1.234,567 €"), Some(123457));
/// assert_eq!(parse_cents("-0.5"), Some(-50));
/// assert_eq!(parse_cents("abc"), None);
/// ```
pub fn parse_cents(raw: &str) -> Option<i64> {
    let normalized = normalize_numeric(raw)?;
    let s = normalized.as_str();

    let (negative, body) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };

    let (int_part, frac_part) = body.split_once('.').unwrap_or((body, ""));
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    if !int_part.chars().all(|c| c.is_ascii_digit()) || !frac_part.chars().all(|c| c.is_ascii_digit())
    {
        return None;
    }

    let whole: i64 = if int_part.is_empty() {
        0
    } else {
        int_part.parse().ok()?
    };

    let mut digits = frac_part.bytes().map(|b| (b - b'0') as i64);
    let tenths = digits.next().unwrap_or(0);
    let hundredths = digits.next().unwrap_or(0);
    let thousandths = digits.next().unwrap_or(0);

    let mut cents = whole.checked_mul(100)?.checked_add(tenths * 10 + hundredths)?;
    if thousandths >= 5 {
        cents = cents.checked_add(1)?;
    }

    Some(if negative { -cents } else { cents })
}

/// Parses a number, returning `None` for anything unreadable.
pub fn parse_number(raw: &str) -> Option<f64> {
    normalize_numeric(raw)?
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// Number or 0.
pub fn coerce_f64(raw: &str) -> f64 {
    parse_number(raw).unwrap_or(0.0)
}

/// Whole number (rounded) or 0.
///
/// ```rust
/// use botica_core::coerce::coerce_i64;
///
/// assert_eq!(coerce_i64("12"), 12);
/// assert_eq!(coerce_i64(" 2,6 "), 3);
/// assert_eq!(coerce_i64("doce"), 0);
/// ```
pub fn coerce_i64(raw: &str) -> i64 {
    f64_to_i64(coerce_f64(raw))
}

/// Decimal amount as Money, or zero.
pub fn coerce_money(raw: &str) -> Money {
    Money::from_cents(parse_cents(raw).unwrap_or(0))
}

/// Human percentage (`"12,5%"`) as Percentage, or zero.
pub fn coerce_percentage(raw: &str) -> Percentage {
    Percentage::from_percentage(coerce_f64(raw))
}

fn f64_to_i64(value: f64) -> i64 {
    if value.is_finite() {
        value.round().clamp(i64::MIN as f64, i64::MAX as f64) as i64
    } else {
        0
    }
}

fn clamp_u32(value: i64) -> u32 {
    value.clamp(0, u32::MAX as i64) as u32
}

// =============================================================================
// Lenient serde deserializers
// =============================================================================

/// Any JSON value, read as loosely as possible.
#[derive(Deserialize)]
#[serde(untagged)]
enum Loose {
    Int(i64),
    Float(f64),
    Text(String),
    Other(IgnoredAny),
}

impl Loose {
    fn into_i64(self) -> i64 {
        match self {
            Loose::Int(v) => v,
            Loose::Float(v) => f64_to_i64(v),
            Loose::Text(s) => coerce_i64(&s),
            Loose::Other(_) => 0,
        }
    }
}

/// Integer field; strings are parsed, anything else is 0.
pub fn lenient_i64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    Ok(Loose::deserialize(deserializer)?.into_i64())
}

/// Money field stored as cents.
pub fn lenient_money<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Money, D::Error> {
    Ok(Money::from_cents(Loose::deserialize(deserializer)?.into_i64()))
}

/// Percentage field stored as basis points; negatives clamp to 0.
pub fn lenient_percentage<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Percentage, D::Error> {
    Ok(Percentage::from_bps(clamp_u32(
        Loose::deserialize(deserializer)?.into_i64(),
    )))
}

// =============================================================================
// Unit Tests
// =============================================================================
