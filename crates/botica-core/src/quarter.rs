//! # Quarter Calendar
//!
//! `QuarterKey` names a calendar quarter as `"<1-4>T<YY>"` (`3T26` is
//! July-September 2026). It is a pure function of the calendar and is never
//! stored except as a key of [`Settings::quarterly_targets`].
//!
//! ```text
//!   1T26            2T26            3T26            4T26
//!   Jan Feb Mar  │  Apr May Jun  │  Jul Aug Sep  │  Oct Nov Dec
//!   ▲            ▲
//!   start()      end_exclusive()
//! ```
//!
//! All boundaries are computed on the UTC calendar.
//!
//! [`Settings::quarterly_targets`]: crate::types::Settings

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// Identifies a calendar quarter.
///
/// Ordering is chronological (year first, then quarter).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QuarterKey {
    year: i32,
    quarter: u8,
}

impl QuarterKey {
    /// Creates a key; `quarter` must be 1-4.
    pub fn new(year: i32, quarter: u8) -> Result<Self, ValidationError> {
        if !(1..=4).contains(&quarter) {
            return Err(ValidationError::OutOfRange {
                field: "quarter".to_string(),
                min: 1,
                max: 4,
            });
        }
        Ok(QuarterKey { year, quarter })
    }

    /// Quarter containing `date`.
    ///
    /// ```rust
    /// use botica_core::quarter::QuarterKey;
    /// use chrono::NaiveDate;
    ///
    /// let date = NaiveDate::from_ymd_opt(2026, 8, 14).unwrap();
    /// assert_eq!(QuarterKey::from_date(date).to_string(), "3T26");
    /// ```
    pub fn from_date(date: NaiveDate) -> Self {
        QuarterKey {
            year: date.year(),
            quarter: (date.month0() / 3 + 1) as u8,
        }
    }

    /// Quarter containing the instant `at`.
    pub fn from_datetime(at: DateTime<Utc>) -> Self {
        Self::from_date(at.date_naive())
    }

    #[inline]
    pub fn year(&self) -> i32 {
        self.year
    }

    #[inline]
    pub fn quarter(&self) -> u8 {
        self.quarter
    }

    /// First calendar day of the quarter.
    pub fn first_day(&self) -> NaiveDate {
        let month = (self.quarter as u32 - 1) * 3 + 1;
        NaiveDate::from_ymd_opt(self.year, month, 1).unwrap_or(NaiveDate::MIN)
    }

    /// Last calendar day of the quarter.
    pub fn last_day(&self) -> NaiveDate {
        self.next()
            .first_day()
            .pred_opt()
            .unwrap_or(NaiveDate::MAX)
    }

    /// First instant of the quarter.
    pub fn start(&self) -> DateTime<Utc> {
        midnight(self.first_day())
    }

    /// First instant after the quarter.
    pub fn end_exclusive(&self) -> DateTime<Utc> {
        self.next().start()
    }

    /// First instant of the last calendar day; the deadline used for
    /// pacing, so the final day itself counts as "no days left".
    pub fn pacing_end(&self) -> DateTime<Utc> {
        midnight(self.last_day())
    }

    /// Whether `at` falls inside the quarter.
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start() && at < self.end_exclusive()
    }

    pub fn next(&self) -> Self {
        if self.quarter == 4 {
            QuarterKey {
                year: self.year + 1,
                quarter: 1,
            }
        } else {
            QuarterKey {
                year: self.year,
                quarter: self.quarter + 1,
            }
        }
    }
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

impl fmt::Display for QuarterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}T{:02}", self.quarter, self.year.rem_euclid(100))
    }
}

/// Parses `"3T26"` (also accepts lowercase `t` and a four-digit year).
/// Two-digit years map to 2000-2099.
impl FromStr for QuarterKey {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::InvalidFormat {
            field: "quarter".to_string(),
            reason: format!("'{}' is not of the form <1-4>T<YY>", s),
        };

        let trimmed = s.trim();
        let (q, y) = trimmed
            .split_once(['T', 't'])
            .ok_or_else(invalid)?;

        let quarter: u8 = q.parse().map_err(|_| invalid())?;
        if y.is_empty() || !y.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        let year: i32 = match y.len() {
            2 => 2000 + y.parse::<i32>().map_err(|_| invalid())?,
            4 => y.parse().map_err(|_| invalid())?,
            _ => return Err(invalid()),
        };

        QuarterKey::new(year, quarter).map_err(|_| invalid())
    }
}

impl Serialize for QuarterKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for QuarterKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_from_date_month_boundaries() {
        assert_eq!(QuarterKey::from_date(date(2025, 1, 1)).to_string(), "1T25");
        assert_eq!(QuarterKey::from_date(date(2025, 3, 31)).to_string(), "1T25");
        assert_eq!(QuarterKey::from_date(date(2025, 4, 1)).to_string(), "2T25");
        assert_eq!(QuarterKey::from_date(date(2025, 9, 30)).to_string(), "3T25");
        assert_eq!(QuarterKey::from_date(date(2025, 12, 31)).to_string(), "4T25");
        assert_eq!(QuarterKey::from_date(date(2009, 10, 2)).to_string(), "4T09");
    }

    #[test]
    fn test_parse() {
        let q: QuarterKey = "3T26".parse().unwrap();
        assert_eq!(q.year(), 2026);
        assert_eq!(q.quarter(), 3);

        assert_eq!("4t2031".parse::<QuarterKey>().unwrap().to_string(), "4T31");
        assert!("5T26".parse::<QuarterKey>().is_err());
        assert!("0T26".parse::<QuarterKey>().is_err());
        assert!("T26".parse::<QuarterKey>().is_err());
        assert!("3T".parse::<QuarterKey>().is_err());
        assert!("3T2".parse::<QuarterKey>().is_err());
        assert!("Q3-26".parse::<QuarterKey>().is_err());
    }

    #[test]
    fn test_boundaries() {
        let q: QuarterKey = "1T24".parse().unwrap();
        assert_eq!(q.first_day(), date(2024, 1, 1));
        assert_eq!(q.last_day(), date(2024, 3, 31));
        assert_eq!(q.pacing_end(), midnight(date(2024, 3, 31)));
        assert_eq!(q.end_exclusive(), midnight(date(2024, 4, 1)));

        let q4: QuarterKey = "4T24".parse().unwrap();
        assert_eq!(q4.last_day(), date(2024, 12, 31));
        assert_eq!(q4.next().to_string(), "1T25");
    }

    #[test]
    fn test_contains() {
        let q: QuarterKey = "2T26".parse().unwrap();
        assert!(q.contains(midnight(date(2026, 4, 1))));
        assert!(q.contains(midnight(date(2026, 6, 30)) + chrono::Duration::hours(23)));
        assert!(!q.contains(midnight(date(2026, 7, 1))));
        assert!(!q.contains(midnight(date(2026, 3, 31))));
    }

    #[test]
    fn test_ordering_is_chronological() {
        let a: QuarterKey = "4T25".parse().unwrap();
        let b: QuarterKey = "1T26".parse().unwrap();
        assert!(a < b);
    }
}
