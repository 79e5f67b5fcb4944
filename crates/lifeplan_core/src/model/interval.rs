//! Day-granular date interval with an explicit Unset state.
//!
//! # Responsibility
//! - Define the `Interval` value carried by every roadmap node.
//! - Convert between interval endpoints and their wire string form.
//!
//! # Invariants
//! - An unset endpoint is `None`; it is never replaced by a default date here.
//! - Wire form is `YYYY-MM-DD`, or an empty string for an unset endpoint.
//! - Malformed wire strings decode to unset and emit a warning.

use chrono::NaiveDate;
use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

const WIRE_DATE_FORMAT: &str = "%Y-%m-%d";

// Accepts a bare date or a date followed by a time part (`T...` or ` ...`).
static DATE_PREFIX: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^(\d{4}-\d{2}-\d{2})(?:[T ].*)?$").ok());

/// Inclusive `[start, end]` date range; either endpoint may be unset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Interval {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl Interval {
    /// Both endpoints unset (freshly created node).
    pub const UNSET: Interval = Interval {
        start: None,
        end: None,
    };

    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    /// Interval with both endpoints present.
    pub fn dated(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    /// One-day interval on `day`.
    pub fn single_day(day: NaiveDate) -> Self {
        Self::dated(day, day)
    }

    pub fn is_unset(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// Returns `(start, end)` when both endpoints are present.
    pub fn bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        match (self.start, self.end) {
            (Some(start), Some(end)) => Some((start, end)),
            _ => None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.bounds().is_some()
    }

    /// Inclusive length in days (`start == end` is one day).
    pub fn duration_days(&self) -> Option<i64> {
        self.bounds()
            .map(|(start, end)| (end - start).num_days().abs() + 1)
    }

    /// Whether `other` lies entirely inside this interval.
    ///
    /// Incomplete intervals never contain anything and are never contained.
    pub fn contains(&self, other: &Interval) -> bool {
        match (self.bounds(), other.bounds()) {
            (Some((start, end)), Some((other_start, other_end))) => {
                start <= other_start && other_end <= end
            }
            _ => false,
        }
    }
}

/// Parses one wire date field.
///
/// Empty input is the unset sentinel. Anything else that does not parse as a
/// calendar date degrades to unset with a warning.
pub fn parse_date_field(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let candidate = DATE_PREFIX
        .as_ref()
        .and_then(|pattern| pattern.captures(trimmed))
        .and_then(|captures| captures.get(1))
        .map(|found| found.as_str());

    let parsed =
        candidate.and_then(|value| NaiveDate::parse_from_str(value, WIRE_DATE_FORMAT).ok());
    if parsed.is_none() {
        warn!(
            "event=date_parse module=model status=degraded reason=malformed_date input_len={}",
            trimmed.len()
        );
    }
    parsed
}

/// Formats one endpoint for the wire (`""` when unset).
pub fn format_date_field(value: Option<NaiveDate>) -> String {
    value
        .map(|date| date.format(WIRE_DATE_FORMAT).to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parse_accepts_plain_and_timestamped_dates() {
        assert_eq!(parse_date_field("2024-01-05"), Some(day(2024, 1, 5)));
        assert_eq!(
            parse_date_field("2024-01-05T00:00:00.000Z"),
            Some(day(2024, 1, 5))
        );
        assert_eq!(parse_date_field(" 2024-02-29 "), Some(day(2024, 2, 29)));
    }

    #[test]
    fn parse_degrades_to_unset() {
        assert_eq!(parse_date_field(""), None);
        assert_eq!(parse_date_field("   "), None);
        assert_eq!(parse_date_field("2023-02-30"), None);
        assert_eq!(parse_date_field("next tuesday"), None);
        assert_eq!(parse_date_field("05/01/2024"), None);
    }

    #[test]
    fn format_uses_empty_string_for_unset() {
        assert_eq!(format_date_field(None), "");
        assert_eq!(format_date_field(Some(day(2024, 3, 9))), "2024-03-09");
    }

    #[test]
    fn duration_is_inclusive() {
        let interval = Interval::dated(day(2024, 1, 1), day(2024, 1, 5));
        assert_eq!(interval.duration_days(), Some(5));
        assert_eq!(Interval::single_day(day(2024, 1, 1)).duration_days(), Some(1));
        assert_eq!(Interval::UNSET.duration_days(), None);
    }

    #[test]
    fn contains_requires_complete_intervals() {
        let outer = Interval::dated(day(2024, 1, 1), day(2024, 1, 31));
        assert!(outer.contains(&Interval::dated(day(2024, 1, 3), day(2024, 1, 4))));
        assert!(!outer.contains(&Interval::dated(day(2023, 12, 31), day(2024, 1, 4))));
        assert!(!outer.contains(&Interval::new(Some(day(2024, 1, 3)), None)));
    }
}
