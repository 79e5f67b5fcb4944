//! Pure interval arithmetic (day granularity, inclusive bounds).
//!
//! # Invariants
//! - No function here invents a date for a fully unset interval.
//! - Every returned complete interval satisfies `start <= end`.

use crate::model::interval::Interval;
use chrono::{Duration, NaiveDate};

/// Swaps inverted endpoints; `start == end` is a valid one-day interval.
pub fn validate(interval: Interval) -> Interval {
    match interval.bounds() {
        Some((start, end)) if start > end => Interval::dated(end, start),
        _ => interval,
    }
}

/// Completes a half-set interval and validates it.
///
/// A fully unset interval is returned unchanged (pending node). A missing
/// start defaults to `today`; a missing end defaults to `start + 1 day`.
pub fn ensure(interval: Interval, today: NaiveDate) -> Interval {
    match (interval.start, interval.end) {
        (None, None) => interval,
        (None, Some(end)) => validate(Interval::dated(today, end)),
        (Some(start), None) => Interval::dated(start, shift_days(start, 1)),
        (Some(_), Some(_)) => validate(interval),
    }
}

/// Clips `child` into `bound`; a no-op when `bound` is not complete.
pub fn clamp_into(child: Interval, bound: Interval) -> Interval {
    let Some((low, high)) = bound.bounds() else {
        return child;
    };
    let (low, high) = if low <= high { (low, high) } else { (high, low) };
    let clip = |date: NaiveDate| date.max(low).min(high);
    validate(Interval {
        start: child.start.map(clip),
        end: child.end.map(clip),
    })
}

/// Smallest interval containing both; unset endpoints are ignored.
pub fn union(a: Interval, b: Interval) -> Interval {
    let pick = |x: Option<NaiveDate>, y: Option<NaiveDate>, f: fn(NaiveDate, NaiveDate) -> NaiveDate| {
        match (x, y) {
            (Some(x), Some(y)) => Some(f(x, y)),
            (x, None) => x,
            (None, y) => y,
        }
    };
    Interval {
        start: pick(a.start, b.start, NaiveDate::min),
        end: pick(a.end, b.end, NaiveDate::max),
    }
}

/// Union over a sequence (unset when the sequence has no dates).
pub fn span(intervals: impl IntoIterator<Item = Interval>) -> Interval {
    intervals.into_iter().fold(Interval::UNSET, union)
}

/// Signed whole days from `from` to `to`.
pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}

/// `date` moved by `days`, saturating at the representable date range.
pub fn shift_days(date: NaiveDate, days: i64) -> NaiveDate {
    Duration::try_days(days)
        .and_then(|delta| date.checked_add_signed(delta))
        .unwrap_or(if days < 0 { NaiveDate::MIN } else { NaiveDate::MAX })
}
