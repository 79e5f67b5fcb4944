//! Two-band timeline header bucketing.
//!
//! # Invariants
//! - Segments tile the visible range exactly, in date order.
//! - Edge segments are clipped to the visible range.
//! - A secondary segment never crosses a primary boundary.

use super::config::ZoomLevel;
use super::projection::TimelineProjection;
use chrono::{Datelike, Duration, NaiveDate};

/// One labelled header cell covering `first..=last`.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderSegment {
    pub first: NaiveDate,
    pub last: NaiveDate,
    pub label: String,
    pub x: f64,
    pub width: f64,
}

/// Coarse (`primary`) and fine (`secondary`) header rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeaderBands {
    pub primary: Vec<HeaderSegment>,
    pub secondary: Vec<HeaderSegment>,
}

#[derive(Debug, Clone, Copy)]
enum Period {
    Day,
    Week,
    Month,
    Year,
}

impl Period {
    /// First day of the period after the one containing `date`.
    fn next_start(self, date: NaiveDate) -> Option<NaiveDate> {
        match self {
            Self::Day => date.succ_opt(),
            Self::Week => {
                let remaining = 7 - i64::from(date.weekday().num_days_from_monday());
                date.checked_add_signed(Duration::days(remaining))
            }
            Self::Month => {
                if date.month() == 12 {
                    NaiveDate::from_ymd_opt(date.year() + 1, 1, 1)
                } else {
                    NaiveDate::from_ymd_opt(date.year(), date.month() + 1, 1)
                }
            }
            Self::Year => NaiveDate::from_ymd_opt(date.year() + 1, 1, 1),
        }
    }

    fn label(self, date: NaiveDate) -> String {
        let format = match self {
            Self::Day => "%d",
            Self::Week => "W%V",
            Self::Month => "%b",
            Self::Year => "%Y",
        };
        date.format(format).to_string()
    }
}

fn bands_for(level: ZoomLevel) -> (Period, Period) {
    match level {
        ZoomLevel::Day => (Period::Week, Period::Day),
        ZoomLevel::Month => (Period::Month, Period::Week),
        ZoomLevel::Year => (Period::Year, Period::Month),
    }
}

/// Buckets `visible_start..=visible_end` into header bands for `level`.
///
/// Month-level primary labels carry the year (`Jan 2024`).
pub fn header_bands(
    projection: &TimelineProjection,
    level: ZoomLevel,
    visible_start: NaiveDate,
    visible_end: NaiveDate,
) -> HeaderBands {
    if visible_end < visible_start {
        return HeaderBands::default();
    }
    let (primary, secondary) = bands_for(level);

    let primary_label = |first: NaiveDate| match level {
        ZoomLevel::Month => first.format("%b %Y").to_string(),
        _ => primary.label(first),
    };

    HeaderBands {
        primary: segments(projection, visible_start, visible_end, |first| {
            (primary.next_start(first), primary_label(first))
        }),
        secondary: segments(projection, visible_start, visible_end, |first| {
            let boundary = earliest(secondary.next_start(first), primary.next_start(first));
            (boundary, secondary.label(first))
        }),
    }
}

fn segments(
    projection: &TimelineProjection,
    visible_start: NaiveDate,
    visible_end: NaiveDate,
    split: impl Fn(NaiveDate) -> (Option<NaiveDate>, String),
) -> Vec<HeaderSegment> {
    let mut out = Vec::new();
    let mut cursor = visible_start;
    loop {
        let (next_start, label) = split(cursor);
        let last = match next_start.and_then(|next| next.pred_opt()) {
            Some(last) if last < visible_end => last,
            _ => visible_end,
        };
        out.push(HeaderSegment {
            first: cursor,
            last,
            label,
            x: projection.to_pixel(cursor),
            width: projection.bar_width(cursor, last),
        });
        match last.succ_opt() {
            Some(next) if last < visible_end => cursor = next,
            _ => break,
        }
    }
    out
}

fn earliest(a: Option<NaiveDate>, b: Option<NaiveDate>) -> Option<NaiveDate> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, None) => a,
        (None, b) => b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn labels(segments: &[HeaderSegment]) -> Vec<&str> {
        segments.iter().map(|segment| segment.label.as_str()).collect()
    }

    #[test]
    fn month_view_clips_edges_and_splits_weeks() {
        let start = day(2024, 1, 20);
        let end = day(2024, 2, 10);
        let projection = TimelineProjection::new(start, 8.0);
        let bands = header_bands(&projection, ZoomLevel::Month, start, end);

        assert_eq!(labels(&bands.primary), vec!["Jan 2024", "Feb 2024"]);
        assert_eq!(bands.primary[0].first, start);
        assert_eq!(bands.primary[0].last, day(2024, 1, 31));
        assert_eq!(bands.primary[0].width, 12.0 * 8.0);
        assert_eq!(bands.primary[1].x, 12.0 * 8.0);
        assert_eq!(bands.primary[1].last, end);

        // 2024-01-29 (Mon) .. 2024-02-04 (Sun) crosses the month boundary.
        let split: Vec<_> = bands
            .secondary
            .iter()
            .filter(|segment| segment.label == "W05")
            .map(|segment| (segment.first, segment.last))
            .collect();
        assert_eq!(
            split,
            vec![
                (day(2024, 1, 29), day(2024, 1, 31)),
                (day(2024, 2, 1), day(2024, 2, 4)),
            ]
        );
    }

    #[test]
    fn secondary_segments_tile_the_range() {
        let start = day(2023, 11, 3);
        let end = day(2025, 2, 17);
        let projection = TimelineProjection::new(start, 1.5);
        for level in [ZoomLevel::Day, ZoomLevel::Month, ZoomLevel::Year] {
            let bands = header_bands(&projection, level, start, end);
            for band in [&bands.primary, &bands.secondary] {
                assert_eq!(band.first().map(|segment| segment.first), Some(start));
                assert_eq!(band.last().map(|segment| segment.last), Some(end));
                for pair in band.windows(2) {
                    assert_eq!(pair[0].last.succ_opt(), Some(pair[1].first));
                }
            }
        }
    }

    #[test]
    fn day_view_groups_days_by_iso_week() {
        let start = day(2024, 1, 3);
        let end = day(2024, 1, 9);
        let projection = TimelineProjection::new(start, 40.0);
        let bands = header_bands(&projection, ZoomLevel::Day, start, end);

        assert_eq!(labels(&bands.primary), vec!["W01", "W02"]);
        assert_eq!(bands.secondary.len(), 7);
        assert_eq!(bands.secondary[0].label, "03");
        assert_eq!(bands.secondary[0].width, 40.0);
    }

    #[test]
    fn year_view_labels_months() {
        let start = day(2023, 12, 15);
        let end = day(2024, 1, 15);
        let projection = TimelineProjection::new(start, 1.5);
        let bands = header_bands(&projection, ZoomLevel::Year, start, end);
        assert_eq!(labels(&bands.primary), vec!["2023", "2024"]);
        assert_eq!(labels(&bands.secondary), vec!["Dec", "Jan"]);
    }

    #[test]
    fn inverted_range_is_empty() {
        let projection = TimelineProjection::new(day(2024, 1, 1), 8.0);
        let bands = header_bands(&projection, ZoomLevel::Month, day(2024, 2, 1), day(2024, 1, 1));
        assert!(bands.primary.is_empty());
        assert!(bands.secondary.is_empty());
    }
}
