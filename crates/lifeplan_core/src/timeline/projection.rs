//! Linear date <-> pixel mapping.

use crate::engine::interval::{days_between, shift_days};
use crate::model::interval::Interval;
use chrono::NaiveDate;

/// Maps dates onto a horizontal axis starting at `origin` (pixel 0).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimelineProjection {
    pub origin: NaiveDate,
    /// Pixels per day; always positive.
    pub day_width: f64,
}

impl TimelineProjection {
    /// Creates a projection; a non-positive or non-finite width becomes 1.0.
    pub fn new(origin: NaiveDate, day_width: f64) -> Self {
        let day_width = if day_width.is_finite() && day_width > 0.0 {
            day_width
        } else {
            1.0
        };
        Self { origin, day_width }
    }

    /// Left edge of `date`.
    pub fn to_pixel(&self, date: NaiveDate) -> f64 {
        days_between(self.origin, date) as f64 * self.day_width
    }

    /// Date whose left edge is nearest to `pixel`, saturating at the date range.
    pub fn to_date(&self, pixel: f64) -> NaiveDate {
        shift_days(self.origin, self.day_delta(pixel))
    }

    /// Width of an inclusive range; at least one day wide.
    pub fn bar_width(&self, start: NaiveDate, end: NaiveDate) -> f64 {
        (days_between(start, end) + 1).max(1) as f64 * self.day_width
    }

    /// Whole days covered by a pointer movement of `pixel_delta`.
    pub fn day_delta(&self, pixel_delta: f64) -> i64 {
        (pixel_delta / self.day_width).round() as i64
    }

    /// `(x, width)` of a bar for a complete interval.
    pub fn bar(&self, interval: Interval) -> Option<(f64, f64)> {
        interval
            .bounds()
            .map(|(start, end)| (self.to_pixel(start), self.bar_width(start, end)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn pixel_and_date_are_inverse_on_day_edges() {
        let projection = TimelineProjection::new(day(2024, 1, 1), 12.0);
        let date = day(2024, 2, 14);
        assert_eq!(projection.to_date(projection.to_pixel(date)), date);
        assert_eq!(projection.to_pixel(day(2023, 12, 31)), -12.0);
    }

    #[test]
    fn to_date_rounds_to_nearest_day() {
        let projection = TimelineProjection::new(day(2024, 1, 1), 10.0);
        assert_eq!(projection.to_date(14.9), day(2024, 1, 2));
        assert_eq!(projection.to_date(15.1), day(2024, 1, 3));
    }

    #[test]
    fn same_day_bar_is_one_day_wide() {
        let projection = TimelineProjection::new(day(2024, 1, 1), 8.0);
        assert_eq!(projection.bar_width(day(2024, 1, 5), day(2024, 1, 5)), 8.0);
        assert_eq!(projection.bar_width(day(2024, 1, 5), day(2024, 1, 3)), 8.0);
        assert_eq!(projection.bar_width(day(2024, 1, 1), day(2024, 1, 10)), 80.0);
    }

    #[test]
    fn far_pixels_saturate_instead_of_overflowing() {
        let projection = TimelineProjection::new(day(2024, 1, 1), 0.5);
        assert_eq!(projection.to_date(1.0e18), NaiveDate::MAX);
        assert_eq!(projection.to_date(-1.0e18), NaiveDate::MIN);
        assert_eq!(projection.to_date(f64::INFINITY), NaiveDate::MAX);
    }

    #[test]
    fn invalid_width_falls_back() {
        assert_eq!(TimelineProjection::new(day(2024, 1, 1), 0.0).day_width, 1.0);
        assert_eq!(TimelineProjection::new(day(2024, 1, 1), f64::NAN).day_width, 1.0);
    }

    #[test]
    fn bar_requires_complete_interval() {
        let projection = TimelineProjection::new(day(2024, 1, 1), 4.0);
        assert_eq!(projection.bar(Interval::new(Some(day(2024, 1, 2)), None)), None);
        assert_eq!(
            projection.bar(Interval::dated(day(2024, 1, 2), day(2024, 1, 3))),
            Some((4.0, 8.0))
        );
    }
}
