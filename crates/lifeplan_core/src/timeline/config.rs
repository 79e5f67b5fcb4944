//! Timeline zoom constants.

use serde::{Deserialize, Serialize};

/// Day widths and zoom thresholds, in pixels per day.
///
/// Every field falls back to its default when missing from a config document.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    /// Day width applied by `set_zoom(ZoomLevel::Day)`.
    pub day_zoom_width: f64,
    pub month_zoom_width: f64,
    pub year_zoom_width: f64,
    /// Widths at or above this show the `Day` header.
    pub day_threshold: f64,
    /// Widths at or above this (and below `day_threshold`) show `Month`.
    pub month_threshold: f64,
    pub min_day_width: f64,
    pub max_day_width: f64,
    /// Multiplier applied per `zoom_in` / divisor per `zoom_out`.
    pub zoom_step: f64,
    /// Days shown before the earliest date by `fit_to`.
    pub lead_days: i64,
    /// Days shown after the latest date by `fit_to`.
    pub trail_days: i64,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            day_zoom_width: 40.0,
            month_zoom_width: 8.0,
            year_zoom_width: 1.5,
            day_threshold: 20.0,
            month_threshold: 3.0,
            min_day_width: 0.5,
            max_day_width: 80.0,
            zoom_step: 1.2,
            lead_days: 7,
            trail_days: 30,
        }
    }
}

impl TimelineConfig {
    /// Clamps `day_width` into the configured range; NaN maps to the minimum.
    pub fn clamp_day_width(&self, day_width: f64) -> f64 {
        let (low, high) = self.day_width_bounds();
        if day_width.is_nan() {
            return low;
        }
        day_width.clamp(low, high)
    }

    /// Usable `(min, max)` day widths.
    ///
    /// Swapped bounds are reordered; non-finite or non-positive bounds fall
    /// back to the defaults.
    fn day_width_bounds(&self) -> (f64, f64) {
        let usable = |width: f64| width.is_finite() && width > 0.0;
        if !usable(self.min_day_width) || !usable(self.max_day_width) {
            let defaults = Self::default();
            return (defaults.min_day_width, defaults.max_day_width);
        }
        if self.min_day_width <= self.max_day_width {
            (self.min_day_width, self.max_day_width)
        } else {
            (self.max_day_width, self.min_day_width)
        }
    }
}

/// Header granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoomLevel {
    /// Days grouped by ISO week.
    Day,
    /// Weeks grouped by month.
    Month,
    /// Months grouped by year.
    Year,
}

impl ZoomLevel {
    /// Zoom level whose thresholds contain `day_width`.
    pub fn for_day_width(day_width: f64, config: &TimelineConfig) -> Self {
        if day_width >= config.day_threshold {
            Self::Day
        } else if day_width >= config.month_threshold {
            Self::Month
        } else {
            Self::Year
        }
    }

    /// Preset day width for this level.
    pub fn day_width(self, config: &TimelineConfig) -> f64 {
        match self {
            Self::Day => config.day_zoom_width,
            Self::Month => config.month_zoom_width,
            Self::Year => config.year_zoom_width,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Month => "month",
            Self::Year => "year",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_map_back_to_their_level() {
        let config = TimelineConfig::default();
        for level in [ZoomLevel::Day, ZoomLevel::Month, ZoomLevel::Year] {
            assert_eq!(
                ZoomLevel::for_day_width(level.day_width(&config), &config),
                level
            );
        }
    }

    #[test]
    fn invalid_width_bounds_are_normalized() {
        let swapped = TimelineConfig {
            min_day_width: 60.0,
            max_day_width: 2.0,
            ..TimelineConfig::default()
        };
        assert_eq!(swapped.clamp_day_width(100.0), 60.0);
        assert_eq!(swapped.clamp_day_width(1.0), 2.0);

        let broken: TimelineConfig =
            serde_json::from_str(r#"{"min_day_width": -1.0, "max_day_width": 0.0}"#).unwrap();
        let defaults = TimelineConfig::default();
        assert_eq!(broken.clamp_day_width(1.0e6), defaults.max_day_width);

        let nan = TimelineConfig {
            max_day_width: f64::NAN,
            ..TimelineConfig::default()
        };
        assert_eq!(nan.clamp_day_width(10.0), 10.0);
        assert_eq!(defaults.clamp_day_width(f64::NAN), defaults.min_day_width);
    }

    #[test]
    fn partial_document_keeps_defaults() {
        let config: TimelineConfig =
            serde_json::from_str(r#"{"day_zoom_width": 50.0, "trail_days": 10}"#).unwrap();
        assert_eq!(config.day_zoom_width, 50.0);
        assert_eq!(config.trail_days, 10);
        assert_eq!(config.zoom_step, TimelineConfig::default().zoom_step);
    }
}
