//! Visible window and zoom state.

use super::config::{TimelineConfig, ZoomLevel};
use super::header::{header_bands, HeaderBands};
use super::projection::TimelineProjection;
use crate::engine::interval::shift_days;
use crate::model::tree::Tree;
use chrono::NaiveDate;

/// Projection plus the visible end date and zoom level.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineViewport {
    pub projection: TimelineProjection,
    /// Last visible date (inclusive).
    pub end: NaiveDate,
    pub zoom: ZoomLevel,
    config: TimelineConfig,
}

impl TimelineViewport {
    /// Viewport over `start..=end` at the `Month` preset.
    pub fn new(start: NaiveDate, end: NaiveDate, config: TimelineConfig) -> Self {
        let zoom = ZoomLevel::Month;
        let day_width = config.clamp_day_width(zoom.day_width(&config));
        Self {
            projection: TimelineProjection::new(start, day_width),
            end: end.max(start),
            zoom: ZoomLevel::for_day_width(day_width, &config),
            config,
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.projection.origin
    }

    pub fn config(&self) -> &TimelineConfig {
        &self.config
    }

    /// Width of the whole visible range in pixels.
    pub fn total_width(&self) -> f64 {
        self.projection.bar_width(self.start(), self.end)
    }

    pub fn zoom_in(&mut self) {
        self.set_day_width(self.projection.day_width * self.config.zoom_step);
    }

    pub fn zoom_out(&mut self) {
        self.set_day_width(self.projection.day_width / self.config.zoom_step);
    }

    /// Jumps to the preset day width of `level`.
    pub fn set_zoom(&mut self, level: ZoomLevel) {
        self.projection.day_width = self.config.clamp_day_width(level.day_width(&self.config));
        self.zoom = level;
    }

    /// Moves the visible window by `days` (negative scrolls back).
    pub fn scroll_days(&mut self, days: i64) {
        self.projection.origin = shift_days(self.projection.origin, days);
        self.end = shift_days(self.end, days);
    }

    /// Frames every dated node with lead/trail padding; `today` when undated.
    pub fn fit_to(&mut self, tree: &Tree, today: NaiveDate) {
        let (first, last) = tree.date_span().bounds().unwrap_or((today, today));
        self.projection.origin = shift_days(first, self.config.lead_days.saturating_neg());
        self.end = shift_days(last, self.config.trail_days);
    }

    /// Header bands for the visible range at the current zoom level.
    pub fn header(&self) -> HeaderBands {
        header_bands(&self.projection, self.zoom, self.start(), self.end)
    }

    fn set_day_width(&mut self, day_width: f64) {
        let day_width = self.config.clamp_day_width(day_width);
        self.projection.day_width = day_width;
        self.zoom = ZoomLevel::for_day_width(day_width, &self.config);
    }
}
