//! Date <-> pixel projection for the roadmap timeline.
//!
//! # Responsibility
//! - Map dates to horizontal pixel offsets and back (`projection`).
//! - Bucket the visible range into header bands per zoom level (`header`).
//! - Track the visible window and zoom state (`viewport`).
//! - Flatten the tree into render rows with bar geometry (`rows`).
//!
//! # Invariants
//! - All date/pixel conversions go through one `TimelineProjection`.
//! - Nothing here mutates the tree.

pub mod config;
pub mod header;
pub mod projection;
pub mod rows;
pub mod viewport;

pub use config::{TimelineConfig, ZoomLevel};
pub use header::{header_bands, HeaderBands, HeaderSegment};
pub use projection::TimelineProjection;
pub use rows::{timeline_rows, BarGeometry, TimelineRow};
pub use viewport::TimelineViewport;
