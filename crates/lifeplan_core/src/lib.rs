//! Core domain logic for the LifePlan roadmap.
//!
//! A three-level Project -> Task -> Subtask tree whose date intervals,
//! point totals and verified flags stay consistent under every edit.
//! This crate is the single source of truth for those invariants; the FFI
//! and CLI crates only call into it.

pub mod db;
pub mod drag;
pub mod engine;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod timeline;

pub use drag::{DragConfig, DragController, DragError, DragMode, DragResult, DragState};
pub use engine::{Direction, Propagation};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::interval::Interval;
pub use model::node::{NodeId, NodeKind, NodeRef, NodeStatus, Priority, Project, Subtask, Task};
pub use model::patch::NodePatch;
pub use model::tree::Tree;
pub use repo::{
    GatewayError, GatewayResult, JsonFileGateway, PersistenceGateway, RoadmapRecords,
    SqliteRoadmapGateway,
};
pub use service::{Mutation, ReorderScope, StoreError, StoreResult, TreeStore};
pub use timeline::{
    timeline_rows, HeaderBands, HeaderSegment, TimelineConfig, TimelineProjection, TimelineRow,
    TimelineViewport, ZoomLevel,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
