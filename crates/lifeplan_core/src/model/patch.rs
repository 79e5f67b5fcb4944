//! Partial field updates for roadmap nodes.
//!
//! `None` on a patch field means "leave unchanged". Fields that can be
//! cleared are doubly optional: `Some(None)` clears, `Some(Some(v))` sets.

use super::node::{NodeStatus, Priority};
use chrono::NaiveDate;

/// Partial update accepted by `TreeStore::update_*`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodePatch {
    pub name: Option<String>,
    pub start: Option<Option<NaiveDate>>,
    pub end: Option<Option<NaiveDate>>,
    pub status: Option<NodeStatus>,
    pub priority: Option<Option<Priority>>,
    pub category: Option<Option<String>>,
    pub verified: Option<bool>,
    /// Ignored for projects.
    pub points: Option<Option<u32>>,
}

impl NodePatch {
    /// Patch setting both interval endpoints.
    pub fn dates(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
            ..Self::default()
        }
    }

    pub fn start(start: NaiveDate) -> Self {
        Self {
            start: Some(Some(start)),
            ..Self::default()
        }
    }

    pub fn end(end: NaiveDate) -> Self {
        Self {
            end: Some(Some(end)),
            ..Self::default()
        }
    }

    pub fn verified(verified: bool) -> Self {
        Self {
            verified: Some(verified),
            ..Self::default()
        }
    }

    pub fn points(points: Option<u32>) -> Self {
        Self {
            points: Some(points),
            ..Self::default()
        }
    }

    pub fn touches_dates(&self) -> bool {
        self.start.is_some() || self.end.is_some()
    }

    pub fn touches_rollups(&self) -> bool {
        self.verified.is_some() || self.points.is_some()
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
