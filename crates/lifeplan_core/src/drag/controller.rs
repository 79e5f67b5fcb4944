//! Drag gesture state machine.
//!
//! `Idle -> {MovingBar, ResizingLeft, ResizingRight} -> Idle`. There is no
//! cancel transition; releasing the pointer always commits.

use super::config::DragConfig;
use crate::engine::interval::{days_between, shift_days};
use crate::model::interval::Interval;
use crate::model::node::NodeRef;
use crate::model::patch::NodePatch;
use crate::service::tree_store::{StoreError, TreeStore};
use crate::timeline::projection::TimelineProjection;
use chrono::NaiveDate;
use log::{debug, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Result type for drag operations.
pub type DragResult<T> = Result<T, DragError>;

/// Errors from drag gestures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragError {
    /// A gesture is already in progress.
    AlreadyDragging,
    /// Pointer event arrived while idle.
    NotDragging,
    /// Target node does not exist.
    NotFound(NodeRef),
    /// Target has no complete interval to drag.
    IncompleteInterval(NodeRef),
    /// Applying the interval failed.
    Store(StoreError),
}

impl Display for DragError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlreadyDragging => write!(f, "a drag gesture is already active"),
            Self::NotDragging => write!(f, "no drag gesture is active"),
            Self::NotFound(node) => write!(f, "drag target not found: {node}"),
            Self::IncompleteInterval(node) => {
                write!(f, "drag target has no complete interval: {node}")
            }
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for DragError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for DragError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Gesture kind chosen at pointer-down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragMode {
    /// Shift the whole bar, keeping its duration.
    MoveBar,
    /// Move only the start edge.
    ResizeLeft,
    /// Move only the end edge.
    ResizeRight,
}

impl DragMode {
    fn as_str(self) -> &'static str {
        match self {
            Self::MoveBar => "move_bar",
            Self::ResizeLeft => "resize_left",
            Self::ResizeRight => "resize_right",
        }
    }
}

/// Observable controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragState {
    Idle,
    MovingBar(NodeRef),
    ResizingLeft(NodeRef),
    ResizingRight(NodeRef),
}

#[derive(Debug, Clone)]
struct DragSnapshot {
    target: NodeRef,
    mode: DragMode,
    start: NaiveDate,
    end: NaiveDate,
    start_pointer_x: f64,
    /// Pointer distance from the bar's left edge at pointer-down.
    grab_offset: f64,
    applied: Interval,
    last_applied_at: Option<Instant>,
}

impl DragSnapshot {
    fn compute(&self, projection: &TimelineProjection, pointer_x: f64) -> Interval {
        match self.mode {
            DragMode::MoveBar => {
                let new_start = projection.to_date(pointer_x - self.grab_offset);
                let delta = days_between(self.start, new_start);
                Interval::dated(shift_days(self.start, delta), shift_days(self.end, delta))
            }
            DragMode::ResizeLeft => {
                let delta = projection.day_delta(pointer_x - self.start_pointer_x);
                let new_start = shift_days(self.start, delta).min(self.end);
                Interval::dated(new_start, self.end)
            }
            DragMode::ResizeRight => {
                let delta = projection.day_delta(pointer_x - self.start_pointer_x);
                let new_end = shift_days(self.end, delta).max(self.start);
                Interval::dated(self.start, new_end)
            }
        }
    }
}

/// Converts pointer gestures into throttled store updates.
#[derive(Debug, Clone, Default)]
pub struct DragController {
    config: DragConfig,
    active: Option<DragSnapshot>,
}

impl DragController {
    pub fn new(config: DragConfig) -> Self {
        Self {
            config,
            active: None,
        }
    }

    pub fn state(&self) -> DragState {
        match &self.active {
            None => DragState::Idle,
            Some(snapshot) => match snapshot.mode {
                DragMode::MoveBar => DragState::MovingBar(snapshot.target),
                DragMode::ResizeLeft => DragState::ResizingLeft(snapshot.target),
                DragMode::ResizeRight => DragState::ResizingRight(snapshot.target),
            },
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.active.is_some()
    }

    /// Pointer-down on `target`'s bar or one of its edges.
    pub fn begin(
        &mut self,
        store: &TreeStore,
        projection: &TimelineProjection,
        target: NodeRef,
        mode: DragMode,
        pointer_x: f64,
    ) -> DragResult<()> {
        if self.active.is_some() {
            return Err(DragError::AlreadyDragging);
        }
        let interval = store
            .node_interval(target)
            .ok_or(DragError::NotFound(target))?;
        let (start, end) = interval
            .bounds()
            .ok_or(DragError::IncompleteInterval(target))?;

        self.active = Some(DragSnapshot {
            target,
            mode,
            start,
            end,
            start_pointer_x: pointer_x,
            grab_offset: pointer_x - projection.to_pixel(start),
            applied: interval,
            last_applied_at: None,
        });
        debug!(
            "event=drag_begin module=drag status=ok kind={} mode={}",
            target.kind(),
            mode.as_str()
        );
        Ok(())
    }

    /// Pointer movement at `now`; applies the interval unless throttled.
    ///
    /// Returns the interval computed for this pointer position.
    pub fn pointer_moved(
        &mut self,
        store: &mut TreeStore,
        projection: &TimelineProjection,
        pointer_x: f64,
        now: Instant,
    ) -> DragResult<Interval> {
        let throttle = self.config.throttle();
        let snapshot = self.active.as_mut().ok_or(DragError::NotDragging)?;
        let computed = snapshot.compute(projection, pointer_x);

        let due = snapshot
            .last_applied_at
            .map_or(true, |last| now.saturating_duration_since(last) >= throttle);
        if due && computed != snapshot.applied {
            apply(store, snapshot.target, computed)?;
            snapshot.applied = computed;
            snapshot.last_applied_at = Some(now);
        }
        Ok(computed)
    }

    /// Pointer-up: applies the final interval and returns to idle.
    pub fn release(
        &mut self,
        store: &mut TreeStore,
        projection: &TimelineProjection,
        pointer_x: f64,
    ) -> DragResult<Interval> {
        let snapshot = self.active.take().ok_or(DragError::NotDragging)?;
        let computed = snapshot.compute(projection, pointer_x);
        if computed != snapshot.applied {
            if let Err(err) = apply(store, snapshot.target, computed) {
                warn!(
                    "event=drag_release module=drag status=error kind={} error={}",
                    snapshot.target.kind(),
                    err
                );
                return Err(err.into());
            }
        }
        debug!(
            "event=drag_release module=drag status=ok kind={} mode={}",
            snapshot.target.kind(),
            snapshot.mode.as_str()
        );
        Ok(computed)
    }
}

fn apply(store: &mut TreeStore, target: NodeRef, interval: Interval) -> Result<(), StoreError> {
    let patch = NodePatch::dates(interval.start, interval.end);
    match target {
        NodeRef::Project(id) => store.update_project(id, patch).map(|_| ()),
        NodeRef::Task(id) => store.update_task(id, patch).map(|_| ()),
        NodeRef::Subtask(id) => store.update_subtask(id, patch).map(|_| ()),
    }
}
