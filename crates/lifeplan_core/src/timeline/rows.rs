//! Flattened render rows for the timeline body.

use super::projection::TimelineProjection;
use crate::model::interval::Interval;
use crate::model::node::{NodeRef, NodeStatus};
use crate::model::tree::Tree;

/// Horizontal placement of a bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarGeometry {
    pub x: f64,
    pub width: f64,
}

/// One timeline row: a project, task or subtask.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineRow {
    pub node: NodeRef,
    /// 0 for projects, 1 for tasks, 2 for subtasks.
    pub depth: usize,
    pub label: String,
    pub status: NodeStatus,
    pub verified: bool,
    pub interval: Interval,
    /// `None` while either endpoint is unset.
    pub bar: Option<BarGeometry>,
}

/// Depth-first rows: each project, then its tasks, each followed by its subtasks.
pub fn timeline_rows(tree: &Tree, projection: &TimelineProjection) -> Vec<TimelineRow> {
    let mut rows = Vec::with_capacity(tree.node_count());
    for project in &tree.projects {
        rows.push(row(
            projection,
            NodeRef::Project(project.id),
            &project.name,
            project.status,
            project.verified,
            project.interval,
        ));
        for task in &project.tasks {
            rows.push(row(
                projection,
                NodeRef::Task(task.id),
                &task.name,
                task.status,
                task.verified,
                task.interval,
            ));
            for subtask in &task.subtasks {
                rows.push(row(
                    projection,
                    NodeRef::Subtask(subtask.id),
                    &subtask.name,
                    subtask.status,
                    subtask.verified,
                    subtask.interval,
                ));
            }
        }
    }
    rows
}

fn row(
    projection: &TimelineProjection,
    node: NodeRef,
    label: &str,
    status: NodeStatus,
    verified: bool,
    interval: Interval,
) -> TimelineRow {
    TimelineRow {
        node,
        depth: node.kind().depth(),
        label: label.to_string(),
        status,
        verified,
        interval,
        bar: projection
            .bar(interval)
            .map(|(x, width)| BarGeometry { x, width }),
    }
}
