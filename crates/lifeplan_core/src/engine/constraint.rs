//! Date and aggregate propagation across the roadmap tree.
//!
//! # Responsibility
//! - Apply an explicit interval edit at one level and restore tree
//!   invariants around it (upward extension, downward clamp).
//! - Recompute derived task intervals, points and verified rollups.
//!
//! # Invariants
//! - The explicitly edited node keeps the interval it was given.
//! - A task with dated subtasks spans exactly `min(start)..max(end)`.
//! - A project interval only grows here, except through
//!   `set_project_interval`, which clamps descendants instead.
//! - Nodes untouched by a propagation stay pointer-equal (copy-on-write).

use super::interval::{clamp_into, span, union, validate};
use crate::model::interval::Interval;
use crate::model::node::{Project, Task};
use std::sync::Arc;

/// Which propagation rule ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// A leaf edit widened its ancestors.
    Upward,
    /// An ancestor edit clamped its descendants.
    Downward,
    /// Only aggregates (interval span, points, verified) were recomputed.
    Rollup,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Upward => "upward",
            Self::Downward => "downward",
            Self::Rollup => "rollup",
        }
    }
}

/// Summary of one propagation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Propagation {
    pub direction: Direction,
    /// Descendant intervals changed by a downward clamp.
    pub clamped: usize,
    /// Whether the project interval grew to cover its tasks.
    pub project_extended: bool,
}

impl Propagation {
    fn new(direction: Direction) -> Self {
        Self {
            direction,
            clamped: 0,
            project_extended: false,
        }
    }
}

/// Explicit project edit: the project takes `interval`, descendants clamp in.
pub fn set_project_interval(project: &mut Project, interval: Interval) -> Propagation {
    let mut report = Propagation::new(Direction::Downward);
    project.interval = validate(interval);

    let bound = project.interval;
    for task in project.tasks.iter_mut() {
        if task_needs_clamp(task, bound) {
            report.clamped += clamp_task(Arc::make_mut(task), bound);
        }
    }

    // Partial bounds clamp nothing; tasks may still poke out, so cover them.
    report.project_extended = cover_tasks(project);
    refresh_project_verified(project);
    report
}

/// Explicit task edit.
///
/// A childless task takes `interval` and widens its project (upward). A task
/// with subtasks clamps them into `interval` and re-derives (downward).
pub fn set_task_interval(project: &mut Project, task_index: usize, interval: Interval) -> Propagation {
    let interval = validate(interval);
    let task = Arc::make_mut(&mut project.tasks[task_index]);
    task.explicit_interval = interval;

    let mut report = if task.is_derived() {
        let mut report = Propagation::new(Direction::Downward);
        report.clamped = clamp_subtasks(task, interval);
        refresh_task(task);
        report
    } else {
        task.interval = interval;
        Propagation::new(Direction::Upward)
    };

    report.project_extended = cover_tasks(project);
    refresh_project_verified(project);
    report
}

/// Explicit subtask edit: the subtask takes `interval`, ancestors adjust.
pub fn set_subtask_interval(
    project: &mut Project,
    task_index: usize,
    subtask_index: usize,
    interval: Interval,
) -> Propagation {
    let task = Arc::make_mut(&mut project.tasks[task_index]);
    Arc::make_mut(&mut task.subtasks[subtask_index]).interval = validate(interval);
    refresh_task(task);

    let mut report = Propagation::new(Direction::Upward);
    report.project_extended = cover_tasks(project);
    refresh_project_verified(project);
    report
}

/// Recomputes aggregates after a child-list, points or verified change.
///
/// `task_index` names the task whose children changed, if any.
pub fn rollup(project: &mut Project, task_index: Option<usize>) -> Propagation {
    if let Some(index) = task_index {
        let current = &project.tasks[index];
        // Why: an unconditional refresh would clone a shared task even when
        // nothing changed, breaking pointer equality for untouched nodes.
        if derived_values(current) != effective_values(current) {
            refresh_task(Arc::make_mut(&mut project.tasks[index]));
        }
    }

    let mut report = Propagation::new(Direction::Rollup);
    report.project_extended = cover_tasks(project);
    refresh_project_verified(project);
    report
}

/// Re-derives a task's effective interval, points and verified flag.
///
/// Without subtasks the task shows its retained explicit values.
pub fn refresh_task(task: &mut Task) {
    let (interval, points, verified) = derived_values(task);
    task.interval = interval;
    task.points = points;
    task.verified = verified;
}

/// Verified rollup for a project (invariant: AND over effective task flags).
pub fn refresh_project_verified(project: &mut Project) {
    project.verified = if project.tasks.is_empty() {
        project.explicit_verified
    } else {
        project.tasks.iter().all(|task| task.verified)
    };
}

fn derived_values(task: &Task) -> (Interval, Option<u32>, bool) {
    if task.subtasks.is_empty() {
        return (task.explicit_interval, task.explicit_points, task.explicit_verified);
    }

    let dated = span(
        task.subtasks
            .iter()
            .map(|subtask| subtask.interval)
            .filter(Interval::is_complete),
    );
    let interval = if dated.is_complete() {
        dated
    } else {
        task.explicit_interval
    };
    // Why: points arrive unchecked from callers; a plain sum can overflow.
    let points = task
        .subtasks
        .iter()
        .map(|subtask| subtask.points.unwrap_or(0))
        .fold(0u32, u32::saturating_add);
    let verified = task.subtasks.iter().all(|subtask| subtask.verified);
    (interval, Some(points), verified)
}

fn effective_values(task: &Task) -> (Interval, Option<u32>, bool) {
    (task.interval, task.points, task.verified)
}

/// Widens the project to contain every task; returns whether it grew.
fn cover_tasks(project: &mut Project) -> bool {
    let covered = union(
        project.interval,
        span(project.tasks.iter().map(|task| task.interval)),
    );
    if covered == project.interval {
        return false;
    }
    project.interval = covered;
    true
}

fn task_needs_clamp(task: &Task, bound: Interval) -> bool {
    if !bound.is_complete() {
        return false;
    }
    clamp_into(task.explicit_interval, bound) != task.explicit_interval
        || clamp_into(task.interval, bound) != task.interval
        || task
            .subtasks
            .iter()
            .any(|subtask| clamp_into(subtask.interval, bound) != subtask.interval)
}

/// Clamps a task (and its subtasks) into `bound`; returns changed intervals.
fn clamp_task(task: &mut Task, bound: Interval) -> usize {
    task.explicit_interval = clamp_into(task.explicit_interval, bound);
    if task.is_derived() {
        let clamped = clamp_subtasks(task, bound);
        let before = task.interval;
        refresh_task(task);
        return clamped + usize::from(before != task.interval);
    }

    let clamped = clamp_into(task.interval, bound);
    let changed = clamped != task.interval;
    task.interval = clamped;
    usize::from(changed)
}

fn clamp_subtasks(task: &mut Task, bound: Interval) -> usize {
    let mut changed = 0;
    for subtask in task.subtasks.iter_mut() {
        let clamped = clamp_into(subtask.interval, bound);
        if clamped != subtask.interval {
            Arc::make_mut(subtask).interval = clamped;
            changed += 1;
        }
    }
    changed
}
