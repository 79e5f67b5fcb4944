//! Whole-roadmap tree value and read-side lookups.
//!
//! # Responsibility
//! - Hold the ordered project list.
//! - Resolve node ids to positions for path rebuilding.
//!
//! # Invariants
//! - Cloning a `Tree` is shallow; nodes are shared until written.
//! - Lookups never allocate and never mutate.

use super::interval::Interval;
use super::node::{NodeId, NodeRef, Project, Subtask, Task};
use crate::engine::interval::span;
use std::sync::Arc;

/// Position of a task inside the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskPath {
    pub project: usize,
    pub task: usize,
}

/// Position of a subtask inside the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubtaskPath {
    pub project: usize,
    pub task: usize,
    pub subtask: usize,
}

/// The roadmap: projects in sibling order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tree {
    pub projects: Vec<Arc<Project>>,
}

impl Tree {
    pub fn new(projects: Vec<Project>) -> Self {
        Self {
            projects: projects.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    /// Number of nodes of all kinds.
    pub fn node_count(&self) -> usize {
        self.projects
            .iter()
            .map(|project| {
                1 + project
                    .tasks
                    .iter()
                    .map(|task| 1 + task.subtasks.len())
                    .sum::<usize>()
            })
            .sum()
    }

    pub fn project_position(&self, id: NodeId) -> Option<usize> {
        self.projects.iter().position(|project| project.id == id)
    }

    pub fn project(&self, id: NodeId) -> Option<&Project> {
        self.project_position(id)
            .map(|index| self.projects[index].as_ref())
    }

    pub fn locate_task(&self, id: NodeId) -> Option<TaskPath> {
        self.projects
            .iter()
            .enumerate()
            .find_map(|(project_index, project)| {
                project.task_position(id).map(|task_index| TaskPath {
                    project: project_index,
                    task: task_index,
                })
            })
    }

    pub fn task(&self, id: NodeId) -> Option<&Task> {
        self.locate_task(id)
            .map(|path| self.projects[path.project].tasks[path.task].as_ref())
    }

    pub fn locate_subtask(&self, id: NodeId) -> Option<SubtaskPath> {
        for (project_index, project) in self.projects.iter().enumerate() {
            for (task_index, task) in project.tasks.iter().enumerate() {
                if let Some(subtask_index) = task.subtask_position(id) {
                    return Some(SubtaskPath {
                        project: project_index,
                        task: task_index,
                        subtask: subtask_index,
                    });
                }
            }
        }
        None
    }

    pub fn subtask(&self, id: NodeId) -> Option<&Subtask> {
        self.locate_subtask(id).map(|path| {
            self.projects[path.project].tasks[path.task].subtasks[path.subtask].as_ref()
        })
    }

    /// Effective interval of any node.
    pub fn node_interval(&self, node: NodeRef) -> Option<Interval> {
        match node {
            NodeRef::Project(id) => self.project(id).map(|project| project.interval),
            NodeRef::Task(id) => self.task(id).map(|task| task.interval),
            NodeRef::Subtask(id) => self.subtask(id).map(|subtask| subtask.interval),
        }
    }

    /// Smallest interval covering every dated node.
    pub fn date_span(&self) -> Interval {
        span(self.projects.iter().flat_map(|project| {
            std::iter::once(project.interval).chain(project.tasks.iter().flat_map(|task| {
                std::iter::once(task.interval)
                    .chain(task.subtasks.iter().map(|subtask| subtask.interval))
            }))
        }))
    }
}
