//! Roadmap node records: Project, Task and Subtask.
//!
//! # Responsibility
//! - Define the three node kinds and their shared field vocabulary.
//! - Provide creation defaults for new nodes.
//!
//! # Invariants
//! - New nodes start with an empty name, an unset interval and `Backlog`.
//! - A Task keeps its last explicit interval/points/verified values next to
//!   the effective ones, so derivation never loses them.
//! - Children are held behind `Arc` and cloned only on write.

use super::interval::Interval;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use uuid::Uuid;

/// Stable identifier of any roadmap node.
pub type NodeId = Uuid;

/// The three levels of the roadmap tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Project,
    Task,
    Subtask,
}

impl NodeKind {
    /// Depth in the tree (Project = 0).
    pub fn depth(self) -> usize {
        match self {
            Self::Project => 0,
            Self::Task => 1,
            Self::Subtask => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::Task => "task",
            Self::Subtask => "subtask",
        }
    }
}

impl Display for NodeKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind-tagged node identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeRef {
    Project(NodeId),
    Task(NodeId),
    Subtask(NodeId),
}

impl NodeRef {
    pub fn id(self) -> NodeId {
        match self {
            Self::Project(id) | Self::Task(id) | Self::Subtask(id) => id,
        }
    }

    pub fn kind(self) -> NodeKind {
        match self {
            Self::Project(_) => NodeKind::Project,
            Self::Task(_) => NodeKind::Task,
            Self::Subtask(_) => NodeKind::Subtask,
        }
    }
}

impl Display for NodeRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.kind(), self.id())
    }
}

/// Workflow status shared by all node kinds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    #[default]
    Backlog,
    Sprint,
    Today,
    Active,
    Completed,
    Refinement,
}

impl NodeStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Backlog => "backlog",
            Self::Sprint => "sprint",
            Self::Today => "today",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Refinement => "refinement",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "backlog" => Some(Self::Backlog),
            "sprint" => Some(Self::Sprint),
            "today" => Some(Self::Today),
            "active" => Some(Self::Active),
            "completed" => Some(Self::Completed),
            "refinement" => Some(Self::Refinement),
            _ => None,
        }
    }
}

/// Optional urgency label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            "urgent" => Some(Self::Urgent),
            _ => None,
        }
    }
}

/// Top-level roadmap node.
#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    pub id: NodeId,
    pub name: String,
    /// Always contains every task interval (see `engine::constraint`).
    pub interval: Interval,
    pub order: usize,
    pub status: NodeStatus,
    pub priority: Option<Priority>,
    pub category: Option<String>,
    /// Effective flag: AND over tasks, or `explicit_verified` without tasks.
    pub verified: bool,
    pub explicit_verified: bool,
    pub tasks: Vec<Arc<Task>>,
}

impl Project {
    /// Creates a new empty project at sibling position `order`.
    pub fn new(order: usize) -> Self {
        Self::with_id(Uuid::new_v4(), order)
    }

    /// Creates a new empty project with a caller-provided id.
    ///
    /// Used by load paths where identity already exists.
    pub fn with_id(id: NodeId, order: usize) -> Self {
        Self {
            id,
            name: String::new(),
            interval: Interval::UNSET,
            order,
            status: NodeStatus::Backlog,
            priority: None,
            category: None,
            verified: false,
            explicit_verified: false,
            tasks: Vec::new(),
        }
    }

    pub fn task_position(&self, id: NodeId) -> Option<usize> {
        self.tasks.iter().position(|task| task.id == id)
    }
}

/// Second-level node; its interval is derived once it has subtasks.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub id: NodeId,
    pub name: String,
    /// Effective interval (derived from subtasks when any are dated).
    pub interval: Interval,
    /// Last interval set by a caller; restored when the last subtask goes.
    pub explicit_interval: Interval,
    pub order: usize,
    pub status: NodeStatus,
    pub priority: Option<Priority>,
    pub category: Option<String>,
    /// Effective flag: AND over subtasks, or `explicit_verified` without them.
    pub verified: bool,
    pub explicit_verified: bool,
    /// Effective points: sum over subtasks, or `explicit_points` without them.
    pub points: Option<u32>,
    pub explicit_points: Option<u32>,
    pub subtasks: Vec<Arc<Subtask>>,
}

impl Task {
    pub fn new(order: usize) -> Self {
        Self::with_id(Uuid::new_v4(), order)
    }

    pub fn with_id(id: NodeId, order: usize) -> Self {
        Self {
            id,
            name: String::new(),
            interval: Interval::UNSET,
            explicit_interval: Interval::UNSET,
            order,
            status: NodeStatus::Backlog,
            priority: None,
            category: None,
            verified: false,
            explicit_verified: false,
            points: None,
            explicit_points: None,
            subtasks: Vec::new(),
        }
    }

    /// Whether interval/points/verified are currently rolled up from children.
    pub fn is_derived(&self) -> bool {
        !self.subtasks.is_empty()
    }

    pub fn subtask_position(&self, id: NodeId) -> Option<usize> {
        self.subtasks.iter().position(|subtask| subtask.id == id)
    }
}

/// Leaf node.
#[derive(Debug, Clone, PartialEq)]
pub struct Subtask {
    pub id: NodeId,
    pub name: String,
    pub interval: Interval,
    pub order: usize,
    pub status: NodeStatus,
    pub priority: Option<Priority>,
    pub category: Option<String>,
    pub verified: bool,
    pub points: Option<u32>,
}

impl Subtask {
    pub fn new(order: usize) -> Self {
        Self::with_id(Uuid::new_v4(), order)
    }

    pub fn with_id(id: NodeId, order: usize) -> Self {
        Self {
            id,
            name: String::new(),
            interval: Interval::UNSET,
            order,
            status: NodeStatus::Backlog,
            priority: None,
            category: None,
            verified: false,
            points: None,
        }
    }
}
