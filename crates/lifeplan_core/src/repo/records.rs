//! Flat wire records for the roadmap tree.
//!
//! # Responsibility
//! - Flatten the tree into three record collections (projects, tasks,
//!   subtasks) linked by parent ids.
//! - Rebuild a tree from records and restore every derived value.
//!
//! # Invariants
//! - Dates travel as `YYYY-MM-DD`; an empty string means unset.
//! - Rebuilt siblings are ordered by `order`, then densified to `0..n-1`.
//! - Records whose parent is missing are dropped with a warning.
//! - Unknown status/priority values are rejected, not masked.

use super::gateway::{GatewayError, GatewayResult};
use crate::engine::constraint;
use crate::engine::interval::validate;
use crate::model::interval::{format_date_field, parse_date_field, Interval};
use crate::model::node::{NodeId, NodeStatus, Priority, Project, Subtask, Task};
use crate::model::tree::Tree;
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

fn default_status() -> String {
    NodeStatus::Backlog.as_str().to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRecord {
    pub id: NodeId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub verified: bool,
    /// Flag set by the caller; older documents fall back to `verified`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explicit_verified: Option<bool>,
    #[serde(default)]
    pub order: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    pub id: NodeId,
    pub project_id: NodeId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
    #[serde(default)]
    pub explicit_start_date: String,
    #[serde(default)]
    pub explicit_end_date: String,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Caller-entered estimate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<u32>,
    /// Sum over subtasks; present only while the task has subtasks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_points: Option<u32>,
    #[serde(default)]
    pub verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explicit_verified: Option<bool>,
    #[serde(default)]
    pub order: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubtaskRecord {
    pub id: NodeId,
    pub project_id: NodeId,
    pub task_id: NodeId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<u32>,
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub order: usize,
}

/// The whole tree as three flat collections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoadmapRecords {
    #[serde(default)]
    pub projects: Vec<ProjectRecord>,
    #[serde(default)]
    pub tasks: Vec<TaskRecord>,
    #[serde(default)]
    pub subtasks: Vec<SubtaskRecord>,
}

impl RoadmapRecords {
    /// Flattens `tree` in sibling order.
    pub fn from_tree(tree: &Tree) -> Self {
        let mut records = Self::default();
        for project in &tree.projects {
            records.projects.push(ProjectRecord {
                id: project.id,
                name: project.name.clone(),
                start_date: format_date_field(project.interval.start),
                end_date: format_date_field(project.interval.end),
                status: project.status.as_str().to_string(),
                priority: project.priority.map(|value| value.as_str().to_string()),
                category: project.category.clone(),
                verified: project.verified,
                explicit_verified: Some(project.explicit_verified),
                order: project.order,
            });

            for task in &project.tasks {
                records.tasks.push(TaskRecord {
                    id: task.id,
                    project_id: project.id,
                    name: task.name.clone(),
                    start_date: format_date_field(task.interval.start),
                    end_date: format_date_field(task.interval.end),
                    explicit_start_date: format_date_field(task.explicit_interval.start),
                    explicit_end_date: format_date_field(task.explicit_interval.end),
                    status: task.status.as_str().to_string(),
                    priority: task.priority.map(|value| value.as_str().to_string()),
                    category: task.category.clone(),
                    points: task.explicit_points,
                    total_points: if task.is_derived() { task.points } else { None },
                    verified: task.verified,
                    explicit_verified: Some(task.explicit_verified),
                    order: task.order,
                });

                for subtask in &task.subtasks {
                    records.subtasks.push(SubtaskRecord {
                        id: subtask.id,
                        project_id: project.id,
                        task_id: task.id,
                        name: subtask.name.clone(),
                        start_date: format_date_field(subtask.interval.start),
                        end_date: format_date_field(subtask.interval.end),
                        status: subtask.status.as_str().to_string(),
                        priority: subtask.priority.map(|value| value.as_str().to_string()),
                        category: subtask.category.clone(),
                        points: subtask.points,
                        verified: subtask.verified,
                        order: subtask.order,
                    });
                }
            }
        }
        records
    }

    /// Rebuilds the tree and recomputes every derived value.
    pub fn into_tree(self) -> GatewayResult<Tree> {
        let mut subtasks_by_task: HashMap<NodeId, Vec<(NodeId, Subtask)>> = HashMap::new();
        for record in self.subtasks {
            let parent = (record.project_id, record.task_id);
            subtasks_by_task
                .entry(parent.1)
                .or_default()
                .push((parent.0, subtask_from_record(record)?));
        }

        let mut tasks_by_project: HashMap<NodeId, Vec<Task>> = HashMap::new();
        for record in self.tasks {
            let project_id = record.project_id;
            let mut task = task_from_record(&record)?;
            let mut children = subtasks_by_task.remove(&task.id).unwrap_or_default();
            let before = children.len();
            children.retain(|(owner, _)| *owner == project_id);
            if children.len() != before {
                warn!(
                    "event=roadmap_rebuild module=repo status=degraded reason=subtask_project_mismatch dropped={}",
                    before - children.len()
                );
            }
            let mut children: Vec<Subtask> = children.into_iter().map(|(_, node)| node).collect();
            children.sort_by_key(|subtask| subtask.order);
            task.subtasks = children.into_iter().map(Arc::new).collect();

            if task.subtasks.is_empty() {
                // Childless tasks show their explicit interval.
                task.explicit_interval = task.interval;
            }
            tasks_by_project.entry(project_id).or_default().push(task);
        }

        let orphan_subtasks: usize = subtasks_by_task.values().map(Vec::len).sum();
        if orphan_subtasks > 0 {
            warn!(
                "event=roadmap_rebuild module=repo status=degraded reason=orphan_subtasks dropped={}",
                orphan_subtasks
            );
        }

        let mut projects = Vec::with_capacity(self.projects.len());
        for record in self.projects {
            let mut project = project_from_record(&record)?;
            let mut tasks = tasks_by_project.remove(&project.id).unwrap_or_default();
            tasks.sort_by_key(|task| task.order);
            project.tasks = tasks.into_iter().map(Arc::new).collect();
            projects.push(project);
        }

        let orphan_tasks: usize = tasks_by_project.values().map(Vec::len).sum();
        if orphan_tasks > 0 {
            warn!(
                "event=roadmap_rebuild module=repo status=degraded reason=orphan_tasks dropped={}",
                orphan_tasks
            );
        }

        projects.sort_by_key(|project| project.order);
        for (index, project) in projects.iter_mut().enumerate() {
            project.order = index;
            for (task_index, task) in project.tasks.iter_mut().enumerate() {
                let task = Arc::make_mut(task);
                task.order = task_index;
                for (subtask_index, subtask) in task.subtasks.iter_mut().enumerate() {
                    Arc::make_mut(subtask).order = subtask_index;
                }
                constraint::refresh_task(task);
            }
            constraint::rollup(project, None);
        }

        Ok(Tree::new(projects))
    }
}

fn parse_status(value: &str, column: &'static str) -> GatewayResult<NodeStatus> {
    NodeStatus::parse(value)
        .ok_or_else(|| GatewayError::InvalidData(format!("invalid status `{value}` in {column}")))
}

fn parse_priority(value: Option<&str>, column: &'static str) -> GatewayResult<Option<Priority>> {
    match value {
        None => Ok(None),
        Some(text) => Priority::parse(text).map(Some).ok_or_else(|| {
            GatewayError::InvalidData(format!("invalid priority `{text}` in {column}"))
        }),
    }
}

fn interval_from_fields(start: &str, end: &str) -> Interval {
    validate(Interval::new(parse_date_field(start), parse_date_field(end)))
}

fn project_from_record(record: &ProjectRecord) -> GatewayResult<Project> {
    let mut project = Project::with_id(record.id, record.order);
    project.name = record.name.clone();
    project.interval = interval_from_fields(&record.start_date, &record.end_date);
    project.status = parse_status(&record.status, "projects.status")?;
    project.priority = parse_priority(record.priority.as_deref(), "projects.priority")?;
    project.category = record.category.clone();
    project.explicit_verified = record.explicit_verified.unwrap_or(record.verified);
    project.verified = record.verified;
    Ok(project)
}

fn task_from_record(record: &TaskRecord) -> GatewayResult<Task> {
    let mut task = Task::with_id(record.id, record.order);
    task.name = record.name.clone();
    task.interval = interval_from_fields(&record.start_date, &record.end_date);
    task.explicit_interval =
        interval_from_fields(&record.explicit_start_date, &record.explicit_end_date);
    task.status = parse_status(&record.status, "tasks.status")?;
    task.priority = parse_priority(record.priority.as_deref(), "tasks.priority")?;
    task.category = record.category.clone();
    task.explicit_points = record.points;
    task.points = record.total_points.or(record.points);
    task.explicit_verified = record.explicit_verified.unwrap_or(record.verified);
    task.verified = record.verified;
    Ok(task)
}

fn subtask_from_record(record: SubtaskRecord) -> GatewayResult<Subtask> {
    let mut subtask = Subtask::with_id(record.id, record.order);
    subtask.interval = interval_from_fields(&record.start_date, &record.end_date);
    subtask.status = parse_status(&record.status, "subtasks.status")?;
    subtask.priority = parse_priority(record.priority.as_deref(), "subtasks.priority")?;
    subtask.name = record.name;
    subtask.category = record.category;
    subtask.points = record.points;
    subtask.verified = record.verified;
    Ok(subtask)
}
