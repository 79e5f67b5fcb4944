//! Roadmap mutation API over the in-memory tree.
//!
//! # Responsibility
//! - Apply create/update/delete/reorder requests to the roadmap tree.
//! - Run the constraint engine after every committed change.
//! - Hand each committed snapshot to the background save worker.
//!
//! # Invariants
//! - Every operation completes, including propagation, before returning.
//! - A failed operation leaves the current tree untouched.
//! - Edits rebuild only the path from the root to the changed node; every
//!   other subtree stays shared with the previous snapshot.
//!
//! # See also
//! - `engine::constraint` for the propagation rules.
//! - `service::save_worker` for fire-and-forget persistence.

use crate::engine::constraint::{self, Propagation};
use crate::engine::interval::ensure;
use crate::engine::order::{densify, move_within};
use crate::model::interval::Interval;
use crate::model::node::{NodeId, NodeKind, NodeRef, Project, Subtask, Task};
use crate::model::patch::NodePatch;
use crate::model::tree::Tree;
use crate::repo::gateway::PersistenceGateway;
use crate::service::save_worker::SaveWorkerHandle;
use chrono::NaiveDate;
use log::{debug, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors from store operations. Every error leaves the tree unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Target node does not exist.
    NotFound(NodeRef),
    /// Parent chain named by a create or reorder request does not exist.
    ParentNotFound(NodeRef),
    /// Reorder index outside the sibling list.
    InvalidReorder {
        scope: ReorderScope,
        from: usize,
        to: usize,
        len: usize,
    },
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(node) => write!(f, "roadmap node not found: {node}"),
            Self::ParentNotFound(node) => write!(f, "roadmap parent not found: {node}"),
            Self::InvalidReorder {
                scope,
                from,
                to,
                len,
            } => write!(
                f,
                "invalid reorder in {scope}: from={from} to={to} len={len}"
            ),
        }
    }
}

impl Error for StoreError {}

/// One sibling list addressed by `reorder`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReorderScope {
    Projects,
    Tasks { project_id: NodeId },
    Subtasks { project_id: NodeId, task_id: NodeId },
}

impl Display for ReorderScope {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Projects => write!(f, "projects"),
            Self::Tasks { project_id } => write!(f, "tasks of project {project_id}"),
            Self::Subtasks {
                project_id,
                task_id,
            } => write!(f, "subtasks of task {task_id} in project {project_id}"),
        }
    }
}

/// One update inside `TreeStore::apply_batch`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    UpdateProject(NodeId, NodePatch),
    UpdateTask(NodeId, NodePatch),
    UpdateSubtask(NodeId, NodePatch),
}

impl Mutation {
    pub fn target(&self) -> NodeRef {
        match self {
            Self::UpdateProject(id, _) => NodeRef::Project(*id),
            Self::UpdateTask(id, _) => NodeRef::Task(*id),
            Self::UpdateSubtask(id, _) => NodeRef::Subtask(*id),
        }
    }

    fn patch(&self) -> &NodePatch {
        match self {
            Self::UpdateProject(_, patch)
            | Self::UpdateTask(_, patch)
            | Self::UpdateSubtask(_, patch) => patch,
        }
    }
}

type TodayFn = Box<dyn Fn() -> NaiveDate + Send>;

/// Single-writer owner of the roadmap tree.
pub struct TreeStore {
    tree: Tree,
    today: TodayFn,
    persistence: Option<SaveWorkerHandle>,
}

impl TreeStore {
    /// Creates a store without persistence.
    pub fn in_memory(tree: Tree) -> Self {
        Self {
            tree,
            today: Box::new(|| chrono::Local::now().date_naive()),
            persistence: None,
        }
    }

    /// Loads the tree through `gateway` and starts the save worker that owns it.
    pub fn open(gateway: Box<dyn PersistenceGateway>) -> std::io::Result<Self> {
        let tree = gateway.load();
        let worker = SaveWorkerHandle::start(gateway)?;
        let mut store = Self::in_memory(tree);
        store.persistence = Some(worker);
        Ok(store)
    }

    /// Replaces the clock used to fill missing dates.
    pub fn with_today(mut self, today: impl Fn() -> NaiveDate + Send + 'static) -> Self {
        self.today = Box::new(today);
        self
    }

    /// Current snapshot.
    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn project(&self, id: NodeId) -> Option<&Project> {
        self.tree.project(id)
    }

    pub fn task(&self, id: NodeId) -> Option<&Task> {
        self.tree.task(id)
    }

    pub fn subtask(&self, id: NodeId) -> Option<&Subtask> {
        self.tree.subtask(id)
    }

    pub fn node_interval(&self, node: NodeRef) -> Option<Interval> {
        self.tree.node_interval(node)
    }

    /// Blocks until every snapshot committed so far has been handed to the gateway.
    ///
    /// Returns `true` immediately for in-memory stores.
    pub fn flush(&self) -> bool {
        match &self.persistence {
            Some(worker) => worker.flush(),
            None => true,
        }
    }

    /// Appends a new empty project.
    pub fn add_project(&mut self) -> Project {
        let mut next = self.tree.clone();
        let project = Project::new(next.projects.len());
        next.projects.push(Arc::new(project.clone()));
        self.commit(next, "project_add", NodeKind::Project);
        project
    }

    /// Appends a new empty task to `project_id`.
    pub fn add_task(&mut self, project_id: NodeId) -> StoreResult<Task> {
        let mut next = self.tree.clone();
        let Some(project_index) = next.project_position(project_id) else {
            return Err(self.reject(
                "task_add",
                StoreError::ParentNotFound(NodeRef::Project(project_id)),
            ));
        };

        let project = Arc::make_mut(&mut next.projects[project_index]);
        let task = Task::new(project.tasks.len());
        project.tasks.push(Arc::new(task.clone()));
        constraint::rollup(project, None);

        self.commit(next, "task_add", NodeKind::Task);
        Ok(task)
    }

    /// Appends a new empty subtask to `task_id`, which must belong to `project_id`.
    pub fn add_subtask(&mut self, project_id: NodeId, task_id: NodeId) -> StoreResult<Subtask> {
        let mut next = self.tree.clone();
        let Some(project_index) = next.project_position(project_id) else {
            return Err(self.reject(
                "subtask_add",
                StoreError::ParentNotFound(NodeRef::Project(project_id)),
            ));
        };
        let Some(task_index) = next.projects[project_index].task_position(task_id) else {
            return Err(self.reject(
                "subtask_add",
                StoreError::ParentNotFound(NodeRef::Task(task_id)),
            ));
        };

        let project = Arc::make_mut(&mut next.projects[project_index]);
        let task = Arc::make_mut(&mut project.tasks[task_index]);
        let subtask = Subtask::new(task.subtasks.len());
        task.subtasks.push(Arc::new(subtask.clone()));
        constraint::rollup(project, Some(task_index));

        self.commit(next, "subtask_add", NodeKind::Subtask);
        Ok(subtask)
    }

    /// Applies `patch` to a project and propagates.
    pub fn update_project(&mut self, id: NodeId, patch: NodePatch) -> StoreResult<Project> {
        self.update(Mutation::UpdateProject(id, patch))?;
        self.tree
            .project(id)
            .cloned()
            .ok_or(StoreError::NotFound(NodeRef::Project(id)))
    }

    /// Applies `patch` to a task and propagates.
    pub fn update_task(&mut self, id: NodeId, patch: NodePatch) -> StoreResult<Task> {
        self.update(Mutation::UpdateTask(id, patch))?;
        self.tree
            .task(id)
            .cloned()
            .ok_or(StoreError::NotFound(NodeRef::Task(id)))
    }

    /// Applies `patch` to a subtask and propagates.
    pub fn update_subtask(&mut self, id: NodeId, patch: NodePatch) -> StoreResult<Subtask> {
        self.update(Mutation::UpdateSubtask(id, patch))?;
        self.tree
            .subtask(id)
            .cloned()
            .ok_or(StoreError::NotFound(NodeRef::Subtask(id)))
    }

    /// Applies several updates as one edit with one save.
    ///
    /// Mutations run deepest-first (subtasks, then tasks, then projects) so
    /// every upward extension lands before any downward clamp. Results are
    /// reported in input order.
    pub fn apply_batch(&mut self, mutations: Vec<Mutation>) -> Vec<StoreResult<()>> {
        let today = (self.today)();
        let mut next = self.tree.clone();
        let mut sequence: Vec<usize> = (0..mutations.len()).collect();
        sequence.sort_by_key(|&index| {
            std::cmp::Reverse(mutations[index].target().kind().depth())
        });

        let mut results: Vec<StoreResult<()>> = vec![Ok(()); mutations.len()];
        for index in sequence {
            results[index] = apply_mutation(&mut next, &mutations[index], today).map(|_| ());
        }

        let applied = results.iter().filter(|result| result.is_ok()).count();
        if applied > 0 {
            self.tree = next;
            self.enqueue_save();
        }
        debug!(
            "event=batch_apply module=store status={} applied={} rejected={}",
            if applied > 0 { "ok" } else { "noop" },
            applied,
            mutations.len() - applied
        );
        results
    }

    /// Removes a project and its subtree.
    pub fn delete_project(&mut self, id: NodeId) -> StoreResult<()> {
        let mut next = self.tree.clone();
        let Some(index) = next.project_position(id) else {
            return Err(self.reject("project_delete", StoreError::NotFound(NodeRef::Project(id))));
        };
        next.projects.remove(index);
        densify(&mut next.projects);
        self.commit(next, "project_delete", NodeKind::Project);
        Ok(())
    }

    /// Removes a task and its subtasks; the project re-derives.
    pub fn delete_task(&mut self, id: NodeId) -> StoreResult<()> {
        let mut next = self.tree.clone();
        let Some(path) = next.locate_task(id) else {
            return Err(self.reject("task_delete", StoreError::NotFound(NodeRef::Task(id))));
        };
        let project = Arc::make_mut(&mut next.projects[path.project]);
        project.tasks.remove(path.task);
        densify(&mut project.tasks);
        constraint::rollup(project, None);
        self.commit(next, "task_delete", NodeKind::Task);
        Ok(())
    }

    /// Removes a subtask; its task re-derives (or reverts to explicit values).
    pub fn delete_subtask(&mut self, id: NodeId) -> StoreResult<()> {
        let mut next = self.tree.clone();
        let Some(path) = next.locate_subtask(id) else {
            return Err(self.reject("subtask_delete", StoreError::NotFound(NodeRef::Subtask(id))));
        };
        let project = Arc::make_mut(&mut next.projects[path.project]);
        let task = Arc::make_mut(&mut project.tasks[path.task]);
        task.subtasks.remove(path.subtask);
        densify(&mut task.subtasks);
        constraint::rollup(project, Some(path.task));
        self.commit(next, "subtask_delete", NodeKind::Subtask);
        Ok(())
    }

    /// Moves one sibling so it lands at `to` in the resulting list.
    pub fn reorder(&mut self, scope: ReorderScope, from: usize, to: usize) -> StoreResult<()> {
        let mut next = self.tree.clone();
        let (moved, len) = match scope {
            ReorderScope::Projects => {
                let len = next.projects.len();
                (move_within(&mut next.projects, from, to), len)
            }
            ReorderScope::Tasks { project_id } => {
                let Some(project_index) = next.project_position(project_id) else {
                    return Err(self.reject(
                        "reorder",
                        StoreError::ParentNotFound(NodeRef::Project(project_id)),
                    ));
                };
                let project = Arc::make_mut(&mut next.projects[project_index]);
                let len = project.tasks.len();
                (move_within(&mut project.tasks, from, to), len)
            }
            ReorderScope::Subtasks {
                project_id,
                task_id,
            } => {
                let Some(project_index) = next.project_position(project_id) else {
                    return Err(self.reject(
                        "reorder",
                        StoreError::ParentNotFound(NodeRef::Project(project_id)),
                    ));
                };
                let Some(task_index) = next.projects[project_index].task_position(task_id) else {
                    return Err(self.reject(
                        "reorder",
                        StoreError::ParentNotFound(NodeRef::Task(task_id)),
                    ));
                };
                let project = Arc::make_mut(&mut next.projects[project_index]);
                let task = Arc::make_mut(&mut project.tasks[task_index]);
                let len = task.subtasks.len();
                (move_within(&mut task.subtasks, from, to), len)
            }
        };

        if !moved {
            return Err(self.reject(
                "reorder",
                StoreError::InvalidReorder {
                    scope,
                    from,
                    to,
                    len,
                },
            ));
        }

        self.tree = next;
        self.enqueue_save();
        debug!(
            "event=reorder module=store status=ok from={} to={} len={}",
            from, to, len
        );
        Ok(())
    }

    fn update(&mut self, mutation: Mutation) -> StoreResult<()> {
        let today = (self.today)();
        let mut next = self.tree.clone();
        let target = mutation.target();
        match apply_mutation(&mut next, &mutation, today) {
            Ok(report) => {
                self.tree = next;
                self.enqueue_save();
                match report {
                    Some(report) => debug!(
                        "event=node_update module=store status=ok kind={} direction={} clamped={} project_extended={}",
                        target.kind(),
                        report.direction.as_str(),
                        report.clamped,
                        report.project_extended
                    ),
                    None => debug!(
                        "event=node_update module=store status=ok kind={} direction=none",
                        target.kind()
                    ),
                }
                Ok(())
            }
            Err(err) => Err(self.reject("node_update", err)),
        }
    }

    fn commit(&mut self, next: Tree, event: &str, kind: NodeKind) {
        self.tree = next;
        self.enqueue_save();
        debug!("event={} module=store status=ok kind={}", event, kind);
    }

    fn enqueue_save(&self) {
        if let Some(worker) = &self.persistence {
            if !worker.enqueue(self.tree.clone()) {
                warn!("event=persist_enqueue module=store status=error reason=worker_stopped");
            }
        }
    }

    fn reject(&self, event: &str, err: StoreError) -> StoreError {
        let reason = match &err {
            StoreError::NotFound(_) => "not_found",
            StoreError::ParentNotFound(_) => "parent_not_found",
            StoreError::InvalidReorder { .. } => "index_out_of_range",
        };
        warn!(
            "event={} module=store status=noop reason={} error={}",
            event, reason, err
        );
        err
    }
}

macro_rules! apply_labels {
    ($node:expr, $patch:expr) => {{
        if let Some(name) = &$patch.name {
            $node.name = name.clone();
        }
        if let Some(status) = $patch.status {
            $node.status = status;
        }
        if let Some(priority) = $patch.priority {
            $node.priority = priority;
        }
        if let Some(category) = &$patch.category {
            $node.category = category.clone();
        }
    }};
}

/// Applies one update to `tree`; `None` means no propagation was needed.
fn apply_mutation(
    tree: &mut Tree,
    mutation: &Mutation,
    today: NaiveDate,
) -> StoreResult<Option<Propagation>> {
    let patch = mutation.patch();
    match mutation.target() {
        NodeRef::Project(id) => {
            let index = tree
                .project_position(id)
                .ok_or(StoreError::NotFound(NodeRef::Project(id)))?;
            let project = Arc::make_mut(&mut tree.projects[index]);
            apply_labels!(project, patch);
            if let Some(verified) = patch.verified {
                project.explicit_verified = verified;
            }

            Ok(if patch.touches_dates() {
                let requested = ensure(merged_interval(project.interval, patch), today);
                Some(constraint::set_project_interval(project, requested))
            } else if patch.verified.is_some() {
                Some(constraint::rollup(project, None))
            } else {
                None
            })
        }
        NodeRef::Task(id) => {
            let path = tree
                .locate_task(id)
                .ok_or(StoreError::NotFound(NodeRef::Task(id)))?;
            let project = Arc::make_mut(&mut tree.projects[path.project]);
            let task = Arc::make_mut(&mut project.tasks[path.task]);
            apply_labels!(task, patch);
            if let Some(verified) = patch.verified {
                task.explicit_verified = verified;
            }
            if let Some(points) = patch.points {
                task.explicit_points = points;
            }
            let current = task.interval;

            Ok(if patch.touches_dates() {
                let requested = ensure(merged_interval(current, patch), today);
                Some(constraint::set_task_interval(project, path.task, requested))
            } else if patch.touches_rollups() {
                Some(constraint::rollup(project, Some(path.task)))
            } else {
                None
            })
        }
        NodeRef::Subtask(id) => {
            let path = tree
                .locate_subtask(id)
                .ok_or(StoreError::NotFound(NodeRef::Subtask(id)))?;
            let project = Arc::make_mut(&mut tree.projects[path.project]);
            let task = Arc::make_mut(&mut project.tasks[path.task]);
            let subtask = Arc::make_mut(&mut task.subtasks[path.subtask]);
            apply_labels!(subtask, patch);
            if let Some(verified) = patch.verified {
                subtask.verified = verified;
            }
            if let Some(points) = patch.points {
                subtask.points = points;
            }
            let current = subtask.interval;

            Ok(if patch.touches_dates() {
                let requested = ensure(merged_interval(current, patch), today);
                Some(constraint::set_subtask_interval(
                    project,
                    path.task,
                    path.subtask,
                    requested,
                ))
            } else if patch.touches_rollups() {
                Some(constraint::rollup(project, Some(path.task)))
            } else {
                None
            })
        }
    }
}

fn merged_interval(current: Interval, patch: &NodePatch) -> Interval {
    Interval::new(
        patch.start.unwrap_or(current.start),
        patch.end.unwrap_or(current.end),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::node::NodeStatus;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn store() -> TreeStore {
        TreeStore::in_memory(Tree::default()).with_today(|| day(2024, 6, 1))
    }

    #[test]
    fn add_task_appends_with_unset_interval() {
        let mut store = store();
        let project = store.add_project();
        store.add_task(project.id).unwrap();
        let second = store.add_task(project.id).unwrap();

        assert_eq!(second.order, 1);
        assert_eq!(second.status, NodeStatus::Backlog);
        assert!(second.interval.is_unset());
    }

    #[test]
    fn missing_start_is_filled_from_clock() {
        let mut store = store();
        let project = store.add_project();
        let task = store.add_task(project.id).unwrap();

        let updated = store
            .update_task(task.id, NodePatch::end(day(2024, 6, 10)))
            .unwrap();
        assert_eq!(updated.interval, Interval::dated(day(2024, 6, 1), day(2024, 6, 10)));
    }

    #[test]
    fn missing_end_defaults_to_next_day() {
        let mut store = store();
        let project = store.add_project();
        let updated = store
            .update_project(project.id, NodePatch::start(day(2024, 3, 4)))
            .unwrap();
        assert_eq!(updated.interval, Interval::dated(day(2024, 3, 4), day(2024, 3, 5)));
    }

    #[test]
    fn label_only_patch_keeps_untouched_projects_shared() {
        let mut store = store();
        let first = store.add_project();
        store.add_project();
        let before = store.tree().clone();

        store
            .update_project(
                first.id,
                NodePatch {
                    name: Some("Launch".to_string()),
                    ..NodePatch::default()
                },
            )
            .unwrap();

        let after = store.tree();
        assert_eq!(after.projects[0].name, "Launch");
        assert!(!Arc::ptr_eq(&before.projects[0], &after.projects[0]));
        assert!(Arc::ptr_eq(&before.projects[1], &after.projects[1]));
    }

    #[test]
    fn unknown_ids_are_rejected_without_change() {
        let mut store = store();
        store.add_project();
        let before = store.tree().clone();
        let missing = uuid::Uuid::new_v4();

        assert_eq!(
            store.update_task(missing, NodePatch::verified(true)),
            Err(StoreError::NotFound(NodeRef::Task(missing)))
        );
        assert_eq!(
            store.add_subtask(missing, missing),
            Err(StoreError::ParentNotFound(NodeRef::Project(missing)))
        );
        assert_eq!(store.tree(), &before);
    }

    #[test]
    fn reorder_rejects_out_of_range() {
        let mut store = store();
        store.add_project();
        store.add_project();

        let err = store.reorder(ReorderScope::Projects, 0, 2).unwrap_err();
        assert!(matches!(err, StoreError::InvalidReorder { len: 2, .. }));
    }

    #[test]
    fn batch_reports_per_mutation_results() {
        let mut store = store();
        let project = store.add_project();
        let missing = uuid::Uuid::new_v4();

        let results = store.apply_batch(vec![
            Mutation::UpdateProject(project.id, NodePatch::verified(true)),
            Mutation::UpdateSubtask(missing, NodePatch::verified(true)),
        ]);
        assert_eq!(results[0], Ok(()));
        assert_eq!(
            results[1],
            Err(StoreError::NotFound(NodeRef::Subtask(missing)))
        );
        assert!(store.project(project.id).unwrap().verified);
    }
}
