//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose roadmap edits and snapshots to Dart via FRB.
//! - Own the one process-wide `TreeStore`, persisted through SQLite.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Node ids cross the boundary as UUID strings; dates as `YYYY-MM-DD`
//!   (empty string for unset).
//! - Every mutation goes through `TreeStore`, so tree invariants hold after
//!   each call returns.

use lifeplan_core::model::interval::{format_date_field, parse_date_field};
use lifeplan_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    NodeId, NodeKind, NodePatch, NodeRef, NodeStatus, ReorderScope, SqliteRoadmapGateway,
    TreeStore,
};
use log::{error, warn};
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, OnceLock};
use uuid::Uuid;

const ROADMAP_DB_FILE_NAME: &str = "lifeplan_roadmap.sqlite3";
static ROADMAP_DB_PATH: OnceLock<PathBuf> = OnceLock::new();
static ROADMAP_STORE: OnceLock<Result<Mutex<TreeStore>, String>> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Result envelope for roadmap commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoadmapActionResponse {
    /// Whether the command was applied.
    pub ok: bool,
    /// Created or affected node id.
    pub node_id: Option<String>,
    /// Human-readable message for diagnostics/UI.
    pub message: String,
}

impl RoadmapActionResponse {
    fn success(message: impl Into<String>, node_id: Option<NodeId>) -> Self {
        Self {
            ok: true,
            node_id: node_id.map(|id| id.to_string()),
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            node_id: None,
            message: message.into(),
        }
    }
}

/// One flattened roadmap row for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoadmapNodeItem {
    pub node_id: String,
    /// `project|task|subtask`.
    pub kind: String,
    /// Parent id (`None` for projects).
    pub parent_id: Option<String>,
    pub name: String,
    pub start_date: String,
    pub end_date: String,
    pub status: String,
    pub verified: bool,
    pub points: Option<u32>,
    pub order: u32,
}

/// Creates an empty project at the end of the roadmap.
#[flutter_rust_bridge::frb(sync)]
pub fn roadmap_add_project() -> RoadmapActionResponse {
    match with_store(|store| Ok(store.add_project().id)) {
        Ok(id) => RoadmapActionResponse::success("Project created.", Some(id)),
        Err(err) => RoadmapActionResponse::failure(format!("roadmap_add_project failed: {err}")),
    }
}

/// Creates an empty task under `project_id`.
#[flutter_rust_bridge::frb(sync)]
pub fn roadmap_add_task(project_id: String) -> RoadmapActionResponse {
    let result = parse_id(&project_id).and_then(|project_id| {
        with_store(|store| {
            store
                .add_task(project_id)
                .map(|task| task.id)
                .map_err(|err| err.to_string())
        })
    });
    match result {
        Ok(id) => RoadmapActionResponse::success("Task created.", Some(id)),
        Err(err) => RoadmapActionResponse::failure(format!("roadmap_add_task failed: {err}")),
    }
}

/// Creates an empty subtask under `task_id` of `project_id`.
#[flutter_rust_bridge::frb(sync)]
pub fn roadmap_add_subtask(project_id: String, task_id: String) -> RoadmapActionResponse {
    let result = parse_id(&project_id).and_then(|project_id| {
        let task_id = parse_id(&task_id)?;
        with_store(|store| {
            store
                .add_subtask(project_id, task_id)
                .map(|subtask| subtask.id)
                .map_err(|err| err.to_string())
        })
    });
    match result {
        Ok(id) => RoadmapActionResponse::success("Subtask created.", Some(id)),
        Err(err) => RoadmapActionResponse::failure(format!("roadmap_add_subtask failed: {err}")),
    }
}

/// Sets interval endpoints of any node.
///
/// Input semantics:
/// - `None` leaves the endpoint unchanged; `Some("")` clears it.
/// - Malformed dates are treated as unset.
/// - A missing start is filled with today, a missing end with start + 1 day.
#[flutter_rust_bridge::frb(sync)]
pub fn roadmap_update_dates(
    kind: String,
    node_id: String,
    start_date: Option<String>,
    end_date: Option<String>,
) -> RoadmapActionResponse {
    let patch = NodePatch {
        start: start_date.as_deref().map(parse_date_field),
        end: end_date.as_deref().map(parse_date_field),
        ..NodePatch::default()
    };
    update_node("roadmap_update_dates", &kind, &node_id, patch)
}

/// Sets the verified flag of any node.
#[flutter_rust_bridge::frb(sync)]
pub fn roadmap_set_verified(kind: String, node_id: String, verified: bool) -> RoadmapActionResponse {
    update_node(
        "roadmap_set_verified",
        &kind,
        &node_id,
        NodePatch::verified(verified),
    )
}

/// Sets the point estimate of a task or subtask (`None` clears it).
#[flutter_rust_bridge::frb(sync)]
pub fn roadmap_set_points(
    kind: String,
    node_id: String,
    points: Option<u32>,
) -> RoadmapActionResponse {
    update_node(
        "roadmap_set_points",
        &kind,
        &node_id,
        NodePatch::points(points),
    )
}

/// Renames any node; the name is trimmed.
#[flutter_rust_bridge::frb(sync)]
pub fn roadmap_rename(kind: String, node_id: String, name: String) -> RoadmapActionResponse {
    let patch = NodePatch {
        name: Some(name.trim().to_string()),
        ..NodePatch::default()
    };
    update_node("roadmap_rename", &kind, &node_id, patch)
}

/// Sets the workflow status (`backlog|sprint|today|active|completed|refinement`).
#[flutter_rust_bridge::frb(sync)]
pub fn roadmap_set_status(kind: String, node_id: String, status: String) -> RoadmapActionResponse {
    let Some(status) = NodeStatus::parse(status.trim()) else {
        return RoadmapActionResponse::failure(format!(
            "roadmap_set_status failed: unsupported status `{}`",
            status.trim()
        ));
    };
    let patch = NodePatch {
        status: Some(status),
        ..NodePatch::default()
    };
    update_node("roadmap_set_status", &kind, &node_id, patch)
}

/// Deletes a node and its subtree.
#[flutter_rust_bridge::frb(sync)]
pub fn roadmap_delete(kind: String, node_id: String) -> RoadmapActionResponse {
    let result = parse_node_ref(&kind, &node_id).and_then(|node| {
        with_store(|store| {
            let deleted = match node {
                NodeRef::Project(id) => store.delete_project(id),
                NodeRef::Task(id) => store.delete_task(id),
                NodeRef::Subtask(id) => store.delete_subtask(id),
            };
            deleted.map(|()| node.id()).map_err(|err| err.to_string())
        })
    });
    match result {
        Ok(id) => RoadmapActionResponse::success("Node deleted.", Some(id)),
        Err(err) => RoadmapActionResponse::failure(format!("roadmap_delete failed: {err}")),
    }
}

/// Moves one sibling to post-removal position `to`.
///
/// Input semantics:
/// - No ids: project list. `project_id` only: that project's tasks.
///   Both ids: that task's subtasks.
#[flutter_rust_bridge::frb(sync)]
pub fn roadmap_reorder(
    project_id: Option<String>,
    task_id: Option<String>,
    from: u32,
    to: u32,
) -> RoadmapActionResponse {
    let scope = match (project_id.as_deref(), task_id.as_deref()) {
        (None, None) => Ok(ReorderScope::Projects),
        (Some(project_id), None) => {
            parse_id(project_id).map(|project_id| ReorderScope::Tasks { project_id })
        }
        (Some(project_id), Some(task_id)) => parse_id(project_id).and_then(|project_id| {
            parse_id(task_id).map(|task_id| ReorderScope::Subtasks {
                project_id,
                task_id,
            })
        }),
        (None, Some(_)) => Err("task scope requires project_id".to_string()),
    };

    let result = scope.and_then(|scope| {
        with_store(|store| {
            store
                .reorder(scope, from as usize, to as usize)
                .map_err(|err| err.to_string())
        })
    });
    match result {
        Ok(()) => RoadmapActionResponse::success("Reordered.", None),
        Err(err) => RoadmapActionResponse::failure(format!("roadmap_reorder failed: {err}")),
    }
}

/// Returns every node in display order (project, its tasks, their subtasks).
///
/// # FFI contract
/// - Never panics; returns an empty list when the store is unavailable.
#[flutter_rust_bridge::frb(sync)]
pub fn roadmap_snapshot() -> Vec<RoadmapNodeItem> {
    with_store(|store| Ok(snapshot_items(store))).unwrap_or_else(|err| {
        error!("event=roadmap_snapshot module=ffi status=error error={err}");
        Vec::new()
    })
}

/// Blocks until pending saves are written. Returns `false` on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn roadmap_flush() -> bool {
    with_store(|store| Ok(store.flush())).unwrap_or(false)
}

fn update_node(
    operation: &str,
    kind: &str,
    node_id: &str,
    patch: NodePatch,
) -> RoadmapActionResponse {
    let result = parse_node_ref(kind, node_id).and_then(|node| {
        with_store(|store| {
            let updated = match node {
                NodeRef::Project(id) => store.update_project(id, patch).map(|_| ()),
                NodeRef::Task(id) => store.update_task(id, patch).map(|_| ()),
                NodeRef::Subtask(id) => store.update_subtask(id, patch).map(|_| ()),
            };
            updated.map(|()| node.id()).map_err(|err| err.to_string())
        })
    });
    match result {
        Ok(id) => RoadmapActionResponse::success("Node updated.", Some(id)),
        Err(err) => RoadmapActionResponse::failure(format!("{operation} failed: {err}")),
    }
}

fn snapshot_items(store: &TreeStore) -> Vec<RoadmapNodeItem> {
    let tree = store.tree();
    let mut items = Vec::with_capacity(tree.node_count());
    for project in &tree.projects {
        items.push(RoadmapNodeItem {
            node_id: project.id.to_string(),
            kind: NodeKind::Project.as_str().to_string(),
            parent_id: None,
            name: project.name.clone(),
            start_date: format_date_field(project.interval.start),
            end_date: format_date_field(project.interval.end),
            status: project.status.as_str().to_string(),
            verified: project.verified,
            points: None,
            order: to_u32(project.order),
        });
        for task in &project.tasks {
            items.push(RoadmapNodeItem {
                node_id: task.id.to_string(),
                kind: NodeKind::Task.as_str().to_string(),
                parent_id: Some(project.id.to_string()),
                name: task.name.clone(),
                start_date: format_date_field(task.interval.start),
                end_date: format_date_field(task.interval.end),
                status: task.status.as_str().to_string(),
                verified: task.verified,
                points: task.points,
                order: to_u32(task.order),
            });
            for subtask in &task.subtasks {
                items.push(RoadmapNodeItem {
                    node_id: subtask.id.to_string(),
                    kind: NodeKind::Subtask.as_str().to_string(),
                    parent_id: Some(task.id.to_string()),
                    name: subtask.name.clone(),
                    start_date: format_date_field(subtask.interval.start),
                    end_date: format_date_field(subtask.interval.end),
                    status: subtask.status.as_str().to_string(),
                    verified: subtask.verified,
                    points: subtask.points,
                    order: to_u32(subtask.order),
                });
            }
        }
    }
    items
}

fn to_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

fn parse_id(raw: &str) -> Result<NodeId, String> {
    Uuid::parse_str(raw.trim()).map_err(|_| format!("invalid node id `{}`", raw.trim()))
}

fn parse_node_ref(kind: &str, node_id: &str) -> Result<NodeRef, String> {
    let id = parse_id(node_id)?;
    match kind.trim().to_ascii_lowercase().as_str() {
        "project" => Ok(NodeRef::Project(id)),
        "task" => Ok(NodeRef::Task(id)),
        "subtask" => Ok(NodeRef::Subtask(id)),
        other => Err(format!(
            "unsupported node kind `{other}`; expected project|task|subtask"
        )),
    }
}

fn resolve_roadmap_db_path() -> PathBuf {
    ROADMAP_DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var("LIFEPLAN_DB_PATH") {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(ROADMAP_DB_FILE_NAME)
        })
        .clone()
}

fn open_store() -> Result<Mutex<TreeStore>, String> {
    let db_path = resolve_roadmap_db_path();
    let gateway = SqliteRoadmapGateway::open(&db_path)
        .map_err(|err| format!("roadmap DB open failed: {err}"))?;
    let store = TreeStore::open(Box::new(gateway))
        .map_err(|err| format!("roadmap save worker failed to start: {err}"))?;
    Ok(Mutex::new(store))
}

fn lock_store() -> Result<MutexGuard<'static, TreeStore>, String> {
    let store = ROADMAP_STORE
        .get_or_init(open_store)
        .as_ref()
        .map_err(Clone::clone)?;
    store.lock().map_err(|_| {
        warn!("event=store_lock module=ffi status=error reason=poisoned");
        "roadmap store lock poisoned".to_string()
    })
}

fn with_store<T>(f: impl FnOnce(&mut TreeStore) -> Result<T, String>) -> Result<T, String> {
    let mut guard = lock_store()?;
    f(&mut guard)
}
