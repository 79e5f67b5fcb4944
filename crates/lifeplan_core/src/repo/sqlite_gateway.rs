//! SQLite-backed persistence gateway.
//!
//! # Responsibility
//! - Store the roadmap in `roadmap_projects`, `roadmap_tasks` and
//!   `roadmap_subtasks`.
//! - Replace the stored tree atomically on every save.
//!
//! # Invariants
//! - The connection must be migrated to the latest schema version.
//! - A save either replaces every row or none.

use super::gateway::{GatewayError, GatewayResult, PersistenceGateway};
use super::records::{ProjectRecord, RoadmapRecords, SubtaskRecord, TaskRecord};
use crate::db::migrations::latest_version;
use crate::db::{open_db, open_db_in_memory};
use crate::model::tree::Tree;
use rusqlite::{params, Connection, Row};
use std::path::Path;
use uuid::Uuid;

const REQUIRED_TABLES: [&str; 3] = ["roadmap_projects", "roadmap_tasks", "roadmap_subtasks"];

/// Gateway over one migrated SQLite connection.
pub struct SqliteRoadmapGateway {
    conn: Connection,
}

impl SqliteRoadmapGateway {
    /// Wraps a connection after checking its schema.
    pub fn try_new(conn: Connection) -> GatewayResult<Self> {
        ensure_roadmap_connection_ready(&conn)?;
        Ok(Self { conn })
    }

    /// Opens (and migrates) the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> GatewayResult<Self> {
        Self::try_new(open_db(path)?)
    }

    pub fn open_in_memory() -> GatewayResult<Self> {
        Self::try_new(open_db_in_memory()?)
    }

    fn read_records(&self) -> GatewayResult<RoadmapRecords> {
        let mut records = RoadmapRecords::default();

        let mut stmt = self.conn.prepare(
            "SELECT id, name, start_date, end_date, status, priority, category,
                    verified, explicit_verified, sort_order
             FROM roadmap_projects
             ORDER BY sort_order ASC, id ASC;",
        )?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            records.projects.push(ProjectRecord {
                id: parse_uuid(row, "id", "roadmap_projects.id")?,
                name: row.get("name")?,
                start_date: row.get("start_date")?,
                end_date: row.get("end_date")?,
                status: row.get("status")?,
                priority: row.get("priority")?,
                category: row.get("category")?,
                verified: parse_flag(row, "verified", "roadmap_projects.verified")?,
                explicit_verified: Some(parse_flag(
                    row,
                    "explicit_verified",
                    "roadmap_projects.explicit_verified",
                )?),
                order: parse_order(row, "roadmap_projects.sort_order")?,
            });
        }

        let mut stmt = self.conn.prepare(
            "SELECT id, project_id, name, start_date, end_date, explicit_start_date,
                    explicit_end_date, status, priority, category, points, total_points,
                    verified, explicit_verified, sort_order
             FROM roadmap_tasks
             ORDER BY project_id ASC, sort_order ASC, id ASC;",
        )?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            records.tasks.push(TaskRecord {
                id: parse_uuid(row, "id", "roadmap_tasks.id")?,
                project_id: parse_uuid(row, "project_id", "roadmap_tasks.project_id")?,
                name: row.get("name")?,
                start_date: row.get("start_date")?,
                end_date: row.get("end_date")?,
                explicit_start_date: row.get("explicit_start_date")?,
                explicit_end_date: row.get("explicit_end_date")?,
                status: row.get("status")?,
                priority: row.get("priority")?,
                category: row.get("category")?,
                points: row.get("points")?,
                total_points: row.get("total_points")?,
                verified: parse_flag(row, "verified", "roadmap_tasks.verified")?,
                explicit_verified: Some(parse_flag(
                    row,
                    "explicit_verified",
                    "roadmap_tasks.explicit_verified",
                )?),
                order: parse_order(row, "roadmap_tasks.sort_order")?,
            });
        }

        let mut stmt = self.conn.prepare(
            "SELECT id, project_id, task_id, name, start_date, end_date, status,
                    priority, category, points, verified, sort_order
             FROM roadmap_subtasks
             ORDER BY task_id ASC, sort_order ASC, id ASC;",
        )?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            records.subtasks.push(SubtaskRecord {
                id: parse_uuid(row, "id", "roadmap_subtasks.id")?,
                project_id: parse_uuid(row, "project_id", "roadmap_subtasks.project_id")?,
                task_id: parse_uuid(row, "task_id", "roadmap_subtasks.task_id")?,
                name: row.get("name")?,
                start_date: row.get("start_date")?,
                end_date: row.get("end_date")?,
                status: row.get("status")?,
                priority: row.get("priority")?,
                category: row.get("category")?,
                points: row.get("points")?,
                verified: parse_flag(row, "verified", "roadmap_subtasks.verified")?,
                order: parse_order(row, "roadmap_subtasks.sort_order")?,
            });
        }

        Ok(records)
    }
}

impl PersistenceGateway for SqliteRoadmapGateway {
    fn backend(&self) -> &'static str {
        "sqlite"
    }

    fn try_load(&self) -> GatewayResult<Tree> {
        self.read_records()?.into_tree()
    }

    fn try_save(&self, tree: &Tree) -> GatewayResult<()> {
        let records = RoadmapRecords::from_tree(tree);
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM roadmap_subtasks;", [])?;
        tx.execute("DELETE FROM roadmap_tasks;", [])?;
        tx.execute("DELETE FROM roadmap_projects;", [])?;

        {
            let mut insert = tx.prepare(
                "INSERT INTO roadmap_projects (
                    id, name, start_date, end_date, status, priority, category,
                    verified, explicit_verified, sort_order
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10);",
            )?;
            for record in &records.projects {
                insert.execute(params![
                    record.id.to_string(),
                    record.name,
                    record.start_date,
                    record.end_date,
                    record.status,
                    record.priority,
                    record.category,
                    bool_to_int(record.verified),
                    bool_to_int(record.explicit_verified.unwrap_or(record.verified)),
                    order_to_int(record.order),
                ])?;
            }

            let mut insert = tx.prepare(
                "INSERT INTO roadmap_tasks (
                    id, project_id, name, start_date, end_date, explicit_start_date,
                    explicit_end_date, status, priority, category, points, total_points,
                    verified, explicit_verified, sort_order
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15);",
            )?;
            for record in &records.tasks {
                insert.execute(params![
                    record.id.to_string(),
                    record.project_id.to_string(),
                    record.name,
                    record.start_date,
                    record.end_date,
                    record.explicit_start_date,
                    record.explicit_end_date,
                    record.status,
                    record.priority,
                    record.category,
                    record.points,
                    record.total_points,
                    bool_to_int(record.verified),
                    bool_to_int(record.explicit_verified.unwrap_or(record.verified)),
                    order_to_int(record.order),
                ])?;
            }

            let mut insert = tx.prepare(
                "INSERT INTO roadmap_subtasks (
                    id, project_id, task_id, name, start_date, end_date, status,
                    priority, category, points, verified, sort_order
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12);",
            )?;
            for record in &records.subtasks {
                insert.execute(params![
                    record.id.to_string(),
                    record.project_id.to_string(),
                    record.task_id.to_string(),
                    record.name,
                    record.start_date,
                    record.end_date,
                    record.status,
                    record.priority,
                    record.category,
                    record.points,
                    bool_to_int(record.verified),
                    order_to_int(record.order),
                ])?;
            }
        }

        tx.commit()?;
        Ok(())
    }
}

fn parse_uuid(row: &Row<'_>, column: &str, label: &'static str) -> GatewayResult<Uuid> {
    let value: String = row.get(column)?;
    Uuid::parse_str(&value)
        .map_err(|_| GatewayError::InvalidData(format!("invalid uuid `{value}` in {label}")))
}

fn parse_flag(row: &Row<'_>, column: &str, label: &'static str) -> GatewayResult<bool> {
    match row.get::<_, i64>(column)? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(GatewayError::InvalidData(format!(
            "invalid flag value `{other}` in {label}"
        ))),
    }
}

fn parse_order(row: &Row<'_>, label: &'static str) -> GatewayResult<usize> {
    let value: i64 = row.get("sort_order")?;
    usize::try_from(value)
        .map_err(|_| GatewayError::InvalidData(format!("invalid order `{value}` in {label}")))
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

fn order_to_int(order: usize) -> i64 {
    i64::try_from(order).unwrap_or(i64::MAX)
}

fn ensure_roadmap_connection_ready(conn: &Connection) -> GatewayResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(GatewayError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for table in REQUIRED_TABLES {
        let exists: i64 = conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table],
            |row| row.get(0),
        )?;
        if exists != 1 {
            return Err(GatewayError::MissingRequiredTable(table));
        }
    }

    Ok(())
}
