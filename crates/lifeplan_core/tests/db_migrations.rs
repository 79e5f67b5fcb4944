use lifeplan_core::db::migrations::latest_version;
use lifeplan_core::db::{open_db, open_db_in_memory, DbError};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "roadmap_projects");
    assert_table_exists(&conn, "roadmap_tasks");
    assert_table_exists(&conn, "roadmap_subtasks");
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lifeplan.db");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    assert_table_exists(&conn_second, "roadmap_projects");
}

#[test]
fn deleting_project_cascades_to_children() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "INSERT INTO roadmap_projects (id, name, sort_order) VALUES ('p1', 'Launch', 0);
         INSERT INTO roadmap_tasks (id, project_id, name, sort_order) VALUES ('t1', 'p1', 'Build', 0);
         INSERT INTO roadmap_subtasks (id, project_id, task_id, name, sort_order)
             VALUES ('s1', 'p1', 't1', 'API', 0);
         DELETE FROM roadmap_projects WHERE id = 'p1';",
    )
    .unwrap();

    assert_eq!(row_count(&conn, "roadmap_tasks"), 0);
    assert_eq!(row_count(&conn, "roadmap_subtasks"), 0);
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn row_count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })
    .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
