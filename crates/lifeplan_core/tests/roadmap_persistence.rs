use chrono::NaiveDate;
use lifeplan_core::{
    GatewayError, GatewayResult, Interval, JsonFileGateway, NodePatch, NodeStatus,
    PersistenceGateway, Priority, SqliteRoadmapGateway, Tree, TreeStore,
};
use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Backend whose every save fails, counting the attempts.
struct UnwritableGateway {
    attempts: Arc<AtomicUsize>,
}

impl PersistenceGateway for UnwritableGateway {
    fn backend(&self) -> &'static str {
        "unwritable"
    }

    fn try_load(&self) -> GatewayResult<Tree> {
        Ok(Tree::default())
    }

    fn try_save(&self, _tree: &Tree) -> GatewayResult<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(GatewayError::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            "disk full",
        )))
    }
}

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Launch (Jan 1..Mar 10) with a dated leaf task, a derived task, and labels.
fn populate(store: &mut TreeStore) {
    let project = store.add_project().id;
    store
        .update_project(
            project,
            NodePatch {
                name: Some("Launch".to_string()),
                priority: Some(Some(Priority::High)),
                category: Some(Some("work".to_string())),
                ..NodePatch::default()
            },
        )
        .unwrap();

    let design = store.add_task(project).unwrap().id;
    store
        .update_task(
            design,
            NodePatch {
                name: Some("Design".to_string()),
                start: Some(Some(day(2024, 1, 1))),
                end: Some(Some(day(2024, 1, 5))),
                points: Some(Some(5)),
                status: Some(NodeStatus::Completed),
                verified: Some(true),
                ..NodePatch::default()
            },
        )
        .unwrap();

    let build = store.add_task(project).unwrap().id;
    store
        .update_task(build, NodePatch::dates(Some(day(2024, 1, 20)), Some(day(2024, 1, 25))))
        .unwrap();
    let api = store.add_subtask(project, build).unwrap().id;
    store
        .update_subtask(
            api,
            NodePatch {
                name: Some("API".to_string()),
                start: Some(Some(day(2024, 2, 1))),
                end: Some(Some(day(2024, 3, 10))),
                points: Some(Some(8)),
                ..NodePatch::default()
            },
        )
        .unwrap();
    store.add_subtask(project, build).unwrap();
    store.add_project();
}

#[test]
fn sqlite_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("roadmap.sqlite3");

    let saved = {
        let gateway = SqliteRoadmapGateway::open(&path).unwrap();
        let mut store = TreeStore::open(Box::new(gateway))
            .unwrap()
            .with_today(|| day(2024, 1, 1));
        assert!(store.tree().is_empty());
        populate(&mut store);
        assert!(store.flush());
        store.tree().clone()
    };

    let gateway = SqliteRoadmapGateway::open(&path).unwrap();
    let store = TreeStore::open(Box::new(gateway)).unwrap();
    assert_eq!(store.tree(), &saved);

    let build = &store.tree().projects[0].tasks[1];
    assert_eq!(
        build.interval,
        Interval::dated(day(2024, 2, 1), day(2024, 3, 10))
    );
    assert_eq!(
        build.explicit_interval,
        Interval::dated(day(2024, 1, 20), day(2024, 1, 25))
    );
    assert_eq!(build.points, Some(8));
}

#[test]
fn json_gateway_round_trips_tree() {
    let dir = tempfile::tempdir().unwrap();
    let gateway = JsonFileGateway::new(dir.path().join("nested").join("roadmap.json"));

    let mut store = TreeStore::in_memory(Tree::default()).with_today(|| day(2024, 1, 1));
    populate(&mut store);
    assert!(gateway.save(store.tree()));

    let loaded = gateway.load();
    assert_eq!(&loaded, store.tree());
    assert!(!dir.path().join("nested").join("roadmap.json.tmp").exists());
}

#[test]
fn json_document_uses_flat_camel_case_records() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("roadmap.json");
    let gateway = JsonFileGateway::new(&path);

    let mut store = TreeStore::in_memory(Tree::default()).with_today(|| day(2024, 1, 1));
    populate(&mut store);
    assert!(gateway.save(store.tree()));

    let document: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(document["projects"].as_array().unwrap().len(), 2);
    assert_eq!(document["tasks"].as_array().unwrap().len(), 2);
    assert_eq!(document["subtasks"].as_array().unwrap().len(), 2);
    assert_eq!(document["projects"][0]["startDate"], "2024-01-01");
    assert_eq!(document["subtasks"][1]["startDate"], "");
}

#[test]
fn malformed_dates_degrade_to_unset_or_date_prefix() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("roadmap.json");
    fs::write(
        &path,
        r#"{
            "projects": [{
                "id": "6f1c5b8e-4a3d-4b7e-9a2f-1c2d3e4f5a6b",
                "name": "Imported",
                "startDate": "garbage",
                "endDate": "2024-01-05T10:00:00Z",
                "order": 3
            }]
        }"#,
    )
    .unwrap();

    let tree = JsonFileGateway::new(&path).load();
    let project = &tree.projects[0];
    assert_eq!(project.name, "Imported");
    assert_eq!(project.interval.start, None);
    assert_eq!(project.interval.end, Some(day(2024, 1, 5)));
    assert_eq!(project.order, 0);
    assert_eq!(project.status, NodeStatus::Backlog);
}

#[test]
fn orphan_records_are_dropped_on_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("roadmap.json");
    fs::write(
        &path,
        r#"{
            "projects": [],
            "tasks": [{
                "id": "0b7f3e52-8d0c-4f3a-a1b2-c3d4e5f60718",
                "projectId": "9a8b7c6d-5e4f-4a3b-8c2d-1e0f9a8b7c6d"
            }]
        }"#,
    )
    .unwrap();

    assert!(JsonFileGateway::new(&path).load().is_empty());
}

#[test]
fn missing_or_unreadable_file_loads_empty_tree() {
    let dir = tempfile::tempdir().unwrap();
    assert!(JsonFileGateway::new(dir.path().join("absent.json"))
        .load()
        .is_empty());

    let corrupt = dir.path().join("corrupt.json");
    fs::write(&corrupt, "{ not json").unwrap();
    assert!(JsonFileGateway::new(&corrupt).load().is_empty());
}

#[test]
fn unknown_status_is_rejected_not_masked() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("roadmap.json");
    fs::write(
        &path,
        r#"{"projects": [{"id": "6f1c5b8e-4a3d-4b7e-9a2f-1c2d3e4f5a6b", "status": "someday"}]}"#,
    )
    .unwrap();

    let err = JsonFileGateway::new(&path).try_load().unwrap_err();
    assert!(err.to_string().contains("someday"));
}

#[test]
fn failed_saves_keep_edits_committed_in_memory() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let gateway = UnwritableGateway {
        attempts: Arc::clone(&attempts),
    };
    let mut store = TreeStore::open(Box::new(gateway))
        .unwrap()
        .with_today(|| day(2024, 1, 1));

    let project = store.add_project().id;
    store
        .update_project(project, NodePatch::dates(Some(day(2024, 1, 1)), Some(day(2024, 1, 9))))
        .unwrap();
    assert!(store.flush());
    assert!(attempts.load(Ordering::SeqCst) >= 1);
    assert_eq!(
        store.project(project).unwrap().interval,
        Interval::dated(day(2024, 1, 1), day(2024, 1, 9))
    );

    let task = store.add_task(project).unwrap().id;
    store
        .update_task(task, NodePatch::dates(Some(day(2024, 1, 5)), Some(day(2024, 1, 20))))
        .unwrap();
    assert!(store.flush());
    assert_eq!(
        store.project(project).unwrap().interval,
        Interval::dated(day(2024, 1, 1), day(2024, 1, 20))
    );
    assert_eq!(store.tree().node_count(), 2);
}
