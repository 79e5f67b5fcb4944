use chrono::NaiveDate;
use lifeplan_core::{
    DragController, DragError, DragMode, DragState, Interval, NodePatch, NodeRef,
    TimelineProjection, Tree, TreeStore,
};
use std::time::{Duration, Instant};

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn setup() -> (TreeStore, TimelineProjection) {
    (
        TreeStore::in_memory(Tree::default()).with_today(|| day(2024, 1, 1)),
        TimelineProjection::new(day(2024, 1, 1), 10.0),
    )
}

#[test]
fn moving_subtask_bar_propagates_to_task_and_project() {
    let (mut store, projection) = setup();
    let project = store.add_project().id;
    let task = store.add_task(project).unwrap().id;
    let subtask = store.add_subtask(project, task).unwrap().id;
    store
        .update_subtask(subtask, NodePatch::dates(Some(day(2024, 2, 1)), Some(day(2024, 2, 3))))
        .unwrap();

    let mut drag = DragController::default();
    let target = NodeRef::Subtask(subtask);
    // Feb 1 sits at x=310; grab half a day in and move ten days right.
    drag.begin(&store, &projection, target, DragMode::MoveBar, 315.0)
        .unwrap();
    assert_eq!(drag.state(), DragState::MovingBar(target));
    let moved = drag.release(&mut store, &projection, 415.0).unwrap();

    let expected = Interval::dated(day(2024, 2, 11), day(2024, 2, 13));
    assert_eq!(moved, expected);
    assert_eq!(store.subtask(subtask).unwrap().interval, expected);
    assert_eq!(store.task(task).unwrap().interval, expected);
    let project_interval = store.project(project).unwrap().interval;
    assert!(project_interval.contains(&expected));
    assert!(!drag.is_dragging());
}

#[test]
fn resizing_derived_task_clamps_its_subtasks() {
    let (mut store, projection) = setup();
    let project = store.add_project().id;
    let task = store.add_task(project).unwrap().id;
    let early = store.add_subtask(project, task).unwrap().id;
    let late = store.add_subtask(project, task).unwrap().id;
    store
        .update_subtask(early, NodePatch::dates(Some(day(2024, 2, 1)), Some(day(2024, 2, 3))))
        .unwrap();
    store
        .update_subtask(late, NodePatch::dates(Some(day(2024, 2, 8)), Some(day(2024, 2, 10))))
        .unwrap();

    let mut drag = DragController::default();
    let target = NodeRef::Task(task);
    drag.begin(&store, &projection, target, DragMode::ResizeRight, 400.0)
        .unwrap();
    let resized = drag.release(&mut store, &projection, 350.0).unwrap();

    assert_eq!(resized, Interval::dated(day(2024, 2, 1), day(2024, 2, 5)));
    assert_eq!(
        store.subtask(early).unwrap().interval,
        Interval::dated(day(2024, 2, 1), day(2024, 2, 3))
    );
    assert_eq!(
        store.subtask(late).unwrap().interval,
        Interval::single_day(day(2024, 2, 5))
    );
    assert_eq!(store.task(task).unwrap().interval, resized);
}

#[test]
fn moves_inside_throttle_window_are_deferred_to_release() {
    let (mut store, projection) = setup();
    let project = store.add_project().id;
    store
        .update_project(project, NodePatch::dates(Some(day(2024, 1, 10)), Some(day(2024, 1, 12))))
        .unwrap();

    let mut drag = DragController::default();
    let target = NodeRef::Project(project);
    drag.begin(&store, &projection, target, DragMode::ResizeRight, 120.0)
        .unwrap();

    let t0 = Instant::now();
    drag.pointer_moved(&mut store, &projection, 140.0, t0).unwrap();
    assert_eq!(
        store.project(project).unwrap().interval.end,
        Some(day(2024, 1, 14))
    );

    drag.pointer_moved(&mut store, &projection, 160.0, t0 + Duration::from_millis(10))
        .unwrap();
    assert_eq!(
        store.project(project).unwrap().interval.end,
        Some(day(2024, 1, 14))
    );

    drag.release(&mut store, &projection, 170.0).unwrap();
    assert_eq!(
        store.project(project).unwrap().interval.end,
        Some(day(2024, 1, 17))
    );
}

#[test]
fn undated_node_cannot_be_dragged() {
    let (mut store, projection) = setup();
    let project = store.add_project().id;
    let target = NodeRef::Project(project);

    let mut drag = DragController::default();
    let err = drag
        .begin(&store, &projection, target, DragMode::MoveBar, 0.0)
        .unwrap_err();
    assert!(matches!(err, DragError::IncompleteInterval(node) if node == target));
    assert!(!drag.is_dragging());

    let err = drag.release(&mut store, &projection, 10.0).unwrap_err();
    assert!(matches!(err, DragError::NotDragging));
}

#[test]
fn far_pointer_positions_saturate_at_date_range() {
    let mut store = TreeStore::in_memory(Tree::default()).with_today(|| day(2024, 1, 1));
    let projection = TimelineProjection::new(day(2024, 1, 1), 0.5);
    let project = store.add_project().id;
    store
        .update_project(project, NodePatch::dates(Some(day(2024, 1, 10)), Some(day(2024, 1, 12))))
        .unwrap();
    let target = NodeRef::Project(project);

    let mut drag = DragController::default();
    drag.begin(&store, &projection, target, DragMode::ResizeRight, 10.0)
        .unwrap();
    let resized = drag.release(&mut store, &projection, 1.0e9).unwrap();
    assert_eq!(resized, Interval::dated(day(2024, 1, 10), NaiveDate::MAX));
    assert_eq!(store.project(project).unwrap().interval, resized);

    drag.begin(&store, &projection, target, DragMode::ResizeLeft, 10.0)
        .unwrap();
    let resized = drag.release(&mut store, &projection, -1.0e18).unwrap();
    assert_eq!(resized, Interval::dated(NaiveDate::MIN, NaiveDate::MAX));

    drag.begin(&store, &projection, target, DragMode::MoveBar, 0.0)
        .unwrap();
    let moved = drag.release(&mut store, &projection, 1.0e18).unwrap();
    assert_eq!(moved.end, Some(NaiveDate::MAX));
    assert!(moved.start.unwrap() <= moved.end.unwrap());
}
