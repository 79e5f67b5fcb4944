//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `lifeplan_core` linkage.
//! - Print a fixed sample roadmap so propagation can be eyeballed.
//!
//! Output is deterministic: the sample uses fixed dates and an injected clock.

use chrono::NaiveDate;
use lifeplan_core::{
    timeline_rows, NodePatch, StoreResult, TimelineConfig, TimelineViewport, Tree, TreeStore,
};

fn main() {
    println!("lifeplan_core ping={}", lifeplan_core::ping());
    println!("lifeplan_core version={}", lifeplan_core::core_version());

    if let Err(err) = print_sample_roadmap() {
        eprintln!("sample roadmap failed: {err}");
        std::process::exit(1);
    }
}

fn print_sample_roadmap() -> StoreResult<()> {
    let today = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default();
    let mut store = TreeStore::in_memory(Tree::default()).with_today(move || today);

    let project = store.add_project();
    store.update_project(project.id, named("Launch"))?;

    let design = store.add_task(project.id)?;
    store.update_task(design.id, named("Design"))?;
    store.update_task(design.id, dates(today, ymd(2024, 1, 5, today)))?;

    let build = store.add_task(project.id)?;
    store.update_task(build.id, named("Build"))?;
    let api = store.add_subtask(project.id, build.id)?;
    store.update_subtask(api.id, named("API"))?;
    store.update_subtask(
        api.id,
        dates(ymd(2024, 2, 1, today), ymd(2024, 2, 3, today)),
    )?;
    store.update_subtask(api.id, NodePatch::end(ymd(2024, 3, 10, today)))?;

    let mut viewport = TimelineViewport::new(today, today, TimelineConfig::default());
    viewport.fit_to(store.tree(), today);
    println!(
        "timeline start={} end={} zoom={}",
        viewport.start(),
        viewport.end,
        viewport.zoom.as_str()
    );

    for row in timeline_rows(store.tree(), &viewport.projection) {
        let bar = row
            .bar
            .map(|bar| format!("x={:.1} width={:.1}", bar.x, bar.width))
            .unwrap_or_else(|| "unscheduled".to_string());
        println!(
            "{}{} [{}] {}..{} verified={} {}",
            "  ".repeat(row.depth),
            row.label,
            row.node.kind(),
            display_date(row.interval.start),
            display_date(row.interval.end),
            row.verified,
            bar
        );
    }
    Ok(())
}

fn named(name: &str) -> NodePatch {
    NodePatch {
        name: Some(name.to_string()),
        ..NodePatch::default()
    }
}

fn ymd(year: i32, month: u32, day: u32, fallback: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(fallback)
}

fn dates(start: NaiveDate, end: NaiveDate) -> NodePatch {
    NodePatch::dates(Some(start), Some(end))
}

fn display_date(value: Option<NaiveDate>) -> String {
    value
        .map(|date| date.to_string())
        .unwrap_or_else(|| "-".to_string())
}
