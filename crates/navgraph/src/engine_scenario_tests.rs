//! End-to-end engine tests: load, process, query, fail, re-query

use navgraph_common::{Error, Vec3};

use super::engine::NavEngine;
use super::graph::{AreaId, Direction};
use super::nav_file::NavFile;
use super::processor::Phase;
use super::route::WaypointKind;
use super::test_fixtures::{raw_area, sample_nav_file};
use super::trace::ClearTrace;

fn run_processor(engine: &mut NavEngine) {
    let mut steps = 0;
    while engine.processing_phase() != Phase::Idle {
        engine.tick(60.0, &ClearTrace);
        steps += 1;
        assert!(steps < 10_000, "processor failed to converge");
    }
}

fn idle_ticks(engine: &mut NavEngine, n: usize) {
    for _ in 0..n {
        engine.tick(60.0, &ClearTrace);
    }
}

/// Corridor mesh 1-2-3 where area 3 sits 40 units up
fn step_corridor_file() -> NavFile {
    let mut file = sample_nav_file();
    let three = &mut file.areas[2];
    three.nw.z = 40.0;
    three.se.z = 40.0;
    three.ne_z = 40.0;
    three.sw_z = 40.0;
    file
}

/// Same corridor plus a detour area 4 adjacent to both 2 and 3
fn detour_corridor_file() -> NavFile {
    let mut file = step_corridor_file();
    let mut four = raw_area(4, (100.0, 100.0), (300.0, 200.0), 0.0);
    four.connections[Direction::North.index()].extend([2, 3]);
    file.areas[1].connections[Direction::South.index()].push(4);
    file.areas[2].connections[Direction::South.index()].push(4);
    file.areas.push(four);
    file
}

#[test]
fn test_queries_before_load_return_not_found() {
    let mut engine = NavEngine::with_defaults();
    assert!(engine.closest_area(Vec3::ZERO).is_none());
    assert!(engine
        .find_path(Vec3::ZERO, Vec3::new(100.0, 0.0, 0.0))
        .is_none());
    assert!(engine.current_path().is_none());
    assert!(engine.current_waypoint().is_none());
    assert!(engine.advance_path().is_none());
    assert!(!engine.is_edge_blocked(AreaId::new(1), AreaId::new(2)));
    // Mutation entry points must tolerate the unloaded state too.
    engine.report_traversal_failure(AreaId::new(1), AreaId::new(2));
}

#[test]
fn test_scenario_block_without_alternate_fails() {
    let mut engine = NavEngine::with_defaults();
    engine
        .load_bytes(&step_corridor_file().to_bytes().unwrap())
        .unwrap();
    run_processor(&mut engine);

    let goal = Vec3::new(250.0, 50.0, 40.0);
    let path = engine
        .find_path_between(AreaId::new(1), AreaId::new(3), goal)
        .expect("route exists");
    assert_eq!(
        path.areas().collect::<Vec<_>>(),
        vec![AreaId::new(1), AreaId::new(2), AreaId::new(3)]
    );

    // The 40-unit step up into area 3 crosses with a boost.
    let conn = engine
        .graph()
        .unwrap()
        .connection(AreaId::new(2), AreaId::new(3))
        .unwrap();
    assert!(conn.needs_boost);

    engine.report_traversal_failure(AreaId::new(2), AreaId::new(3));
    assert!(!engine.is_edge_blocked(AreaId::new(2), AreaId::new(3)));
    engine.report_traversal_failure(AreaId::new(2), AreaId::new(3));
    assert!(engine.is_edge_blocked(AreaId::new(2), AreaId::new(3)));

    idle_ticks(&mut engine, 20); // get past the repath debounce
    let blocked_path = engine.find_path_respecting_blocks(AreaId::new(1), AreaId::new(3), goal);
    assert!(blocked_path.is_none(), "no alternate route exists");
    assert!(engine.current_path().is_none());
}

#[test]
fn test_scenario_block_with_alternate_diverts() {
    let mut engine = NavEngine::with_defaults();
    engine
        .load_bytes(&detour_corridor_file().to_bytes().unwrap())
        .unwrap();
    run_processor(&mut engine);

    let goal = Vec3::new(250.0, 50.0, 40.0);
    engine.report_traversal_failure(AreaId::new(2), AreaId::new(3));
    engine.report_traversal_failure(AreaId::new(2), AreaId::new(3));
    assert!(engine.is_edge_blocked(AreaId::new(2), AreaId::new(3)));

    idle_ticks(&mut engine, 20);
    let path = engine
        .find_path_respecting_blocks(AreaId::new(1), AreaId::new(3), goal)
        .expect("detour available");
    let areas: Vec<_> = path.areas().collect();
    assert_eq!(
        areas,
        vec![AreaId::new(1), AreaId::new(2), AreaId::new(4), AreaId::new(3)]
    );
}

#[test]
fn test_waypoints_through_engine() {
    let mut engine = NavEngine::with_defaults();
    engine
        .load_bytes(&sample_nav_file().to_bytes().unwrap())
        .unwrap();
    run_processor(&mut engine);

    let goal = Vec3::new(250.0, 50.0, 0.0);
    engine
        .find_path_between(AreaId::new(1), AreaId::new(3), goal)
        .expect("route exists");

    let wp = engine.current_waypoint().unwrap();
    assert_eq!(wp.kind, WaypointKind::Door);
    assert!((wp.pos.x - 100.0).abs() < 1e-3);

    engine.advance_path();
    engine.advance_path();
    let wp = engine.current_waypoint().unwrap();
    assert_eq!(wp.kind, WaypointKind::Goal);
    assert_eq!(wp.pos, goal);
}

#[test]
fn test_debounce_returns_existing_path() {
    let mut engine = NavEngine::with_defaults();
    engine
        .load_bytes(&sample_nav_file().to_bytes().unwrap())
        .unwrap();
    run_processor(&mut engine);

    let goal = Vec3::new(250.0, 50.0, 0.0);
    engine
        .find_path_between(AreaId::new(1), AreaId::new(3), goal)
        .expect("route exists");
    let first: Vec<_> = engine.current_path().unwrap().areas().collect();

    // Re-query within the debounce window: the installed path must not move.
    let second = engine
        .find_path_between(AreaId::new(3), AreaId::new(1), Vec3::ZERO)
        .expect("debounced query returns current path");
    assert_eq!(second.areas().collect::<Vec<_>>(), first);
}

#[test]
fn test_parse_failure_keeps_previous_graph() {
    let mut engine = NavEngine::with_defaults();
    engine
        .load_bytes(&sample_nav_file().to_bytes().unwrap())
        .unwrap();
    let before = engine.graph().unwrap().len();

    let mut bad = sample_nav_file().to_bytes().unwrap();
    bad[0] ^= 0xff;
    assert!(matches!(engine.load_bytes(&bad), Err(Error::WrongMagic(_))));
    assert_eq!(engine.graph().unwrap().len(), before);
}

#[test]
fn test_load_file_or_generate_retries_once() {
    let dir = std::env::temp_dir().join(format!("navgraph-test-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("generated.nav");
    let _ = std::fs::remove_file(&path);

    let mut engine = NavEngine::with_defaults();
    assert!(matches!(
        engine.load_file(&path),
        Err(Error::MissingFile(_))
    ));

    engine
        .load_file_or_generate(&path, |p| {
            std::fs::write(p, sample_nav_file().to_bytes()?)?;
            Ok(())
        })
        .unwrap();
    assert_eq!(engine.graph().unwrap().len(), 3);

    std::fs::remove_file(&path).ok();
    std::fs::remove_dir(&dir).ok();
}

#[test]
fn test_recalculate_costs_restarts_pipeline() {
    let mut engine = NavEngine::with_defaults();
    engine
        .load_bytes(&sample_nav_file().to_bytes().unwrap())
        .unwrap();
    run_processor(&mut engine);
    assert_eq!(engine.processing_phase(), Phase::Idle);

    engine.recalculate_costs();
    assert_ne!(engine.processing_phase(), Phase::Idle);
    run_processor(&mut engine);
    assert_eq!(engine.processing_phase(), Phase::Idle);
}
