//! Shared graph and mesh fixtures for unit tests

use navgraph_common::{distance, Error, Result, Vec3};

use super::graph::{Area, AreaGraph, AreaId, Connection, Direction};
use super::nav_file::{NavFile, RawArea};
use super::trace::{SweepHit, TraceProvider};

/// A flat axis-aligned area at a fixed height
pub fn area_at(id: u32, min: (f32, f32), max: (f32, f32), z: f32) -> Area {
    Area::new(
        AreaId::new(id),
        0,
        Vec3::new(min.0, min.1, z),
        Vec3::new(max.0, max.1, z),
        z,
        z,
    )
}

fn link(graph: &mut AreaGraph, from: u32, to: u32, dir: Direction) {
    let (a, b) = (AreaId::new(from), AreaId::new(to));
    let cost = distance(
        &graph.area(a).expect("fixture area").center(),
        &graph.area(b).expect("fixture area").center(),
    );
    graph.add_connection(a, dir, Connection::new(b, cost, Some(dir)));
}

/// Two flat areas side by side, connected in both directions
pub fn flat_pair_graph() -> AreaGraph {
    let mut graph = AreaGraph::new();
    graph.insert_area(area_at(1, (0.0, 0.0), (100.0, 100.0), 0.0));
    graph.insert_area(area_at(2, (100.0, 0.0), (200.0, 100.0), 0.0));
    link(&mut graph, 1, 2, Direction::East);
    link(&mut graph, 2, 1, Direction::West);
    graph
}

/// A west-to-east chain of `n` flat areas with ids 1..=n
pub fn corridor_graph(n: u32) -> AreaGraph {
    let mut graph = AreaGraph::new();
    for i in 1..=n {
        let x = (i - 1) as f32 * 100.0;
        graph.insert_area(area_at(i, (x, 0.0), (x + 100.0, 100.0), 0.0));
    }
    for i in 1..n {
        link(&mut graph, i, i + 1, Direction::East);
        link(&mut graph, i + 1, i, Direction::West);
    }
    graph
}

/// Two connected pairs with no route between them
pub fn disjoint_graph() -> AreaGraph {
    let mut graph = AreaGraph::new();
    graph.insert_area(area_at(1, (0.0, 0.0), (100.0, 100.0), 0.0));
    graph.insert_area(area_at(2, (100.0, 0.0), (200.0, 100.0), 0.0));
    graph.insert_area(area_at(3, (1000.0, 0.0), (1100.0, 100.0), 0.0));
    graph.insert_area(area_at(4, (1100.0, 0.0), (1200.0, 100.0), 0.0));
    link(&mut graph, 1, 2, Direction::East);
    link(&mut graph, 2, 1, Direction::West);
    link(&mut graph, 3, 4, Direction::East);
    link(&mut graph, 4, 3, Direction::West);
    graph
}

/// A pair whose second area sits well above jump height, plus the base
/// distance between their centers
pub fn tall_gain_graph() -> (AreaGraph, f32) {
    let mut graph = AreaGraph::new();
    graph.insert_area(area_at(1, (0.0, 0.0), (100.0, 100.0), 0.0));
    graph.insert_area(area_at(2, (100.0, 0.0), (200.0, 100.0), 150.0));
    link(&mut graph, 1, 2, Direction::East);
    link(&mut graph, 2, 1, Direction::West);
    let base = distance(
        &graph.area(AreaId::new(1)).expect("fixture area").center(),
        &graph.area(AreaId::new(2)).expect("fixture area").center(),
    );
    (graph, base)
}

/// A raw mesh area record with empty optional blocks
pub fn raw_area(id: u32, min: (f32, f32), max: (f32, f32), z: f32) -> RawArea {
    RawArea {
        id,
        flags: 0,
        nw: Vec3::new(min.0, min.1, z),
        se: Vec3::new(max.0, max.1, z),
        ne_z: z,
        sw_z: z,
        connections: Default::default(),
        hiding_spots: Vec::new(),
        encounter_paths: Vec::new(),
        place_id: 0,
        ladder_up: Vec::new(),
        ladder_down: Vec::new(),
        earliest_occupy: [0.0; 2],
        light_intensity: [1.0; 4],
        visible_areas: Vec::new(),
        inherit_visibility_from: 0,
    }
}

/// A three-area corridor mesh file with bidirectional east/west adjacency
pub fn sample_nav_file() -> NavFile {
    let mut one = raw_area(1, (0.0, 0.0), (100.0, 100.0), 0.0);
    let mut two = raw_area(2, (100.0, 0.0), (200.0, 100.0), 0.0);
    let mut three = raw_area(3, (200.0, 0.0), (300.0, 100.0), 0.0);
    one.connections[Direction::East.index()].push(2);
    two.connections[Direction::West.index()].push(1);
    two.connections[Direction::East.index()].push(3);
    three.connections[Direction::West.index()].push(2);
    NavFile {
        minor_version: 1,
        bsp_size: 4096,
        analyzed: true,
        places: vec!["Courtyard".to_string(), "Tunnels".to_string()],
        areas: vec![one, two, three],
    }
}

/// Scripted sweep outcome
#[derive(Debug, Clone, Copy)]
enum SweepOutcome {
    Clear,
    Blocked,
    Inconclusive,
}

/// Trace double with a fixed scripted outcome
#[derive(Debug, Clone, Copy)]
pub struct StubTrace {
    outcome: SweepOutcome,
}

impl StubTrace {
    /// Every sweep reaches its end point
    pub fn clear() -> Self {
        Self {
            outcome: SweepOutcome::Clear,
        }
    }

    /// Every sweep hits a wall halfway
    pub fn blocked() -> Self {
        Self {
            outcome: SweepOutcome::Blocked,
        }
    }

    /// The host cannot answer
    pub fn inconclusive() -> Self {
        Self {
            outcome: SweepOutcome::Inconclusive,
        }
    }
}

impl TraceProvider for StubTrace {
    fn sweep_capsule(&self, _start: Vec3, _end: Vec3) -> Result<Option<SweepHit>> {
        match self.outcome {
            SweepOutcome::Clear => Ok(None),
            SweepOutcome::Blocked => Ok(Some(SweepHit {
                fraction: 0.5,
                normal: Vec3::Z,
            })),
            SweepOutcome::Inconclusive => Err(Error::Graph("probe unavailable".to_string())),
        }
    }
}
