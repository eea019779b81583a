//! Area graph storage
//!
//! The graph is the core data structure for pathfinding: convex areas with
//! four directional connection lists, stored in a dense arena with an id
//! index so callers can hold plain ids across frames while the connection
//! lists are mutated underneath them.

use std::collections::HashMap;

use navgraph_common::{distance, distance_squared, Vec3};

use super::nav_file::NavFile;

/// Connections with a cost at or above this value are treated as absent by
/// the pathfinder. They stay in the graph so connectivity can be restored by
/// an explicit cost recalculation.
pub const COST_BLOCKED: f32 = 1.0e9;

/// Identifier of an area, stable for the lifetime of a loaded mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub struct AreaId(u32);

impl AreaId {
    /// Id zero is never assigned by the mesh format
    pub const INVALID: AreaId = AreaId(0);

    /// Creates an area id from its raw mesh value
    pub fn new(id: u32) -> Self {
        AreaId(id)
    }

    /// Returns the raw id value
    pub fn id(&self) -> u32 {
        self.0
    }

    /// Checks whether the id is potentially valid
    pub fn is_valid(&self) -> bool {
        self.0 != 0
    }
}

impl std::fmt::Display for AreaId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Cardinal direction of a connection list.
///
/// North is -Y and East is +X, matching the mesh file's corner layout
/// (north-west corner carries the minimum X/Y).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    /// All directions in mesh-file order
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// Index into a directional connection table
    pub fn index(self) -> usize {
        match self {
            Direction::North => 0,
            Direction::East => 1,
            Direction::South => 2,
            Direction::West => 3,
        }
    }

    /// Direction for a connection table index
    pub fn from_index(index: usize) -> Option<Direction> {
        Self::ALL.get(index).copied()
    }

    /// The opposing direction
    pub fn opposite(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::East => Direction::West,
            Direction::South => Direction::North,
            Direction::West => Direction::East,
        }
    }
}

/// Walkable boundary segment between two adjacent areas
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub struct Door {
    /// Endpoint at the low-coordinate end of the shared axis
    pub left: Vec3,
    /// Midpoint of the segment, the default crossing target
    pub middle: Vec3,
    /// Endpoint at the high-coordinate end of the shared axis
    pub right: Vec3,
}

/// Directed, costed link from one area to another
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub struct Connection {
    /// Target area id
    pub target: AreaId,
    /// Traversal cost, accumulates penalties and never decreases outside an
    /// explicit cost recalculation
    pub cost: f32,
    /// Door geometry when a walkable span exists on the shared boundary
    pub door: Option<Door>,
    /// Cardinal facing direction from source to target
    pub dir: Option<Direction>,
    /// Crossing requires a jump (gain between step and jump height)
    pub needs_boost: bool,
    /// Descent-only crossing; the reverse transition exceeds jump height
    pub one_way_drop: bool,
}

impl Connection {
    /// Creates a connection with no door geometry yet
    pub fn new(target: AreaId, cost: f32, dir: Option<Direction>) -> Self {
        Self {
            target,
            cost,
            door: None,
            dir,
            needs_boost: false,
            one_way_drop: false,
        }
    }

    /// Whether the pathfinder should consider this connection at all
    pub fn is_passable(&self) -> bool {
        self.cost < COST_BLOCKED
    }
}

/// A convex mesh cell with four directional neighbor lists.
///
/// Geometry is immutable after parse; connection lists are mutated by door
/// synthesis, the phased processor and the circuit breaker.
#[derive(Debug, Clone)]
pub struct Area {
    id: AreaId,
    flags: u32,
    /// Corner order: north-west, north-east, south-east, south-west
    corners: [Vec3; 4],
    center: Vec3,
    connections: [Vec<Connection>; 4],
}

impl Area {
    /// Builds an area from the two stored diagonal corners plus the two
    /// independently stored corner heights.
    pub fn new(id: AreaId, flags: u32, nw: Vec3, se: Vec3, ne_z: f32, sw_z: f32) -> Self {
        let ne = Vec3::new(se.x, nw.y, ne_z);
        let sw = Vec3::new(nw.x, se.y, sw_z);
        let center = (nw + se) * 0.5;
        Self {
            id,
            flags,
            corners: [nw, ne, se, sw],
            center,
            connections: [Vec::new(), Vec::new(), Vec::new(), Vec::new()],
        }
    }

    pub fn id(&self) -> AreaId {
        self.id
    }

    pub fn flags(&self) -> u32 {
        self.flags
    }

    /// Center position, the midpoint of the two stored diagonal corners
    pub fn center(&self) -> Vec3 {
        self.center
    }

    /// All four corners in north-west, north-east, south-east, south-west order
    pub fn corners(&self) -> &[Vec3; 4] {
        &self.corners
    }

    pub fn north_west(&self) -> Vec3 {
        self.corners[0]
    }

    pub fn north_east(&self) -> Vec3 {
        self.corners[1]
    }

    pub fn south_east(&self) -> Vec3 {
        self.corners[2]
    }

    pub fn south_west(&self) -> Vec3 {
        self.corners[3]
    }

    pub fn min_x(&self) -> f32 {
        self.corners[0].x
    }

    pub fn max_x(&self) -> f32 {
        self.corners[2].x
    }

    pub fn min_y(&self) -> f32 {
        self.corners[0].y
    }

    pub fn max_y(&self) -> f32 {
        self.corners[2].y
    }

    /// Checks horizontal containment of a position
    pub fn contains_xy(&self, pos: Vec3) -> bool {
        pos.x >= self.min_x() && pos.x <= self.max_x() && pos.y >= self.min_y() && pos.y <= self.max_y()
    }

    /// Connection list for one direction
    pub fn connections(&self, dir: Direction) -> &[Connection] {
        &self.connections[dir.index()]
    }

    /// Mutable connection list for one direction
    pub fn connections_mut(&mut self, dir: Direction) -> &mut Vec<Connection> {
        &mut self.connections[dir.index()]
    }

    /// Iterates over all outgoing connections across the four lists
    pub fn all_connections(&self) -> impl Iterator<Item = &Connection> {
        self.connections.iter().flatten()
    }

    /// Iterates mutably over all outgoing connections
    pub fn all_connections_mut(&mut self) -> impl Iterator<Item = &mut Connection> {
        self.connections.iter_mut().flatten()
    }

    /// Finds the outgoing connection to a target area
    pub fn connection(&self, target: AreaId) -> Option<&Connection> {
        self.all_connections().find(|c| c.target == target)
    }

    /// Finds the outgoing connection to a target area, mutably
    pub fn connection_mut(&mut self, target: AreaId) -> Option<&mut Connection> {
        self.all_connections_mut().find(|c| c.target == target)
    }
}

/// Dense arena of areas with an id index.
///
/// Single instance per loaded mesh; rebuilt wholesale on map change.
#[derive(Debug, Default, Clone)]
pub struct AreaGraph {
    areas: Vec<Area>,
    index: HashMap<u32, usize>,
}

impl AreaGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the graph from a parsed mesh file. Raw directional target ids
    /// become unannotated connections; targets that do not resolve to a
    /// decoded area are skipped.
    pub fn from_nav(file: &NavFile) -> Self {
        let mut graph = Self::new();
        for raw in &file.areas {
            graph.insert_area(Area::new(
                AreaId::new(raw.id),
                raw.flags,
                raw.nw,
                raw.se,
                raw.ne_z,
                raw.sw_z,
            ));
        }

        for raw in &file.areas {
            let from = AreaId::new(raw.id);
            let from_center = match graph.area(from) {
                Some(a) => a.center(),
                None => continue,
            };
            for (dir_idx, targets) in raw.connections.iter().enumerate() {
                let dir = match Direction::from_index(dir_idx) {
                    Some(d) => d,
                    None => continue,
                };
                for &target_id in targets {
                    let target = AreaId::new(target_id);
                    if target == from {
                        continue;
                    }
                    let target_center = match graph.area(target) {
                        Some(t) => t.center(),
                        None => {
                            log::debug!("area {from}: dropping link to unknown area {target_id}");
                            continue;
                        }
                    };
                    let cost = distance(&from_center, &target_center);
                    if let Some(area) = graph.area_mut(from) {
                        if area.connection(target).is_none() {
                            area.connections_mut(dir).push(Connection::new(target, cost, Some(dir)));
                        }
                    }
                }
            }
        }
        graph
    }

    /// Inserts an area, replacing any previous area with the same id
    pub fn insert_area(&mut self, area: Area) {
        let id = area.id().id();
        match self.index.get(&id) {
            Some(&slot) => self.areas[slot] = area,
            None => {
                self.index.insert(id, self.areas.len());
                self.areas.push(area);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.areas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }

    pub fn contains(&self, id: AreaId) -> bool {
        self.index.contains_key(&id.id())
    }

    /// Resolves an area by id
    pub fn area(&self, id: AreaId) -> Option<&Area> {
        self.index.get(&id.id()).map(|&slot| &self.areas[slot])
    }

    /// Resolves an area by id, mutably
    pub fn area_mut(&mut self, id: AreaId) -> Option<&mut Area> {
        match self.index.get(&id.id()) {
            Some(&slot) => self.areas.get_mut(slot),
            None => None,
        }
    }

    /// Iterates over all areas in arena order
    pub fn iter(&self) -> impl Iterator<Item = &Area> {
        self.areas.iter()
    }

    /// Snapshot of all area ids, for building work queues
    pub fn ids(&self) -> Vec<AreaId> {
        self.areas.iter().map(|a| a.id()).collect()
    }

    /// Finds the area closest to a world position.
    ///
    /// Areas containing the position horizontally win, nearest floor height
    /// first; otherwise the area with the nearest center is returned.
    pub fn closest_area(&self, pos: Vec3) -> Option<AreaId> {
        let mut best_contained: Option<(f32, AreaId)> = None;
        for area in &self.areas {
            if area.contains_xy(pos) {
                let dz = (area.center().z - pos.z).abs();
                if best_contained.map_or(true, |(d, _)| dz < d) {
                    best_contained = Some((dz, area.id()));
                }
            }
        }
        if let Some((_, id)) = best_contained {
            return Some(id);
        }

        let mut best: Option<(f32, AreaId)> = None;
        for area in &self.areas {
            let d = distance_squared(&area.center(), &pos);
            if best.map_or(true, |(bd, _)| d < bd) {
                best = Some((d, area.id()));
            }
        }
        best.map(|(_, id)| id)
    }

    /// Finds a directed connection between two areas
    pub fn connection(&self, from: AreaId, to: AreaId) -> Option<&Connection> {
        self.area(from).and_then(|a| a.connection(to))
    }

    /// Finds a directed connection between two areas, mutably
    pub fn connection_mut(&mut self, from: AreaId, to: AreaId) -> Option<&mut Connection> {
        self.area_mut(from).and_then(|a| a.connection_mut(to))
    }

    /// Adds a directed connection to an area's list for the given direction.
    /// Returns false when the source area is unknown or the link exists.
    pub fn add_connection(&mut self, from: AreaId, dir: Direction, connection: Connection) -> bool {
        match self.area_mut(from) {
            Some(area) => {
                if area.connection(connection.target).is_some() {
                    return false;
                }
                area.connections_mut(dir).push(connection);
                true
            }
            None => {
                log::debug!("add_connection: unknown source area {from}");
                false
            }
        }
    }

    /// Removes a directed connection. Returns false when it did not exist.
    pub fn remove_connection(&mut self, from: AreaId, to: AreaId) -> bool {
        match self.area_mut(from) {
            Some(area) => {
                let mut removed = false;
                for dir in Direction::ALL {
                    let list = area.connections_mut(dir);
                    let before = list.len();
                    list.retain(|c| c.target != to);
                    removed |= list.len() != before;
                }
                removed
            }
            None => false,
        }
    }

    /// Raises the cost of the connection in both directions. Called from hot
    /// per-frame paths, so unknown ids are a quiet no-op.
    pub fn bump_cost_both(&mut self, a: AreaId, b: AreaId, amount: f32) {
        if amount <= 0.0 {
            return;
        }
        for (from, to) in [(a, b), (b, a)] {
            match self.connection_mut(from, to) {
                Some(conn) => conn.cost += amount,
                None => log::debug!("bump_cost_both: no connection {from}->{to}"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::flat_pair_graph;

    #[test]
    fn test_area_corners_from_diagonals() {
        let area = Area::new(
            AreaId::new(7),
            0,
            Vec3::new(0.0, 0.0, 10.0),
            Vec3::new(100.0, 50.0, 14.0),
            12.0,
            11.0,
        );
        assert_eq!(area.north_east(), Vec3::new(100.0, 0.0, 12.0));
        assert_eq!(area.south_west(), Vec3::new(0.0, 50.0, 11.0));
        assert_eq!(area.center(), Vec3::new(50.0, 25.0, 12.0));
    }

    #[test]
    fn test_closest_area_prefers_containment() {
        let graph = flat_pair_graph();
        // Inside the second area but closer to the first area's center.
        let pos = Vec3::new(101.0, 50.0, 0.0);
        assert_eq!(graph.closest_area(pos), Some(AreaId::new(2)));
    }

    #[test]
    fn test_closest_area_falls_back_to_nearest_center() {
        let graph = flat_pair_graph();
        let pos = Vec3::new(-500.0, -500.0, 0.0);
        assert_eq!(graph.closest_area(pos), Some(AreaId::new(1)));
    }

    #[test]
    fn test_bump_cost_both_is_monotonic_and_tolerant() {
        let mut graph = flat_pair_graph();
        let a = AreaId::new(1);
        let b = AreaId::new(2);
        let before = graph.connection(a, b).unwrap().cost;
        graph.bump_cost_both(a, b, 25.0);
        graph.bump_cost_both(a, b, 25.0);
        assert_eq!(graph.connection(a, b).unwrap().cost, before + 50.0);
        assert_eq!(graph.connection(b, a).unwrap().cost, before + 50.0);

        // Unknown ids must not panic.
        graph.bump_cost_both(AreaId::new(99), b, 10.0);
    }

    #[test]
    fn test_remove_connection() {
        let mut graph = flat_pair_graph();
        assert!(graph.remove_connection(AreaId::new(1), AreaId::new(2)));
        assert!(graph.connection(AreaId::new(1), AreaId::new(2)).is_none());
        assert!(!graph.remove_connection(AreaId::new(1), AreaId::new(2)));
    }
}
