//! Door synthesis between adjacent areas
//!
//! A door is the sub-span of the shared boundary between two areas where the
//! height delta stays within a single jump. Connections for which no span
//! can be computed are removed from the graph; this is the only place where
//! graph pruning happens.

use navgraph_common::{lerp, Vec3};

use super::graph::{Area, AreaGraph, Connection, Direction, Door};
use super::profile::NavProfile;

const SPAN_EPSILON: f32 = 0.001;

/// Iterations of the reachable-span boundary search
const CLIP_ITERATIONS: usize = 4;

/// A synthesized door plus the flags derived while clipping it
#[derive(Debug, Clone, Copy)]
pub struct DoorSpan {
    pub door: Door,
    pub dir: Direction,
    pub needs_boost: bool,
    pub one_way_drop: bool,
}

/// Axis the door runs along
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    X,
    Y,
}

/// Determines the cardinal facing direction from `a` to `b` by bounding-box
/// overlap, falling back to the dominant axis of the center offset.
pub fn facing_direction(a: &Area, b: &Area) -> Direction {
    let overlap_x = a.min_x() < b.max_x() && b.min_x() < a.max_x();
    let overlap_y = a.min_y() < b.max_y() && b.min_y() < a.max_y();
    let delta = b.center() - a.center();

    if overlap_x && !overlap_y {
        if delta.y < 0.0 {
            Direction::North
        } else {
            Direction::South
        }
    } else if overlap_y && !overlap_x {
        if delta.x > 0.0 {
            Direction::East
        } else {
            Direction::West
        }
    } else if delta.y.abs() >= delta.x.abs() {
        if delta.y < 0.0 {
            Direction::North
        } else {
            Direction::South
        }
    } else if delta.x > 0.0 {
        Direction::East
    } else {
        Direction::West
    }
}

/// The edge of an area facing the given direction, as the pair of corners
/// bounding it in ascending order along the door axis.
fn facing_edge(area: &Area, dir: Direction) -> (Vec3, Vec3) {
    match dir {
        Direction::North => (area.north_west(), area.north_east()),
        Direction::South => (area.south_west(), area.south_east()),
        Direction::East => (area.north_east(), area.south_east()),
        Direction::West => (area.north_west(), area.south_west()),
    }
}

fn axis_of(dir: Direction) -> Axis {
    match dir {
        Direction::North | Direction::South => Axis::X,
        Direction::East | Direction::West => Axis::Y,
    }
}

fn coord(v: Vec3, axis: Axis) -> f32 {
    match axis {
        Axis::X => v.x,
        Axis::Y => v.y,
    }
}

/// Height of an edge at a world coordinate along its axis
fn edge_height(p0: Vec3, p1: Vec3, axis: Axis, t: f32) -> f32 {
    let lo = coord(p0, axis);
    let hi = coord(p1, axis);
    let span = hi - lo;
    if span.abs() < SPAN_EPSILON {
        return p0.z;
    }
    lerp(p0.z, p1.z, (t - lo) / span)
}

/// Computes the walkable door span for the directed pair `a` -> `b`.
///
/// Returns `None` when the two facing edges do not overlap, or when the
/// whole overlap exceeds jump height uphill.
pub fn compute_door(a: &Area, b: &Area, profile: &NavProfile) -> Option<DoorSpan> {
    let dir = facing_direction(a, b);
    let axis = axis_of(dir);
    let (a0, a1) = facing_edge(a, dir);
    let (b0, b1) = facing_edge(b, dir.opposite());

    let mut lo = coord(a0, axis).max(coord(b0, axis));
    let mut hi = coord(a1, axis).min(coord(b1, axis));
    if hi - lo <= SPAN_EPSILON {
        return None;
    }

    let delta_at = |t: f32| edge_height(b0, b1, axis, t) - edge_height(a0, a1, axis, t);
    let qualifies = |t: f32| delta_at(t).abs() < profile.jump_height;

    let lo_ok = qualifies(lo);
    let hi_ok = qualifies(hi);
    let mut one_way_drop = false;

    match (lo_ok, hi_ok) {
        (true, true) => {
            // Whole span is reachable; leave hull clearance at the ends when
            // the door is wide enough to afford it.
            if hi - lo > 2.0 * profile.hull_clearance {
                lo += profile.hull_clearance;
                hi -= profile.hull_clearance;
            }
        }
        (true, false) => {
            let crossing = clip_boundary(lo, hi, &qualifies);
            hi = (crossing - profile.hull_clearance).max(lo);
        }
        (false, true) => {
            let crossing = clip_boundary(hi, lo, &qualifies);
            lo = (crossing + profile.hull_clearance).min(hi);
        }
        (false, false) => {
            // Falling is always permitted: a strict descent keeps the raw
            // overlap as a one-way door. An unreachable climb is a non-edge.
            if delta_at(lo) < 0.0 && delta_at(hi) < 0.0 {
                one_way_drop = true;
            } else {
                return None;
            }
        }
    }

    let gain_lo = delta_at(lo);
    let gain_hi = delta_at(hi);
    let needs_boost = !one_way_drop
        && [gain_lo, gain_hi]
            .iter()
            .any(|&g| g > profile.step_height && g <= profile.jump_height);

    let point_at = |t: f32| {
        let z = edge_height(a0, a1, axis, t).max(edge_height(b0, b1, axis, t));
        match axis {
            Axis::X => Vec3::new(t, a0.y, z),
            Axis::Y => Vec3::new(a0.x, t, z),
        }
    };

    let left = point_at(lo);
    let right = point_at(hi);
    let middle = point_at((lo + hi) * 0.5);

    Some(DoorSpan {
        door: Door { left, middle, right },
        dir,
        needs_boost,
        one_way_drop,
    })
}

/// Binary search from a reachable coordinate toward an unreachable one for
/// the point where the height delta crosses jump height.
fn clip_boundary(good: f32, bad: f32, qualifies: &dyn Fn(f32) -> bool) -> f32 {
    let mut good = good;
    let mut bad = bad;
    for _ in 0..CLIP_ITERATIONS {
        let mid = (good + bad) * 0.5;
        if qualifies(mid) {
            good = mid;
        } else {
            bad = mid;
        }
    }
    good
}

/// Rebuilds every area's connection lists with synthesized door geometry.
///
/// Connections without a computable span are dropped; everything else is
/// re-bucketed under its computed facing direction.
pub fn synthesize_doors(graph: &mut AreaGraph, profile: &NavProfile) {
    for id in graph.ids() {
        let rebuilt: Vec<(Direction, Connection)> = {
            let area = match graph.area(id) {
                Some(a) => a,
                None => continue,
            };
            let mut out = Vec::new();
            for conn in area.all_connections() {
                let target = match graph.area(conn.target) {
                    Some(t) => t,
                    None => {
                        log::debug!("door synthesis: {id}->{} target vanished", conn.target);
                        continue;
                    }
                };
                match compute_door(area, target, profile) {
                    Some(span) => {
                        let mut next = conn.clone();
                        next.door = Some(span.door);
                        next.dir = Some(span.dir);
                        next.needs_boost = span.needs_boost;
                        next.one_way_drop = span.one_way_drop;
                        out.push((span.dir, next));
                    }
                    None => {
                        log::debug!("door synthesis: {id}->{} has no walkable span", conn.target);
                    }
                }
            }
            out
        };

        if let Some(area) = graph.area_mut(id) {
            for dir in Direction::ALL {
                area.connections_mut(dir).clear();
            }
            for (dir, conn) in rebuilt {
                area.connections_mut(dir).push(conn);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::AreaId;
    use crate::test_fixtures::area_at;

    fn profile() -> NavProfile {
        NavProfile::default()
    }

    #[test]
    fn test_flat_neighbors_share_a_full_door() {
        let a = area_at(1, (0.0, 0.0), (100.0, 100.0), 0.0);
        let b = area_at(2, (100.0, 0.0), (200.0, 100.0), 0.0);
        let span = compute_door(&a, &b, &profile()).unwrap();
        assert_eq!(span.dir, Direction::East);
        assert!(!span.needs_boost);
        assert!(!span.one_way_drop);
        // Clearance pulled in from both ends of the 100-unit overlap.
        assert!((span.door.left.y - 16.0).abs() < 1e-3);
        assert!((span.door.right.y - 84.0).abs() < 1e-3);
        assert!((span.door.left.x - 100.0).abs() < 1e-3);
        assert!((span.door.middle.y - 50.0).abs() < 1e-3);
    }

    #[test]
    fn test_partial_overlap_is_clipped_to_the_shared_span() {
        let a = area_at(1, (0.0, 0.0), (100.0, 100.0), 0.0);
        let b = area_at(2, (100.0, 60.0), (200.0, 260.0), 0.0);
        let span = compute_door(&a, &b, &profile()).unwrap();
        // Overlap is y in [60, 100]; too narrow for symmetric clearance.
        assert!(span.door.left.y >= 60.0 - 1e-3);
        assert!(span.door.right.y <= 100.0 + 1e-3);
    }

    #[test]
    fn test_disjoint_edges_have_no_door() {
        let a = area_at(1, (0.0, 0.0), (100.0, 100.0), 0.0);
        let b = area_at(2, (100.0, 200.0), (200.0, 300.0), 0.0);
        assert!(compute_door(&a, &b, &profile()).is_none());
    }

    #[test]
    fn test_unreachable_climb_is_a_non_edge() {
        let a = area_at(1, (0.0, 0.0), (100.0, 100.0), 0.0);
        let b = area_at(2, (100.0, 0.0), (200.0, 100.0), 100.0);
        assert!(compute_door(&a, &b, &profile()).is_none());
    }

    #[test]
    fn test_tall_drop_is_one_way() {
        let a = area_at(1, (0.0, 0.0), (100.0, 100.0), 100.0);
        let b = area_at(2, (100.0, 0.0), (200.0, 100.0), 0.0);
        let span = compute_door(&a, &b, &profile()).unwrap();
        assert!(span.one_way_drop);
        assert!(!span.needs_boost);
        // Raw overlap, no clearance applied.
        assert!((span.door.left.y - 0.0).abs() < 1e-3);
        assert!((span.door.right.y - 100.0).abs() < 1e-3);
    }

    #[test]
    fn test_jumpable_step_sets_boost_flag() {
        let a = area_at(1, (0.0, 0.0), (100.0, 100.0), 0.0);
        let b = area_at(2, (100.0, 0.0), (200.0, 100.0), 40.0);
        let span = compute_door(&a, &b, &profile()).unwrap();
        assert!(span.needs_boost);
        assert!(!span.one_way_drop);
    }

    #[test]
    fn test_sloped_edge_is_clipped_near_the_crossing() {
        // B's facing edge climbs from 0 to 160 along Y, so only the low part
        // is within jump height of A.
        let a = area_at(1, (0.0, 0.0), (100.0, 100.0), 0.0);
        let b = Area::new(
            AreaId::new(2),
            0,
            Vec3::new(100.0, 0.0, 0.0),
            Vec3::new(200.0, 100.0, 160.0),
            0.0,
            160.0,
        );
        let span = compute_door(&a, &b, &profile()).unwrap();
        // Crossing of |dz| = 72 sits at y = 45; the clipped end must sit at
        // or below it with clearance backed off toward the reachable side.
        assert!(span.door.right.y < 45.0);
        assert!(span.door.left.y <= span.door.right.y + 1e-3);
    }

    #[test]
    fn test_facing_direction_falls_back_to_center_offset() {
        // Diagonal placement: no single-axis overlap.
        let a = area_at(1, (0.0, 0.0), (100.0, 100.0), 0.0);
        let b = area_at(2, (120.0, 150.0), (220.0, 250.0), 0.0);
        assert_eq!(facing_direction(&a, &b), Direction::South);
    }

    #[test]
    fn test_synthesize_rebuckets_and_prunes() {
        let mut graph = AreaGraph::new();
        graph.insert_area(area_at(1, (0.0, 0.0), (100.0, 100.0), 0.0));
        graph.insert_area(area_at(2, (100.0, 0.0), (200.0, 100.0), 0.0));
        graph.insert_area(area_at(3, (300.0, 300.0), (400.0, 400.0), 0.0));
        // Mis-bucketed raw connection and one with no shared boundary.
        graph.add_connection(
            AreaId::new(1),
            Direction::North,
            Connection::new(AreaId::new(2), 100.0, None),
        );
        graph.add_connection(
            AreaId::new(1),
            Direction::South,
            Connection::new(AreaId::new(3), 400.0, None),
        );

        synthesize_doors(&mut graph, &profile());

        let one = graph.area(AreaId::new(1)).unwrap();
        assert!(one.connection(AreaId::new(3)).is_none());
        let conn = one.connection(AreaId::new(2)).unwrap();
        assert_eq!(conn.dir, Some(Direction::East));
        assert!(conn.door.is_some());
        assert_eq!(one.connections(Direction::East).len(), 1);
        assert!(one.connections(Direction::North).is_empty());
    }

    #[test]
    fn test_door_endpoint_height_validity() {
        // Property: every synthesized door is jumpable at both endpoints or
        // explicitly one-way descent.
        let p = profile();
        let heights = [0.0, 30.0, 80.0, -90.0, 150.0];
        let a = area_at(1, (0.0, 0.0), (100.0, 100.0), 0.0);
        for (i, &h) in heights.iter().enumerate() {
            let b = area_at(10 + i as u32, (100.0, 0.0), (200.0, 100.0), h);
            if let Some(span) = compute_door(&a, &b, &p) {
                let dl = h - 0.0;
                if !span.one_way_drop {
                    assert!(dl.abs() < p.jump_height, "height {h} produced a walkable door");
                }
            }
        }
    }
}
