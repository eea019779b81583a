//! Path and waypoint bookkeeping
//!
//! A path stores area ids, not references: the graph mutates between frames
//! as the processor and circuit breaker do their work, so each waypoint is
//! resolved against live data on demand. A stale id simply yields no
//! waypoint and the caller re-plans.

use std::collections::VecDeque;

use navgraph_common::Vec3;

use super::graph::{AreaGraph, AreaId};

/// What a waypoint points at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub enum WaypointKind {
    /// Door middle point into the next area
    Door,
    /// Center of the next area (no door geometry available)
    Center,
    /// The final goal position
    Goal,
}

/// A fine-grained movement target derived from the coarse area path
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub struct Waypoint {
    pub pos: Vec3,
    pub kind: WaypointKind,
    /// Area the waypoint leads into
    pub area: AreaId,
}

/// An ordered area sequence from start to goal, consumed front to back
#[derive(Debug, Clone)]
pub struct Path {
    areas: VecDeque<AreaId>,
    goal: Vec3,
}

impl Path {
    pub fn new(areas: Vec<AreaId>, goal: Vec3) -> Self {
        Self {
            areas: areas.into(),
            goal,
        }
    }

    /// Remaining areas, front first
    pub fn areas(&self) -> impl Iterator<Item = AreaId> + '_ {
        self.areas.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.areas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }

    /// The area the agent is currently traversing
    pub fn current(&self) -> Option<AreaId> {
        self.areas.front().copied()
    }

    /// The goal position the path was planned for
    pub fn goal(&self) -> Vec3 {
        self.goal
    }

    /// Removes and returns the leading area once the agent has crossed it
    pub fn advance(&mut self) -> Option<AreaId> {
        self.areas.pop_front()
    }

    /// Resolves the current movement target against the live graph.
    ///
    /// Returns `None` when the path is exhausted or its leading ids no
    /// longer resolve (the graph changed); callers re-plan in that case.
    pub fn current_waypoint(&self, graph: &AreaGraph) -> Option<Waypoint> {
        let current = *self.areas.front()?;
        let next = match self.areas.get(1) {
            Some(&next) => next,
            None => {
                return Some(Waypoint {
                    pos: self.goal,
                    kind: WaypointKind::Goal,
                    area: current,
                })
            }
        };

        if let Some(conn) = graph.connection(current, next) {
            if let Some(door) = &conn.door {
                return Some(Waypoint {
                    pos: door.middle,
                    kind: WaypointKind::Door,
                    area: next,
                });
            }
        }
        graph.area(next).map(|area| Waypoint {
            pos: area.center(),
            kind: WaypointKind::Center,
            area: next,
        })
    }
}
