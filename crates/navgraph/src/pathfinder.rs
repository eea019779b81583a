//! Weighted A* search over the area graph
//!
//! The search trusts the costs embedded in the graph and performs no
//! accessibility checks of its own. The heuristic is Manhattan distance on
//! the horizontal plane; with penalty multipliers in play the result is
//! good quality rather than provably optimal.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use navgraph_common::manhattan_xy;

use super::graph::{AreaGraph, AreaId};

/// State of a node in the search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeState {
    Open,
    Closed,
}

/// Node in the A* search
#[derive(Debug, Clone)]
struct SearchNode {
    id: AreaId,
    parent: Option<usize>,
    g: f32,
    state: NodeState,
}

/// Node wrapper for the binary heap (priority queue)
#[derive(Debug, Clone, Copy)]
struct HeapNode {
    /// Index of the node in the search pool
    index: usize,
    /// Total cost (f value)
    f: f32,
}

impl PartialEq for HeapNode {
    fn eq(&self, other: &Self) -> bool {
        self.f == other.f
    }
}

impl Eq for HeapNode {}

impl PartialOrd for HeapNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for a min-heap; NaN sorts as greatest.
        match other.f.partial_cmp(&self.f) {
            Some(ordering) => ordering,
            None => {
                if other.f.is_nan() && !self.f.is_nan() {
                    Ordering::Less
                } else if !other.f.is_nan() && self.f.is_nan() {
                    Ordering::Greater
                } else {
                    Ordering::Equal
                }
            }
        }
    }
}

/// Reusable A* search state.
///
/// The pool and open list are cleared per query, so a single instance can
/// serve every query against a graph.
#[derive(Debug, Default)]
pub struct Pathfinder {
    nodes: Vec<SearchNode>,
    lookup: HashMap<AreaId, usize>,
    open: BinaryHeap<HeapNode>,
}

impl Pathfinder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Finds the cheapest path between two areas using the costs embedded in
    /// the graph. Returns the area sequence from start to goal inclusive, or
    /// `None` when no route exists.
    pub fn find_path(
        &mut self,
        graph: &AreaGraph,
        start: AreaId,
        goal: AreaId,
    ) -> Option<Vec<AreaId>> {
        self.find_path_with(graph, start, goal, |g, id| {
            g.area(id)
                .map(|area| {
                    area.all_connections()
                        .filter(|c| c.is_passable())
                        .map(|c| (c.target, c.cost))
                        .collect()
                })
                .unwrap_or_default()
        })
    }

    /// Finds a path using a caller-supplied adjacency function, for callers
    /// that filter candidate connections (blocked edges, door constraints).
    pub fn find_path_with<F>(
        &mut self,
        graph: &AreaGraph,
        start: AreaId,
        goal: AreaId,
        mut adjacency: F,
    ) -> Option<Vec<AreaId>>
    where
        F: FnMut(&AreaGraph, AreaId) -> Vec<(AreaId, f32)>,
    {
        let goal_center = graph.area(goal)?.center();
        graph.area(start)?;
        if start == goal {
            return Some(vec![start]);
        }

        self.nodes.clear();
        self.lookup.clear();
        self.open.clear();

        let heuristic = |g: &AreaGraph, id: AreaId| -> f32 {
            g.area(id)
                .map(|a| manhattan_xy(&a.center(), &goal_center))
                .unwrap_or(0.0)
        };

        self.nodes.push(SearchNode {
            id: start,
            parent: None,
            g: 0.0,
            state: NodeState::Open,
        });
        self.lookup.insert(start, 0);
        self.open.push(HeapNode {
            index: 0,
            f: heuristic(graph, start),
        });

        while let Some(HeapNode { index, .. }) = self.open.pop() {
            if self.nodes[index].state == NodeState::Closed {
                continue; // stale heap entry
            }
            self.nodes[index].state = NodeState::Closed;

            let current = self.nodes[index].id;
            if current == goal {
                return Some(self.reconstruct(index));
            }

            let current_g = self.nodes[index].g;
            for (target, cost) in adjacency(graph, current) {
                if !graph.contains(target) {
                    continue;
                }
                let tentative = current_g + cost.max(0.0);
                let slot = match self.lookup.get(&target) {
                    Some(&slot) => {
                        if tentative >= self.nodes[slot].g {
                            continue;
                        }
                        self.nodes[slot].g = tentative;
                        self.nodes[slot].parent = Some(index);
                        self.nodes[slot].state = NodeState::Open;
                        slot
                    }
                    None => {
                        let slot = self.nodes.len();
                        self.nodes.push(SearchNode {
                            id: target,
                            parent: Some(index),
                            g: tentative,
                            state: NodeState::Open,
                        });
                        self.lookup.insert(target, slot);
                        slot
                    }
                };
                self.open.push(HeapNode {
                    index: slot,
                    f: tentative + heuristic(graph, target),
                });
            }
        }

        None
    }

    /// Walks parent links back to the start and reverses the result
    fn reconstruct(&self, mut index: usize) -> Vec<AreaId> {
        let mut path = Vec::new();
        loop {
            path.push(self.nodes[index].id);
            match self.nodes[index].parent {
                Some(parent) => index = parent,
                None => break,
            }
        }
        path.reverse();
        path
    }
}
