//! Phased connection processing
//!
//! Cost annotation runs as a four-stage pipeline stepped once per rendered
//! frame, so a large mesh never stalls the host's render loop. Each step
//! processes a batch of work items; the batch size tracks a measured
//! frames-per-second signal against the profile's target.
//!
//! The stages run strictly in order: cheap cost assignment, expensive probe
//! fallback for uncertain edges, stair patching for missing reverse
//! connections, and optional fine stitching against a higher-resolution
//! point layer.

use std::collections::VecDeque;

use navgraph_common::{distance, Vec3};

use super::access::classify;
use super::door::{compute_door, facing_direction};
use super::graph::{AreaGraph, AreaId, Connection};
use super::profile::{CostPreset, NavProfile};
use super::trace::TraceProvider;

/// Pipeline stage. Stages are entered strictly in order and each is exited
/// when its work queue drains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub enum Phase {
    Idle,
    BasicCosts,
    ExpensiveProbes,
    StairPatching,
    FineStitching,
}

/// Snapshot of the processor's progress cursor
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub struct ProcessorStatus {
    pub phase: Phase,
    /// Work items left across all remaining queues
    pub remaining: usize,
    /// Current per-step batch size
    pub batch: usize,
    /// Items processed since the last start
    pub processed: u64,
}

/// Optional higher-resolution sample layer for fine stitching
#[derive(Debug, Clone)]
pub struct PointLayer {
    pub points: Vec<Vec3>,
    /// Maximum distance between two points considered for a stitch probe
    pub link_range: f32,
}

/// The frame-budgeted connection annotation pipeline.
///
/// Re-entrant: stepping while idle is a no-op. `restart` discards in-flight
/// state and rebuilds the work queue; `stop` resets to idle and keeps
/// whatever annotations were already applied.
#[derive(Debug)]
pub struct ConnectionProcessor {
    phase: Phase,
    batch: usize,
    processed: u64,
    basic_queue: VecDeque<(AreaId, AreaId)>,
    probe_queue: VecDeque<(AreaId, AreaId)>,
    stair_queue: VecDeque<(AreaId, AreaId)>,
    stitch_queue: VecDeque<(usize, usize)>,
    point_layer: Option<PointLayer>,
}

impl ConnectionProcessor {
    pub fn new(profile: &NavProfile) -> Self {
        Self {
            phase: Phase::Idle,
            batch: profile.initial_batch,
            processed: 0,
            basic_queue: VecDeque::new(),
            probe_queue: VecDeque::new(),
            stair_queue: VecDeque::new(),
            stitch_queue: VecDeque::new(),
            point_layer: None,
        }
    }

    /// Supplies (or clears) the point layer used by the fine stitching stage
    pub fn set_point_layer(&mut self, layer: Option<PointLayer>) {
        self.point_layer = layer;
    }

    pub fn is_idle(&self) -> bool {
        self.phase == Phase::Idle
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn status(&self) -> ProcessorStatus {
        ProcessorStatus {
            phase: self.phase,
            remaining: self.basic_queue.len()
                + self.probe_queue.len()
                + self.stair_queue.len()
                + self.stitch_queue.len(),
            batch: self.batch,
            processed: self.processed,
        }
    }

    /// Builds the work queue from the graph and enters the first stage
    pub fn start(&mut self, graph: &AreaGraph) {
        self.stop();
        self.processed = 0;
        for area in graph.iter() {
            for conn in area.all_connections() {
                self.basic_queue.push_back((area.id(), conn.target));
            }
        }
        self.phase = Phase::BasicCosts;
    }

    /// Discards in-flight state and rebuilds the work queue from scratch
    pub fn restart(&mut self, graph: &AreaGraph) {
        self.start(graph);
    }

    /// Resets to idle. Annotations already applied remain; there is no
    /// rollback.
    pub fn stop(&mut self) {
        self.phase = Phase::Idle;
        self.basic_queue.clear();
        self.probe_queue.clear();
        self.stair_queue.clear();
        self.stitch_queue.clear();
    }

    /// Runs one frame's worth of work. `measured_fps` is the host's frame
    /// rate estimate; the batch shrinks below target and grows when there is
    /// comfortable headroom.
    pub fn step(
        &mut self,
        graph: &mut AreaGraph,
        profile: &NavProfile,
        probe: &dyn TraceProvider,
        measured_fps: f32,
    ) -> Phase {
        if self.phase == Phase::Idle {
            return Phase::Idle;
        }

        self.adapt_batch(profile, measured_fps);

        let mut budget = self.batch;
        while budget > 0 {
            match self.phase {
                Phase::Idle => break,
                Phase::BasicCosts => match self.basic_queue.pop_front() {
                    Some((from, to)) => {
                        self.apply_basic_cost(graph, profile, from, to);
                        self.processed += 1;
                        budget -= 1;
                    }
                    None => {
                        self.phase = Phase::ExpensiveProbes;
                    }
                },
                Phase::ExpensiveProbes => match self.probe_queue.pop_front() {
                    Some((from, to)) => {
                        self.refine_cost(graph, profile, probe, from, to);
                        self.processed += 1;
                        budget -= 1;
                    }
                    None => {
                        self.build_stair_queue(graph, profile);
                        self.phase = Phase::StairPatching;
                    }
                },
                Phase::StairPatching => match self.stair_queue.pop_front() {
                    Some((from, to)) => {
                        self.patch_stair(graph, profile, probe, from, to);
                        self.processed += 1;
                        budget -= 1;
                    }
                    None => {
                        self.build_stitch_queue(graph);
                        self.phase = Phase::FineStitching;
                    }
                },
                Phase::FineStitching => match self.stitch_queue.pop_front() {
                    Some((i, j)) => {
                        self.stitch_points(graph, probe, i, j);
                        self.processed += 1;
                        budget -= 1;
                    }
                    None => {
                        self.phase = Phase::Idle;
                        log::debug!("connection processing complete, {} items", self.processed);
                    }
                },
            }
        }
        self.phase
    }

    fn adapt_batch(&mut self, profile: &NavProfile, measured_fps: f32) {
        if measured_fps < profile.target_fps {
            self.batch = self.batch.saturating_sub(1).max(profile.min_batch);
        } else if measured_fps > profile.target_fps * 1.2 {
            self.batch = (self.batch + 1).min(profile.max_batch);
        }
    }

    /// Stage 1: cheap classifier cost. Edges the classifier could not judge
    /// without a sweep are queued for the probe stage.
    fn apply_basic_cost(
        &mut self,
        graph: &mut AreaGraph,
        profile: &NavProfile,
        from: AreaId,
        to: AreaId,
    ) {
        let (cost, needs_probe) = {
            let (a, b) = match (graph.area(from), graph.area(to)) {
                (Some(a), Some(b)) => (a, b),
                _ => {
                    log::debug!("basic cost: skipping stale pair {from}->{to}");
                    return;
                }
            };
            let reach = classify(a, b, profile, None);
            (
                edge_cost(a.center(), b.center(), reach.multiplier, profile),
                reach.multiplier >= profile.provisional_multiplier,
            )
        };

        match graph.connection_mut(from, to) {
            Some(conn) => conn.cost = cost,
            None => return,
        }
        if needs_probe {
            self.probe_queue.push_back((from, to));
        }
    }

    /// Stage 2: re-evaluates an uncertain edge with the probe permitted and
    /// replaces the provisional cost.
    fn refine_cost(
        &mut self,
        graph: &mut AreaGraph,
        profile: &NavProfile,
        probe: &dyn TraceProvider,
        from: AreaId,
        to: AreaId,
    ) {
        let cost = {
            let (a, b) = match (graph.area(from), graph.area(to)) {
                (Some(a), Some(b)) => (a, b),
                _ => return,
            };
            let reach = classify(a, b, profile, Some(probe));
            edge_cost(a.center(), b.center(), reach.multiplier, profile)
        };
        if let Some(conn) = graph.connection_mut(from, to) {
            conn.cost = cost;
        }
    }

    /// Collects directed edges whose reverse is missing and whose height
    /// delta sits in the stair band.
    fn build_stair_queue(&mut self, graph: &AreaGraph, profile: &NavProfile) {
        for area in graph.iter() {
            for conn in area.all_connections() {
                if graph.connection(conn.target, area.id()).is_some() {
                    continue;
                }
                let target = match graph.area(conn.target) {
                    Some(t) => t,
                    None => continue,
                };
                let dz = (target.center().z - area.center().z).abs();
                if dz >= profile.stair_min && dz <= profile.stair_max {
                    self.stair_queue.push_back((area.id(), conn.target));
                }
            }
        }
    }

    /// Stage 3: inserts the missing reverse connection when a reverse sweep
    /// succeeds. Climbing back up costs more than the drop that created the
    /// forward edge.
    fn patch_stair(
        &mut self,
        graph: &mut AreaGraph,
        profile: &NavProfile,
        probe: &dyn TraceProvider,
        from: AreaId,
        to: AreaId,
    ) {
        if graph.connection(to, from).is_some() {
            return;
        }
        let (dir, conn) = {
            let (a, b) = match (graph.area(from), graph.area(to)) {
                (Some(a), Some(b)) => (a, b),
                _ => return,
            };
            match probe.sweep_capsule(b.center(), a.center()) {
                Ok(None) => {}
                Ok(Some(_)) | Err(_) => return,
            }

            let gain = a.center().z - b.center().z;
            let multiplier = if gain > 0.0 {
                profile.stair_climb_multiplier
            } else {
                1.0
            };
            let cost = edge_cost(b.center(), a.center(), multiplier, profile);
            let mut conn = Connection::new(from, cost, None);
            match compute_door(b, a, profile) {
                Some(span) => {
                    conn.door = Some(span.door);
                    conn.dir = Some(span.dir);
                    conn.needs_boost = span.needs_boost;
                    (span.dir, conn)
                }
                None => {
                    let dir = facing_direction(b, a);
                    conn.dir = Some(dir);
                    conn.needs_boost = gain > profile.step_height;
                    (dir, conn)
                }
            }
        };
        if graph.add_connection(to, dir, conn) {
            log::debug!("stair patch: inserted reverse connection {to}->{from}");
        }
    }

    /// Pairs up nearby points of the fine layer that fall in distinct areas
    fn build_stitch_queue(&mut self, graph: &AreaGraph) {
        let layer = match &self.point_layer {
            Some(layer) => layer,
            None => return,
        };
        if graph.is_empty() {
            return;
        }
        for i in 0..layer.points.len() {
            for j in (i + 1)..layer.points.len() {
                if distance(&layer.points[i], &layer.points[j]) <= layer.link_range {
                    self.stitch_queue.push_back((i, j));
                }
            }
        }
    }

    /// Stage 4: a successful short-range sweep between two sample points
    /// adds a bidirectional link between their areas.
    fn stitch_points(&mut self, graph: &mut AreaGraph, probe: &dyn TraceProvider, i: usize, j: usize) {
        let layer = match &self.point_layer {
            Some(layer) => layer,
            None => return,
        };
        let (p, q) = match (layer.points.get(i), layer.points.get(j)) {
            (Some(&p), Some(&q)) => (p, q),
            _ => return,
        };
        let (pa, qa) = match (graph.closest_area(p), graph.closest_area(q)) {
            (Some(pa), Some(qa)) if pa != qa => (pa, qa),
            _ => return,
        };
        if graph.connection(pa, qa).is_some() || graph.connection(qa, pa).is_some() {
            return;
        }
        match probe.sweep_capsule(p, q) {
            Ok(None) => {}
            Ok(Some(_)) | Err(_) => return,
        }

        let (pc, qc, forward_dir) = match (graph.area(pa), graph.area(qa)) {
            (Some(a), Some(b)) => (a.center(), b.center(), facing_direction(a, b)),
            _ => return,
        };
        let cost = distance(&pc, &qc);
        graph.add_connection(pa, forward_dir, Connection::new(qa, cost, Some(forward_dir)));
        let reverse_dir = forward_dir.opposite();
        graph.add_connection(qa, reverse_dir, Connection::new(pa, cost, Some(reverse_dir)));
        log::debug!("fine stitch: linked {pa}<->{qa}");
    }
}

/// Base distance times multiplier, plus the height-gain penalty under the
/// `HeightPenalized` preset.
fn edge_cost(from: Vec3, to: Vec3, multiplier: f32, profile: &NavProfile) -> f32 {
    let mut cost = distance(&from, &to) * multiplier;
    if profile.cost_preset == CostPreset::HeightPenalized {
        let gain = to.z - from.z;
        if gain > 0.0 {
            cost += (gain / profile.step_height) * profile.step_cost;
        }
    }
    cost
}
