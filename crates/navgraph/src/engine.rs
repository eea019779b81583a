//! Engine facade
//!
//! Owns the single mutable graph instance and everything that reads or
//! writes it: the parse cache, the phased processor, the pathfinder, the
//! circuit breaker and the current path. All queries take and return plain
//! ids and positions; callers never get mutable access to graph internals.
//!
//! Queries issued before a mesh is loaded return "not found" rather than
//! failing, so callers can poll cheaply during startup.

use std::path::{Path as FsPath, PathBuf};

use navgraph_common::{Error, Result, Vec3};

use super::breaker::{BreakerConfig, CircuitBreaker, FailureRecord};
use super::door::synthesize_doors;
use super::graph::{AreaGraph, AreaId};
use super::nav_file::ParseCache;
use super::pathfinder::Pathfinder;
use super::processor::{ConnectionProcessor, Phase, PointLayer, ProcessorStatus};
use super::profile::NavProfile;
use super::route::{Path, Waypoint};
use super::scheduler::RepathScheduler;
use super::trace::TraceProvider;

/// Ticks between repath slots
const REPATH_INTERVAL: u64 = 10;

/// Ticks between breaker cleanup sweeps
const CLEANUP_INTERVAL: u64 = 512;

/// The navigation engine: one graph, one processing pipeline, one breaker.
pub struct NavEngine {
    profile: NavProfile,
    graph: Option<AreaGraph>,
    cache: ParseCache,
    processor: ConnectionProcessor,
    pathfinder: Pathfinder,
    breaker: CircuitBreaker,
    scheduler: RepathScheduler,
    path: Option<Path>,
    tick: u64,
}

impl NavEngine {
    pub fn new(profile: NavProfile, breaker: BreakerConfig) -> Self {
        let processor = ConnectionProcessor::new(&profile);
        Self {
            profile,
            graph: None,
            cache: ParseCache::new(),
            processor,
            pathfinder: Pathfinder::new(),
            breaker: CircuitBreaker::new(breaker),
            scheduler: RepathScheduler::new(REPATH_INTERVAL),
            path: None,
            tick: 0,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(NavProfile::default(), BreakerConfig::default())
    }

    pub fn profile(&self) -> &NavProfile {
        &self.profile
    }

    /// The loaded graph, if any
    pub fn graph(&self) -> Option<&AreaGraph> {
        self.graph.as_ref()
    }

    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    /// Loads a mesh from raw bytes, replacing any previous graph wholesale.
    ///
    /// On a parse failure the previous graph stays published. Repeated loads
    /// of identical bytes reuse the memoized parse.
    pub fn load_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        let file = self.cache.parse(bytes)?;
        let mut graph = AreaGraph::from_nav(file);
        synthesize_doors(&mut graph, &self.profile);
        self.processor.restart(&graph);
        self.graph = Some(graph);
        self.path = None;
        self.breaker.clear();
        self.scheduler.reset();
        log::debug!(
            "loaded mesh: {} areas",
            self.graph.as_ref().map_or(0, |g| g.len())
        );
        Ok(())
    }

    /// Loads a mesh file from disk
    pub fn load_file(&mut self, path: &FsPath) -> Result<()> {
        let bytes = read_mesh(path)?;
        self.load_bytes(&bytes)
    }

    /// Loads a mesh file, invoking `generate` once and retrying when the
    /// file is missing. `generate` is the external trigger that produces the
    /// mesh (typically an analysis pass in the host).
    pub fn load_file_or_generate<F>(&mut self, path: &FsPath, generate: F) -> Result<()>
    where
        F: FnOnce(&FsPath) -> Result<()>,
    {
        match self.load_file(path) {
            Err(Error::MissingFile(_)) => {
                log::debug!("mesh missing, invoking generation for {}", path.display());
                generate(path)?;
                self.load_file(path)
            }
            other => other,
        }
    }

    /// Supplies the optional fine-grained point layer for stitching
    pub fn set_point_layer(&mut self, layer: Option<PointLayer>) {
        self.processor.set_point_layer(layer);
    }

    /// The area closest to a world position, or `None` before a load
    pub fn closest_area(&self, pos: Vec3) -> Option<AreaId> {
        self.graph.as_ref()?.closest_area(pos)
    }

    /// Plans a path between two world positions and installs it as the
    /// current path. Debounced: a query issued before the repath interval
    /// has elapsed returns the existing path unchanged.
    pub fn find_path(&mut self, start: Vec3, goal: Vec3) -> Option<&Path> {
        let (start_area, goal_area) = {
            let graph = self.graph.as_ref()?;
            (graph.closest_area(start)?, graph.closest_area(goal)?)
        };
        self.find_path_between(start_area, goal_area, goal)
    }

    /// Plans a path between two areas toward a goal position
    pub fn find_path_between(
        &mut self,
        start: AreaId,
        goal: AreaId,
        goal_pos: Vec3,
    ) -> Option<&Path> {
        if self.graph.is_none() {
            return None;
        }
        if !self.scheduler.try_acquire(self.tick) {
            return self.path.as_ref();
        }
        let graph = self.graph.as_ref()?;
        match self.pathfinder.find_path(graph, start, goal) {
            Some(areas) => {
                self.path = Some(Path::new(areas, goal_pos));
                self.path.as_ref()
            }
            None => {
                self.path = None;
                None
            }
        }
    }

    /// Plans a path that excludes edges the breaker currently blocks.
    ///
    /// The pathfinder itself is not aware of block flags; this models the
    /// caller that consults `is_edge_blocked` before committing to an edge.
    pub fn find_path_respecting_blocks(
        &mut self,
        start: AreaId,
        goal: AreaId,
        goal_pos: Vec3,
    ) -> Option<&Path> {
        if self.graph.is_none() {
            return None;
        }
        if !self.scheduler.try_acquire(self.tick) {
            return self.path.as_ref();
        }
        let tick = self.tick;
        let keys: Vec<(AreaId, AreaId)> = self.breaker.records().map(|(&key, _)| key).collect();
        let blocked: std::collections::HashSet<(AreaId, AreaId)> = keys
            .into_iter()
            .filter(|&(from, to)| self.breaker.is_blocked(from, to, tick))
            .collect();

        let graph = self.graph.as_ref()?;
        let found = self.pathfinder.find_path_with(graph, start, goal, |g, id| {
            g.area(id)
                .map(|area| {
                    area.all_connections()
                        .filter(|c| c.is_passable() && !blocked.contains(&(id, c.target)))
                        .map(|c| (c.target, c.cost))
                        .collect()
                })
                .unwrap_or_default()
        });
        match found {
            Some(areas) => {
                self.path = Some(Path::new(areas, goal_pos));
                self.path.as_ref()
            }
            None => {
                self.path = None;
                None
            }
        }
    }

    /// The path installed by the last successful query
    pub fn current_path(&self) -> Option<&Path> {
        self.path.as_ref()
    }

    /// Drops the current path
    pub fn clear_path(&mut self) {
        self.path = None;
    }

    /// Removes the leading node of the current path
    pub fn advance_path(&mut self) -> Option<AreaId> {
        self.path.as_mut()?.advance()
    }

    /// Resolves the current movement target against the live graph
    pub fn current_waypoint(&self) -> Option<Waypoint> {
        let graph = self.graph.as_ref()?;
        self.path.as_ref()?.current_waypoint(graph)
    }

    /// Reports a traversal failure between two areas. Unknown ids no-op.
    pub fn report_traversal_failure(&mut self, from: AreaId, to: AreaId) {
        let tick = self.tick;
        match self.graph.as_mut() {
            Some(graph) => self.breaker.report_failure(graph, from, to, tick),
            None => log::debug!("failure report {from}->{to} before any mesh load"),
        }
    }

    /// Whether the breaker currently blocks the directed edge
    pub fn is_edge_blocked(&mut self, from: AreaId, to: AreaId) -> bool {
        let tick = self.tick;
        self.breaker.is_blocked(from, to, tick)
    }

    /// Manually trips an edge (ops surface)
    pub fn block_edge(&mut self, from: AreaId, to: AreaId) {
        let tick = self.tick;
        self.breaker.block(from, to, tick);
    }

    /// Manually clears an edge block (ops surface)
    pub fn unblock_edge(&mut self, from: AreaId, to: AreaId) {
        self.breaker.unblock(from, to);
    }

    /// Drops all failure records (ops surface)
    pub fn clear_failures(&mut self) {
        self.breaker.clear();
    }

    /// Tracked failure records (ops surface)
    pub fn failure_records(&self) -> impl Iterator<Item = (&(AreaId, AreaId), &FailureRecord)> {
        self.breaker.records()
    }

    /// Advances engine time by one frame: steps the processor with the
    /// measured frame rate and periodically prunes the failure table.
    pub fn tick(&mut self, measured_fps: f32, probe: &dyn TraceProvider) {
        self.tick += 1;
        if let Some(graph) = self.graph.as_mut() {
            self.processor.step(graph, &self.profile, probe, measured_fps);
        }
        if self.tick % CLEANUP_INTERVAL == 0 {
            self.breaker.cleanup(self.tick);
        }
    }

    /// Restarts cost annotation from scratch on the loaded graph
    pub fn recalculate_costs(&mut self) {
        if let Some(graph) = self.graph.as_ref() {
            self.processor.restart(graph);
        }
    }

    /// Stops the processing pipeline, keeping annotations applied so far
    pub fn stop_processing(&mut self) {
        self.processor.stop();
    }

    /// Current processing phase
    pub fn processing_phase(&self) -> Phase {
        self.processor.phase()
    }

    /// Processing progress snapshot
    pub fn processor_status(&self) -> ProcessorStatus {
        self.processor.status()
    }
}

fn read_mesh(path: &FsPath) -> Result<Vec<u8>> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(bytes),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            Err(Error::MissingFile(PathBuf::from(path)))
        }
        Err(err) => Err(err.into()),
    }
}
