//! Navigation graph engine for mesh-driven agent pathfinding
//!
//! The engine ingests a binary navigation mesh, builds a graph of convex
//! areas with directional adjacency, synthesizes walkable door segments
//! between neighbors, annotates edges with traversal costs over many frames,
//! and answers shortest-path queries. A runtime failure feedback loop
//! penalizes and temporarily blocks edges that repeatedly fail in practice.

pub mod access;
pub mod breaker;
pub mod clock;
pub mod command;
pub mod door;
pub mod engine;
pub mod graph;
pub mod nav_file;
pub mod pathfinder;
pub mod processor;
pub mod profile;
pub mod route;
pub mod scheduler;
pub mod trace;

pub use access::{classify, Reachability};
pub use breaker::{BreakerConfig, CircuitBreaker, FailureRecord};
pub use clock::FrameClock;
pub use door::synthesize_doors;
pub use engine::NavEngine;
pub use graph::{Area, AreaGraph, AreaId, Connection, Direction, Door, COST_BLOCKED};
pub use nav_file::{NavFile, ParseCache, NAV_MAGIC, NAV_MAJOR_VERSION};
pub use pathfinder::Pathfinder;
pub use processor::{ConnectionProcessor, Phase, PointLayer, ProcessorStatus};
pub use profile::{CostPreset, NavProfile};
pub use route::{Path, Waypoint, WaypointKind};
pub use scheduler::RepathScheduler;
pub use trace::{ClearTrace, SweepHit, TraceProvider};

#[cfg(test)]
mod test_fixtures;

#[cfg(test)]
mod engine_scenario_tests;
