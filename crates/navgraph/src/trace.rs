//! Geometry probe interface consumed from the host environment
//!
//! The engine needs exactly one capability from the host: sweeping a
//! fixed-size capsule between two points and reporting the first blocking
//! surface. Everything else is derived from mesh data.

use navgraph_common::{Result, Vec3};

/// First blocking surface hit by a capsule sweep
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepHit {
    /// Fraction of the sweep completed before the hit, in [0, 1]
    pub fraction: f32,
    /// Normal of the blocking surface
    pub normal: Vec3,
}

/// Capsule sweep provider.
///
/// `Ok(None)` means the capsule reached the end point unobstructed. An
/// `Err` means the host could not answer; callers treat that as
/// inconclusive and take their conservative branch.
pub trait TraceProvider {
    fn sweep_capsule(&self, start: Vec3, end: Vec3) -> Result<Option<SweepHit>>;
}

/// Probe that treats the world as unobstructed.
///
/// Used by offline tooling that has mesh data but no collision host.
#[derive(Debug, Default, Clone, Copy)]
pub struct ClearTrace;

impl TraceProvider for ClearTrace {
    fn sweep_capsule(&self, _start: Vec3, _end: Vec3) -> Result<Option<SweepHit>> {
        Ok(None)
    }
}
