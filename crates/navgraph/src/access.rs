//! Accessibility classification for directed area transitions
//!
//! Decides whether a transition is physically reachable and how hard it is,
//! using corner-height heuristics first and a capsule sweep only when the
//! caller permits the expense. Transitions are never deleted here; bad ones
//! get a large multiplier so mesh adjacency errors cannot disconnect the
//! graph.

use navgraph_common::Vec3;

use super::graph::Area;
use super::profile::NavProfile;
use super::trace::TraceProvider;

/// Outcome of classifying a directed transition
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reachability {
    pub reachable: bool,
    /// Scalar applied to the base distance cost
    pub multiplier: f32,
}

impl Reachability {
    fn with(multiplier: f32) -> Self {
        Self {
            reachable: true,
            multiplier,
        }
    }
}

/// Classifies the directed transition `a` -> `b`.
///
/// Pass `probe: None` for the cheap estimate; transitions that would need a
/// sweep then get the provisional multiplier for later refinement.
pub fn classify(
    a: &Area,
    b: &Area,
    profile: &NavProfile,
    probe: Option<&dyn TraceProvider>,
) -> Reachability {
    let gain = b.center().z - a.center().z;

    // Falling is free.
    if gain <= 0.0 {
        return Reachability::with(1.0);
    }
    if gain <= profile.step_height {
        return Reachability::with(1.0);
    }
    if gain <= profile.jump_height {
        return Reachability::with(1.5);
    }

    // Gain exceeds a single jump. A corner pair within jump height means an
    // indirect route along the shared geometry exists.
    if corner_path_exists(a, b, profile.jump_height) {
        return Reachability::with(2.0);
    }

    match probe {
        Some(trace) => {
            let lift = Vec3::new(0.0, 0.0, profile.step_height);
            match trace.sweep_capsule(a.center() + lift, b.center() + lift) {
                Ok(None) => Reachability::with(3.0),
                Ok(Some(_hit)) => Reachability::with(profile.unreachable_multiplier),
                Err(err) => {
                    log::debug!("sweep {}->{} inconclusive: {err}", a.id(), b.id());
                    Reachability::with(profile.unreachable_multiplier)
                }
            }
        }
        None => Reachability::with(profile.provisional_multiplier),
    }
}

/// Any corner-to-corner pair within jump height
fn corner_path_exists(a: &Area, b: &Area, jump_height: f32) -> bool {
    a.corners().iter().any(|ca| {
        b.corners()
            .iter()
            .any(|cb| (cb.z - ca.z).abs() <= jump_height)
    })
}
