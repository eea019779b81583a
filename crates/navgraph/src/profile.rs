//! Movement profile and tuning constants for graph construction
//!
//! The profile describes the simulated body (step/jump limits, capsule
//! dimensions) and the cost-annotation tunables. Defaults match the
//! standard humanoid hull the mesh was generated for.

/// How edge costs are derived from base distance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub enum CostPreset {
    /// Cost is base distance times the accessibility multiplier
    Flat,
    /// Additionally penalizes height gain in multiples of the step height
    HeightPenalized,
}

/// Tuning parameters for door synthesis, accessibility and the processor
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub struct NavProfile {
    /// Height the body can walk up without jumping
    pub step_height: f32,
    /// Maximum height a single jump can clear
    pub jump_height: f32,
    /// Falls higher than this are not offered as stair candidates
    pub death_drop: f32,
    /// Horizontal clearance pulled in from unreachable door ends
    pub hull_clearance: f32,
    /// Radius of the swept capsule
    pub capsule_radius: f32,
    /// Height of the swept capsule
    pub capsule_height: f32,
    /// Cost derivation preset
    pub cost_preset: CostPreset,
    /// Flat cost added per step-height of gain under `HeightPenalized`
    pub step_cost: f32,
    /// Multiplier assigned when a probe was not yet permitted
    pub provisional_multiplier: f32,
    /// Multiplier assigned when a probe found the transition blocked.
    ///
    /// Tunable: keeping blocked edges at a large multiplier instead of
    /// deleting them preserves graph connectivity on meshes with bad
    /// adjacency data.
    pub unreachable_multiplier: f32,
    /// Frame rate the phased processor tries to preserve
    pub target_fps: f32,
    /// Lower bound for the processor batch size
    pub min_batch: usize,
    /// Upper bound for the processor batch size
    pub max_batch: usize,
    /// Batch size the processor starts with
    pub initial_batch: usize,
    /// Minimum height delta for a missing-reverse stair candidate
    pub stair_min: f32,
    /// Maximum height delta for a missing-reverse stair candidate
    pub stair_max: f32,
    /// Multiplier applied to the inserted reverse edge when climbing
    pub stair_climb_multiplier: f32,
}

impl Default for NavProfile {
    fn default() -> Self {
        Self {
            step_height: 18.0,
            jump_height: 72.0,
            death_drop: 200.0,
            hull_clearance: 16.0,
            capsule_radius: 16.0,
            capsule_height: 72.0,
            cost_preset: CostPreset::Flat,
            step_cost: 10.0,
            provisional_multiplier: 5.0,
            unreachable_multiplier: 10.0,
            target_fps: 60.0,
            min_batch: 1,
            max_batch: 64,
            initial_batch: 16,
            stair_min: 18.0,
            stair_max: 200.0,
            stair_climb_multiplier: 2.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_profile_orders_heights() {
        let p = NavProfile::default();
        assert!(p.step_height < p.jump_height);
        assert!(p.jump_height < p.death_drop);
        assert!(p.min_batch <= p.initial_batch && p.initial_batch <= p.max_batch);
    }
}
