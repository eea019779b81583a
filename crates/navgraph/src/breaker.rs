//! Traversal failure feedback
//!
//! Movement reports edges it failed to cross. Each failure raises the edge
//! cost permanently; repeated failures trip the edge into a Blocked state
//! that callers consult before committing to a crossing. Blocks expire
//! after a quiet period, the cost penalties do not.

use std::collections::HashMap;

use super::graph::{AreaGraph, AreaId};

/// Circuit breaker tunables
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub struct BreakerConfig {
    /// Failures before an edge trips to Blocked
    pub max_failures: u32,
    /// Cost added to both directions per reported failure
    pub failure_penalty: f32,
    /// One-time cost added when the edge trips
    pub block_penalty: f32,
    /// Ticks a tripped edge stays blocked after its last failure
    pub block_duration: u64,
    /// Non-blocked records older than this multiple of the block duration
    /// are dropped by cleanup
    pub stale_factor: u64,
    /// Hard cap on tracked edges; oldest records are evicted first
    pub max_entries: usize,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            max_failures: 2,
            failure_penalty: 500.0,
            block_penalty: 2000.0,
            block_duration: 600,
            stale_factor: 4,
            max_entries: 256,
        }
    }
}

/// Per-directed-edge failure bookkeeping, created lazily on first failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub struct FailureRecord {
    pub count: u32,
    pub last_failure: u64,
    pub blocked: bool,
}

/// Escalates repeatedly failing edges from penalized to temporarily blocked
#[derive(Debug, Default)]
pub struct CircuitBreaker {
    config: BreakerConfig,
    entries: HashMap<(AreaId, AreaId), FailureRecord>,
}

impl CircuitBreaker {
    pub fn new(config: BreakerConfig) -> Self {
        Self {
            config,
            entries: HashMap::new(),
        }
    }

    pub fn config(&self) -> &BreakerConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Tracked records, for the ops surface
    pub fn records(&self) -> impl Iterator<Item = (&(AreaId, AreaId), &FailureRecord)> {
        self.entries.iter()
    }

    /// Registers one traversal failure on the directed edge.
    ///
    /// The cost penalty lands on both directions since either endpoint may
    /// have caused the failure. Unknown ids penalize nothing but are still
    /// recorded, so a flapping edge cannot dodge the breaker by outrunning
    /// graph mutation.
    pub fn report_failure(&mut self, graph: &mut AreaGraph, from: AreaId, to: AreaId, tick: u64) {
        graph.bump_cost_both(from, to, self.config.failure_penalty);

        let record = self.entries.entry((from, to)).or_insert(FailureRecord {
            count: 0,
            last_failure: tick,
            blocked: false,
        });
        record.count += 1;
        record.last_failure = tick;

        if !record.blocked && record.count >= self.config.max_failures {
            record.blocked = true;
            log::debug!("edge {from}->{to} tripped after {} failures", record.count);
            graph.bump_cost_both(from, to, self.config.block_penalty);
        }

        if self.entries.len() > self.config.max_entries {
            self.evict_oldest();
        }
    }

    /// Whether the directed edge is currently blocked. A blocked edge whose
    /// quiet period has elapsed transitions back to Active with its count
    /// halved; accumulated cost penalties remain.
    pub fn is_blocked(&mut self, from: AreaId, to: AreaId, tick: u64) -> bool {
        let config_duration = self.config.block_duration;
        match self.entries.get_mut(&(from, to)) {
            Some(record) if record.blocked => {
                if tick.saturating_sub(record.last_failure) >= config_duration {
                    record.blocked = false;
                    record.count /= 2;
                    log::debug!("edge {from}->{to} block expired");
                    false
                } else {
                    true
                }
            }
            _ => false,
        }
    }

    /// Manually trips an edge, for the ops surface
    pub fn block(&mut self, from: AreaId, to: AreaId, tick: u64) {
        let record = self.entries.entry((from, to)).or_insert(FailureRecord {
            count: 0,
            last_failure: tick,
            blocked: false,
        });
        record.blocked = true;
        record.last_failure = tick;
    }

    /// Manually clears a block and its failure count
    pub fn unblock(&mut self, from: AreaId, to: AreaId) {
        if let Some(record) = self.entries.get_mut(&(from, to)) {
            record.blocked = false;
            record.count = 0;
        }
    }

    /// Drops every record
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Prunes stale non-blocked records and enforces the entry cap
    pub fn cleanup(&mut self, tick: u64) {
        let horizon = self.config.block_duration * self.config.stale_factor;
        self.entries
            .retain(|_, r| r.blocked || tick.saturating_sub(r.last_failure) < horizon);
        while self.entries.len() > self.config.max_entries {
            self.evict_oldest();
        }
    }

    fn evict_oldest(&mut self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, r)| r.last_failure)
            .map(|(&key, _)| key);
        if let Some(key) = oldest {
            self.entries.remove(&key);
        }
    }
}
