//! Repath debouncing
//!
//! Pathfinding runs to completion inside a single scheduled slot; this
//! scheduler only enforces a minimum tick gap between slots so per-frame
//! callers cannot flood the search.

/// Debounces pathfinder invocations to a minimum tick interval
#[derive(Debug, Clone)]
pub struct RepathScheduler {
    min_interval: u64,
    last: Option<u64>,
}

impl RepathScheduler {
    pub fn new(min_interval: u64) -> Self {
        Self {
            min_interval,
            last: None,
        }
    }

    /// Claims a slot at the given tick. Returns false while the interval
    /// since the last claimed slot has not yet elapsed.
    pub fn try_acquire(&mut self, tick: u64) -> bool {
        match self.last {
            Some(last) if tick.saturating_sub(last) < self.min_interval => false,
            _ => {
                self.last = Some(tick);
                true
            }
        }
    }

    /// Forgets the last slot so the next attempt is granted immediately
    pub fn reset(&mut self) {
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debounce_interval() {
        let mut sched = RepathScheduler::new(10);
        assert!(sched.try_acquire(100));
        assert!(!sched.try_acquire(105));
        assert!(!sched.try_acquire(109));
        assert!(sched.try_acquire(110));
        assert!(!sched.try_acquire(115));
    }

    #[test]
    fn test_reset_grants_immediately() {
        let mut sched = RepathScheduler::new(10);
        assert!(sched.try_acquire(100));
        sched.reset();
        assert!(sched.try_acquire(101));
    }
}
