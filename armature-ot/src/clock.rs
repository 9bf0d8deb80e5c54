//! Causality tracking between operations

use crate::{Operation, SiteId, VectorClock};

/// Local vector clock plus the causal-order queries built on it
///
/// With vector clocks disabled, concurrency degrades to identical
/// wall-clock timestamps. That approximation is much weaker: two edits made
/// a millisecond apart are treated as causally ordered and left untransformed.
#[derive(Debug, Clone)]
pub struct VectorClockTracker {
    clock: VectorClock,
    enabled: bool,
}

impl VectorClockTracker {
    /// Create a tracker with vector clocks enabled
    pub fn new() -> Self {
        Self {
            clock: VectorClock::new(),
            enabled: true,
        }
    }

    /// Create a tracker that falls back to timestamp equality
    pub fn disabled() -> Self {
        Self {
            clock: VectorClock::new(),
            enabled: false,
        }
    }

    /// Create a tracker with vector clocks on or off
    pub fn with_enabled(enabled: bool) -> Self {
        if enabled { Self::new() } else { Self::disabled() }
    }

    /// Check if vector clocks are in use
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Current local clock
    pub fn clock(&self) -> &VectorClock {
        &self.clock
    }

    /// Advance the local entry for `site` and snapshot the clock.
    ///
    /// Returns `None` when causality tracking is disabled.
    pub fn tick(&mut self, site: SiteId) -> Option<VectorClock> {
        if !self.enabled {
            return None;
        }
        self.clock.increment(site);
        Some(self.clock.clone())
    }

    /// Merge a remote clock into the local one. Entries never decrease.
    pub fn update(&mut self, remote: &VectorClock) {
        if self.enabled {
            self.clock.merge(remote);
        }
    }

    /// Strict happens-before between two clocks
    pub fn happens_before(a: &VectorClock, b: &VectorClock) -> bool {
        a.happens_before(b)
    }

    /// Check whether two operations are causally unordered
    pub fn are_concurrent(&self, op1: &Operation, op2: &Operation) -> bool {
        concurrent(op1, op2, self.enabled)
    }
}

impl Default for VectorClockTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Concurrency test shared by the tracker and the transformer.
///
/// An operation without a clock snapshot cannot be ordered, so it is treated
/// as concurrent while clocks are enabled.
pub(crate) fn concurrent(op1: &Operation, op2: &Operation, vector_clocks: bool) -> bool {
    if !vector_clocks {
        return op1.timestamp() == op2.timestamp();
    }
    match (op1.vector_clock(), op2.vector_clock()) {
        (Some(a), Some(b)) => !a.happens_before(b) && !b.happens_before(a),
        _ => true,
    }
}
