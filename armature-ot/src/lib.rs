//! Operational Transformation Engine for Armature Framework
//!
//! Transforms concurrent text edits so that every collaborating site
//! converges on the same document, whatever order the edits arrive in.
//!
//! ## Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Transform Pipeline                          │
//! │                                                                 │
//! │  ┌──────────┐    ┌──────────┐    ┌──────────┐    ┌──────────┐   │
//! │  │  Local   │───▶│ Operation│───▶│ Vector   │───▶│ Pairwise │   │
//! │  │  Edit    │    │ Factory  │    │ Clocks   │    │Transform │   │
//! │  └──────────┘    └──────────┘    └──────────┘    └──────────┘   │
//! │                                                       │         │
//! │                  ┌──────────┐    ┌──────────┐         ▼         │
//! │                  │  Text    │◀───│Compressor│◀───┌──────────┐   │
//! │                  │  Buffer  │    │          │    │ Conflict │   │
//! │                  └──────────┘    └──────────┘    │ Detector │   │
//! │                                                  └──────────┘   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use armature_ot::{apply_to_text, OperationFactory, SiteId, Transformer};
//!
//! let mut alice = OperationFactory::new(SiteId(1));
//! let mut bob = OperationFactory::new(SiteId(2));
//!
//! let a = alice.insert(1, "X");
//! let b = bob.insert(1, "Y");
//!
//! let mut transformer = Transformer::default();
//!
//! // Alice applies her edit, then Bob's transformed against it
//! let doc = apply_to_text("abc", &a).unwrap();
//! let b2 = transformer.transform(&b, &a).operation;
//! assert_eq!(apply_to_text(&doc, &b2).unwrap(), "aXYbc");
//!
//! // Bob applies his edit, then Alice's transformed against it
//! let doc = apply_to_text("abc", &b).unwrap();
//! let a2 = transformer.transform(&a, &b).operation;
//! assert_eq!(apply_to_text(&doc, &a2).unwrap(), "aXYbc");
//! ```
//!
//! ## Transform Matrix
//!
//! | Local \ Foreign | Insert | Delete |
//! |-----------------|--------|--------|
//! | `Insert` | shift right, ties by site id | shift left / collapse into delete start |
//! | `Delete` | shift right / extend over insert | shrink by overlap |
//! | `Retain` | shift right | shift left |
//! | `Format` | shift right | shift left / cancel when erased |
//!
//! Retains and formats never move text, so transforming against them is the
//! identity (format/format only records attribute conflicts).
//!
//! ## Features
//!
//! - **`text`** - Rope-backed [`TextBuffer`] (default)
//! - **`full`** - All features

pub mod apply;
pub mod clock;
pub mod compose;
pub mod config;
pub mod conflict;
pub mod document;
pub mod error;
pub mod operation;
pub mod site;
pub mod transform;

#[cfg(feature = "text")]
pub mod buffer;

pub use apply::*;
pub use clock::*;
pub use compose::*;
pub use config::*;
pub use conflict::*;
pub use document::*;
pub use error::*;
pub use operation::*;
pub use site::*;
pub use transform::*;

#[cfg(feature = "text")]
pub use buffer::*;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Identifier of a collaborating site
///
/// Assigned once per session. Lower ids win insert position ties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SiteId(pub u32);

impl std::fmt::Display for SiteId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "site-{}", self.0)
    }
}

/// Vector clock for tracking causality
///
/// Maps each site to the highest sequence number observed from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorClock {
    clocks: HashMap<SiteId, u64>,
}

impl VectorClock {
    /// Create a new empty vector clock
    pub fn new() -> Self {
        Self {
            clocks: HashMap::new(),
        }
    }

    /// Increment the clock for a site
    pub fn increment(&mut self, site: SiteId) -> u64 {
        let counter = self.clocks.entry(site).or_insert(0);
        *counter += 1;
        *counter
    }

    /// Get the counter for a site
    pub fn get(&self, site: &SiteId) -> u64 {
        *self.clocks.get(site).unwrap_or(&0)
    }

    /// Raise the entry for a site to at least `counter`
    pub fn observe(&mut self, site: SiteId, counter: u64) {
        let entry = self.clocks.entry(site).or_insert(0);
        *entry = (*entry).max(counter);
    }

    /// Merge with another vector clock (entrywise max)
    pub fn merge(&mut self, other: &Self) {
        for (site, counter) in &other.clocks {
            self.observe(*site, *counter);
        }
    }

    /// Check if this clock is concurrent with another
    pub fn is_concurrent(&self, other: &Self) -> bool {
        !self.happens_before(other) && !other.happens_before(self)
    }

    /// Check if this clock happens before another
    ///
    /// Every entry is `<=` the other's and at least one is strictly less.
    pub fn happens_before(&self, other: &Self) -> bool {
        let mut dominated = false;
        for (site, &counter) in &self.clocks {
            let other_counter = other.get(site);
            if counter > other_counter {
                return false;
            }
            if counter < other_counter {
                dominated = true;
            }
        }
        for (site, &counter) in &other.clocks {
            if !self.clocks.contains_key(site) && counter > 0 {
                dominated = true;
            }
        }
        dominated
    }

    /// Iterate over `(site, counter)` entries
    pub fn iter(&self) -> impl Iterator<Item = (&SiteId, &u64)> {
        self.clocks.iter()
    }

    /// Check if no site has been observed
    pub fn is_empty(&self) -> bool {
        self.clocks.values().all(|&c| c == 0)
    }
}

impl Default for VectorClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_site_id_ordering() {
        assert!(SiteId(1) < SiteId(2));
        assert_eq!(SiteId(7).to_string(), "site-7");
    }

    #[test]
    fn test_vector_clock() {
        let site1 = SiteId(1);
        let site2 = SiteId(2);

        let mut vc1 = VectorClock::new();
        vc1.increment(site1);
        vc1.increment(site1);

        let mut vc2 = VectorClock::new();
        vc2.increment(site2);

        assert!(vc1.is_concurrent(&vc2));

        vc1.merge(&vc2);
        assert_eq!(vc1.get(&site1), 2);
        assert_eq!(vc1.get(&site2), 1);
    }

    #[test]
    fn test_happens_before() {
        let site = SiteId(1);

        let mut vc1 = VectorClock::new();
        vc1.increment(site);

        let mut vc2 = vc1.clone();
        vc2.increment(site);

        assert!(vc1.happens_before(&vc2));
        assert!(!vc2.happens_before(&vc1));
    }

    #[test]
    fn test_equal_clocks_are_concurrent() {
        let mut vc = VectorClock::new();
        vc.increment(SiteId(3));

        assert!(!vc.happens_before(&vc.clone()));
        assert!(vc.is_concurrent(&vc.clone()));
    }

    #[test]
    fn test_observe_never_decreases() {
        let mut vc = VectorClock::new();
        vc.observe(SiteId(1), 5);
        vc.observe(SiteId(1), 3);
        assert_eq!(vc.get(&SiteId(1)), 5);
    }
}
