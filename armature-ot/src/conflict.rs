//! Conflict classification for concurrent operations
//!
//! The pairwise transform records conflicts inline when it cannot keep both
//! authors' intent. [`ConflictDetector`] classifies arbitrary pairs on top of
//! that, e.g. to show that several people are editing the same paragraph.

use crate::clock::concurrent;
use crate::{ConflictResolutionStrategy, OpType, Operation};
use serde::{Deserialize, Serialize};

/// Category of conflict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConflictKind {
    /// Both operations target the same offsets
    Position,
    /// Concurrent edits of the same region
    Concurrent,
    /// Causally ordered edits of the same region
    Causal,
}

/// How much authorial intent was lost
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// Cosmetic
    Low,
    /// Text was touched by both sides
    Medium,
    /// Most of the contested text was claimed by both sides
    High,
}

/// Who settles the conflict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Resolution {
    /// The transform result stands
    Automatic,
    /// Application waits for explicit confirmation
    Manual,
}

/// A detected conflict between two operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConflictInfo {
    /// Conflict category
    pub kind: ConflictKind,
    /// Severity
    pub severity: Severity,
    /// The local and foreign operation, in that order
    pub operations: [Operation; 2],
    /// Resolution mode
    pub resolution: Resolution,
}

impl ConflictInfo {
    /// Create a conflict record
    pub fn new(
        kind: ConflictKind,
        severity: Severity,
        op1: &Operation,
        op2: &Operation,
        resolution: Resolution,
    ) -> Self {
        Self {
            kind,
            severity,
            operations: [op1.clone(), op2.clone()],
            resolution,
        }
    }

    /// Check if the conflict needs external confirmation
    pub fn requires_manual(&self) -> bool {
        self.resolution == Resolution::Manual
    }
}

/// Length of the intersection of two half-open ranges
pub fn overlap_len(op1: &Operation, op2: &Operation) -> usize {
    let start = op1.position().max(op2.position());
    let end = op1.end().min(op2.end());
    end.saturating_sub(start)
}

/// Whether two operations act on a shared region.
///
/// Inserts are points; a point touches a range it lies inside or on the
/// boundary of.
fn regions_touch(op1: &Operation, op2: &Operation) -> bool {
    match (op1.op_type(), op2.op_type()) {
        (OpType::Insert, OpType::Insert) => op1.position() == op2.position(),
        (OpType::Insert, _) => op2.position() <= op1.position() && op1.position() <= op2.end(),
        (_, OpType::Insert) => op1.position() <= op2.position() && op2.position() <= op1.end(),
        _ => overlap_len(op1, op2) > 0,
    }
}

/// Classifies operation pairs into conflict categories
#[derive(Debug, Clone)]
pub struct ConflictDetector {
    strategy: ConflictResolutionStrategy,
    vector_clocks: bool,
}

impl ConflictDetector {
    /// Create a detector
    pub fn new(strategy: ConflictResolutionStrategy, vector_clocks: bool) -> Self {
        Self {
            strategy,
            vector_clocks,
        }
    }

    /// Resolution mode recorded on new conflicts
    pub fn resolution(&self) -> Resolution {
        match self.strategy {
            ConflictResolutionStrategy::Manual => Resolution::Manual,
            _ => Resolution::Automatic,
        }
    }

    /// Same-position concurrent inserts, or overlapping concurrent deletes
    pub fn has_position_conflict(&self, op1: &Operation, op2: &Operation) -> bool {
        if !concurrent(op1, op2, self.vector_clocks) {
            return false;
        }
        match (op1.op_type(), op2.op_type()) {
            (OpType::Insert, OpType::Insert) => op1.position() == op2.position(),
            (OpType::Delete, OpType::Delete) => overlap_len(op1, op2) > 0,
            _ => false,
        }
    }

    /// Severity of a pair, independent of concurrency
    pub fn assess_severity(&self, op1: &Operation, op2: &Operation) -> Severity {
        match (op1.op_type(), op2.op_type()) {
            (OpType::Format, _) | (_, OpType::Format) => Severity::Low,
            (OpType::Delete, OpType::Delete) => {
                let longest = op1.len().max(op2.len());
                if longest == 0 {
                    return Severity::Low;
                }
                let ratio = overlap_len(op1, op2) as f64 / longest as f64;
                if ratio > 0.8 {
                    Severity::High
                } else if ratio > 0.4 {
                    Severity::Medium
                } else {
                    Severity::Low
                }
            }
            (OpType::Insert, OpType::Insert) if op1.position() == op2.position() => {
                Severity::Medium
            }
            _ => Severity::Low,
        }
    }

    /// Classify a pair, or `None` when they do not touch the same region
    pub fn detect(&self, op1: &Operation, op2: &Operation) -> Option<ConflictInfo> {
        if op1 == op2 || !regions_touch(op1, op2) {
            return None;
        }

        let (kind, severity) = if self.has_position_conflict(op1, op2) {
            (ConflictKind::Position, self.assess_severity(op1, op2))
        } else if concurrent(op1, op2, self.vector_clocks) {
            (ConflictKind::Concurrent, self.assess_severity(op1, op2))
        } else {
            (ConflictKind::Causal, Severity::Low)
        };

        Some(ConflictInfo::new(
            kind,
            severity,
            op1,
            op2,
            self.resolution(),
        ))
    }

    /// Classify every distinct pair in a batch
    pub fn detect_all(&self, ops: &[Operation]) -> Vec<ConflictInfo> {
        let mut conflicts = Vec::new();
        for (i, op1) in ops.iter().enumerate() {
            for op2 in &ops[i + 1..] {
                if let Some(conflict) = self.detect(op1, op2) {
                    conflicts.push(conflict);
                }
            }
        }
        conflicts
    }
}

impl Default for ConflictDetector {
    fn default() -> Self {
        Self::new(ConflictResolutionStrategy::Merge, true)
    }
}
