//! Edit operations and the per-site factory that stamps them
//!
//! An [`Operation`] is immutable once created. Transforms and composition
//! always produce new values; the only way to mint a fresh operation is
//! through an [`OperationFactory`] owned by the issuing site.

use crate::{OtError, OtResult, SiteId, VectorClock, VectorClockTracker};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use uuid::Uuid;

/// Namespace for deriving operation ids from `(site, sequence, timestamp)`
const OPERATION_NAMESPACE: Uuid = Uuid::from_bytes([
    0x6f, 0x74, 0x2d, 0x61, 0x72, 0x6d, 0x61, 0x74, 0x75, 0x72, 0x65, 0x2d, 0x6f, 0x70, 0x73, 0x31,
]);

/// Style attributes carried by format operations
///
/// Structural only: the engine compares keys but never interprets values.
pub type Attributes = BTreeMap<String, serde_json::Value>;

/// The edit primitive and its payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OpKind {
    /// Insert text at the position
    Insert { content: String },
    /// Remove `length` chars starting at the position
    Delete { length: usize },
    /// Skip over `length` chars
    Retain { length: usize },
    /// Apply attributes to `length` chars starting at the position
    Format {
        length: usize,
        attributes: Attributes,
    },
}

impl OpKind {
    /// The payload-free discriminant
    pub fn op_type(&self) -> OpType {
        match self {
            OpKind::Insert { .. } => OpType::Insert,
            OpKind::Delete { .. } => OpType::Delete,
            OpKind::Retain { .. } => OpType::Retain,
            OpKind::Format { .. } => OpType::Format,
        }
    }

    /// Number of chars inserted or covered
    pub fn len(&self) -> usize {
        match self {
            OpKind::Insert { content } => content.chars().count(),
            OpKind::Delete { length }
            | OpKind::Retain { length }
            | OpKind::Format { length, .. } => *length,
        }
    }

    /// Check if the operation spans nothing
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Operation type without payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OpType {
    /// Insert
    Insert,
    /// Delete
    Delete,
    /// Retain
    Retain,
    /// Format
    Format,
}

impl std::fmt::Display for OpType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            OpType::Insert => "insert",
            OpType::Delete => "delete",
            OpType::Retain => "retain",
            OpType::Format => "format",
        };
        f.write_str(name)
    }
}

/// A single edit issued by a site
///
/// Equality and hashing go by `id` only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Operation {
    id: Uuid,
    site_id: SiteId,
    sequence: u64,
    timestamp: DateTime<Utc>,
    position: usize,
    kind: OpKind,
    vector_clock: Option<VectorClock>,
}

impl Operation {
    /// Unique operation ID
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Originating site
    pub fn site_id(&self) -> SiteId {
        self.site_id
    }

    /// Per-site sequence number
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Wall-clock creation time
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Start offset, in chars
    pub fn position(&self) -> usize {
        self.position
    }

    /// Edit primitive
    pub fn kind(&self) -> &OpKind {
        &self.kind
    }

    /// Payload-free type
    pub fn op_type(&self) -> OpType {
        self.kind.op_type()
    }

    /// Chars inserted or covered
    pub fn len(&self) -> usize {
        self.kind.len()
    }

    /// Check if the operation spans nothing
    pub fn is_empty(&self) -> bool {
        self.kind.is_empty()
    }

    /// One past the last covered offset
    pub fn end(&self) -> usize {
        self.position + self.len()
    }

    /// Vector clock snapshot at creation, if causality tracking was on
    pub fn vector_clock(&self) -> Option<&VectorClock> {
        self.vector_clock.as_ref()
    }

    /// Inserted text, for inserts
    pub fn content(&self) -> Option<&str> {
        match &self.kind {
            OpKind::Insert { content } => Some(content),
            _ => None,
        }
    }

    /// Attributes, for formats
    pub fn attributes(&self) -> Option<&Attributes> {
        match &self.kind {
            OpKind::Format { attributes, .. } => Some(attributes),
            _ => None,
        }
    }

    /// `(type, position, length)` triple that transforms may change
    pub fn shape(&self) -> (OpType, usize, usize) {
        (self.op_type(), self.position, self.len())
    }

    /// Same identity and metadata with a new position and payload
    pub(crate) fn with_shape(&self, position: usize, kind: OpKind) -> Self {
        Self {
            position,
            kind,
            ..self.clone()
        }
    }

    /// Serialize for transport
    pub fn to_json(&self) -> OtResult<String> {
        serde_json::to_string(self).map_err(OtError::from)
    }

    /// Deserialize from transport
    pub fn from_json(json: &str) -> OtResult<Self> {
        serde_json::from_str(json).map_err(OtError::from)
    }
}

impl PartialEq for Operation {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Operation {}

impl Hash for Operation {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Mints operations for one site
///
/// Owns the site's sequence counter and local vector clock. One factory per
/// site; never shared between sites.
#[derive(Debug, Clone)]
pub struct OperationFactory {
    site_id: SiteId,
    sequence: u64,
    tracker: VectorClockTracker,
}

impl OperationFactory {
    /// Create a factory with vector clocks enabled
    pub fn new(site_id: SiteId) -> Self {
        Self::with_tracker(site_id, VectorClockTracker::new())
    }

    /// Create a factory around an existing clock tracker
    pub fn with_tracker(site_id: SiteId, tracker: VectorClockTracker) -> Self {
        Self {
            site_id,
            sequence: 0,
            tracker,
        }
    }

    /// Site this factory stamps
    pub fn site_id(&self) -> SiteId {
        self.site_id
    }

    /// Last issued sequence number
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Local clock tracker
    pub fn tracker(&self) -> &VectorClockTracker {
        &self.tracker
    }

    /// Local clock tracker, for merging remote clocks
    pub fn tracker_mut(&mut self) -> &mut VectorClockTracker {
        &mut self.tracker
    }

    /// Create an operation stamped with the current time
    pub fn create(&mut self, position: usize, kind: OpKind) -> Operation {
        self.create_at(position, kind, Utc::now())
    }

    /// Create an operation with an explicit timestamp
    pub fn create_at(&mut self, position: usize, kind: OpKind, timestamp: DateTime<Utc>) -> Operation {
        self.sequence += 1;
        let vector_clock = self.tracker.tick(self.site_id);

        let name = format!(
            "{}:{}:{}",
            self.site_id.0,
            self.sequence,
            timestamp.timestamp_millis()
        );

        Operation {
            id: Uuid::new_v5(&OPERATION_NAMESPACE, name.as_bytes()),
            site_id: self.site_id,
            sequence: self.sequence,
            timestamp,
            position,
            kind,
            vector_clock,
        }
    }

    /// Create an insert
    pub fn insert(&mut self, position: usize, content: impl Into<String>) -> Operation {
        self.create(
            position,
            OpKind::Insert {
                content: content.into(),
            },
        )
    }

    /// Create a delete
    pub fn delete(&mut self, position: usize, length: usize) -> Operation {
        self.create(position, OpKind::Delete { length })
    }

    /// Create a retain
    pub fn retain(&mut self, position: usize, length: usize) -> Operation {
        self.create(position, OpKind::Retain { length })
    }

    /// Create a format
    pub fn format(&mut self, position: usize, length: usize, attributes: Attributes) -> Operation {
        self.create(position, OpKind::Format { length, attributes })
    }
}
