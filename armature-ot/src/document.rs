//! Document state held by the buffer owner

use crate::{Operation, OtError, OtResult, VectorClock};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Authoritative state of one site's copy of a document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentState {
    /// Current text
    pub content: String,
    /// Number of operations applied
    pub version: u64,
    /// Local clock after the last applied operation
    pub vector_clock: VectorClock,
    /// Applied operations, oldest first
    pub operations: Vec<Operation>,
    /// Local operations not yet acknowledged
    pub pending_operations: Vec<Operation>,
    /// Time of the last acknowledgment
    pub last_synced: Option<DateTime<Utc>>,
}

impl DocumentState {
    /// Create state for a document with initial content
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    /// Length in chars
    pub fn content_length(&self) -> usize {
        self.content.chars().count()
    }

    /// Check if any local operation awaits acknowledgment
    pub fn has_pending(&self) -> bool {
        !self.pending_operations.is_empty()
    }

    /// Serialize the state to JSON
    pub fn to_json(&self) -> OtResult<String> {
        serde_json::to_string(self).map_err(OtError::from)
    }

    /// Deserialize state from JSON
    pub fn from_json(json: &str) -> OtResult<Self> {
        serde_json::from_str(json).map_err(OtError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{OperationFactory, SiteId};

    #[test]
    fn test_new_state() {
        let state = DocumentState::new("héllo");
        assert_eq!(state.content_length(), 5);
        assert_eq!(state.version, 0);
        assert!(!state.has_pending());
        assert!(state.last_synced.is_none());
    }

    #[test]
    fn test_json_round_trip() {
        let mut site = OperationFactory::new(SiteId(1));
        let mut state = DocumentState::new("abc");
        state.pending_operations.push(site.insert(3, "d"));

        let parsed = DocumentState::from_json(&state.to_json().unwrap()).unwrap();
        assert_eq!(parsed.content, "abc");
        assert_eq!(parsed.pending_operations.len(), 1);
        assert_eq!(parsed.pending_operations[0].content(), Some("d"));
    }
}
