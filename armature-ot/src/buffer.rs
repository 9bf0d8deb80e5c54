//! Rope-backed text buffer
//!
//! An authoritative buffer for long documents, where rebuilding a `String`
//! on every edit would be too slow.

use crate::apply::inverse;
use crate::{is_valid, OpKind, Operation, OtError, OtResult};
use ropey::Rope;

/// Text buffer that applies operations in place
#[derive(Debug, Clone, Default)]
pub struct TextBuffer {
    rope: Rope,
}

impl TextBuffer {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self { rope: Rope::new() }
    }

    /// Length in chars
    pub fn len(&self) -> usize {
        self.rope.len_chars()
    }

    /// Check if the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Text in `[start, end)`, in chars
    pub fn slice(&self, start: usize, end: usize) -> OtResult<String> {
        if start > end || end > self.len() {
            return Err(OtError::InvalidOperation(format!(
                "slice {}..{} outside buffer of {} chars",
                start,
                end,
                self.len()
            )));
        }
        Ok(self.rope.slice(start..end).to_string())
    }

    /// Check an operation against the current length
    pub fn is_valid(&self, op: &Operation) -> bool {
        is_valid(op, self.len())
    }

    fn check(&self, op: &Operation) -> OtResult<()> {
        if self.is_valid(op) {
            Ok(())
        } else {
            Err(OtError::OutOfBounds {
                position: op.position(),
                length: op.len(),
                content_length: self.len(),
            })
        }
    }

    /// Apply an operation in place
    pub fn apply(&mut self, op: &Operation) -> OtResult<()> {
        self.check(op)?;
        match op.kind() {
            OpKind::Insert { content } => self.rope.insert(op.position(), content),
            OpKind::Delete { length } => self.rope.remove(op.position()..op.position() + length),
            OpKind::Retain { .. } | OpKind::Format { .. } => {}
        }
        Ok(())
    }

    /// Build the inverse of `op` against the current (pre-op) contents
    pub fn invert(&self, op: &Operation) -> OtResult<Operation> {
        self.check(op)?;
        let start = op.position();
        Ok(inverse(op, |length| {
            self.rope.slice(start..start + length).to_string()
        }))
    }
}

impl From<&str> for TextBuffer {
    fn from(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
        }
    }
}

impl std::fmt::Display for TextBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for chunk in self.rope.chunks() {
            f.write_str(chunk)?;
        }
        Ok(())
    }
}
