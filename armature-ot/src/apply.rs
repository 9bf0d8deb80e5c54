//! Applying, inverting and validating operations against plain text
//!
//! Offsets count `char`s, not bytes.

use crate::{OpKind, Operation, OtError, OtResult};

/// Bounds check against a document of `content_length` chars
pub fn is_valid(op: &Operation, content_length: usize) -> bool {
    in_bounds(op.position(), op.kind(), content_length)
}

pub(crate) fn in_bounds(position: usize, kind: &OpKind, content_length: usize) -> bool {
    if position > content_length {
        return false;
    }
    match kind {
        OpKind::Delete { length } => position + length <= content_length,
        _ => true,
    }
}

fn check_bounds(op: &Operation, content: &str) -> OtResult<usize> {
    let content_length = content.chars().count();
    if is_valid(op, content_length) {
        Ok(content_length)
    } else {
        Err(OtError::OutOfBounds {
            position: op.position(),
            length: op.len(),
            content_length,
        })
    }
}

fn byte_offset(content: &str, char_index: usize) -> usize {
    content
        .char_indices()
        .nth(char_index)
        .map(|(b, _)| b)
        .unwrap_or(content.len())
}

/// Apply an operation to text, returning the new text.
///
/// Retains and formats leave plain text untouched.
pub fn apply_to_text(content: &str, op: &Operation) -> OtResult<String> {
    check_bounds(op, content)?;

    match op.kind() {
        OpKind::Insert { content: text } => {
            let at = byte_offset(content, op.position());
            let mut out = String::with_capacity(content.len() + text.len());
            out.push_str(&content[..at]);
            out.push_str(text);
            out.push_str(&content[at..]);
            Ok(out)
        }
        OpKind::Delete { length } => {
            let start = byte_offset(content, op.position());
            let end = byte_offset(content, op.position() + length);
            let mut out = String::with_capacity(content.len() - (end - start));
            out.push_str(&content[..start]);
            out.push_str(&content[end..]);
            Ok(out)
        }
        OpKind::Retain { .. } | OpKind::Format { .. } => Ok(content.to_string()),
    }
}

/// Build the operation that undoes `op`, given the text before `op` ran.
///
/// The inverse keeps `op`'s identity; reissue it through a factory before
/// sending it to other sites. Inverting a format clears its keys by setting
/// them to `null`, since prior attribute values live outside this engine.
pub fn invert(op: &Operation, content: &str) -> OtResult<Operation> {
    check_bounds(op, content)?;
    Ok(inverse(op, |length| {
        content.chars().skip(op.position()).take(length).collect()
    }))
}

/// Inverse of `op`; `removed` yields the `length` chars a delete removes.
pub(crate) fn inverse(op: &Operation, removed: impl FnOnce(usize) -> String) -> Operation {
    let kind = match op.kind() {
        OpKind::Insert { content: text } => OpKind::Delete {
            length: text.chars().count(),
        },
        OpKind::Delete { length } => OpKind::Insert {
            content: removed(*length),
        },
        OpKind::Retain { length } => OpKind::Retain { length: *length },
        OpKind::Format { length, attributes } => OpKind::Format {
            length: *length,
            attributes: attributes
                .keys()
                .map(|k| (k.clone(), serde_json::Value::Null))
                .collect(),
        },
    };

    op.with_shape(op.position(), kind)
}
