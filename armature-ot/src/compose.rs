//! Composition and compression of operation logs

use crate::{OpKind, Operation, OptimizedTransformConfig};

/// Merge two adjacent operations from the same author into one.
///
/// The merged operation keeps the metadata of `next`, whose clock
/// snapshot dominates `acc`'s.
fn merge_pair(acc: &Operation, next: &Operation) -> Option<Operation> {
    if acc.site_id() != next.site_id() {
        return None;
    }

    let kind = match (acc.kind(), next.kind()) {
        (OpKind::Insert { content }, OpKind::Insert { content: more })
            if acc.end() == next.position() =>
        {
            OpKind::Insert {
                content: format!("{}{}", content, more),
            }
        }
        // Repeated forward deletes at a fixed point
        (OpKind::Delete { length }, OpKind::Delete { length: more })
            if acc.position() == next.position() =>
        {
            OpKind::Delete {
                length: length + more,
            }
        }
        (OpKind::Retain { length }, OpKind::Retain { length: more })
            if acc.end() == next.position() =>
        {
            OpKind::Retain {
                length: length + more,
            }
        }
        (
            OpKind::Format { length, attributes },
            OpKind::Format {
                length: more,
                attributes: same,
            },
        ) if acc.end() == next.position() && attributes == same => OpKind::Format {
            length: length + more,
            attributes: attributes.clone(),
        },
        _ => return None,
    };

    Some(next.with_shape(acc.position(), kind))
}

/// Compose a run of adjacent, same-type, same-author operations.
///
/// Returns `None` when any neighbouring pair cannot be merged; callers keep
/// the operations separate in that case.
pub fn compose(ops: &[Operation]) -> Option<Operation> {
    let (first, rest) = ops.split_first()?;
    rest.iter()
        .try_fold(first.clone(), |acc, next| merge_pair(&acc, next))
}

/// Bounds operation logs by composing runs of edits
#[derive(Debug, Clone)]
pub struct Compressor {
    config: OptimizedTransformConfig,
}

impl Compressor {
    /// Create a compressor
    pub fn new(config: OptimizedTransformConfig) -> Self {
        tracing::debug!(
            threshold = config.compression_threshold,
            window_ms = config.compression_window_ms,
            enabled = config.enable_compression,
            "Initializing compressor"
        );
        Self { config }
    }

    /// Compose a run of operations (see [`compose`])
    pub fn compose(&self, ops: &[Operation]) -> Option<Operation> {
        compose(ops)
    }

    /// Check if a log of `len` operations is due for compression
    pub fn should_compress(&self, len: usize) -> bool {
        self.config.enable_compression && len > self.config.compression_threshold
    }

    /// Compress once the log exceeds the configured threshold
    pub fn compress(&self, ops: &[Operation]) -> Vec<Operation> {
        if !self.should_compress(ops.len()) {
            return ops.to_vec();
        }
        self.compress_all(ops)
    }

    /// Compress regardless of the threshold.
    ///
    /// Greedily extends a run while the next operation is from the same
    /// author, within the time window of its predecessor, and composable.
    pub fn compress_all(&self, ops: &[Operation]) -> Vec<Operation> {
        if !self.config.enable_compression {
            return ops.to_vec();
        }

        let window = self.config.compression_window();
        let mut out = Vec::with_capacity(ops.len());
        let Some((first, rest)) = ops.split_first() else {
            return out;
        };

        let mut acc = first.clone();
        let mut last_seen = first.timestamp();

        for op in rest {
            let gap = op.timestamp() - last_seen;
            let merged = if gap >= chrono::Duration::zero() && gap <= window {
                merge_pair(&acc, op)
            } else {
                None
            };

            match merged {
                Some(m) => acc = m,
                None => {
                    out.push(acc);
                    acc = op.clone();
                }
            }
            last_seen = op.timestamp();
        }
        out.push(acc);

        tracing::debug!(before = ops.len(), after = out.len(), "Compressed operation log");
        out
    }
}

impl Default for Compressor {
    fn default() -> Self {
        Self::new(OptimizedTransformConfig::default())
    }
}
