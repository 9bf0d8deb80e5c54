//! A collaborating site
//!
//! [`Site`] ties the pieces together for one replica of a document: local
//! edits are created, applied and queued as pending until the server
//! acknowledges them; remote edits are transformed through the pending queue
//! before they are applied, and the pending queue is rebased over them in
//! turn.
//!
//! ```text
//! local edit ──> factory ──> apply ──> operations + pending ──> (send)
//!
//! remote op ──> transform through pending ──> validate ──> apply
//!                      │                                     │
//!                      └─ rebase pending over remote op <────┘
//! ```
//!
//! Transport is the caller's business: send what `insert`/`delete`/...
//! return, feed what arrives into [`Site::receive`].

use crate::apply::in_bounds;
use crate::{
    apply_to_text, Attributes, Compressor, ConflictInfo, DocumentState, OpKind, Operation,
    OperationFactory, OptimizedTransformConfig, OtError, OtResult, SiteId, TransformResult,
    TransformStats, Transformer, VectorClock, VectorClockTracker,
};
use chrono::Utc;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// What happened to a received operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ReceiveOutcome {
    /// Transformed and applied
    Applied(TransformResult),
    /// Parked until [`Site::resolve`] is called
    AwaitingResolution {
        /// Id of the parked operation
        id: Uuid,
        /// Conflicts that require confirmation
        conflicts: Vec<ConflictInfo>,
    },
}

impl ReceiveOutcome {
    /// Check if the operation was applied
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }
}

/// One replica of a shared document
#[derive(Debug)]
pub struct Site {
    factory: OperationFactory,
    transformer: Transformer,
    compressor: Compressor,
    config: OptimizedTransformConfig,
    state: DocumentState,
    awaiting: Vec<Operation>,
}

impl Site {
    /// Create a site with the default configuration
    pub fn new(site_id: SiteId, content: impl Into<String>) -> Self {
        let config = OptimizedTransformConfig::default();
        Self::build(site_id, content.into(), config)
    }

    /// Create a site with a custom configuration
    pub fn with_config(
        site_id: SiteId,
        content: impl Into<String>,
        config: OptimizedTransformConfig,
    ) -> OtResult<Self> {
        config.validate()?;
        Ok(Self::build(site_id, content.into(), config))
    }

    fn build(site_id: SiteId, content: String, config: OptimizedTransformConfig) -> Self {
        tracing::debug!(%site_id, length = content.chars().count(), "Creating site");
        let tracker = VectorClockTracker::with_enabled(config.enable_vector_clocks);
        Self {
            factory: OperationFactory::with_tracker(site_id, tracker),
            transformer: Transformer::new(config.clone()),
            compressor: Compressor::new(config.clone()),
            config,
            state: DocumentState::new(content),
            awaiting: Vec::new(),
        }
    }

    /// This site's id
    pub fn site_id(&self) -> SiteId {
        self.factory.site_id()
    }

    /// Current text
    pub fn content(&self) -> &str {
        &self.state.content
    }

    /// Number of operations applied
    pub fn version(&self) -> u64 {
        self.state.version
    }

    /// Full document state
    pub fn state(&self) -> &DocumentState {
        &self.state
    }

    /// Local operations not yet acknowledged
    pub fn pending(&self) -> &[Operation] {
        &self.state.pending_operations
    }

    /// Remote operations parked for manual resolution
    pub fn awaiting_resolution(&self) -> &[Operation] {
        &self.awaiting
    }

    /// Local vector clock
    pub fn clock(&self) -> &VectorClock {
        self.factory.tracker().clock()
    }

    /// Configuration in use
    pub fn config(&self) -> &OptimizedTransformConfig {
        &self.config
    }

    /// Transformer counters
    pub fn stats(&self) -> &TransformStats {
        self.transformer.stats()
    }

    /// Insert `content` at `position`
    pub fn insert(&mut self, position: usize, content: impl Into<String>) -> OtResult<Operation> {
        self.local(
            position,
            OpKind::Insert {
                content: content.into(),
            },
        )
    }

    /// Delete `length` chars at `position`
    pub fn delete(&mut self, position: usize, length: usize) -> OtResult<Operation> {
        self.local(position, OpKind::Delete { length })
    }

    /// Record a retain over `length` chars at `position`
    pub fn retain(&mut self, position: usize, length: usize) -> OtResult<Operation> {
        self.local(position, OpKind::Retain { length })
    }

    /// Format `length` chars at `position`
    pub fn format(
        &mut self,
        position: usize,
        length: usize,
        attributes: Attributes,
    ) -> OtResult<Operation> {
        self.local(position, OpKind::Format { length, attributes })
    }

    fn local(&mut self, position: usize, kind: OpKind) -> OtResult<Operation> {
        // Reject before the factory consumes a sequence number
        let content_length = self.state.content_length();
        if !in_bounds(position, &kind, content_length) {
            return Err(OtError::OutOfBounds {
                position,
                length: kind.len(),
                content_length,
            });
        }

        let op = self.factory.create(position, kind);
        self.state.content = apply_to_text(&self.state.content, &op)?;
        self.state.pending_operations.push(op.clone());
        self.commit(op.clone());

        tracing::trace!(site = %self.site_id(), op = %op.id(), kind = %op.op_type(), "local edit");
        Ok(op)
    }

    /// Integrate an operation from another site.
    ///
    /// Under [`Manual`](crate::ConflictResolutionStrategy::Manual) an operation whose
    /// transform recorded conflicts is parked instead of applied.
    pub fn receive(&mut self, remote: &Operation) -> OtResult<ReceiveOutcome> {
        if remote.site_id() == self.site_id() {
            return Err(OtError::InvalidOperation(format!(
                "operation {} originated at {}",
                remote.id(),
                remote.site_id()
            )));
        }

        let (result, rebased) = self.rebase(remote);

        if result.requires_manual() {
            tracing::warn!(
                site = %self.site_id(),
                op = %remote.id(),
                conflicts = result.conflicts.len(),
                "Deferring operation for manual resolution"
            );
            self.awaiting.push(remote.clone());
            return Ok(ReceiveOutcome::AwaitingResolution {
                id: remote.id(),
                conflicts: result.conflicts,
            });
        }

        self.integrate(result, rebased).map(ReceiveOutcome::Applied)
    }

    /// Settle a parked operation.
    ///
    /// Accepting transforms it against the current pending queue and applies
    /// it; rejecting drops it, leaving any compensation to the caller.
    pub fn resolve(&mut self, id: Uuid, accept: bool) -> OtResult<Option<TransformResult>> {
        let index = self
            .awaiting
            .iter()
            .position(|op| op.id() == id)
            .ok_or(OtError::UnknownOperation(id))?;
        let remote = self.awaiting.remove(index);

        if !accept {
            tracing::debug!(site = %self.site_id(), op = %id, "Rejected parked operation");
            return Ok(None);
        }

        let (result, rebased) = self.rebase(&remote);
        self.integrate(result, rebased).map(Some)
    }

    /// Retire acknowledged pending operations. Returns how many were removed.
    pub fn acknowledge(&mut self, ids: &[Uuid]) -> usize {
        let before = self.state.pending_operations.len();
        self.state
            .pending_operations
            .retain(|op| !ids.contains(&op.id()));
        self.state.last_synced = Some(Utc::now());

        let removed = before - self.state.pending_operations.len();
        tracing::debug!(site = %self.site_id(), removed, "Acknowledged operations");
        removed
    }

    /// Transform `remote` through every pending operation, rebasing each
    /// pending operation over the version of `remote` it is concurrent with.
    fn rebase(&mut self, remote: &Operation) -> (TransformResult, Vec<Operation>) {
        let mut incoming = remote.clone();
        let mut conflicts = Vec::new();
        let mut rebased = Vec::with_capacity(self.state.pending_operations.len());

        for local in &self.state.pending_operations {
            let forward = self.transformer.transform(&incoming, local);
            let backward = self.transformer.transform(local, &incoming);
            conflicts.extend(forward.conflicts);
            incoming = forward.operation;
            rebased.push(backward.operation);
        }

        (TransformResult::from_parts(remote, incoming, conflicts), rebased)
    }

    fn integrate(
        &mut self,
        result: TransformResult,
        rebased: Vec<Operation>,
    ) -> OtResult<TransformResult> {
        let op = &result.operation;
        let content = apply_to_text(&self.state.content, op).inspect_err(|e| {
            tracing::warn!(site = %self.site_id(), op = %op.id(), error = %e, "Rejected remote operation");
        })?;

        if let Some(clock) = op.vector_clock() {
            self.factory.tracker_mut().update(clock);
        }
        self.state.content = content;
        self.state.pending_operations = rebased;
        self.commit(op.clone());

        tracing::trace!(
            site = %self.site_id(),
            op = %op.id(),
            transformed = result.is_transformed,
            version = self.state.version,
            "applied remote operation"
        );
        Ok(result)
    }

    fn commit(&mut self, op: Operation) {
        self.state.operations.push(op);
        self.state.version += 1;
        self.state.vector_clock = self.factory.tracker().clock().clone();
        self.maybe_compress();
    }

    /// Compress the applied log. A pending backlog forces it.
    ///
    /// Pending entries are never composed: a peer may have seen any prefix
    /// of them, and `rebase` needs each one's own clock.
    fn maybe_compress(&mut self) {
        if self.state.pending_operations.len() > self.config.max_operation_buffer {
            tracing::debug!(
                site = %self.site_id(),
                pending = self.state.pending_operations.len(),
                "Pending buffer full, forcing log compression"
            );
            self.state.operations = self.compressor.compress_all(&self.state.operations);
        } else if self.compressor.should_compress(self.state.operations.len()) {
            self.state.operations = self.compressor.compress(&self.state.operations);
        }
    }
}

/// Site handle for use from several threads
pub type SharedSite = Arc<Mutex<Site>>;

/// Create a shared site
pub fn shared_site(site: Site) -> SharedSite {
    Arc::new(Mutex::new(site))
}
