//! In-memory session implementation.

use crate::config::MemoryConfig;
use crate::state::{CommittedState, PendingOp};
use ormtest_core::{
    EntityKey, EntityRecord, EntityRef, EntityType, Savepoint, Session, SessionError,
    SessionResult, TypeSnapshot,
};
use parking_lot::RwLock;
use tracing::debug;

/// An in-memory [`Session`].
///
/// Suitable for:
/// - Unit tests of code written against the `Session` trait
/// - Exercising the `ormtest_kit` helpers without a persistence backend
///
/// Committed rows live in ordered maps keyed by entity type and identity.
/// Pending work is buffered until [`commit`](Session::commit), which applies
/// the whole batch atomically; a failing batch leaves committed state
/// untouched. Savepoints capture the committed state and
/// [`rollback_to`](Session::rollback_to) restores it, undoing commits made
/// inside the scope.
///
/// Transient records receive sequential integer identities, starting from
/// [`MemoryConfig::first_key`].
pub struct MemorySession {
    config: MemoryConfig,
    inner: RwLock<Inner>,
}

struct Inner {
    committed: CommittedState,
    pending: Vec<PendingOp>,
    savepoints: Vec<SavepointEntry>,
    next_savepoint: u64,
}

struct SavepointEntry {
    token: Savepoint,
    committed: CommittedState,
}

impl MemorySession {
    /// Creates a session with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(MemoryConfig::default())
    }

    /// Creates a session with the given configuration.
    #[must_use]
    pub fn with_config(config: MemoryConfig) -> Self {
        let committed = CommittedState::new(config.first_key);
        Self {
            config,
            inner: RwLock::new(Inner {
                committed,
                pending: Vec::new(),
                savepoints: Vec::new(),
                next_savepoint: 1,
            }),
        }
    }

    /// Returns the session configuration.
    #[must_use]
    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }

    /// Returns the number of pending (uncommitted) operations.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.inner.read().pending.len()
    }

    /// Returns the number of committed rows of one type.
    #[must_use]
    pub fn row_count(&self, entity_type: &EntityType) -> usize {
        self.inner
            .read()
            .committed
            .rows
            .get(entity_type)
            .map_or(0, TypeSnapshot::len)
    }

    /// Drops all state: rows, pending work, savepoints, identity counter.
    pub fn clear(&self) {
        let mut inner = self.inner.write();
        inner.committed = CommittedState::new(self.config.first_key);
        inner.pending.clear();
        inner.savepoints.clear();
    }
}

impl Default for MemorySession {
    fn default() -> Self {
        Self::new()
    }
}

impl Session for MemorySession {
    fn begin(&self) -> SessionResult<Savepoint> {
        let mut inner = self.inner.write();
        let token = Savepoint::new(inner.next_savepoint);
        inner.next_savepoint += 1;
        let snapshot = inner.committed.clone();
        inner.savepoints.push(SavepointEntry {
            token,
            committed: snapshot,
        });
        debug!(savepoint = %token, "opened savepoint");
        Ok(token)
    }

    fn commit(&self) -> SessionResult<Vec<EntityRef>> {
        let mut inner = self.inner.write();
        let mut scratch = inner.committed.clone();
        let flushed = scratch.apply(&inner.pending, self.config.strict_delete)?;
        inner.committed = scratch;
        inner.pending.clear();
        debug!(flushed = flushed.len(), "committed");
        Ok(flushed)
    }

    fn rollback(&self) -> SessionResult<()> {
        let mut inner = self.inner.write();
        let dropped = inner.pending.len();
        inner.pending.clear();
        debug!(dropped, "rolled back pending work");
        Ok(())
    }

    fn rollback_to(&self, savepoint: Savepoint) -> SessionResult<()> {
        let mut inner = self.inner.write();
        let position = inner
            .savepoints
            .iter()
            .position(|entry| entry.token == savepoint)
            .ok_or(SessionError::UnknownSavepoint { savepoint })?;
        let entry = inner
            .savepoints
            .drain(position..)
            .next()
            .ok_or(SessionError::UnknownSavepoint { savepoint })?;
        inner.committed = entry.committed;
        inner.pending.clear();
        debug!(savepoint = %savepoint, "restored savepoint");
        Ok(())
    }

    fn add(&self, record: EntityRecord) -> SessionResult<()> {
        self.inner.write().pending.push(PendingOp::Add(record));
        Ok(())
    }

    fn delete(&self, entity_type: &EntityType, key: &EntityKey) -> SessionResult<()> {
        self.inner
            .write()
            .pending
            .push(PendingOp::Delete(entity_type.clone(), key.clone()));
        Ok(())
    }

    fn get(&self, entity_type: &EntityType, key: &EntityKey) -> SessionResult<Option<Vec<u8>>> {
        let inner = self.inner.read();
        Ok(inner
            .committed
            .rows
            .get(entity_type)
            .and_then(|rows| rows.get(key))
            .cloned())
    }

    fn snapshot(&self, entity_type: &EntityType) -> SessionResult<TypeSnapshot> {
        let inner = self.inner.read();
        if !inner.pending.is_empty() {
            return Err(SessionError::pending_changes(inner.pending.len()));
        }
        Ok(inner
            .committed
            .rows
            .get(entity_type)
            .cloned()
            .unwrap_or_default())
    }

    fn entity_types(&self) -> Vec<EntityType> {
        self.inner
            .read()
            .committed
            .seen_types
            .iter()
            .cloned()
            .collect()
    }
}

impl std::fmt::Debug for MemorySession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("MemorySession")
            .field("types", &inner.committed.seen_types.len())
            .field("pending", &inner.pending.len())
            .field("savepoints", &inner.savepoints.len())
            .finish_non_exhaustive()
    }
}
