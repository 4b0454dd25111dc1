//! The session (unit-of-work) interface.

use crate::entity::{Entity, EntityRecord, EntityRef};
use crate::error::SessionResult;
use crate::key::EntityKey;
use crate::types::{EntityType, Savepoint};
use std::collections::BTreeMap;

/// Committed rows of one entity type at a point in time: identity to field image.
pub type TypeSnapshot = BTreeMap<EntityKey, Vec<u8>>;

/// A caller-owned unit-of-work over some persistence backend.
///
/// The session buffers registrations and deletions until [`commit`], which
/// flushes them atomically and assigns identities to transient records.
/// Savepoints capture the committed state; [`rollback_to`] restores it,
/// undoing commits made after the savepoint was opened.
///
/// Methods take `&self`; implementations use interior mutability. The
/// helpers in `ormtest_kit` assume a single logical thread of control per
/// session and provide no locking discipline of their own.
///
/// [`commit`]: Session::commit
/// [`rollback_to`]: Session::rollback_to
pub trait Session {
    /// Opens a savepoint capturing the current committed state.
    fn begin(&self) -> SessionResult<Savepoint>;

    /// Flushes all pending work atomically.
    ///
    /// Transient records receive identities here. Returns the flushed
    /// identities in registration order; deletions are not listed.
    fn commit(&self) -> SessionResult<Vec<EntityRef>>;

    /// Discards pending (uncommitted) work. Committed state is untouched.
    fn rollback(&self) -> SessionResult<()>;

    /// Discards pending work and restores the committed state captured by
    /// `savepoint`, invalidating savepoints opened after it.
    ///
    /// # Errors
    ///
    /// Fails with [`SessionError::UnknownSavepoint`] for a stale or foreign
    /// token.
    ///
    /// [`SessionError::UnknownSavepoint`]: crate::SessionError::UnknownSavepoint
    fn rollback_to(&self, savepoint: Savepoint) -> SessionResult<()>;

    /// Registers a pending insert or update.
    fn add(&self, record: EntityRecord) -> SessionResult<()>;

    /// Registers a pending deletion of a persisted entity.
    fn delete(&self, entity_type: &EntityType, key: &EntityKey) -> SessionResult<()>;

    /// Reads the committed field image of one entity, if present.
    fn get(&self, entity_type: &EntityType, key: &EntityKey) -> SessionResult<Option<Vec<u8>>>;

    /// Returns all committed rows of one entity type.
    ///
    /// Identities and field values are only reliable after a commit, so this
    /// fails with a pending-changes error while uncommitted work exists.
    /// An unknown type yields an empty snapshot.
    fn snapshot(&self, entity_type: &EntityType) -> SessionResult<TypeSnapshot>;

    /// Returns every entity type the session has committed rows for, past or
    /// present. Deleting all rows of a type does not forget the type.
    fn entity_types(&self) -> Vec<EntityType>;

    /// Encodes a typed entity and registers it. Convenience over [`add`].
    ///
    /// [`add`]: Session::add
    fn add_entity<E: Entity>(&self, entity: &E) -> SessionResult<()> {
        self.add(entity.to_record()?)
    }
}
