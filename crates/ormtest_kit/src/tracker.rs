//! Change tracking across a scoped block.

use ormtest_core::{EntityKey, EntityType, Session, SessionResult, TypeSnapshot};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Records which identities a block of session work created, updated, or
/// deleted.
///
/// On construction, the tracker snapshots the identities and field images of
/// every observed entity type. [`finish`](Self::finish) re-snapshots and
/// returns the difference as a [`ChangeSet`]. Identities and field values
/// are only reliable after a commit, so both ends of the tracked block
/// require a clean session; constructing or finishing with uncommitted work
/// pending fails with a pending-changes error.
///
/// # Example
///
/// ```rust
/// use ormtest_core::{EntityRecord, EntityType, Session};
/// use ormtest_kit::ChangeTracker;
/// use ormtest_memory::MemorySession;
///
/// let session = MemorySession::new();
/// let users = EntityType::new("users");
///
/// let tracker = ChangeTracker::all(&session).unwrap();
/// session.add(EntityRecord::transient(users.clone(), vec![1])).unwrap();
/// session.commit().unwrap();
///
/// let changes = tracker.finish().unwrap();
/// assert_eq!(changes.created(&users).len(), 1);
/// assert!(changes.updated(&users).is_empty());
/// assert!(changes.deleted(&users).is_empty());
/// ```
pub struct ChangeTracker<'a, S: Session> {
    session: &'a S,
    tracked: Option<Vec<EntityType>>,
    before: BTreeMap<EntityType, TypeSnapshot>,
}

impl<'a, S: Session> ChangeTracker<'a, S> {
    /// Tracks every entity type known to the session, including types that
    /// first appear during the block.
    pub fn all(session: &'a S) -> SessionResult<Self> {
        Self::build(session, None)
    }

    /// Tracks only the given entity types.
    pub fn of<I>(session: &'a S, types: I) -> SessionResult<Self>
    where
        I: IntoIterator<Item = EntityType>,
    {
        Self::build(session, Some(types.into_iter().collect()))
    }

    fn build(session: &'a S, tracked: Option<Vec<EntityType>>) -> SessionResult<Self> {
        let observed = match &tracked {
            Some(types) => types.clone(),
            None => session.entity_types(),
        };
        let mut before = BTreeMap::new();
        for entity_type in observed {
            let snapshot = session.snapshot(&entity_type)?;
            before.insert(entity_type, snapshot);
        }
        Ok(Self {
            session,
            tracked,
            before,
        })
    }

    /// Returns the tracked session.
    #[must_use]
    pub fn session(&self) -> &'a S {
        self.session
    }

    /// Re-snapshots and returns the per-type difference.
    pub fn finish(self) -> SessionResult<ChangeSet> {
        let observed: Vec<EntityType> = match &self.tracked {
            Some(types) => types.clone(),
            None => {
                let mut types: BTreeSet<EntityType> =
                    self.session.entity_types().into_iter().collect();
                types.extend(self.before.keys().cloned());
                types.into_iter().collect()
            }
        };

        let empty = TypeSnapshot::new();
        let mut created = BTreeMap::new();
        let mut updated = BTreeMap::new();
        let mut deleted = BTreeMap::new();

        for entity_type in observed {
            let after = self.session.snapshot(&entity_type)?;
            let before = self.before.get(&entity_type).unwrap_or(&empty);

            let mut created_keys = BTreeSet::new();
            let mut updated_keys = BTreeSet::new();
            let mut deleted_keys = BTreeSet::new();

            for (key, image) in &after {
                match before.get(key) {
                    None => {
                        created_keys.insert(key.clone());
                    }
                    Some(previous) if previous != image => {
                        updated_keys.insert(key.clone());
                    }
                    Some(_) => {}
                }
            }
            for key in before.keys() {
                if !after.contains_key(key) {
                    deleted_keys.insert(key.clone());
                }
            }

            if !created_keys.is_empty() {
                created.insert(entity_type.clone(), created_keys);
            }
            if !updated_keys.is_empty() {
                updated.insert(entity_type.clone(), updated_keys);
            }
            if !deleted_keys.is_empty() {
                deleted.insert(entity_type, deleted_keys);
            }
        }

        let changes = ChangeSet {
            created,
            updated,
            deleted,
            empty: BTreeSet::new(),
        };
        debug!(
            created = changes.created.len(),
            updated = changes.updated.len(),
            deleted = changes.deleted.len(),
            "finished tracked block"
        );
        Ok(changes)
    }
}

impl<S: Session> std::fmt::Debug for ChangeTracker<'_, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeTracker")
            .field("types", &self.before.len())
            .field("pinned", &self.tracked.is_some())
            .finish_non_exhaustive()
    }
}

/// Runs `f` inside a tracked block over every entity type.
///
/// Returns `f`'s value together with the observed changes.
pub fn track<S, F, T>(session: &S, f: F) -> SessionResult<(T, ChangeSet)>
where
    S: Session,
    F: FnOnce(&S) -> SessionResult<T>,
{
    let tracker = ChangeTracker::all(session)?;
    let value = f(session)?;
    let changes = tracker.finish()?;
    Ok((value, changes))
}

/// The outcome of a tracked block: created, updated, and deleted identities
/// per entity type.
///
/// The three sets are pairwise disjoint for every type. An identity deleted
/// and re-created within one block is classified by the before/after
/// comparison alone: a differing field image reports as updated, an
/// identical one reports nothing.
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    created: BTreeMap<EntityType, BTreeSet<EntityKey>>,
    updated: BTreeMap<EntityType, BTreeSet<EntityKey>>,
    deleted: BTreeMap<EntityType, BTreeSet<EntityKey>>,
    empty: BTreeSet<EntityKey>,
}

impl ChangeSet {
    /// Identities created during the block. Empty for unseen types.
    #[must_use]
    pub fn created(&self, entity_type: &EntityType) -> &BTreeSet<EntityKey> {
        self.created.get(entity_type).unwrap_or(&self.empty)
    }

    /// Identities whose field image changed during the block.
    #[must_use]
    pub fn updated(&self, entity_type: &EntityType) -> &BTreeSet<EntityKey> {
        self.updated.get(entity_type).unwrap_or(&self.empty)
    }

    /// Identities deleted during the block.
    #[must_use]
    pub fn deleted(&self, entity_type: &EntityType) -> &BTreeSet<EntityKey> {
        self.deleted.get(entity_type).unwrap_or(&self.empty)
    }

    /// Checks whether the block changed nothing at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.updated.is_empty() && self.deleted.is_empty()
    }

    /// Asserts that at least one entity of the type was created.
    ///
    /// # Panics
    ///
    /// Panics with a descriptive message otherwise; this is test-assertion
    /// surface, like the `_one` variants below.
    pub fn assert_created(&self, entity_type: &EntityType) -> &BTreeSet<EntityKey> {
        let set = self.created(entity_type);
        assert!(!set.is_empty(), "no {entity_type} entities were created");
        set
    }

    /// Asserts that at least one entity of the type was updated.
    ///
    /// # Panics
    ///
    /// Panics with a descriptive message otherwise.
    pub fn assert_updated(&self, entity_type: &EntityType) -> &BTreeSet<EntityKey> {
        let set = self.updated(entity_type);
        assert!(!set.is_empty(), "no {entity_type} entities were updated");
        set
    }

    /// Asserts that at least one entity of the type was deleted.
    ///
    /// # Panics
    ///
    /// Panics with a descriptive message otherwise.
    pub fn assert_deleted(&self, entity_type: &EntityType) -> &BTreeSet<EntityKey> {
        let set = self.deleted(entity_type);
        assert!(!set.is_empty(), "no {entity_type} entities were deleted");
        set
    }

    /// Asserts that exactly one entity of the type was created and returns
    /// its identity.
    ///
    /// # Panics
    ///
    /// Panics with a descriptive message otherwise.
    pub fn assert_created_one(&self, entity_type: &EntityType) -> EntityKey {
        Self::exactly_one(self.assert_created(entity_type), entity_type, "created")
    }

    /// Asserts that exactly one entity of the type was updated and returns
    /// its identity.
    ///
    /// # Panics
    ///
    /// Panics with a descriptive message otherwise.
    pub fn assert_updated_one(&self, entity_type: &EntityType) -> EntityKey {
        Self::exactly_one(self.assert_updated(entity_type), entity_type, "updated")
    }

    /// Asserts that exactly one entity of the type was deleted and returns
    /// its identity.
    ///
    /// # Panics
    ///
    /// Panics with a descriptive message otherwise.
    pub fn assert_deleted_one(&self, entity_type: &EntityType) -> EntityKey {
        Self::exactly_one(self.assert_deleted(entity_type), entity_type, "deleted")
    }

    fn exactly_one(
        set: &BTreeSet<EntityKey>,
        entity_type: &EntityType,
        mode: &str,
    ) -> EntityKey {
        assert!(
            set.len() == 1,
            "{} {entity_type} entities {mode}, need exactly one",
            set.len()
        );
        set.iter().next().cloned().expect("set has one element")
    }
}
