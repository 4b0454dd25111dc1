//! Declarative fixture sets.

use ormtest_core::{Entity, EntityRecord, EntityRef, Session, SessionError, SessionResult};
use std::collections::BTreeMap;
use tracing::debug;

type Producer<'a> = Box<dyn FnMut() -> SessionResult<Vec<EntityRecord>> + 'a>;

/// A named, ordered collection of fixture producers.
///
/// Producers are registered with [`define`](Self::define) and friends and
/// run in declaration order by [`create_all`](Self::create_all), which
/// registers every produced entity with the session and commits once at the
/// end. A failing producer aborts the whole batch before anything is
/// registered, so no partial fixture set is ever persisted.
///
/// # Example
///
/// ```rust
/// use ormtest_core::{Entity, Session};
/// use ormtest_kit::FixtureSet;
/// use ormtest_memory::MemorySession;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct User {
///     name: String,
/// }
///
/// impl Entity for User {
///     const TYPE: &'static str = "users";
/// }
///
/// let session = MemorySession::new();
/// let mut fixtures = FixtureSet::new(&session);
/// fixtures.define("john", || User { name: "john".into() }).unwrap();
/// fixtures
///     .define_many("team", || {
///         vec![User { name: "jane".into() }, User { name: "joe".into() }]
///     })
///     .unwrap();
///
/// let refs = fixtures.create_all().unwrap();
/// assert_eq!(refs.len(), 3);
/// assert_eq!(fixtures.created("john").unwrap().len(), 1);
/// ```
pub struct FixtureSet<'a, S: Session> {
    session: &'a S,
    producers: Vec<(String, Producer<'a>)>,
    created: Option<BTreeMap<String, Vec<EntityRef>>>,
}

impl<'a, S: Session> FixtureSet<'a, S> {
    /// Creates an empty fixture set over the session.
    #[must_use]
    pub fn new(session: &'a S) -> Self {
        Self {
            session,
            producers: Vec::new(),
            created: None,
        }
    }

    /// Registers a producer of one entity.
    pub fn define<E, F>(&mut self, name: impl Into<String>, mut produce: F) -> SessionResult<()>
    where
        E: Entity,
        F: FnMut() -> E + 'a,
    {
        self.push(name.into(), Box::new(move || Ok(vec![produce().to_record()?])))
    }

    /// Registers a producer of a sequence of entities.
    pub fn define_many<E, F>(
        &mut self,
        name: impl Into<String>,
        mut produce: F,
    ) -> SessionResult<()>
    where
        E: Entity,
        F: FnMut() -> Vec<E> + 'a,
    {
        self.push(
            name.into(),
            Box::new(move || produce().iter().map(Entity::to_record).collect()),
        )
    }

    /// Registers a fallible producer of one entity.
    pub fn try_define<E, F>(&mut self, name: impl Into<String>, mut produce: F) -> SessionResult<()>
    where
        E: Entity,
        F: FnMut() -> SessionResult<E> + 'a,
    {
        self.push(name.into(), Box::new(move || Ok(vec![produce()?.to_record()?])))
    }

    /// Registers a fallible producer of a sequence of entities.
    pub fn try_define_many<E, F>(
        &mut self,
        name: impl Into<String>,
        mut produce: F,
    ) -> SessionResult<()>
    where
        E: Entity,
        F: FnMut() -> SessionResult<Vec<E>> + 'a,
    {
        self.push(
            name.into(),
            Box::new(move || produce()?.iter().map(Entity::to_record).collect()),
        )
    }

    fn push(&mut self, name: String, producer: Producer<'a>) -> SessionResult<()> {
        if self.producers.iter().any(|(existing, _)| *existing == name) {
            return Err(SessionError::duplicate_fixture(name));
        }
        self.producers.push((name, producer));
        Ok(())
    }

    /// Returns the number of registered producers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.producers.len()
    }

    /// Checks whether no producers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.producers.is_empty()
    }

    /// Runs every producer, registers the outputs, and commits once.
    ///
    /// Producers run in declaration order before anything touches the
    /// session; a failure aborts without registering or committing and names
    /// the producer in the error. Work already pending on the session is
    /// committed along with the fixtures.
    ///
    /// Returns the fixtures' assigned identities in creation order.
    pub fn create_all(&mut self) -> SessionResult<Vec<EntityRef>> {
        if self.created.is_some() {
            return Err(SessionError::FixturesAlreadyCreated);
        }

        let mut batches = Vec::with_capacity(self.producers.len());
        for (name, produce) in &mut self.producers {
            let records = produce().map_err(|e| SessionError::fixture(name.clone(), e))?;
            batches.push((name.clone(), records));
        }
        let total: usize = batches.iter().map(|(_, records)| records.len()).sum();

        for (_, records) in &batches {
            for record in records {
                self.session.add(record.clone())?;
            }
        }
        let refs = self.session.commit()?;

        // Pre-existing pending work flushes first; the fixtures' refs are the tail
        let start = refs.len().saturating_sub(total);
        let fixture_refs = refs.get(start..).unwrap_or(&[]).to_vec();

        let mut by_name = BTreeMap::new();
        let mut cursor = 0;
        for (name, records) in &batches {
            let end = cursor + records.len();
            by_name.insert(
                name.clone(),
                fixture_refs.get(cursor..end).unwrap_or(&[]).to_vec(),
            );
            cursor = end;
        }
        self.created = Some(by_name);

        debug!(
            producers = self.producers.len(),
            entities = fixture_refs.len(),
            "created fixture set"
        );
        Ok(fixture_refs)
    }

    /// Returns the identities created by one named producer.
    ///
    /// `None` before [`create_all`](Self::create_all) or for an unknown name.
    #[must_use]
    pub fn created(&self, name: &str) -> Option<&[EntityRef]> {
        self.created
            .as_ref()
            .and_then(|by_name| by_name.get(name))
            .map(Vec::as_slice)
    }
}

impl<S: Session> std::fmt::Debug for FixtureSet<'_, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FixtureSet")
            .field("producers", &self.producers.len())
            .field("created", &self.created.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ormtest_core::{EntityKey, EntityType};
    use ormtest_memory::MemorySession;
    use serde::Serialize;

    #[derive(Serialize)]
    struct User {
        name: String,
    }

    impl Entity for User {
        const TYPE: &'static str = "users";
    }

    fn user(name: &str) -> User {
        User {
            name: name.to_owned(),
        }
    }

    #[test]
    fn create_all_persists_in_declaration_order() {
        let session = MemorySession::new();
        let mut fixtures = FixtureSet::new(&session);
        fixtures.define("john", || user("john")).unwrap();
        fixtures
            .define_many("team", || vec![user("jane"), user("joe")])
            .unwrap();

        let refs = fixtures.create_all().unwrap();

        assert_eq!(refs.len(), 3);
        assert_eq!(refs[0].key, EntityKey::from(1));
        assert_eq!(refs[1].key, EntityKey::from(2));
        assert_eq!(refs[2].key, EntityKey::from(3));
        assert_eq!(session.snapshot(&User::entity_type()).unwrap().len(), 3);
    }

    #[test]
    fn created_maps_names_to_refs() {
        let session = MemorySession::new();
        let mut fixtures = FixtureSet::new(&session);
        fixtures.define("john", || user("john")).unwrap();
        fixtures
            .define_many("team", || vec![user("jane"), user("joe")])
            .unwrap();

        assert!(fixtures.created("john").is_none());
        fixtures.create_all().unwrap();

        assert_eq!(fixtures.created("john").unwrap().len(), 1);
        assert_eq!(fixtures.created("team").unwrap().len(), 2);
        assert!(fixtures.created("ghost").is_none());
    }

    #[test]
    fn producer_failure_persists_nothing() {
        let session = MemorySession::new();
        let mut fixtures = FixtureSet::new(&session);
        fixtures.define("john", || user("john")).unwrap();
        fixtures
            .try_define("broken", || -> SessionResult<User> {
                Err(SessionError::invalid_operation("producer failed"))
            })
            .unwrap();

        let err = fixtures.create_all().unwrap_err();
        assert!(matches!(err, SessionError::Fixture { ref name, .. } if name.as_str() == "broken"));

        assert_eq!(session.pending_count(), 0);
        assert!(session.snapshot(&User::entity_type()).unwrap().is_empty());
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let session = MemorySession::new();
        let mut fixtures = FixtureSet::new(&session);
        fixtures.define("john", || user("john")).unwrap();
        let err = fixtures.define("john", || user("john 2")).unwrap_err();
        assert!(matches!(err, SessionError::DuplicateFixture { .. }));
    }

    #[test]
    fn create_all_twice_fails() {
        let session = MemorySession::new();
        let mut fixtures = FixtureSet::new(&session);
        fixtures.define("john", || user("john")).unwrap();
        fixtures.create_all().unwrap();

        let err = fixtures.create_all().unwrap_err();
        assert!(matches!(err, SessionError::FixturesAlreadyCreated));
        assert_eq!(session.snapshot(&User::entity_type()).unwrap().len(), 1);
    }

    #[test]
    fn pending_session_work_is_committed_alongside() {
        let session = MemorySession::new();
        session
            .add(EntityRecord::transient(EntityType::new("posts"), vec![9]))
            .unwrap();

        let mut fixtures = FixtureSet::new(&session);
        fixtures.define("john", || user("john")).unwrap();
        let refs = fixtures.create_all().unwrap();

        // Only the fixture's own refs are returned
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].entity_type, User::entity_type());
        assert_eq!(session.snapshot(&EntityType::new("posts")).unwrap().len(), 1);
    }

    #[test]
    fn empty_set_creates_nothing() {
        let session = MemorySession::new();
        let mut fixtures: FixtureSet<'_, MemorySession> = FixtureSet::new(&session);
        let refs = fixtures.create_all().unwrap();
        assert!(refs.is_empty());
        assert!(session.entity_types().is_empty());
    }
}
