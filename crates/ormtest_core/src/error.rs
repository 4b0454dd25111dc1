//! Error types for sessions and the helpers built over them.

use crate::key::EntityKey;
use crate::types::{EntityType, Savepoint};
use thiserror::Error;

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// Errors surfaced by sessions and the test helpers built over them.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Savepoint token is stale or was never issued by this session.
    #[error("unknown savepoint: {savepoint}")]
    UnknownSavepoint {
        /// The rejected token.
        savepoint: Savepoint,
    },

    /// Committed state was inspected while uncommitted work is pending.
    #[error("session has {count} pending change(s); commit or roll back before inspecting")]
    PendingChanges {
        /// Number of pending operations.
        count: usize,
    },

    /// A deletion referenced an identity that is not persisted.
    #[error("no {entity_type} entity with identity {key}")]
    NoSuchEntity {
        /// Entity type that was searched.
        entity_type: EntityType,
        /// Identity that was not found.
        key: EntityKey,
    },

    /// Entity payload could not be encoded.
    #[error("codec error: {message}")]
    Codec {
        /// Description of the failure.
        message: String,
    },

    /// A named fixture producer failed.
    #[error("fixture '{name}' failed: {source}")]
    Fixture {
        /// Name the producer was registered under.
        name: String,
        /// Underlying failure.
        #[source]
        source: Box<SessionError>,
    },

    /// The fixture set was already created.
    #[error("fixture set already created")]
    FixturesAlreadyCreated,

    /// Two fixture producers were registered under the same name.
    #[error("duplicate fixture name: '{name}'")]
    DuplicateFixture {
        /// The colliding name.
        name: String,
    },

    /// Operation not permitted in the current state.
    #[error("invalid operation: {message}")]
    InvalidOperation {
        /// Description of why the operation is invalid.
        message: String,
    },
}

impl SessionError {
    /// Creates an unknown savepoint error.
    pub fn unknown_savepoint(savepoint: Savepoint) -> Self {
        Self::UnknownSavepoint { savepoint }
    }

    /// Creates a pending changes error.
    pub fn pending_changes(count: usize) -> Self {
        Self::PendingChanges { count }
    }

    /// Creates a missing entity error.
    pub fn no_such_entity(entity_type: EntityType, key: EntityKey) -> Self {
        Self::NoSuchEntity { entity_type, key }
    }

    /// Creates a codec error.
    pub fn codec(message: impl Into<String>) -> Self {
        Self::Codec {
            message: message.into(),
        }
    }

    /// Creates a fixture error wrapping the producer's failure.
    pub fn fixture(name: impl Into<String>, source: SessionError) -> Self {
        Self::Fixture {
            name: name.into(),
            source: Box::new(source),
        }
    }

    /// Creates a duplicate fixture name error.
    pub fn duplicate_fixture(name: impl Into<String>) -> Self {
        Self::DuplicateFixture { name: name.into() }
    }

    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        let err = SessionError::unknown_savepoint(Savepoint::new(3));
        assert_eq!(err.to_string(), "unknown savepoint: sp:3");

        let err = SessionError::no_such_entity(EntityType::new("users"), EntityKey::from(1));
        assert_eq!(err.to_string(), "no users entity with identity 1");
    }

    #[test]
    fn fixture_error_carries_source() {
        let err = SessionError::fixture("john", SessionError::codec("bad payload"));
        assert_eq!(err.to_string(), "fixture 'john' failed: codec error: bad payload");
        assert!(std::error::Error::source(&err).is_some());
    }
}
