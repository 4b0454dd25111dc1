//! Typed entities and their type-erased records.

use crate::error::{SessionError, SessionResult};
use crate::key::EntityKey;
use crate::types::EntityType;
use serde::Serialize;
use std::fmt;

/// A domain object persistable through a session.
///
/// Implementors declare their type name and, optionally, a natural identity.
/// Field values are captured as a canonical CBOR image; two entities have
/// equal fields exactly when their images are byte-equal.
///
/// # Example
///
/// ```rust
/// use ormtest_core::Entity;
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
/// let record = User { name: "john".into() }.to_record().unwrap();
/// assert_eq!(record.entity_type.as_str(), "users");
/// assert!(record.key.is_none());
/// ```
pub trait Entity: Serialize {
    /// Stable name of the entity type.
    const TYPE: &'static str;

    /// Returns the entity type descriptor.
    #[must_use]
    fn entity_type() -> EntityType
    where
        Self: Sized,
    {
        EntityType::new(Self::TYPE)
    }

    /// Natural identity of this instance, if it carries one.
    ///
    /// Transient entities return `None` and receive an identity at commit.
    fn key(&self) -> Option<EntityKey> {
        None
    }

    /// Encodes this entity into a type-erased record.
    fn to_record(&self) -> SessionResult<EntityRecord>
    where
        Self: Sized,
    {
        Ok(EntityRecord {
            entity_type: Self::entity_type(),
            key: self.key(),
            payload: encode_image(self)?,
        })
    }
}

/// Encodes a serializable value into a canonical field image.
pub fn encode_image<T: Serialize>(value: &T) -> SessionResult<Vec<u8>> {
    let mut buf = Vec::new();
    ciborium::ser::into_writer(value, &mut buf).map_err(|e| SessionError::codec(e.to_string()))?;
    Ok(buf)
}

/// A type-erased entity pending registration with a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityRecord {
    /// Entity type the record belongs to.
    pub entity_type: EntityType,
    /// Identity, or `None` for a transient record (assigned at commit).
    pub key: Option<EntityKey>,
    /// Canonical field image.
    pub payload: Vec<u8>,
}

impl EntityRecord {
    /// Creates a transient record; the session assigns the identity at commit.
    #[must_use]
    pub fn transient(entity_type: EntityType, payload: Vec<u8>) -> Self {
        Self {
            entity_type,
            key: None,
            payload,
        }
    }

    /// Creates a record with a known identity (insert-or-update).
    #[must_use]
    pub fn keyed(entity_type: EntityType, key: EntityKey, payload: Vec<u8>) -> Self {
        Self {
            entity_type,
            key: Some(key),
            payload,
        }
    }
}

/// A persisted identity: entity type plus assigned key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityRef {
    /// Entity type.
    pub entity_type: EntityType,
    /// Assigned identity.
    pub key: EntityKey,
}

impl EntityRef {
    /// Creates an entity reference.
    #[must_use]
    pub fn new(entity_type: EntityType, key: EntityKey) -> Self {
        Self { entity_type, key }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.entity_type, self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Serialize)]
    struct User {
        name: String,
    }

    impl Entity for User {
        const TYPE: &'static str = "users";
    }

    #[derive(Serialize)]
    struct Tag {
        label: String,
    }

    impl Entity for Tag {
        const TYPE: &'static str = "tags";

        fn key(&self) -> Option<EntityKey> {
            Some(EntityKey::from(self.label.as_str()))
        }
    }

    #[test]
    fn transient_record_has_no_key() {
        let record = User {
            name: "john".into(),
        }
        .to_record()
        .unwrap();
        assert_eq!(record.entity_type, EntityType::new("users"));
        assert!(record.key.is_none());
        assert!(!record.payload.is_empty());
    }

    #[test]
    fn natural_key_is_carried() {
        let record = Tag {
            label: "urgent".into(),
        }
        .to_record()
        .unwrap();
        assert_eq!(record.key, Some(EntityKey::from("urgent")));
    }

    #[test]
    fn equal_fields_encode_to_equal_images() {
        let a = encode_image(&User {
            name: "john".into(),
        })
        .unwrap();
        let b = encode_image(&User {
            name: "john".into(),
        })
        .unwrap();
        let c = encode_image(&User {
            name: "jane".into(),
        })
        .unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn entity_ref_display() {
        let r = EntityRef::new(EntityType::new("users"), EntityKey::from(1));
        assert_eq!(format!("{r}"), "users[1]");
    }
}
