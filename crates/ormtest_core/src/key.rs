//! Entity identity tuples.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// One component of an identity tuple.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum KeyValue {
    /// Integer component, e.g. an autoincrement column.
    Int(i64),
    /// Text component.
    Text(String),
    /// UUID component.
    Uuid(Uuid),
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Text(v) => write!(f, "'{v}'"),
            Self::Uuid(v) => write!(f, "{v}"),
        }
    }
}

impl From<i64> for KeyValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<&str> for KeyValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_owned())
    }
}

impl From<String> for KeyValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<Uuid> for KeyValue {
    fn from(v: Uuid) -> Self {
        Self::Uuid(v)
    }
}

/// Identity of a persisted entity.
///
/// A key is an ordered tuple of one or more components, mirroring a primary
/// key. Transient entities carry no key; the session assigns one at commit.
///
/// # Example
///
/// ```rust
/// use ormtest_core::EntityKey;
///
/// let simple = EntityKey::from(1);
/// let composite = EntityKey::composite(["tenant-a".into(), 42i64.into()]);
/// assert_ne!(simple, composite);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityKey(Vec<KeyValue>);

impl EntityKey {
    /// Creates a single-component key.
    #[must_use]
    pub fn single(part: impl Into<KeyValue>) -> Self {
        Self(vec![part.into()])
    }

    /// Creates a composite key from components in order.
    #[must_use]
    pub fn composite(parts: impl IntoIterator<Item = KeyValue>) -> Self {
        Self(parts.into_iter().collect())
    }

    /// Returns the key components in order.
    #[must_use]
    pub fn parts(&self) -> &[KeyValue] {
        &self.0
    }

    /// Returns the number of components.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Checks whether the key has no components.
    ///
    /// Empty keys never identify anything; sessions reject them.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.as_slice() {
            [single] => write!(f, "{single}"),
            parts => {
                write!(f, "(")?;
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{part}")?;
                }
                write!(f, ")")
            }
        }
    }
}

impl From<i64> for EntityKey {
    fn from(part: i64) -> Self {
        Self::single(part)
    }
}

impl From<&str> for EntityKey {
    fn from(part: &str) -> Self {
        Self::single(part)
    }
}

impl From<String> for EntityKey {
    fn from(part: String) -> Self {
        Self::single(part)
    }
}

impl From<Uuid> for EntityKey {
    fn from(part: Uuid) -> Self {
        Self::single(part)
    }
}
