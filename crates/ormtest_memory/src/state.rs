//! Internal session state.

use ormtest_core::{
    EntityKey, EntityRecord, EntityRef, EntityType, SessionError, SessionResult, TypeSnapshot,
};
use std::collections::{BTreeMap, BTreeSet};

/// A pending, not yet committed operation.
#[derive(Debug, Clone)]
pub(crate) enum PendingOp {
    /// Insert or update an entity.
    Add(EntityRecord),
    /// Delete a persisted entity.
    Delete(EntityType, EntityKey),
}

/// Committed rows plus identity-assignment state.
#[derive(Debug, Clone)]
pub(crate) struct CommittedState {
    /// Entity type to identity to field image.
    pub rows: BTreeMap<EntityType, TypeSnapshot>,
    /// Every type that has ever had committed rows.
    pub seen_types: BTreeSet<EntityType>,
    /// Next auto-assigned integer identity.
    pub next_key: i64,
}

impl CommittedState {
    pub(crate) fn new(first_key: i64) -> Self {
        Self {
            rows: BTreeMap::new(),
            seen_types: BTreeSet::new(),
            next_key: first_key,
        }
    }

    /// Applies pending operations in order.
    ///
    /// Callers apply onto a scratch clone and swap it in on success, so a
    /// failed batch leaves the committed state untouched.
    pub(crate) fn apply(
        &mut self,
        ops: &[PendingOp],
        strict_delete: bool,
    ) -> SessionResult<Vec<EntityRef>> {
        let mut flushed = Vec::new();
        for op in ops {
            match op {
                PendingOp::Add(record) => {
                    let key = match &record.key {
                        Some(key) if key.is_empty() => {
                            return Err(SessionError::invalid_operation(format!(
                                "empty identity for {} record",
                                record.entity_type
                            )));
                        }
                        Some(key) => key.clone(),
                        None => {
                            let key = EntityKey::from(self.next_key);
                            self.next_key += 1;
                            key
                        }
                    };
                    self.seen_types.insert(record.entity_type.clone());
                    self.rows
                        .entry(record.entity_type.clone())
                        .or_default()
                        .insert(key.clone(), record.payload.clone());
                    flushed.push(EntityRef::new(record.entity_type.clone(), key));
                }
                PendingOp::Delete(entity_type, key) => {
                    let removed = self
                        .rows
                        .get_mut(entity_type)
                        .and_then(|rows| rows.remove(key));
                    if removed.is_none() && strict_delete {
                        return Err(SessionError::no_such_entity(
                            entity_type.clone(),
                            key.clone(),
                        ));
                    }
                }
            }
        }
        Ok(flushed)
    }
}
