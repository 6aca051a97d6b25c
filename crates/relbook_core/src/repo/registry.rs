//! Identity registry: per-collection primary-key reservation.
//!
//! The registry maps each reserved id to the arena slot holding its row.
//! Reservation never happens on its own; the owning table reserves and
//! stores in the same `&mut` step, so a duplicate can never slip between
//! the check and the insert.

use crate::model::entity::EntityId;
use crate::model::schema::Collection;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// `id` is already reserved in `collection`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlreadyExists {
    pub collection: Collection,
    pub id: EntityId,
}

impl Display for AlreadyExists {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} id {} already exists", self.collection, self.id)
    }
}

impl Error for AlreadyExists {}

#[derive(Debug, Clone)]
pub struct IdentityRegistry {
    collection: Collection,
    slots: HashMap<EntityId, usize>,
}

impl IdentityRegistry {
    pub fn new(collection: Collection) -> Self {
        Self {
            collection,
            slots: HashMap::new(),
        }
    }

    /// Reserves `id` for `slot`. Fails without mutation if `id` is taken.
    pub fn reserve(&mut self, id: EntityId, slot: usize) -> Result<(), AlreadyExists> {
        if self.slots.contains_key(&id) {
            return Err(AlreadyExists {
                collection: self.collection,
                id,
            });
        }
        self.slots.insert(id, slot);
        Ok(())
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.slots.contains_key(&id)
    }

    pub fn slot(&self, id: EntityId) -> Option<usize> {
        self.slots.get(&id).copied()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
