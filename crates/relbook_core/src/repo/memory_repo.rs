//! Transient in-memory store.
//!
//! # Responsibility
//! - Hold the three collections in index-addressed arenas.
//! - Serialize writers behind one lock; let readers share it.
//!
//! # Invariants
//! - Rows are only ever appended; a slot index stays valid for the store's
//!   lifetime.
//! - Parent/Child rows hold link slot indices, never link copies.
//! - A link's three appends (link arena, parent row, child row) happen
//!   under one write guard.

use crate::model::entity::{Entity, EntityId, Link};
use crate::model::schema::{Collection, EntityKind, Schema};
use crate::repo::binder::{bind_entity, bind_link};
use crate::repo::registry::IdentityRegistry;
use crate::repo::{
    window, EntityListQuery, EntityRepository, LinkListQuery, RepoError, RepoResult, WriteScope,
};
use log::debug;
use std::marker::PhantomData;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Clone)]
struct EntityRow {
    entity: Entity,
    link_slots: Vec<usize>,
}

#[derive(Debug, Clone)]
struct Table<T> {
    rows: Vec<T>,
    registry: IdentityRegistry,
}

impl<T> Table<T> {
    fn new(collection: Collection) -> Self {
        Self {
            rows: Vec::new(),
            registry: IdentityRegistry::new(collection),
        }
    }

    /// Reserves `id` and appends `row` as one step.
    fn insert(&mut self, id: EntityId, row: T) -> RepoResult<usize> {
        let slot = self.rows.len();
        self.registry.reserve(id, slot)?;
        self.rows.push(row);
        Ok(slot)
    }

    fn get(&self, id: EntityId) -> Option<&T> {
        self.registry.slot(id).and_then(|slot| self.rows.get(slot))
    }
}

#[derive(Debug, Clone)]
struct Tables {
    parents: Table<EntityRow>,
    children: Table<EntityRow>,
    links: Table<Link>,
}

impl Tables {
    fn new() -> Self {
        Self {
            parents: Table::new(Collection::Parent),
            children: Table::new(Collection::Child),
            links: Table::new(Collection::Link),
        }
    }

    fn entities(&self, kind: EntityKind) -> &Table<EntityRow> {
        match kind {
            EntityKind::Parent => &self.parents,
            EntityKind::Child => &self.children,
        }
    }

    fn entities_mut(&mut self, kind: EntityKind) -> &mut Table<EntityRow> {
        match kind {
            EntityKind::Parent => &mut self.parents,
            EntityKind::Child => &mut self.children,
        }
    }

    fn registry(&self, collection: Collection) -> &IdentityRegistry {
        match collection {
            Collection::Parent => &self.parents.registry,
            Collection::Child => &self.children.registry,
            Collection::Link => &self.links.registry,
        }
    }

    fn links_at(&self, slots: &[usize]) -> RepoResult<Vec<Link>> {
        slots
            .iter()
            .map(|slot| {
                self.links.rows.get(*slot).cloned().ok_or_else(|| {
                    RepoError::InvalidData(format!("dangling link slot {slot}"))
                })
            })
            .collect()
    }
}

impl WriteScope for Tables {
    fn contains(&self, collection: Collection, id: EntityId) -> RepoResult<bool> {
        Ok(self.registry(collection).contains(id))
    }

    fn insert_entity(&mut self, kind: EntityKind, entity: &Entity) -> RepoResult<()> {
        let row = EntityRow {
            entity: entity.clone(),
            link_slots: Vec::new(),
        };
        self.entities_mut(kind).insert(entity.id, row)?;
        Ok(())
    }

    fn insert_link(&mut self, link: &Link) -> RepoResult<()> {
        // Resolve both endpoints before touching anything.
        let parent_slot = self
            .parents
            .registry
            .slot(link.parent_id)
            .ok_or(RepoError::ParentNotFound(link.parent_id))?;
        let child_slot = self
            .children
            .registry
            .slot(link.child_id)
            .ok_or(RepoError::ChildNotFound(link.child_id))?;

        let link_slot = self.links.insert(link.id, link.clone())?;
        self.parents.rows[parent_slot].link_slots.push(link_slot);
        self.children.rows[child_slot].link_slots.push(link_slot);
        Ok(())
    }
}

/// In-memory store for one schema.
///
/// Share it between threads through `Arc`; all methods take `&self`.
pub struct MemoryEntityRepository<S: Schema> {
    tables: RwLock<Tables>,
    _schema: PhantomData<fn() -> S>,
}

impl<S: Schema> Default for MemoryEntityRepository<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Schema> MemoryEntityRepository<S> {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::new()),
            _schema: PhantomData,
        }
    }

    fn read(&self) -> RepoResult<RwLockReadGuard<'_, Tables>> {
        self.tables.read().map_err(|_| RepoError::LockPoisoned)
    }

    fn write(&self) -> RepoResult<RwLockWriteGuard<'_, Tables>> {
        self.tables.write().map_err(|_| RepoError::LockPoisoned)
    }
}

impl<S: Schema> EntityRepository for MemoryEntityRepository<S> {
    type Schema = S;

    fn create_entity(&self, kind: EntityKind, entity: &Entity) -> RepoResult<Entity> {
        let mut tables = self.write()?;
        let stored = bind_entity(&mut *tables, kind, entity)?;
        debug!(
            "event=entity_insert module=memory_repo schema={} collection={} id={}",
            S::KEY,
            S::label(kind.into()),
            stored.id
        );
        Ok(stored)
    }

    fn create_link(&self, link: &Link) -> RepoResult<Link> {
        let mut tables = self.write()?;
        let stored = bind_link::<S, _>(&mut *tables, link)?;
        debug!(
            "event=link_insert module=memory_repo schema={} id={} parent_id={} child_id={}",
            S::KEY,
            stored.id,
            stored.parent_id,
            stored.child_id
        );
        Ok(stored)
    }

    fn get_entity(&self, kind: EntityKind, id: EntityId) -> RepoResult<Option<Entity>> {
        let tables = self.read()?;
        Ok(tables.entities(kind).get(id).map(|row| row.entity.clone()))
    }

    fn get_link(&self, id: EntityId) -> RepoResult<Option<Link>> {
        let tables = self.read()?;
        Ok(tables.links.get(id).cloned())
    }

    fn list_entities(
        &self,
        kind: EntityKind,
        query: &EntityListQuery,
    ) -> RepoResult<Vec<Entity>> {
        let tables = self.read()?;
        let rows = tables.entities(kind).rows.iter();
        Ok(window(
            rows.map(|row| row.entity.clone()),
            query.offset,
            query.limit,
        ))
    }

    fn list_links(&self, query: &LinkListQuery) -> RepoResult<Vec<Link>> {
        let tables = self.read()?;
        // Walk back-references when a filter names an endpoint; an unknown
        // endpoint simply has no links.
        let candidates = match (query.parent_id, query.child_id) {
            (Some(parent_id), _) => match tables.parents.get(parent_id) {
                Some(row) => tables.links_at(&row.link_slots)?,
                None => Vec::new(),
            },
            (None, Some(child_id)) => match tables.children.get(child_id) {
                Some(row) => tables.links_at(&row.link_slots)?,
                None => Vec::new(),
            },
            (None, None) => tables.links.rows.clone(),
        };
        Ok(window(
            candidates.into_iter().filter(|link| query.matches(link)),
            query.offset,
            query.limit,
        ))
    }

    fn entity_with_links(
        &self,
        kind: EntityKind,
        id: EntityId,
    ) -> RepoResult<Option<(Entity, Vec<Link>)>> {
        let tables = self.read()?;
        match tables.entities(kind).get(id) {
            Some(row) => {
                let links = tables.links_at(&row.link_slots)?;
                Ok(Some((row.entity.clone(), links)))
            }
            None => Ok(None),
        }
    }

    fn count(&self, collection: Collection) -> RepoResult<usize> {
        let tables = self.read()?;
        Ok(tables.registry(collection).len())
    }
}
