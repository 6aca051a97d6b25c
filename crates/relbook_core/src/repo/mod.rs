//! Store contracts and backend implementations.
//!
//! # Responsibility
//! - Define the pluggable `EntityRepository` contract.
//! - Provide the transient (`memory_repo`) and persisted (`sqlite_repo`)
//!   backends, both driven by the shared `binder` sequences.
//!
//! # Invariants
//! - Every write runs as one exclusive check-then-commit unit.
//! - Listings follow insertion order.
//! - A link is visible from both endpoints or from neither.

pub mod binder;
pub mod error;
pub mod memory_repo;
pub mod registry;
pub mod sqlite_repo;

use crate::model::entity::{Entity, EntityId, Link};
use crate::model::schema::{Collection, EntityKind, Schema};
use std::sync::Arc;

pub use error::{RepoError, RepoResult};

/// Window over an insertion-ordered entity listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntityListQuery {
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Link listing filter plus window.
///
/// Filters combine with AND; `None` means unfiltered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkListQuery {
    pub parent_id: Option<EntityId>,
    pub child_id: Option<EntityId>,
    pub limit: Option<u32>,
    pub offset: u32,
}

impl LinkListQuery {
    fn matches(&self, link: &Link) -> bool {
        self.parent_id.map_or(true, |id| link.parent_id == id)
            && self.child_id.map_or(true, |id| link.child_id == id)
    }
}

/// Exclusive mutation scope handed to the binder.
///
/// Implementations must make all inserts of one scope visible together.
pub trait WriteScope {
    fn contains(&self, collection: Collection, id: EntityId) -> RepoResult<bool>;
    fn insert_entity(&mut self, kind: EntityKind, entity: &Entity) -> RepoResult<()>;
    /// Appends `link` to the link collection and to both endpoints'
    /// back-reference lists. Endpoints are already known to exist.
    fn insert_link(&mut self, link: &Link) -> RepoResult<()>;
}

/// Store contract shared by every backend.
pub trait EntityRepository {
    /// Concrete schema this store is bound to.
    type Schema: Schema;

    /// Validates and inserts a parent or child. Returns the stored record.
    fn create_entity(&self, kind: EntityKind, entity: &Entity) -> RepoResult<Entity>;
    /// Creates a link between existing endpoints.
    fn create_link(&self, link: &Link) -> RepoResult<Link>;
    fn get_entity(&self, kind: EntityKind, id: EntityId) -> RepoResult<Option<Entity>>;
    fn get_link(&self, id: EntityId) -> RepoResult<Option<Link>>;
    fn list_entities(&self, kind: EntityKind, query: &EntityListQuery)
        -> RepoResult<Vec<Entity>>;
    fn list_links(&self, query: &LinkListQuery) -> RepoResult<Vec<Link>>;
    /// Loads an entity and its back-referenced links from one snapshot.
    fn entity_with_links(
        &self,
        kind: EntityKind,
        id: EntityId,
    ) -> RepoResult<Option<(Entity, Vec<Link>)>>;
    fn count(&self, collection: Collection) -> RepoResult<usize>;
}

impl<T: EntityRepository + ?Sized> EntityRepository for &T {
    type Schema = T::Schema;

    fn create_entity(&self, kind: EntityKind, entity: &Entity) -> RepoResult<Entity> {
        (**self).create_entity(kind, entity)
    }

    fn create_link(&self, link: &Link) -> RepoResult<Link> {
        (**self).create_link(link)
    }

    fn get_entity(&self, kind: EntityKind, id: EntityId) -> RepoResult<Option<Entity>> {
        (**self).get_entity(kind, id)
    }

    fn get_link(&self, id: EntityId) -> RepoResult<Option<Link>> {
        (**self).get_link(id)
    }

    fn list_entities(
        &self,
        kind: EntityKind,
        query: &EntityListQuery,
    ) -> RepoResult<Vec<Entity>> {
        (**self).list_entities(kind, query)
    }

    fn list_links(&self, query: &LinkListQuery) -> RepoResult<Vec<Link>> {
        (**self).list_links(query)
    }

    fn entity_with_links(
        &self,
        kind: EntityKind,
        id: EntityId,
    ) -> RepoResult<Option<(Entity, Vec<Link>)>> {
        (**self).entity_with_links(kind, id)
    }

    fn count(&self, collection: Collection) -> RepoResult<usize> {
        (**self).count(collection)
    }
}

impl<T: EntityRepository + ?Sized> EntityRepository for Arc<T> {
    type Schema = T::Schema;

    fn create_entity(&self, kind: EntityKind, entity: &Entity) -> RepoResult<Entity> {
        (**self).create_entity(kind, entity)
    }

    fn create_link(&self, link: &Link) -> RepoResult<Link> {
        (**self).create_link(link)
    }

    fn get_entity(&self, kind: EntityKind, id: EntityId) -> RepoResult<Option<Entity>> {
        (**self).get_entity(kind, id)
    }

    fn get_link(&self, id: EntityId) -> RepoResult<Option<Link>> {
        (**self).get_link(id)
    }

    fn list_entities(
        &self,
        kind: EntityKind,
        query: &EntityListQuery,
    ) -> RepoResult<Vec<Entity>> {
        (**self).list_entities(kind, query)
    }

    fn list_links(&self, query: &LinkListQuery) -> RepoResult<Vec<Link>> {
        (**self).list_links(query)
    }

    fn entity_with_links(
        &self,
        kind: EntityKind,
        id: EntityId,
    ) -> RepoResult<Option<(Entity, Vec<Link>)>> {
        (**self).entity_with_links(kind, id)
    }

    fn count(&self, collection: Collection) -> RepoResult<usize> {
        (**self).count(collection)
    }
}

/// Applies an offset/limit window to an already ordered sequence.
fn window<T>(items: impl Iterator<Item = T>, offset: u32, limit: Option<u32>) -> Vec<T> {
    let skipped = items.skip(offset as usize);
    match limit {
        Some(limit) => skipped.take(limit as usize).collect(),
        None => skipped.collect(),
    }
}
