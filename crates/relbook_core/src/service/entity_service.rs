//! Entity use-case service.
//!
//! # Responsibility
//! - Provide create/read entry points for parents, children and links.
//! - Expose the read façade: list-all, paginate, filter, denormalize.
//! - Emit metadata-only diagnostics for every command.
//!
//! # Invariants
//! - Service APIs never bypass repository checks.
//! - Reads never mutate; a page past the end is empty.

use crate::model::entity::{Entity, EntityId, EntityView, Link};
use crate::model::schema::{Collection, EntityKind, Schema};
use crate::repo::{EntityListQuery, EntityRepository, LinkListQuery, RepoError, RepoResult};
use crate::service::query::{denormalize, Page, PageRequest};
use log::{error, info, warn};
use std::time::Instant;

/// Use-case service over one store.
pub struct EntityService<R: EntityRepository> {
    repo: R,
}

impl<R: EntityRepository> EntityService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates a parent with an empty link list.
    pub fn create_parent(&self, id: EntityId, name: impl Into<String>) -> RepoResult<Entity> {
        self.create_entity(EntityKind::Parent, Entity::new(id, name))
    }

    /// Creates a child with an empty link list.
    pub fn create_child(&self, id: EntityId, name: impl Into<String>) -> RepoResult<Entity> {
        self.create_entity(EntityKind::Child, Entity::new(id, name))
    }

    /// Links an existing parent to an existing child.
    ///
    /// Error precedence: `AlreadyExists`, then `ParentNotFound`, then
    /// `ChildNotFound`.
    pub fn create_link(
        &self,
        id: EntityId,
        parent_id: EntityId,
        child_id: EntityId,
    ) -> RepoResult<Link> {
        self.bind_link(Link::new(id, parent_id, child_id))
    }

    /// Links a parent to a child and attaches `text` to the link.
    ///
    /// Only schemas whose links carry text accept this; the text check runs
    /// after the endpoint checks.
    pub fn create_link_with_text(
        &self,
        id: EntityId,
        parent_id: EntityId,
        child_id: EntityId,
        text: impl Into<String>,
    ) -> RepoResult<Link> {
        self.bind_link(Link::new(id, parent_id, child_id).with_text(text))
    }

    pub fn get_parent(&self, id: EntityId) -> RepoResult<Option<Entity>> {
        self.repo.get_entity(EntityKind::Parent, id)
    }

    pub fn get_child(&self, id: EntityId) -> RepoResult<Option<Entity>> {
        self.repo.get_entity(EntityKind::Child, id)
    }

    pub fn get_link(&self, id: EntityId) -> RepoResult<Option<Link>> {
        self.repo.get_link(id)
    }

    /// All parents in insertion order, as of the call.
    pub fn list_parents(&self) -> RepoResult<Vec<Entity>> {
        self.repo.list_entities(EntityKind::Parent, &EntityListQuery::default())
    }

    /// All children in insertion order, as of the call.
    pub fn list_children(&self) -> RepoResult<Vec<Entity>> {
        self.repo.list_entities(EntityKind::Child, &EntityListQuery::default())
    }

    /// All links in insertion order, as of the call.
    pub fn list_links(&self) -> RepoResult<Vec<Link>> {
        self.repo.list_links(&LinkListQuery::default())
    }

    pub fn paginate_parents(&self, request: PageRequest) -> RepoResult<Page<Entity>> {
        self.paginate_entities(EntityKind::Parent, request)
    }

    pub fn paginate_children(&self, request: PageRequest) -> RepoResult<Page<Entity>> {
        self.paginate_entities(EntityKind::Child, request)
    }

    /// Paginates links, optionally restricted by endpoint filters.
    pub fn paginate_links(
        &self,
        filter: LinkListQuery,
        request: PageRequest,
    ) -> RepoResult<Page<Link>> {
        let items = self.repo.list_links(&request.link_query(filter))?;
        Ok(Page::new(request, items))
    }

    /// Links of one parent, or every link when `parent_id` is `None`.
    ///
    /// An unknown parent yields an empty list.
    pub fn filter_links_by_parent(&self, parent_id: Option<EntityId>) -> RepoResult<Vec<Link>> {
        self.repo.list_links(&LinkListQuery {
            parent_id,
            ..LinkListQuery::default()
        })
    }

    /// Links of one child, or every link when `child_id` is `None`.
    pub fn filter_links_by_child(&self, child_id: Option<EntityId>) -> RepoResult<Vec<Link>> {
        self.repo.list_links(&LinkListQuery {
            child_id,
            ..LinkListQuery::default()
        })
    }

    /// Parent plus its links, or `None` when the parent does not exist.
    pub fn denormalize_parent(&self, id: EntityId) -> RepoResult<Option<EntityView>> {
        self.denormalize(EntityKind::Parent, id)
    }

    /// Child plus its links, or `None` when the child does not exist.
    pub fn denormalize_child(&self, id: EntityId) -> RepoResult<Option<EntityView>> {
        self.denormalize(EntityKind::Child, id)
    }

    pub fn count(&self, collection: Collection) -> RepoResult<usize> {
        self.repo.count(collection)
    }

    fn create_entity(&self, kind: EntityKind, entity: Entity) -> RepoResult<Entity> {
        let started_at = Instant::now();
        let result = self.repo.create_entity(kind, &entity);
        log_command::<R::Schema, _>(kind.into(), entity.id, started_at, &result);
        result
    }

    fn bind_link(&self, link: Link) -> RepoResult<Link> {
        let started_at = Instant::now();
        let result = self.repo.create_link(&link);
        log_command::<R::Schema, _>(Collection::Link, link.id, started_at, &result);
        result
    }

    fn paginate_entities(
        &self,
        kind: EntityKind,
        request: PageRequest,
    ) -> RepoResult<Page<Entity>> {
        let items = self.repo.list_entities(kind, &request.entity_query())?;
        Ok(Page::new(request, items))
    }

    fn denormalize(&self, kind: EntityKind, id: EntityId) -> RepoResult<Option<EntityView>> {
        Ok(self
            .repo
            .entity_with_links(kind, id)?
            .map(|(entity, links)| denormalize(entity, links)))
    }
}

fn log_command<S: Schema, T>(
    collection: Collection,
    id: EntityId,
    started_at: Instant,
    result: &Result<T, RepoError>,
) {
    let duration_ms = started_at.elapsed().as_millis();
    match result {
        Ok(_) => info!(
            "event=create module=service status=ok schema={} collection={} id={id} duration_ms={duration_ms}",
            S::KEY,
            S::label(collection)
        ),
        Err(err) if err.is_caller_error() => warn!(
            "event=create module=service status=rejected schema={} collection={} id={id} duration_ms={duration_ms} error_code={}",
            S::KEY,
            S::label(collection),
            err.code()
        ),
        Err(err) => error!(
            "event=create module=service status=error schema={} collection={} id={id} duration_ms={duration_ms} error_code={} error={err}",
            S::KEY,
            S::label(collection),
            err.code()
        ),
    }
}
