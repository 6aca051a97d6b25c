//! Check-then-commit sequences shared by every store backend.
//!
//! # Responsibility
//! - Create named entities with uniqueness and blank-name checks.
//! - Create links with existence checks on both endpoints.
//!
//! # Invariants
//! - Checks run in a fixed order so error reporting is deterministic:
//!   entity id, then name; link id, parent, child, then link text.
//! - A used id is always reported as `AlreadyExists`.
//! - A failed check performs zero mutation.
//! - Callers hand in a `WriteScope` that is already exclusive (write lock
//!   or immediate transaction) and commit only on `Ok`.

use crate::model::entity::{Entity, Link, ValidationError};
use crate::model::schema::{Collection, EntityKind, Schema};
use crate::repo::error::{RepoError, RepoResult};
use crate::repo::WriteScope;

/// Checks and inserts one entity into its collection, name untouched.
pub fn bind_entity<W: WriteScope + ?Sized>(
    scope: &mut W,
    kind: EntityKind,
    entity: &Entity,
) -> RepoResult<Entity> {
    let collection = Collection::from(kind);
    if scope.contains(collection, entity.id)? {
        return Err(RepoError::AlreadyExists {
            collection,
            id: entity.id,
        });
    }
    entity.validate(kind)?;
    scope.insert_entity(kind, entity)?;
    Ok(entity.clone())
}

/// Inserts one link and registers it with both endpoints.
pub fn bind_link<S: Schema, W: WriteScope + ?Sized>(
    scope: &mut W,
    link: &Link,
) -> RepoResult<Link> {
    if scope.contains(Collection::Link, link.id)? {
        return Err(RepoError::AlreadyExists {
            collection: Collection::Link,
            id: link.id,
        });
    }
    if !scope.contains(Collection::Parent, link.parent_id)? {
        return Err(RepoError::ParentNotFound(link.parent_id));
    }
    if !scope.contains(Collection::Child, link.child_id)? {
        return Err(RepoError::ChildNotFound(link.child_id));
    }
    if link.text.is_some() && !S::LINK_TEXT {
        return Err(ValidationError::LinkTextUnsupported { id: link.id }.into());
    }
    scope.insert_link(link)?;
    Ok(link.clone())
}
