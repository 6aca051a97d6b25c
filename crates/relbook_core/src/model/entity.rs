//! Entity and link records.
//!
//! # Responsibility
//! - Define the canonical Parent/Child record (`Entity`) and the `Link`
//!   association between them.
//! - Reject records a store must never hold (blank names, link text on a
//!   schema without it).
//!
//! # Invariants
//! - `Entity::name` is stored exactly as the caller gave it.
//! - A `Link` is immutable after creation.

use crate::model::schema::EntityKind;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Caller-assigned identifier, unique within one collection.
pub type EntityId = i64;

/// A named Parent or Child record.
///
/// Back-references are not part of this shape; they are exposed through
/// [`EntityView`] by the query layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub name: String,
}

impl Entity {
    pub fn new(id: EntityId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    /// Checks that the name is not blank. The name itself is never rewritten.
    pub fn validate(&self, kind: EntityKind) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName { kind, id: self.id });
        }
        Ok(())
    }
}

/// Association between one Parent and one Child.
///
/// `text` is the optional payload some schemas attach to a link (a blog
/// comment body). It is omitted from JSON when absent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Link {
    pub id: EntityId,
    pub parent_id: EntityId,
    pub child_id: EntityId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Link {
    pub fn new(id: EntityId, parent_id: EntityId, child_id: EntityId) -> Self {
        Self {
            id,
            parent_id,
            child_id,
            text: None,
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }
}

/// Denormalized read shape: an entity plus the links it participates in,
/// in link creation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityView {
    pub id: EntityId,
    pub name: String,
    pub links: Vec<Link>,
}

/// Record shape failures, reported before anything is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    EmptyName { kind: EntityKind, id: EntityId },
    LinkTextUnsupported { id: EntityId },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName { kind, id } => {
                write!(f, "{} {id}: name must not be blank", kind_label(*kind))
            }
            Self::LinkTextUnsupported { id } => {
                write!(f, "link {id}: this schema does not store link text")
            }
        }
    }
}

impl Error for ValidationError {}

fn kind_label(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Parent => "parent",
        EntityKind::Child => "child",
    }
}
