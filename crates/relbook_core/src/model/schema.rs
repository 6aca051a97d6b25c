//! Schema descriptors for concrete instantiations of the generic model.
//!
//! A schema only carries names and link shape. Storage and relationship logic
//! is written once against [`Collection`] and reused by every schema.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// One of the three collections held by a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Parent,
    Child,
    Link,
}

impl Collection {
    pub const ALL: [Collection; 3] = [Collection::Parent, Collection::Child, Collection::Link];

    /// Stable lowercase tag used in logs and error codes.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Parent => "parent",
            Self::Child => "child",
            Self::Link => "link",
        }
    }
}

impl Display for Collection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named entity kinds (the collections that carry a `name`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Parent,
    Child,
}

impl From<EntityKind> for Collection {
    fn from(value: EntityKind) -> Self {
        match value {
            EntityKind::Parent => Collection::Parent,
            EntityKind::Child => Collection::Child,
        }
    }
}

/// Static description of one concrete schema.
///
/// Table names are only read by the SQLite store and must match the
/// embedded migrations.
pub trait Schema: Send + Sync + 'static {
    /// Short schema key, e.g. `blog`.
    const KEY: &'static str;

    const PARENT_LABEL: &'static str;
    const CHILD_LABEL: &'static str;
    const LINK_LABEL: &'static str;
    /// Plural link label used as the nested key in denormalized JSON.
    const LINK_PLURAL: &'static str;

    const PARENT_TABLE: &'static str;
    const CHILD_TABLE: &'static str;
    const LINK_TABLE: &'static str;

    /// Whether links carry a free-text payload.
    const LINK_TEXT: bool;

    fn label(collection: Collection) -> &'static str {
        match collection {
            Collection::Parent => Self::PARENT_LABEL,
            Collection::Child => Self::CHILD_LABEL,
            Collection::Link => Self::LINK_LABEL,
        }
    }

    fn table(collection: Collection) -> &'static str {
        match collection {
            Collection::Parent => Self::PARENT_TABLE,
            Collection::Child => Self::CHILD_TABLE,
            Collection::Link => Self::LINK_TABLE,
        }
    }
}

/// Users write posts; comments link a user to a post.
#[derive(Debug, Clone, Copy, Default)]
pub struct Blog;

impl Schema for Blog {
    const KEY: &'static str = "blog";
    const PARENT_LABEL: &'static str = "user";
    const CHILD_LABEL: &'static str = "post";
    const LINK_LABEL: &'static str = "comment";
    const LINK_PLURAL: &'static str = "comments";
    const PARENT_TABLE: &'static str = "blog_users";
    const CHILD_TABLE: &'static str = "blog_posts";
    const LINK_TABLE: &'static str = "blog_comments";
    const LINK_TEXT: bool = true;
}

/// Students enroll in courses.
#[derive(Debug, Clone, Copy, Default)]
pub struct Campus;

impl Schema for Campus {
    const KEY: &'static str = "campus";
    const PARENT_LABEL: &'static str = "student";
    const CHILD_LABEL: &'static str = "course";
    const LINK_LABEL: &'static str = "enrollment";
    const LINK_PLURAL: &'static str = "enrollments";
    const PARENT_TABLE: &'static str = "campus_students";
    const CHILD_TABLE: &'static str = "campus_courses";
    const LINK_TABLE: &'static str = "campus_enrollments";
    const LINK_TEXT: bool = false;
}
