//! Read-side shapes: pagination windows and denormalized views.
//!
//! # Invariants
//! - A page past the end is an empty page, never an error.
//! - Denormalized views nest link records only, not the far endpoint.

use crate::model::entity::{Entity, EntityView, Link};
use crate::model::schema::Schema;
use crate::repo::{EntityListQuery, LinkListQuery};
use serde::Serialize;
use serde_json::{json, Value};

pub const DEFAULT_PER_PAGE: u32 = 5;

/// 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    per_page: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl PageRequest {
    /// Builds a request from raw caller values.
    ///
    /// `page < 1` reads as the first page; `per_page < 1` falls back to
    /// `default_per_page`. Any `per_page >= 1` is honored as given.
    pub fn from_params(page: Option<i64>, per_page: Option<i64>, default_per_page: u32) -> Self {
        let page = match page {
            Some(value) if value >= 1 => u32::try_from(value).unwrap_or(u32::MAX),
            _ => 1,
        };
        let per_page = match per_page {
            Some(value) if value >= 1 => u32::try_from(value).unwrap_or(u32::MAX),
            _ => default_per_page.max(1),
        };
        Self { page, per_page }
    }

    pub fn new(page: u32, per_page: u32) -> Self {
        Self::from_params(
            Some(i64::from(page)),
            Some(i64::from(per_page)),
            DEFAULT_PER_PAGE,
        )
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn per_page(&self) -> u32 {
        self.per_page
    }

    /// Row offset of the first item; saturates for absurd page numbers.
    pub fn offset(&self) -> u32 {
        (self.page - 1).saturating_mul(self.per_page)
    }

    pub fn entity_query(&self) -> EntityListQuery {
        EntityListQuery {
            limit: Some(self.per_page),
            offset: self.offset(),
        }
    }

    pub fn link_query(&self, base: LinkListQuery) -> LinkListQuery {
        LinkListQuery {
            limit: Some(self.per_page),
            offset: self.offset(),
            ..base
        }
    }
}

/// One page of results plus the applied window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub per_page: u32,
}

impl<T> Page<T> {
    pub fn new(request: PageRequest, items: Vec<T>) -> Self {
        Self {
            items,
            page: request.page(),
            per_page: request.per_page(),
        }
    }
}

/// Joins an entity with the links it participates in.
pub fn denormalize(entity: Entity, links: Vec<Link>) -> EntityView {
    EntityView {
        id: entity.id,
        name: entity.name,
        links,
    }
}

/// Renders a view with the nested key named after the schema's links,
/// e.g. `{"id":1,"name":"Ada","comments":[...]}`.
pub fn labeled_json<S: Schema>(view: &EntityView) -> Value {
    let mut object = serde_json::Map::new();
    object.insert("id".to_string(), json!(view.id));
    object.insert("name".to_string(), json!(view.name));
    object.insert(S::LINK_PLURAL.to_string(), json!(view.links));
    Value::Object(object)
}
