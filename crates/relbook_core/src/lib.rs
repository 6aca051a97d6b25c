//! Core relational entity store for relbook.
//! This crate is the single source of truth for uniqueness and
//! referential-integrity invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, CoreConfig};
pub use logging::{default_log_level, init_logging, logging_status, LogTarget, LoggingError};
pub use model::entity::{Entity, EntityId, EntityView, Link, ValidationError};
pub use model::schema::{Blog, Campus, Collection, EntityKind, Schema};
pub use repo::memory_repo::MemoryEntityRepository;
pub use repo::sqlite_repo::SqliteEntityRepository;
pub use repo::{EntityListQuery, EntityRepository, LinkListQuery, RepoError, RepoResult};
pub use service::entity_service::EntityService;
pub use service::query::{labeled_json, Page, PageRequest};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
