//! Generic relational domain model.
//!
//! # Responsibility
//! - Define the Parent/Child/Link record shapes shared by every schema.
//! - Describe concrete schemas (`Blog`, `Campus`) as labels over one model.
//!
//! # Invariants
//! - Every record is identified by a caller-assigned `EntityId`, unique
//!   within its own collection.
//! - Records are append-only: no update or delete exists in the model.

pub mod entity;
pub mod schema;
