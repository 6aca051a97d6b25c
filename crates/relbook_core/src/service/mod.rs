//! Use-case services and read-side views.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep callers decoupled from storage backends.

pub mod entity_service;
pub mod query;
