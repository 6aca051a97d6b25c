//! Store error taxonomy.
//!
//! Caller-correctable failures (`AlreadyExists`, `ParentNotFound`,
//! `ChildNotFound`, `Validation`) are distinct from storage faults so the
//! outer layer can map each kind to exactly one user-visible signal.

use crate::db::DbError;
use crate::model::entity::{EntityId, ValidationError};
use crate::model::schema::Collection;
use crate::repo::registry::AlreadyExists;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

#[derive(Debug)]
pub enum RepoError {
    /// Entity name rejected before any storage access.
    Validation(ValidationError),
    /// `id` is already taken in `collection`.
    AlreadyExists {
        collection: Collection,
        id: EntityId,
    },
    /// Link references a parent that does not exist.
    ParentNotFound(EntityId),
    /// Link references a child that does not exist.
    ChildNotFound(EntityId),
    Db(DbError),
    /// Connection schema is not at the version this binary expects.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    InvalidData(String),
    /// A writer panicked while holding the in-memory store lock.
    LockPoisoned,
}

impl RepoError {
    /// Stable machine-readable code, one per error kind.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "invalid_record",
            Self::AlreadyExists { .. } => "already_exists",
            Self::ParentNotFound(_) => "parent_not_found",
            Self::ChildNotFound(_) => "child_not_found",
            Self::Db(_) => "db_error",
            Self::UninitializedConnection { .. } => "uninitialized_connection",
            Self::MissingRequiredTable(_) => "missing_required_table",
            Self::InvalidData(_) => "invalid_data",
            Self::LockPoisoned => "lock_poisoned",
        }
    }

    /// Whether the caller can fix the request and retry.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Self::Validation(_)
                | Self::AlreadyExists { .. }
                | Self::ParentNotFound(_)
                | Self::ChildNotFound(_)
        )
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::AlreadyExists { collection, id } => {
                write!(f, "{collection} id {id} already exists")
            }
            Self::ParentNotFound(id) => write!(f, "parent not found: {id}"),
            Self::ChildNotFound(id) => write!(f, "child not found: {id}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "store requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "store requires table `{table}`")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::LockPoisoned => write!(f, "store lock poisoned by a panicked writer"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<AlreadyExists> for RepoError {
    fn from(value: AlreadyExists) -> Self {
        Self::AlreadyExists {
            collection: value.collection,
            id: value.id,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

#[cfg(test)]
mod tests {
    use super::RepoError;
    use crate::model::schema::Collection;
    use std::collections::HashSet;

    #[test]
    fn codes_are_distinct_per_kind() {
        let errors = [
            RepoError::AlreadyExists {
                collection: Collection::Link,
                id: 1,
            },
            RepoError::ParentNotFound(1),
            RepoError::ChildNotFound(1),
            RepoError::MissingRequiredTable("t"),
            RepoError::InvalidData(String::new()),
            RepoError::LockPoisoned,
        ];
        let codes: HashSet<_> = errors.iter().map(RepoError::code).collect();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn only_input_errors_are_caller_errors() {
        assert!(RepoError::ParentNotFound(4).is_caller_error());
        assert!(!RepoError::LockPoisoned.is_caller_error());
    }
}
