//! Storage collaborators for catalog, people and dose history.
//!
//! # Responsibility
//! - Define the narrow lookup/store contracts the validator and projector
//!   read through (`CatalogLookup`, `PersonLookup`, `HistoryStore`).
//! - Keep SQL inside SQLite-backed implementations.
//!
//! # Invariants
//! - Write paths validate models before SQL mutations.
//! - Unique-key violations surface as `RepoError::ConstraintViolation`,
//!   never as opaque DB errors.
//! - A corrupt stored allowed-dose set is recovered, not reported.

use crate::db::DbError;
use crate::model::ModelValidationError;
use rusqlite::ffi;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub mod person_repo;
pub mod record_repo;
pub mod vaccine_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Entity kinds addressed by repositories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Person,
    Vaccine,
    DoseRecord,
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Person => f.write_str("person"),
            Self::Vaccine => f.write_str("vaccine"),
            Self::DoseRecord => f.write_str("dose record"),
        }
    }
}

#[derive(Debug)]
pub enum RepoError {
    Validation(ModelValidationError),
    Db(DbError),
    NotFound { entity: EntityKind, id: Uuid },
    /// A unique constraint rejected the write.
    ConstraintViolation(String),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::ConstraintViolation(details) => write!(f, "constraint violation: {details}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound { .. } | Self::ConstraintViolation(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<ModelValidationError> for RepoError {
    fn from(value: ModelValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::SqliteFailure(err, message)
                if err.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
                    || err.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
            {
                Self::ConstraintViolation(message.unwrap_or_else(|| err.to_string()))
            }
            other => Self::Db(DbError::Sqlite(other)),
        }
    }
}

pub(crate) fn parse_uuid(value: &str, column: &'static str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}
