//! Catalog-layer errors, combined into one crate-level [`CatalogError`] the
//! way the teacher combines `TableError`/`IndexError`/... into `DBError`
//! (`core/src/error.rs`).

use thiserror::Error;

use crate::ids::{AttNum, ConstraintId, IndexId, RelId};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RelationError {
    #[error("relation `{0}` already exists")]
    AlreadyExists(String),
    #[error("relation `{0}` does not exist")]
    NotFound(String),
    #[error("relation with id `{0}` does not exist")]
    IdNotFound(RelId),
    #[error("relation `{0}` is of the wrong type for this operation")]
    WrongObjectType(String),
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum AttributeError {
    #[error("column `{0}` already exists")]
    DuplicateColumn(String),
    #[error("column `{0}` does not exist")]
    UndefinedColumn(String),
    #[error("column at position `{0}` not found")]
    PositionNotFound(AttNum),
    #[error("relations are limited to 1600 columns; relation `{0}` is already at the limit")]
    TooManyColumns(RelId),
    #[error("column `{0}` and `{1}` have conflicting types/typmod/collation and cannot be merged")]
    DatatypeMismatch(String, String),
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConstraintError {
    #[error("constraint `{0}` already exists")]
    AlreadyExists(String),
    #[error("constraint `{0}` does not exist")]
    NotFound(String),
    #[error("constraint with id `{0}` does not exist")]
    IdNotFound(ConstraintId),
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum IndexError {
    #[error("index with id `{0}` does not exist")]
    NotFound(IndexId),
    #[error("index `{0}` already exists")]
    AlreadyExists(String),
}

/// Top-level catalog error, analogous to the teacher's `DBError`.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("{0}")]
    Relation(#[from] RelationError),
    #[error("{0}")]
    Attribute(#[from] AttributeError),
    #[error("{0}")]
    Constraint(#[from] ConstraintError),
    #[error("{0}")]
    Index(#[from] IndexError),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, CatalogError>;
