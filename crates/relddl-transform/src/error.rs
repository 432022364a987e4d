//! `spec.md` §4.1 "Errors" / §6 error taxonomy, as used by this crate.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransformError {
    #[error("relation \"{0}\" already exists")]
    DuplicateTable(String),
    #[error("column \"{0}\" does not exist")]
    UndefinedColumn(String),
    #[error("column \"{0}\" specified more than once")]
    DuplicateColumn(String),
    #[error("column \"{0}\" cannot be cast automatically to type \"{1}\"")]
    DatatypeMismatch(String, String),
    #[error("collation mismatch between implicit collations \"{0}\" and \"{1}\"")]
    CollationMismatch(String, String),
    #[error("tables can have at most 1600 columns")]
    TooManyColumns,
    #[error("\"{0}\" is not a table")]
    WrongObjectType(String),
    #[error("invalid table definition: {0}")]
    InvalidTableDefinition(String),
    #[error("relation \"{0}\" does not exist")]
    UndefinedTable(String),
    #[error("unsupported feature: {0}")]
    FeatureNotSupported(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, TransformError>;
