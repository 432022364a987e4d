//! Crate-level error type, combining each subsystem's own error enum the
//! way `core::error::DBError` combines its subsystems': one `thiserror`
//! variant per source, plus a transparent `anyhow::Error` catch-all for
//! everything that doesn't warrant its own variant yet.

use relddl_catalog::{CatalogError, RelId};
use relddl_transform::TransformError;
use thiserror::Error;

use crate::locks::LockMode;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error("relation {relation} requires {requested:?} but {held:?} is already held")]
    LockConflict { relation: RelId, requested: LockMode, held: LockMode },

    #[error("partition bound of {child} overlaps an existing partition of {parent}")]
    PartitionOverlap { parent: RelId, child: RelId },

    #[error("default partition {default_partition} of {parent} contains rows that would violate the new bound")]
    DefaultPartitionConflict { parent: RelId, default_partition: RelId },

    #[error("relation {0} cannot be dropped without CASCADE: {1} depends on it")]
    DependentObjectsExist(RelId, String),

    #[error("ON COMMIT action already registered for relation {0} in this subtransaction")]
    OnCommitAlreadyRegistered(RelId),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
