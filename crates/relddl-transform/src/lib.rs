//! Statement transformer: turns raw `CREATE TABLE`/`ALTER TABLE` trees into
//! resolved, catalog-id-addressed execution plans (`spec.md` §4.1).
//!
//! This crate never touches storage directly; it only reads through the
//! injected [`relddl_catalog::Catalog`] trait to resolve names, and never
//! mutates it. `relddl-core` is the only crate that executes a
//! [`resolved::ResolvedStmt`].

pub mod alter;
pub mod builtin_types;
pub mod create;
pub mod distribution;
pub mod error;
pub mod like;
pub mod partition_bound;
pub mod raw;
pub mod resolved;

pub use alter::transform_alter;
pub use create::transform_create;
pub use distribution::resolve_distribution;
pub use error::{Result, TransformError};
pub use like::{expand_like, AttMap, LikeExpansion};
pub use partition_bound::transform_partition_bound;
pub use resolved::{
    AlterCmd, ColumnPlan, ConstraintPlan, DefineRelationPlan, DistributionKind, DistributionPlan, ForeignKeyPlan,
    ResolvedStmt,
};
