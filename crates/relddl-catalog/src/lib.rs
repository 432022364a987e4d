//! Catalog data model, dependency graph, and the injected [`Catalog`] trait
//! used by the schema-mutation engine (`relddl-core`) and the statement
//! transformer (`relddl-transform`).
//!
//! See `SPEC_FULL.md` §3 and §9 ("Catalog access").

pub mod attribute;
pub mod catalog_trait;
pub mod constraint;
pub mod depend;
pub mod error;
pub mod ids;
pub mod index;
pub mod memory;
pub mod oncommit;
pub mod partition;
pub mod relation;
pub mod trigger;

pub use attribute::{Attribute, IdentityMode, StorageMode};
pub use catalog_trait::{Catalog, CommandId};
pub use constraint::{Constraint, ConstraintKind, FkAction, ForeignKeySpec};
pub use depend::{DependKind, DependencyGraph, ObjectId};
pub use error::{AttributeError, CatalogError, ConstraintError, IndexError, RelationError, Result};
pub use ids::{AttNum, CollationId, ConstraintId, IndexId, NamespaceId, RelId, RoleId, TablespaceId, TriggerId, TypeId};
pub use index::{Index, IndexKeyColumn};
pub use memory::MemoryCatalog;
pub use oncommit::{OnCommitAction, OnCommitItem, SubxactId};
pub use partition::{PartitionBound, PartitionKey, PartitionKeyColumn, PartitionStrategy, RangeDatum};
pub use relation::{DistributionInfo, Persistence, RelKind, Relation, ReplicaIdentity};
pub use trigger::{Trigger, TriggerKind};
