//! The `Relation` type: the catalog row shared by tables, indexes, views,
//! sequences, foreign tables, composite types, and partitioned
//! tables/indexes (`spec.md` §3, glossary "Relkind").

use serde::{Deserialize, Serialize};

use crate::ids::{NamespaceId, RelId, RoleId, TablespaceId};
use crate::partition::{PartitionBound, PartitionKey};

/// One-character-tag-equivalent discriminant for what a [`Relation`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelKind {
    Table,
    Index,
    View,
    MaterializedView,
    Sequence,
    ForeignTable,
    Composite,
    PartitionedTable,
    PartitionedIndex,
}

impl RelKind {
    /// Sub-commands that rewrite the heap only apply to kinds that own
    /// storage; partitioned relations and views never do (§4.3 Phase 3).
    pub fn has_storage(self) -> bool {
        matches!(
            self,
            RelKind::Table | RelKind::Index | RelKind::MaterializedView | RelKind::Sequence | RelKind::ForeignTable
        )
    }

    pub fn is_partitioned(self) -> bool {
        matches!(self, RelKind::PartitionedTable | RelKind::PartitionedIndex)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Persistence {
    Permanent,
    Unlogged,
    Temp,
}

/// `spec.md` §4.4.f: which columns identify a row for logical replication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReplicaIdentity {
    Default,
    Full,
    Nothing,
    UsingIndex(RelId),
}

impl Default for ReplicaIdentity {
    fn default() -> Self {
        ReplicaIdentity::Default
    }
}

/// Opaque distribution metadata (`spec.md` §9 "Distribution layer"): this
/// crate never interprets `kind`, it just carries it alongside the relation
/// row the way `reloptions` carries arbitrary storage parameters.
/// `relddl-transform::DistributionPlan` is resolved down to this shape at
/// `CREATE TABLE` time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionInfo {
    pub kind: String,
    pub column: Option<String>,
}

/// The catalog row for a relation of any [`RelKind`].
///
/// Mirrors `pg_class` plus the distribution metadata `spec.md` §6 says must
/// be laid out identically on coordinator and data nodes; here that's just
/// `distribution`, kept opaque to this crate (`spec.md` §9 "Distribution
/// layer").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    pub id: RelId,
    pub name: String,
    pub kind: RelKind,
    pub persistence: Persistence,
    pub owner: RoleId,
    pub namespace: NamespaceId,
    pub tablespace: Option<TablespaceId>,
    pub has_oids: bool,
    /// True whenever at least one row in the inheritance catalog names this
    /// relation as parent (I6); becomes stale on child deletion and must be
    /// recomputed by a rescan before being trusted false.
    pub has_subclass: bool,
    pub is_partition: bool,
    pub partition_bound: Option<PartitionBound>,
    pub partition_key: Option<PartitionKey>,
    pub replica_identity: ReplicaIdentity,
    pub reloptions: Vec<(String, String)>,
    pub on_commit: Option<crate::oncommit::OnCommitAction>,
    /// Number of non-dropped + dropped attributes; attnum allocation never
    /// goes backwards even across drops (I1).
    pub relnatts: i16,
    pub distribution: Option<DistributionInfo>,
}

impl Relation {
    pub fn new(id: RelId, name: impl Into<String>, kind: RelKind, owner: RoleId, namespace: NamespaceId) -> Self {
        Relation {
            id,
            name: name.into(),
            kind,
            persistence: Persistence::Permanent,
            owner,
            namespace,
            tablespace: None,
            has_oids: false,
            has_subclass: false,
            is_partition: false,
            partition_bound: None,
            partition_key: None,
            replica_identity: ReplicaIdentity::Default,
            reloptions: Vec::new(),
            on_commit: None,
            relnatts: 0,
            distribution: None,
        }
    }

    /// I7: a temp relation's session-local-ness is never visible as true
    /// from another backend, so equality/identity checks that cross a
    /// session boundary must treat `Persistence::Temp` relations as opaque.
    pub fn is_temp(&self) -> bool {
        matches!(self.persistence, Persistence::Temp)
    }
}
