//! Resolved (post-transform) statement trees: everything a raw statement
//! could mean has been nailed down to concrete catalog ids by the time a
//! value of one of these types exists (`spec.md` §4.1 "Statement
//! Transformer", design note "Work-queue polymorphism").
//!
//! These types are deliberately a *sealed sum type*: `relddl-core`'s
//! controller (C3) matches exhaustively over [`AlterCmd`] to classify each
//! command into one of the eleven ordering passes (§4.2). Adding a new
//! sub-command variant here is the only place that can ever happen, which
//! keeps the pass table in `relddl-core` honest.

use relddl_catalog::{
    AttNum, ConstraintKind, FkAction, IdentityMode, NamespaceId, OnCommitAction, PartitionBound,
    PartitionKey, Persistence, RelId, ReplicaIdentity, RoleId, StorageMode, TablespaceId, TypeId,
};

/// A fully resolved column, ready to hand to [`Catalog::insert_attribute`]
/// modulo attnum assignment, which the executor does (§4.2 step 2).
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnPlan {
    pub name: String,
    pub type_id: TypeId,
    pub typmod: i32,
    pub collation: Option<relddl_catalog::CollationId>,
    pub storage: StorageMode,
    pub not_null: bool,
    pub default_expr: Option<String>,
    pub identity: IdentityMode,
}

/// A resolved constraint plan. `PRIMARY`/`UNIQUE`/`EXCLUSION` constraints
/// compile to an implicit index (§4.1 "Constraint-to-index/trigger
/// transformation"); `index_columns` names that index's key by column name
/// (attnum assignment happens at execution time, after `ColumnPlan`s are
/// materialized).
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintPlan {
    pub name: String,
    pub kind: ConstraintKind,
    pub deferrable: bool,
    pub initially_deferred: bool,
    pub not_valid: bool,
    pub check_expr: Option<String>,
    pub index_columns: Vec<String>,
    pub foreign_key: Option<ForeignKeyPlan>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForeignKeyPlan {
    pub local_columns: Vec<String>,
    pub referenced_relation: RelId,
    pub referenced_columns: Vec<String>,
    pub on_delete: FkAction,
    pub on_update: FkAction,
}

/// `spec.md` §9 ("Distribution layer"): the catalog treats distribution as
/// opaque, so this crate resolves it down to a strategy plus key column and
/// hands it to `relddl-core` to stash, rather than threading it through
/// `Catalog` at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistributionKind {
    Hash,
    Modulo,
    Shard,
    Replication,
    RoundRobin,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DistributionPlan {
    pub kind: DistributionKind,
    pub column: Option<String>,
}

/// A plan for a brand-new relation (`CREATE TABLE`, including
/// `... PARTITION OF`). Consumed by `relddl-core`'s `define_relation` (C2).
#[derive(Debug, Clone, PartialEq)]
pub struct DefineRelationPlan {
    pub namespace: NamespaceId,
    pub name: String,
    pub columns: Vec<ColumnPlan>,
    pub constraints: Vec<ConstraintPlan>,
    pub inherits: Vec<RelId>,
    pub partition_key: Option<PartitionKey>,
    pub partition_of: Option<(RelId, PartitionBound)>,
    pub persistence: Persistence,
    pub on_commit: Option<OnCommitAction>,
    pub tablespace: Option<TablespaceId>,
    pub reloptions: Vec<(String, String)>,
    pub owner: RoleId,
    pub distribution: DistributionPlan,
}

/// One resolved `ALTER TABLE` sub-command, the unit the controller (C3)
/// schedules into passes (§4.2). Every variant names the catalog objects
/// involved by id, never by name: name resolution already happened.
#[derive(Debug, Clone, PartialEq)]
pub enum AlterCmd {
    AddColumn {
        column: ColumnPlan,
        if_not_exists: bool,
    },
    DropColumn {
        attnum: AttNum,
        cascade: bool,
    },
    AlterColumnType {
        attnum: AttNum,
        new_type: TypeId,
        new_typmod: i32,
        using_expr: Option<String>,
    },
    SetNotNull {
        attnum: AttNum,
    },
    DropNotNull {
        attnum: AttNum,
    },
    SetDefault {
        attnum: AttNum,
        expr: String,
    },
    DropDefault {
        attnum: AttNum,
    },
    AddConstraint {
        constraint: ConstraintPlan,
    },
    DropConstraint {
        constraint_name: String,
        cascade: bool,
    },
    AttachPartition {
        child: RelId,
        bound: PartitionBound,
    },
    DetachPartition {
        child: RelId,
    },
    SetTablespace {
        tablespace: TablespaceId,
    },
    SetLogged {
        logged: bool,
    },
    SetReplicaIdentity {
        identity: ReplicaIdentity,
    },
    Inherit {
        parent: RelId,
    },
    NoInherit {
        parent: RelId,
    },
    OwnerTo {
        owner: RoleId,
    },
}

/// The transformer's output: one `CREATE TABLE` lowers to exactly one
/// `DefineRelation`; one `ALTER TABLE` lowers to one `AlterTable` per
/// *target relation* — more than one only when the statement cascades to
/// descendants that must see the same sub-commands (§4.2 step 1, I6).
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedStmt {
    DefineRelation(DefineRelationPlan),
    AlterTable { relation: RelId, cmds: Vec<AlterCmd> },
}

impl ResolvedStmt {
    pub fn is_alter(&self) -> bool {
        matches!(self, ResolvedStmt::AlterTable { .. })
    }
}
