//! Raw statement trees, as handed off by the (out-of-scope) SQL parser
//! (`spec.md` §1, §4.1).

use relddl_catalog::{NamespaceId, Persistence, TablespaceId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropBehavior {
    Restrict,
    Cascade,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawTypeName {
    pub name: String,
    pub typmod: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RawColumnConstraint {
    NotNull,
    Null,
    Default(String),
    Check { name: Option<String>, expr: String },
    Unique,
    PrimaryKey,
    References { table: String, column: Option<String> },
    GeneratedSerial,
    GeneratedIdentity { always: bool },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawColumnDef {
    pub name: String,
    pub type_name: RawTypeName,
    pub collation: Option<String>,
    pub constraints: Vec<RawColumnConstraint>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RawTableConstraintKind {
    Check(String),
    Unique(Vec<String>),
    Primary(Vec<String>),
    Exclusion(Vec<(String, String)>),
    Foreign {
        columns: Vec<String>,
        ref_table: String,
        ref_columns: Vec<String>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawTableConstraint {
    pub name: Option<String>,
    pub kind: RawTableConstraintKind,
    pub deferrable: bool,
    pub initially_deferred: bool,
    pub not_valid: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawLikeClause {
    pub source_table: String,
    pub include_defaults: bool,
    pub include_constraints: bool,
    pub include_indexes: bool,
    pub include_storage: bool,
    pub include_comments: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RawTableElement {
    Column(RawColumnDef),
    Constraint(RawTableConstraint),
    Like(RawLikeClause),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawRangeDatum {
    MinValue,
    MaxValue,
    Literal(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawPartitionBoundSpec {
    List { values: Vec<String> },
    Range { from: Vec<RawRangeDatum>, to: Vec<RawRangeDatum> },
    Hash { modulus: u32, remainder: u32 },
    Default,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawPartitionStrategy {
    List,
    Range,
    Hash,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawPartitionKeySpec {
    pub strategy: RawPartitionStrategy,
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawDistributionStrategy {
    Hash,
    Modulo,
    Shard,
    Replication,
    RoundRobin,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawDistributeBy {
    pub strategy: RawDistributionStrategy,
    pub column: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawCreateTableStmt {
    pub namespace: NamespaceId,
    pub name: String,
    pub if_not_exists: bool,
    pub elements: Vec<RawTableElement>,
    pub inherits: Vec<String>,
    pub partition_by: Option<RawPartitionKeySpec>,
    pub partition_of: Option<(String, RawPartitionBoundSpec)>,
    pub persistence: Persistence,
    pub on_commit: Option<relddl_catalog::OnCommitAction>,
    pub tablespace: Option<TablespaceId>,
    pub reloptions: Vec<(String, String)>,
    pub distribute_by: Option<RawDistributeBy>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RawAlterSubCmd {
    AddColumn { col: RawColumnDef, if_not_exists: bool },
    DropColumn { name: String, if_exists: bool, behavior: DropBehavior },
    AlterColumnType { name: String, type_name: RawTypeName, using: Option<String> },
    SetNotNull { name: String },
    DropNotNull { name: String },
    SetDefault { name: String, expr: String },
    DropDefault { name: String },
    AddConstraint(RawTableConstraint),
    DropConstraint { name: String, if_exists: bool, behavior: DropBehavior },
    AttachPartition { child: String, bound: RawPartitionBoundSpec },
    DetachPartition { child: String },
    SetTablespace { tablespace: TablespaceId },
    SetLogged { logged: bool },
    ReplicaIdentityDefault,
    ReplicaIdentityFull,
    ReplicaIdentityNothing,
    ReplicaIdentityUsingIndex { index_name: String },
    Inherit { parent: String },
    NoInherit { parent: String },
    OwnerTo { role_name: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawAlterTableStmt {
    pub target: String,
    pub only: bool,
    pub subcmds: Vec<RawAlterSubCmd>,
}
