//! The `Constraint` catalog row (`spec.md` §3, §4.4.d).

use serde::{Deserialize, Serialize};

use crate::ids::{AttNum, ConstraintId, IndexId, RelId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstraintKind {
    Check,
    Primary,
    Unique,
    Exclusion,
    Foreign,
    NotNull,
    Default,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FkAction {
    NoAction,
    Restrict,
    Cascade,
    SetNull,
    SetDefault,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForeignKeySpec {
    pub referenced_relation: RelId,
    pub referenced_index: IndexId,
    pub local_cols: Vec<AttNum>,
    pub referenced_cols: Vec<AttNum>,
    pub on_delete: FkAction,
    pub on_update: FkAction,
}

/// A constraint row. PK/UNIQUE/EXCLUSION own exactly one [`IndexId`]
/// (`spec.md` §3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    pub id: ConstraintId,
    pub relation: RelId,
    pub name: String,
    pub kind: ConstraintKind,
    pub deferrable: bool,
    pub initially_deferred: bool,
    pub no_inherit: bool,
    /// False while a `NOT VALID` constraint hasn't had its Phase-3/validation
    /// scan run yet.
    pub validated: bool,
    pub inhcount: i32,
    pub index: Option<IndexId>,
    pub check_expr: Option<String>,
    pub foreign_key: Option<ForeignKeySpec>,
}

impl Constraint {
    pub fn new(id: ConstraintId, relation: RelId, name: impl Into<String>, kind: ConstraintKind) -> Self {
        Constraint {
            id,
            relation,
            name: name.into(),
            kind,
            deferrable: false,
            initially_deferred: false,
            no_inherit: false,
            validated: true,
            inhcount: 0,
            index: None,
            check_expr: None,
            foreign_key: None,
        }
    }

    /// Only CHECK constraints are inheritable (§4.4.e).
    pub fn is_inheritable(&self) -> bool {
        matches!(self.kind, ConstraintKind::Check)
    }

    /// §4.4.d merge contract: same name only merges if the expression is
    /// textually identical; otherwise it's a conflicting redefinition.
    pub fn same_definition(&self, other: &Constraint) -> bool {
        self.kind == other.kind && self.name == other.name && self.check_expr == other.check_expr
    }
}
