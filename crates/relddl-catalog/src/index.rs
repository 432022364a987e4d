//! The `Index` catalog row (`spec.md` §3, §4.5).

use serde::{Deserialize, Serialize};

use crate::ids::{AttNum, CollationId, IndexId, RelId, TypeId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexKeyColumn {
    pub attnum: AttNum,
    pub opclass: String,
    pub collation: Option<CollationId>,
}

/// A relation whose `indrelid` points to its owning table (`spec.md` §3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Index {
    pub id: IndexId,
    pub rel: RelId,
    pub name: String,
    pub key_columns: Vec<IndexKeyColumn>,
    pub predicate: Option<String>,
    pub unique: bool,
    pub primary: bool,
    /// Valid only once every partition (if the owning table is partitioned)
    /// has an attached, valid child index of its own (§4.5 index
    /// propagation); for a non-partitioned table this is simply "built".
    pub is_valid: bool,
    /// Set once this index has been attached to a parent index across a
    /// partition boundary (§4.4.g); `None` for a standalone index.
    pub parent_index: Option<IndexId>,
    pub exclusion_ops: Vec<(AttNum, String)>,
    /// Present only transiently while Phase 2 is reparsing a stashed
    /// definition after an `ALTER COLUMN TYPE` (§4.4.c); not persisted once
    /// the index is rebuilt.
    pub stashed_definition: Option<String>,
    pub return_type: Option<TypeId>,
}

impl Index {
    pub fn new(id: IndexId, rel: RelId, name: impl Into<String>) -> Self {
        Index {
            id,
            rel,
            name: name.into(),
            key_columns: Vec::new(),
            predicate: None,
            unique: false,
            primary: false,
            is_valid: false,
            parent_index: None,
            exclusion_ops: Vec::new(),
            stashed_definition: None,
            return_type: None,
        }
    }

    /// §4.5 "match on index-info": whether two indexes describe the same
    /// key columns, operator classes, collations and predicate, and so can
    /// be adopted as equivalents rather than rebuilt.
    pub fn matches_info(&self, other: &Index) -> bool {
        self.key_columns == other.key_columns && self.predicate == other.predicate && self.unique == other.unique
    }

    /// §4.4.f replica identity requirement: unique, immediate (not
    /// deferrable - modeled by the absence of a deferred flag here, since
    /// indexes themselves are never deferrable, only the constraint that
    /// owns them), non-partial, non-expression (no key column lacking a
    /// plain attnum reference is representable in this model, so that's
    /// implied), and valid.
    pub fn eligible_for_replica_identity(&self) -> bool {
        self.unique && self.predicate.is_none() && self.is_valid
    }
}
