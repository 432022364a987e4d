//! The `Attribute` (column) catalog row (`spec.md` §3).

use serde::{Deserialize, Serialize};

use crate::ids::{AttNum, CollationId, TypeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageMode {
    Plain,
    Main,
    Extended,
    External,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdentityMode {
    None,
    Always,
    ByDefault,
}

/// One column of a [`crate::relation::Relation`].
///
/// `attinhcount`/`islocal` together implement the glossary's "Inheritance
/// count": when a column is defined both by a parent and directly on the
/// child, `is_local` is true and `inhcount` counts the contributing parents
/// separately (I4).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub attnum: AttNum,
    pub name: String,
    pub type_id: TypeId,
    pub typmod: i32,
    pub collation: Option<CollationId>,
    pub storage: StorageMode,
    pub not_null: bool,
    pub has_default: bool,
    /// Raw SQL text of the default expression, if any. Stashed as text so a
    /// cooked form can be reparsed against a post-ALTER-TYPE column (§4.4.c).
    pub default_expr: Option<String>,
    pub identity: IdentityMode,
    pub dropped: bool,
    pub inhcount: i32,
    pub is_local: bool,
    /// Set only by the `ADD COLUMN ... DEFAULT` missing-value fast path
    /// (§4.4.a): lets existing rows read the default without a rewrite.
    pub missing_value: Option<String>,
}

impl Attribute {
    pub fn new(attnum: AttNum, name: impl Into<String>, type_id: TypeId) -> Self {
        Attribute {
            attnum,
            name: name.into(),
            type_id,
            typmod: -1,
            collation: None,
            storage: StorageMode::Plain,
            not_null: false,
            has_default: false,
            default_expr: None,
            identity: IdentityMode::None,
            dropped: false,
            inhcount: 0,
            is_local: true,
            missing_value: None,
        }
    }

    /// I4: this column vanishes from the child once no parent still
    /// contributes it and it was never declared locally.
    pub fn should_vanish(&self) -> bool {
        self.inhcount <= 0 && !self.is_local
    }

    /// Checks that two attribute definitions describing "the same" column
    /// (by name) from different parents are compatible enough to merge
    /// (§4.2 step 3, §4.4.e): type, typmod and collation must agree exactly.
    pub fn compatible_for_merge(&self, other: &Attribute) -> bool {
        self.type_id == other.type_id && self.typmod == other.typmod && self.collation == other.collation
    }
}
