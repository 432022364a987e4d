//! Opaque stable identifiers for catalog objects.
//!
//! These mirror the OID-keyed tuples of `pg_class`/`pg_attribute`/etc.
//! (`spec.md` §3, §6): every relation, constraint, index and namespace is
//! addressed by one of these newtypes rather than by name, so that renames
//! never invalidate a reference.

use std::fmt;

macro_rules! oid_newtype {
    ($(#[$attr:meta])* $name:ident) => {
        $(#[$attr])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
        pub struct $name(pub u32);

        impl $name {
            pub const INVALID: $name = $name(0);

            #[inline]
            pub fn is_valid(self) -> bool {
                self.0 != 0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u32> for $name {
            fn from(v: u32) -> Self {
                $name(v)
            }
        }
    };
}

oid_newtype!(
    /// Identifies a relation of any relkind (table, index, view, sequence, …).
    RelId
);
oid_newtype!(
    /// Identifies a constraint row.
    ConstraintId
);
oid_newtype!(
    /// Identifies an index (itself a [`RelId`]-addressable relation, but
    /// tracked separately wherever only index-specific metadata is needed).
    IndexId
);
oid_newtype!(
    /// Identifies a namespace (schema).
    NamespaceId
);
oid_newtype!(
    /// Identifies a tablespace.
    TablespaceId
);
oid_newtype!(
    /// Identifies an owning role.
    RoleId
);
oid_newtype!(
    /// Identifies a type.
    TypeId
);
oid_newtype!(
    /// Identifies a collation.
    CollationId
);
oid_newtype!(
    /// Identifies a trigger row (`pg_trigger` equivalent).
    TriggerId
);

/// 1-based ordinal of a column within a relation (`spec.md` glossary:
/// Attnum). System columns use negative values, so this is signed, unlike
/// the other ids here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct AttNum(pub i16);

impl AttNum {
    pub const INVALID: AttNum = AttNum(0);

    #[inline]
    pub fn is_user_column(self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub fn is_system_column(self) -> bool {
        self.0 < 0
    }
}

impl fmt::Display for AttNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i16> for AttNum {
    fn from(v: i16) -> Self {
        AttNum(v)
    }
}
