//! Lock modes and a minimal in-process lock table (`spec.md` §5 "Ordering
//! guarantees", "Shared-resource policy"). Mirrors the eight lock modes a
//! real relational engine exposes, ordered weakest to strongest; conflicts
//! are NOT a total order (`Share` and `RowExclusive` both block each other
//! but neither one subsumes the other), so a full conflict matrix is kept
//! rather than a simple numeric threshold.

use std::collections::HashMap;

use relddl_catalog::RelId;

use relddl_transform::AlterCmd;

use crate::error::{CoreError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockMode {
    AccessShare,
    RowShare,
    RowExclusive,
    ShareUpdateExclusive,
    Share,
    ShareRowExclusive,
    Exclusive,
    AccessExclusive,
}

impl LockMode {
    fn rank(self) -> usize {
        match self {
            LockMode::AccessShare => 0,
            LockMode::RowShare => 1,
            LockMode::RowExclusive => 2,
            LockMode::ShareUpdateExclusive => 3,
            LockMode::Share => 4,
            LockMode::ShareRowExclusive => 5,
            LockMode::Exclusive => 6,
            LockMode::AccessExclusive => 7,
        }
    }

    /// Whether holding `self` blocks a concurrent request for `other` on the
    /// same relation.
    pub fn conflicts_with(self, other: LockMode) -> bool {
        CONFLICT_MATRIX[self.rank()][other.rank()]
    }
}

// Symmetric; rows/cols ordered per `LockMode::rank`.
#[rustfmt::skip]
const CONFLICT_MATRIX: [[bool; 8]; 8] = [
    //                     AccShare RowShare RowExcl  SUE      Share    SRE      Excl     AccExcl
    /* AccessShare */    [ false,   false,   false,   false,   false,   false,   false,   true  ],
    /* RowShare */       [ false,   false,   false,   false,   false,   false,   true,    true  ],
    /* RowExclusive */   [ false,   false,   false,   false,   true,    true,    true,    true  ],
    /* ShareUpdateExcl */[ false,   false,   false,   true,    true,    true,    true,    true  ],
    /* Share */          [ false,   false,   true,    true,    false,   true,    true,    true  ],
    /* ShareRowExcl */   [ false,   false,   true,    true,    true,    true,    true,    true  ],
    /* Exclusive */      [ false,   true,    true,    true,    true,    true,    true,    true  ],
    /* AccessExclusive */[ true,    true,    true,    true,    true,    true,    true,    true  ],
];

/// `spec.md` §5: the lock level an `ALTER TABLE` sub-command requires on its
/// target relation, following the same "weakest lock that's still safe"
/// philosophy as a real planner (`ADD COLUMN` without a volatile default
/// only needs `ShareUpdateExclusive` since it can use the fast-default path,
/// §4.4.a).
pub fn required_lock_level(cmd: &AlterCmd) -> LockMode {
    use AlterCmd::*;
    match cmd {
        AddColumn { column, .. } => {
            if column.default_expr.is_some() {
                LockMode::AccessExclusive
            } else {
                LockMode::ShareUpdateExclusive
            }
        }
        DropColumn { .. } => LockMode::AccessExclusive,
        AlterColumnType { .. } => LockMode::AccessExclusive,
        SetNotNull { .. } | DropNotNull { .. } | SetDefault { .. } | DropDefault { .. } => LockMode::AccessExclusive,
        AddConstraint { constraint } => {
            if constraint.not_valid {
                LockMode::ShareUpdateExclusive
            } else {
                LockMode::AccessExclusive
            }
        }
        DropConstraint { .. } => LockMode::AccessExclusive,
        AttachPartition { .. } => LockMode::ShareUpdateExclusive,
        DetachPartition { .. } => LockMode::AccessExclusive,
        SetTablespace { .. } => LockMode::AccessExclusive,
        SetLogged { .. } => LockMode::AccessExclusive,
        SetReplicaIdentity { .. } => LockMode::ShareRowExclusive,
        Inherit { .. } | NoInherit { .. } => LockMode::AccessExclusive,
        OwnerTo { .. } => LockMode::AccessExclusive,
    }
}

/// A single-process stand-in for the real engine's lock manager: enough to
/// make "concurrent DDL serializes on conflicting lock modes" (§8 scenario
/// 6) testable without a multi-threaded storage layer. Not reentrant across
/// threads; a real implementation guards this with the storage engine's own
/// locking.
#[derive(Debug, Default)]
pub struct LockManager {
    held: HashMap<RelId, Vec<LockMode>>,
}

impl LockManager {
    pub fn new() -> Self {
        LockManager::default()
    }

    /// Acquires `mode` on `rel`, erroring if an incompatible mode is already
    /// held (by a different logical holder; this single-process model does
    /// not distinguish holders, so lock upgrade within "the same statement"
    /// is the caller's responsibility to not attempt twice).
    pub fn acquire(&mut self, rel: RelId, mode: LockMode) -> Result<()> {
        let existing = self.held.entry(rel).or_default();
        for &held_mode in existing.iter() {
            if held_mode.conflicts_with(mode) {
                return Err(CoreError::LockConflict { relation: rel, requested: mode, held: held_mode });
            }
        }
        existing.push(mode);
        Ok(())
    }

    pub fn release_all(&mut self, rel: RelId) {
        self.held.remove(&rel);
    }
}

impl std::fmt::Debug for LockMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LockMode::AccessShare => "AccessShare",
            LockMode::RowShare => "RowShare",
            LockMode::RowExclusive => "RowExclusive",
            LockMode::ShareUpdateExclusive => "ShareUpdateExclusive",
            LockMode::Share => "Share",
            LockMode::ShareRowExclusive => "ShareRowExclusive",
            LockMode::Exclusive => "Exclusive",
            LockMode::AccessExclusive => "AccessExclusive",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_share_only_conflicts_with_access_exclusive() {
        assert!(!LockMode::AccessShare.conflicts_with(LockMode::RowExclusive));
        assert!(LockMode::AccessShare.conflicts_with(LockMode::AccessExclusive));
    }

    #[test]
    fn share_update_exclusive_conflicts_with_itself() {
        assert!(LockMode::ShareUpdateExclusive.conflicts_with(LockMode::ShareUpdateExclusive));
    }

    #[test]
    fn matrix_is_symmetric() {
        let modes = [
            LockMode::AccessShare,
            LockMode::RowShare,
            LockMode::RowExclusive,
            LockMode::ShareUpdateExclusive,
            LockMode::Share,
            LockMode::ShareRowExclusive,
            LockMode::Exclusive,
            LockMode::AccessExclusive,
        ];
        for &a in &modes {
            for &b in &modes {
                assert_eq!(a.conflicts_with(b), b.conflicts_with(a), "{a:?} vs {b:?}");
            }
        }
    }

    #[test]
    fn lock_manager_rejects_conflicting_second_acquire() {
        let mut mgr = LockManager::new();
        mgr.acquire(RelId(1), LockMode::ShareUpdateExclusive).unwrap();
        assert!(mgr.acquire(RelId(1), LockMode::AccessExclusive).is_err());
    }

    #[test]
    fn lock_manager_allows_compatible_second_acquire() {
        let mut mgr = LockManager::new();
        mgr.acquire(RelId(1), LockMode::AccessShare).unwrap();
        assert!(mgr.acquire(RelId(1), LockMode::RowShare).is_ok());
    }

    #[test]
    fn releasing_frees_the_relation_for_any_mode() {
        let mut mgr = LockManager::new();
        mgr.acquire(RelId(1), LockMode::AccessExclusive).unwrap();
        mgr.release_all(RelId(1));
        assert!(mgr.acquire(RelId(1), LockMode::AccessExclusive).is_ok());
    }
}
