//! The `ALTER TABLE` work queue (`spec.md` §4.2): one target relation's
//! resolved sub-commands, bucketed into passes so that, say, every `DROP
//! COLUMN` across every statement in a batch runs before any `ADD COLUMN`,
//! regardless of the order the caller wrote them in.
//!
//! The eleven passes below mirror the ones a mature ALTER TABLE
//! implementation actually carries internally to get this right: drops
//! first, then type changes, then two passes that re-establish objects a
//! type change had to tear down, then column-attribute tweaks, then adds
//! (columns before the constraints that reference them, index-backed
//! constraints before the ones that merely assume an index exists, e.g.
//! foreign keys), with everything else last.

use relddl_catalog::ConstraintKind;
use relddl_transform::AlterCmd;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Pass {
    /// `DROP COLUMN`, `DROP CONSTRAINT`.
    Drop,
    /// `ALTER COLUMN ... TYPE`.
    AlterType,
    /// Re-attaching indexes a type change had to drop and rebuild. No
    /// `AlterCmd` variant is scheduled here directly today — the rebuild is
    /// internal to `AlterColumnType`'s own executor — but the pass exists so
    /// a future index-rebuild sub-command has somewhere honest to go.
    OldIndex,
    /// Re-validating constraints a type change invalidated. See `OldIndex`.
    OldConstr,
    /// `SET`/`DROP NOT NULL`, `SET`/`DROP DEFAULT`.
    ColAttrs,
    /// `ADD COLUMN`.
    AddColumn,
    /// `ADD CONSTRAINT` for constraints that don't own an index (`CHECK`).
    AddConstr,
    /// Building the index side of an index-backed constraint.
    AddIndex,
    /// `ADD CONSTRAINT` for `PRIMARY KEY`/`UNIQUE`/`EXCLUSION`, once their
    /// backing index exists.
    AddIndexConstr,
    /// `ADD CONSTRAINT` for `FOREIGN KEY`, which must see any just-added
    /// unique index on the referenced side.
    AddOtherConstr,
    /// Everything else: partition attach/detach, tablespace, persistence,
    /// replica identity, inheritance, ownership.
    Partition,
}

impl Pass {
    pub const ORDER: [Pass; 11] = [
        Pass::Drop,
        Pass::AlterType,
        Pass::OldIndex,
        Pass::OldConstr,
        Pass::ColAttrs,
        Pass::AddColumn,
        Pass::AddConstr,
        Pass::AddIndex,
        Pass::AddIndexConstr,
        Pass::AddOtherConstr,
        Pass::Partition,
    ];
}

/// Classifies one resolved sub-command into the pass it must run in.
pub fn classify(cmd: &AlterCmd) -> Pass {
    use AlterCmd::*;
    match cmd {
        DropColumn { .. } | DropConstraint { .. } => Pass::Drop,
        AlterColumnType { .. } => Pass::AlterType,
        SetNotNull { .. } | DropNotNull { .. } | SetDefault { .. } | DropDefault { .. } => Pass::ColAttrs,
        AddColumn { .. } => Pass::AddColumn,
        AddConstraint { constraint } => match constraint.kind {
            ConstraintKind::Check | ConstraintKind::NotNull | ConstraintKind::Default => Pass::AddConstr,
            ConstraintKind::Primary | ConstraintKind::Unique | ConstraintKind::Exclusion => Pass::AddIndexConstr,
            ConstraintKind::Foreign => Pass::AddOtherConstr,
        },
        AttachPartition { .. }
        | DetachPartition { .. }
        | SetTablespace { .. }
        | SetLogged { .. }
        | SetReplicaIdentity { .. }
        | Inherit { .. }
        | NoInherit { .. }
        | OwnerTo { .. } => Pass::Partition,
    }
}

/// One target relation's sub-commands from a single `ALTER TABLE`
/// statement, grouped by pass (`spec.md` §4.2 step 1's output feeding step
/// 4's merge-by-pass-across-statements).
#[derive(Debug, Clone, Default)]
pub struct AlteredTableInfo {
    pub by_pass: std::collections::BTreeMap<Pass, Vec<AlterCmd>>,
}

impl AlteredTableInfo {
    pub fn from_cmds(cmds: Vec<AlterCmd>) -> Self {
        let mut by_pass: std::collections::BTreeMap<Pass, Vec<AlterCmd>> = std::collections::BTreeMap::new();
        for cmd in cmds {
            by_pass.entry(classify(&cmd)).or_default().push(cmd);
        }
        AlteredTableInfo { by_pass }
    }

    /// Drains every sub-command in pass order; this is what `controller.rs`
    /// iterates when it has only one target relation's worth of work.
    pub fn in_pass_order(&self) -> impl Iterator<Item = &AlterCmd> {
        Pass::ORDER.iter().flat_map(move |p| self.by_pass.get(p).into_iter().flatten())
    }
}

impl PartialOrd for Pass {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relddl_catalog::{AttNum, TypeId};
    use relddl_transform::ColumnPlan;

    fn col(name: &str) -> ColumnPlan {
        ColumnPlan {
            name: name.into(),
            type_id: TypeId(23),
            typmod: -1,
            collation: None,
            storage: relddl_catalog::StorageMode::Plain,
            not_null: false,
            default_expr: None,
            identity: relddl_catalog::IdentityMode::None,
        }
    }

    #[test]
    fn drops_run_before_adds_regardless_of_input_order() {
        let cmds = vec![
            AlterCmd::AddColumn { column: col("b"), if_not_exists: false },
            AlterCmd::DropColumn { attnum: AttNum(1), cascade: false },
        ];
        let info = AlteredTableInfo::from_cmds(cmds);
        let ordered: Vec<&AlterCmd> = info.in_pass_order().collect();
        assert!(matches!(ordered[0], AlterCmd::DropColumn { .. }));
        assert!(matches!(ordered[1], AlterCmd::AddColumn { .. }));
    }

    #[test]
    fn pass_order_constant_matches_declared_sequence() {
        assert_eq!(Pass::ORDER[0], Pass::Drop);
        assert_eq!(Pass::ORDER[10], Pass::Partition);
    }
}
