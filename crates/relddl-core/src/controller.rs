//! The three-phase `ALTER TABLE`/`CREATE TABLE` orchestrator (C3, `spec.md`
//! §4.2 "Multi-phase planner/executor"):
//!
//! 1. **Prep** — resolve statements into per-relation sub-command queues and
//!    acquire every lock the batch will need, weakest-possible mode first so
//!    two non-conflicting statements in the same batch don't self-deadlock.
//! 2. **Catalog Rewrite** — run every queue's sub-commands in pass order
//!    (`altered_table_info`), fanning each `ALTER TABLE` out to descendants
//!    per I6 unless the statement was `ONLY`.
//! 3. **Heap Rewrite** — nothing to do in this in-memory model; a real
//!    engine would rewrite table storage here for passes that need it
//!    (`ALTER COLUMN ... TYPE` without a binary-coercible cast, for
//!    instance). Left as a named, empty phase so the seam is visible.
//!
//! The controller never constructs `AlterCmd`/`DefineRelationPlan` itself;
//! those come out of `relddl-transform` already resolved to catalog ids.

use relddl_catalog::{Catalog, RelId, SubxactId};
use relddl_transform::ResolvedStmt;

use crate::altered_table_info::AlteredTableInfo;
use crate::define_relation;
use crate::error::Result;
use crate::inheritance;
use crate::locks::{self, LockManager};
use crate::oncommit_registry::OnCommitRegistry;
use crate::subcommands;

/// Whether an `ALTER TABLE` statement carries `ONLY` (I6: without it, every
/// sub-command also applies to every descendant).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Propagation {
    OnlyThisRelation,
    CascadeToDescendants,
}

/// Runs one batch of resolved statements end to end, returning the oids of
/// any newly created relations (in statement order) for the caller to hand
/// back to whatever issued the batch.
#[tracing::instrument(skip_all)]
pub fn run_batch(
    catalog: &mut dyn Catalog,
    oncommit: &mut OnCommitRegistry,
    locks: &mut LockManager,
    subxact: SubxactId,
    stmts: Vec<(ResolvedStmt, Propagation)>,
) -> Result<Vec<RelId>> {
    // -- Phase 1: Prep -----------------------------------------------------
    let mut queues: Vec<(RelId, AlteredTableInfo, Propagation)> = Vec::new();
    for (stmt, propagation) in &stmts {
        if let ResolvedStmt::AlterTable { relation, cmds } = stmt {
            for cmd in cmds {
                locks.acquire(*relation, locks::required_lock_level(cmd))?;
            }
            queues.push((*relation, AlteredTableInfo::from_cmds(cmds.clone()), *propagation));
        }
    }

    let mut created = Vec::new();

    // -- Phase 2: Catalog Rewrite ------------------------------------------
    for (stmt, _) in stmts {
        if let ResolvedStmt::DefineRelation(plan) = stmt {
            let relid = define_relation::define_relation(plan, catalog, oncommit, subxact)?;
            created.push(relid);
        }
    }

    for (relid, queue, propagation) in &queues {
        apply_queue(catalog, *relid, queue, subcommands::Origin::Direct)?;
        if *propagation == Propagation::CascadeToDescendants {
            for descendant in inheritance::descendants(catalog, *relid) {
                let retargeted = AlteredTableInfo::from_cmds(
                    inheritance::retarget_for_descendant(&queue.in_pass_order().cloned().collect::<Vec<_>>()),
                );
                apply_queue(catalog, descendant, &retargeted, subcommands::Origin::Inherited)?;
            }
        }
    }

    // -- Phase 3: Heap Rewrite ----------------------------------------------
    // No-op here; see module doc comment.

    for (relid, _, _) in &queues {
        locks.release_all(*relid);
    }

    Ok(created)
}

fn apply_queue(catalog: &mut dyn Catalog, relid: RelId, queue: &AlteredTableInfo, origin: subcommands::Origin) -> Result<()> {
    for cmd in queue.in_pass_order() {
        subcommands::execute(catalog, relid, cmd, origin)?;
    }
    Ok(())
}

/// `DROP TABLE` isn't an `AlterCmd`; it's driven straight through
/// `inheritance::execute_drop`, which already implements the cascade-plan
/// plus on-commit-registry bookkeeping this needs (§4.2 step 5).
#[tracing::instrument(skip_all)]
pub fn drop_tables(
    catalog: &mut dyn Catalog,
    oncommit: &mut OnCommitRegistry,
    locks: &mut LockManager,
    roots: &[RelId],
    cascade: bool,
    subxact: SubxactId,
) -> Result<Vec<RelId>> {
    for &relid in roots {
        locks.acquire(relid, locks::LockMode::AccessExclusive)?;
    }
    let dropped = inheritance::execute_drop(catalog, oncommit, roots, cascade, subxact)?;
    for &relid in &dropped {
        locks.release_all(relid);
    }
    Ok(dropped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use relddl_catalog::{Attribute, AttNum, MemoryCatalog, NamespaceId, RelKind, Relation, RoleId, TypeId};
    use relddl_transform::AlterCmd;

    #[test]
    fn batch_runs_drops_before_adds_across_one_relation() {
        let mut cat = MemoryCatalog::new();
        let relid = cat.allocate_oid();
        cat.insert_relation(Relation::new(relid, "t", RelKind::Table, RoleId(1), NamespaceId(1))).unwrap();
        cat.insert_attribute(relid, Attribute::new(AttNum(1), "old", TypeId(23))).unwrap();

        let mut oncommit = OnCommitRegistry::new();
        let mut locks = LockManager::new();
        let cmds = vec![
            AlterCmd::DropColumn { attnum: AttNum(1), cascade: false },
            AlterCmd::AddColumn {
                column: relddl_transform::ColumnPlan {
                    name: "new".into(),
                    type_id: TypeId(23),
                    typmod: -1,
                    collation: None,
                    storage: relddl_catalog::StorageMode::Plain,
                    not_null: false,
                    default_expr: None,
                    identity: relddl_catalog::IdentityMode::None,
                },
                if_not_exists: false,
            },
        ];
        let stmts = vec![(ResolvedStmt::AlterTable { relation: relid, cmds }, Propagation::OnlyThisRelation)];

        run_batch(&mut cat, &mut oncommit, &mut locks, SubxactId::TOP, stmts).unwrap();

        assert!(cat.get_attribute(relid, AttNum(1)).unwrap().dropped);
        assert!(cat.attributes(relid).iter().any(|a| a.name == "new" && !a.dropped));
    }

    #[test]
    fn define_relation_statement_returns_new_relid() {
        let mut cat = MemoryCatalog::new();
        let mut oncommit = OnCommitRegistry::new();
        let mut locks = LockManager::new();
        let plan = relddl_transform::DefineRelationPlan {
            namespace: NamespaceId(1),
            name: "t".into(),
            columns: vec![relddl_transform::ColumnPlan {
                name: "id".into(),
                type_id: TypeId(23),
                typmod: -1,
                collation: None,
                storage: relddl_catalog::StorageMode::Plain,
                not_null: true,
                default_expr: None,
                identity: relddl_catalog::IdentityMode::None,
            }],
            constraints: vec![],
            inherits: vec![],
            partition_key: None,
            partition_of: None,
            persistence: relddl_catalog::Persistence::Permanent,
            on_commit: None,
            tablespace: None,
            reloptions: vec![],
            owner: RoleId(1),
            distribution: relddl_transform::DistributionPlan { kind: relddl_transform::DistributionKind::Replication, column: None },
        };
        let stmts = vec![(ResolvedStmt::DefineRelation(plan), Propagation::OnlyThisRelation)];

        let created = run_batch(&mut cat, &mut oncommit, &mut locks, SubxactId::TOP, stmts).unwrap();
        assert_eq!(created.len(), 1);
        assert!(cat.get_relation(created[0]).is_some());
    }
}
