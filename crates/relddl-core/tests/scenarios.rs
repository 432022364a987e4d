//! End-to-end coverage against `MemoryCatalog`, one test per representative
//! scenario: attribute inheritance merge, partition bound overlap,
//! `ALTER TYPE` preserving the index, `ON COMMIT DROP`, and concurrent DDL
//! lock serialization.

use relddl_catalog::{
    AttNum, Attribute, Catalog, IdentityMode, Index, IndexKeyColumn, MemoryCatalog, NamespaceId, OnCommitAction,
    PartitionBound, PartitionKey, PartitionKeyColumn, PartitionStrategy, Persistence, RelKind, Relation,
    ReplicaIdentity, RoleId, StorageMode, SubxactId, TypeId,
};
use relddl_core::locks::{required_lock_level, LockManager, LockMode};
use relddl_core::{controller, define_relation, oncommit_registry::OnCommitRegistry};
use relddl_transform::{AlterCmd, ColumnPlan, DefineRelationPlan, DistributionKind, DistributionPlan};

fn bare_plan(namespace: NamespaceId, name: &str, inherits: Vec<relddl_catalog::RelId>) -> DefineRelationPlan {
    DefineRelationPlan {
        namespace,
        name: name.into(),
        columns: vec![],
        constraints: vec![],
        inherits,
        partition_key: None,
        partition_of: None,
        persistence: Persistence::Permanent,
        on_commit: None,
        tablespace: None,
        reloptions: vec![],
        owner: RoleId(1),
        distribution: DistributionPlan { kind: DistributionKind::Replication, column: None },
    }
}

fn id_column(name: &str) -> ColumnPlan {
    ColumnPlan {
        name: name.into(),
        type_id: TypeId(23),
        typmod: -1,
        collation: None,
        storage: StorageMode::Plain,
        not_null: true,
        default_expr: None,
        identity: IdentityMode::None,
    }
}

#[test]
fn inheritance_attribute_merge_prefers_parent_column_order() {
    let mut cat = MemoryCatalog::new();
    let mut oncommit = OnCommitRegistry::new();

    let mut parent_plan = bare_plan(NamespaceId(1), "cities", vec![]);
    parent_plan.columns = vec![id_column("name"), id_column("population")];
    let parent = define_relation::define_relation(parent_plan, &mut cat, &mut oncommit, SubxactId::TOP).unwrap();

    let mut child_plan = bare_plan(NamespaceId(1), "capitals", vec![parent]);
    child_plan.columns = vec![id_column("state_code")];
    let child = define_relation::define_relation(child_plan, &mut cat, &mut oncommit, SubxactId::TOP).unwrap();

    let names: Vec<_> = cat.attributes(child).iter().map(|a| a.name.clone()).collect();
    assert_eq!(names, vec!["name", "population", "state_code"]);
}

#[test]
fn partition_bound_overlap_is_rejected_at_attach_time() {
    let mut cat = MemoryCatalog::new();
    let parent = cat.allocate_oid();
    let mut parent_rel = Relation::new(parent, "measurements", RelKind::PartitionedTable, RoleId(1), NamespaceId(1));
    parent_rel.partition_key = Some(PartitionKey {
        strategy: PartitionStrategy::Range,
        columns: vec![PartitionKeyColumn { attnum: Some(AttNum(1)), expr: None, opclass: "default".into(), collation: None }],
    });
    cat.insert_relation(parent_rel).unwrap();

    let existing = cat.allocate_oid();
    cat.insert_relation(Relation::new(existing, "measurements_jan", RelKind::Table, RoleId(1), NamespaceId(1))).unwrap();
    let bound_jan = PartitionBound::Range {
        from: vec![relddl_catalog::RangeDatum::Value("2026-01-01".into())],
        to: vec![relddl_catalog::RangeDatum::Value("2026-02-01".into())],
    };
    relddl_core::subcommands::partition_attach::execute(&mut cat, parent, existing, bound_jan).unwrap();

    let overlapping = cat.allocate_oid();
    cat.insert_relation(Relation::new(overlapping, "measurements_jan2", RelKind::Table, RoleId(1), NamespaceId(1))).unwrap();
    let bound_overlap = PartitionBound::Range {
        from: vec![relddl_catalog::RangeDatum::Value("2026-01-15".into())],
        to: vec![relddl_catalog::RangeDatum::Value("2026-03-01".into())],
    };
    let err = relddl_core::subcommands::partition_attach::execute(&mut cat, parent, overlapping, bound_overlap);
    assert!(err.is_err());
}

#[test]
fn alter_type_rebuilds_keyed_index_in_the_same_statement() {
    let mut cat = MemoryCatalog::new();
    let relid = cat.allocate_oid();
    cat.insert_relation(Relation::new(relid, "orders", RelKind::Table, RoleId(1), NamespaceId(1))).unwrap();
    cat.insert_attribute(relid, Attribute::new(AttNum(1), "amount", TypeId(23))).unwrap();
    let ix_id = cat.allocate_index_id();
    let mut ix = Index::new(ix_id, relid, "orders_amount_idx");
    ix.key_columns = vec![IndexKeyColumn { attnum: AttNum(1), opclass: "default".into(), collation: None }];
    ix.is_valid = true;
    cat.insert_index(ix).unwrap();

    let mut locks = LockManager::new();
    let mut oncommit = OnCommitRegistry::new();
    let cmd = AlterCmd::AlterColumnType { attnum: AttNum(1), new_type: TypeId(700), new_typmod: -1, using_expr: None };
    locks.acquire(relid, required_lock_level(&cmd)).unwrap();
    let stmts = vec![(
        relddl_transform::ResolvedStmt::AlterTable { relation: relid, cmds: vec![cmd] },
        controller::Propagation::OnlyThisRelation,
    )];
    controller::run_batch(&mut cat, &mut oncommit, &mut locks, SubxactId::TOP, stmts).unwrap();

    assert_eq!(cat.get_attribute(relid, AttNum(1)).unwrap().type_id, TypeId(700));
    assert!(cat.get_index(ix_id).unwrap().is_valid);
}

#[test]
fn on_commit_drop_fires_only_at_top_level_commit() {
    let mut cat = MemoryCatalog::new();
    let mut oncommit = OnCommitRegistry::new();
    let plan = {
        let mut p = bare_plan(NamespaceId(1), "scratch", vec![]);
        p.persistence = Persistence::Temp;
        p.on_commit = Some(OnCommitAction::Drop);
        p
    };
    let relid = define_relation::define_relation(plan, &mut cat, &mut oncommit, SubxactId::TOP).unwrap();

    // Mid-transaction: nothing fires yet.
    assert!(cat.get_relation(relid).is_some());

    let dropped = oncommit.at_end_xact(&mut cat, true);
    assert_eq!(dropped, vec![relid]);
}

#[test]
fn concurrent_add_column_and_drop_column_serialize_on_conflicting_locks() {
    let mut locks = LockManager::new();
    let relid = relddl_catalog::RelId(42);

    let add = AlterCmd::AddColumn { column: id_column("extra"), if_not_exists: false };
    let drop = AlterCmd::DropColumn { attnum: AttNum(1), cascade: false };

    // ADD COLUMN without a default only needs ShareUpdateExclusive...
    locks.acquire(relid, required_lock_level(&add)).unwrap();
    // ...which conflicts with DROP COLUMN's AccessExclusive requirement.
    assert!(matches!(required_lock_level(&drop), LockMode::AccessExclusive));
    let err = locks.acquire(relid, required_lock_level(&drop));
    assert!(err.is_err());

    locks.release_all(relid);
    locks.acquire(relid, required_lock_level(&drop)).unwrap();
}

#[test]
fn replica_identity_using_index_requires_eligible_index() {
    let mut cat = MemoryCatalog::new();
    let relid = cat.allocate_oid();
    cat.insert_relation(Relation::new(relid, "t", RelKind::Table, RoleId(1), NamespaceId(1))).unwrap();
    let ix_id = cat.allocate_index_id();
    let mut ix = Index::new(ix_id, relid, "t_pkey");
    ix.unique = true;
    ix.is_valid = true;
    cat.insert_index(ix).unwrap();

    let target = relddl_catalog::RelId(ix_id.0);
    relddl_core::subcommands::replica_identity::execute(&mut cat, relid, ReplicaIdentity::UsingIndex(target)).unwrap();
    assert_eq!(cat.get_relation(relid).unwrap().replica_identity, ReplicaIdentity::UsingIndex(target));
}
