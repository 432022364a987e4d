//! End-to-end coverage across `transform_create`/`transform_alter` against a
//! shared [`MemoryCatalog`], exercising sequences of statements the way a
//! session would issue them rather than each transform function in
//! isolation (that's what the per-module `#[cfg(test)]` blocks already do).

use pretty_assertions::assert_eq;
use relddl_catalog::{Catalog, MemoryCatalog, NamespaceId, Persistence, RoleId};
use relddl_transform::raw::{
    RawAlterSubCmd, RawAlterTableStmt, RawColumnConstraint, RawColumnDef, RawCreateTableStmt, RawTableConstraint,
    RawTableConstraintKind, RawTableElement, RawTypeName,
};
use relddl_transform::{transform_alter, transform_create, AlterCmd, ResolvedStmt};

fn col(name: &str, ty: &str) -> RawColumnDef {
    RawColumnDef { name: name.into(), type_name: RawTypeName { name: ty.into(), typmod: -1 }, collation: None, constraints: vec![] }
}

fn create_stmt(name: &str, elements: Vec<RawTableElement>) -> RawCreateTableStmt {
    RawCreateTableStmt {
        namespace: NamespaceId(1),
        name: name.into(),
        if_not_exists: false,
        elements,
        inherits: vec![],
        partition_by: None,
        partition_of: None,
        persistence: Persistence::Permanent,
        on_commit: None,
        tablespace: None,
        reloptions: vec![],
        distribute_by: None,
    }
}

fn no_roles(_: &str) -> Option<RoleId> {
    None
}

/// A new table followed by `ADD COLUMN ... NOT NULL` against it: the second
/// statement must resolve the column the first statement only *planned*
/// (not yet materialized in the catalog), so the test inserts the plan into
/// the catalog by hand between the two transforms, the way `relddl-core`'s
/// executor would.
#[test]
fn create_then_alter_round_trip_resolves_against_materialized_state() {
    let mut cat = MemoryCatalog::new();

    let stmt = create_stmt(
        "widgets",
        vec![RawTableElement::Column(RawColumnDef {
            constraints: vec![RawColumnConstraint::PrimaryKey],
            ..col("id", "int4")
        })],
    );
    let plans = transform_create(&stmt, &cat, RoleId(1)).unwrap();
    assert_eq!(plans.len(), 1);
    let ResolvedStmt::DefineRelation(plan) = &plans[0] else { panic!("expected a DefineRelation plan") };

    // Materialize it directly (this crate never writes to the catalog itself).
    let relid = cat.allocate_oid();
    cat.insert_relation(relddl_catalog::Relation::new(
        relid,
        &plan.name,
        relddl_catalog::RelKind::Table,
        RoleId(1),
        NamespaceId(1),
    ))
    .unwrap();
    for (i, c) in plan.columns.iter().enumerate() {
        let mut attr = relddl_catalog::Attribute::new(relddl_catalog::AttNum((i + 1) as i16), c.name.as_str(), c.type_id);
        attr.not_null = c.not_null;
        cat.insert_attribute(relid, attr).unwrap();
    }

    let alter = RawAlterTableStmt {
        target: "widgets".into(),
        only: false,
        subcmds: vec![RawAlterSubCmd::AddColumn {
            col: col("label", "text"),
            if_not_exists: false,
        }],
    };
    let resolved = transform_alter(&alter, &cat, &no_roles).unwrap();
    let ResolvedStmt::AlterTable { relation, cmds } = &resolved[0] else { panic!("expected AlterTable") };
    assert_eq!(*relation, relid);
    assert_eq!(cmds.len(), 1);
    assert!(matches!(&cmds[0], AlterCmd::AddColumn { column, .. } if column.name == "label"));
}

#[test]
fn unique_table_constraint_on_two_columns_compiles_to_one_index() {
    let cat = MemoryCatalog::new();
    let stmt = create_stmt(
        "pairs",
        vec![
            RawTableElement::Column(col("a", "int4")),
            RawTableElement::Column(col("b", "int4")),
            RawTableElement::Constraint(RawTableConstraint {
                name: None,
                kind: RawTableConstraintKind::Unique(vec!["a".into(), "b".into()]),
                deferrable: false,
                initially_deferred: false,
                not_valid: false,
            }),
        ],
    );
    let plans = transform_create(&stmt, &cat, RoleId(1)).unwrap();
    let ResolvedStmt::DefineRelation(plan) = &plans[0] else { panic!() };
    assert_eq!(plan.constraints.len(), 1);
    assert_eq!(plan.constraints[0].index_columns, vec!["a".to_string(), "b".to_string()]);
}
