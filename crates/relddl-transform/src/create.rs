//! `transform_create`: lowers a raw `CREATE TABLE` statement to a
//! [`DefineRelationPlan`] (`spec.md` §4.1 "CREATE TABLE attribute merging").
//!
//! Per-parent attribute/constraint merging itself happens in
//! `relddl-core::define_relation` (C2), which has the catalog access needed
//! to walk the actual parent rows; this function only resolves names to ids
//! and normalizes the statement's own element list.

use itertools::Itertools;
use relddl_catalog::{Catalog, Constraint as CatalogConstraint, ConstraintKind, FkAction, IdentityMode, RelId, RoleId};

use crate::builtin_types::{is_serial_type_name, resolve_type_name};
use crate::distribution::resolve_distribution;
use crate::error::{Result, TransformError};
use crate::like::expand_like;
use crate::partition_bound::transform_partition_bound;
use crate::raw::{
    RawColumnConstraint, RawColumnDef, RawCreateTableStmt, RawTableConstraint, RawTableConstraintKind,
    RawTableElement,
};
use crate::resolved::{ColumnPlan, ConstraintPlan, DefineRelationPlan, ForeignKeyPlan, ResolvedStmt};

const MAX_COLUMNS: usize = 1600;

pub fn transform_create(stmt: &RawCreateTableStmt, catalog: &dyn Catalog, owner: RoleId) -> Result<Vec<ResolvedStmt>> {
    log::trace!("transform_create: namespace={:?} name={}", stmt.namespace, stmt.name);
    if catalog.find_relation_by_name(stmt.namespace, &stmt.name).is_some() {
        if stmt.if_not_exists {
            return Ok(Vec::new());
        }
        return Err(TransformError::DuplicateTable(stmt.name.clone()));
    }

    let mut columns = Vec::new();
    let mut constraints = Vec::new();

    for element in &stmt.elements {
        match element {
            RawTableElement::Column(def) => {
                let (col, mut col_constraints) = lower_column(&stmt.name, def, catalog)?;
                columns.push(col);
                constraints.append(&mut col_constraints);
            }
            RawTableElement::Constraint(tc) => {
                constraints.push(lower_table_constraint(&stmt.name, tc, catalog)?);
            }
            RawTableElement::Like(like) => {
                let expansion = expand_like(like, catalog, columns.len())?;
                columns.extend(expansion.columns);
            }
        }
    }

    if columns.len() > MAX_COLUMNS {
        return Err(TransformError::TooManyColumns);
    }
    if let Some(dup) = columns.iter().map(|c| &c.name).duplicates().next() {
        return Err(TransformError::DuplicateColumn(dup.clone()));
    }

    let mut inherits = Vec::new();
    for parent_name in &stmt.inherits {
        inherits.push(resolve_table(catalog, parent_name)?);
    }

    let partition_key = stmt.partition_by.as_ref().map(|spec| relddl_catalog::PartitionKey {
        strategy: match spec.strategy {
            crate::raw::RawPartitionStrategy::List => relddl_catalog::PartitionStrategy::List,
            crate::raw::RawPartitionStrategy::Range => relddl_catalog::PartitionStrategy::Range,
            crate::raw::RawPartitionStrategy::Hash => relddl_catalog::PartitionStrategy::Hash,
        },
        columns: spec
            .columns
            .iter()
            .map(|c| relddl_catalog::PartitionKeyColumn {
                attnum: columns.iter().position(|col| &col.name == c).map(|i| relddl_catalog::AttNum((i + 1) as i16)),
                expr: None,
                opclass: "default".into(),
                collation: None,
            })
            .collect(),
    });

    let partition_of = match &stmt.partition_of {
        Some((parent_name, bound_spec)) => {
            let parent_id = resolve_table(catalog, parent_name)?;
            let parent_key = catalog
                .get_relation(parent_id)
                .and_then(|r| r.partition_key.clone())
                .ok_or_else(|| TransformError::InvalidTableDefinition(format!("\"{parent_name}\" is not partitioned")))?;
            let bound = transform_partition_bound(&parent_key, bound_spec)?;
            Some((parent_id, bound))
        }
        None => None,
    };

    let fk_forces_replication = constraints.iter().any(|c: &ConstraintPlan| c.kind == ConstraintKind::Foreign);
    let distribution = resolve_distribution(stmt.distribute_by.as_ref(), &columns, &constraints, fk_forces_replication);

    let plan = DefineRelationPlan {
        namespace: stmt.namespace,
        name: stmt.name.clone(),
        columns,
        constraints,
        inherits,
        partition_key,
        partition_of,
        persistence: stmt.persistence,
        on_commit: stmt.on_commit,
        tablespace: stmt.tablespace,
        reloptions: stmt.reloptions.clone(),
        owner,
        distribution,
    };

    Ok(vec![ResolvedStmt::DefineRelation(plan)])
}

pub(crate) fn lower_column(
    table_name: &str,
    def: &RawColumnDef,
    catalog: &dyn Catalog,
) -> Result<(ColumnPlan, Vec<ConstraintPlan>)> {
    let type_id = resolve_type_name(&def.type_name)?;
    let mut col = ColumnPlan {
        name: def.name.clone(),
        type_id,
        typmod: def.type_name.typmod,
        collation: None,
        storage: relddl_catalog::StorageMode::Plain,
        not_null: false,
        default_expr: None,
        identity: IdentityMode::None,
    };
    if is_serial_type_name(&def.type_name.name) {
        col.default_expr = Some(format!("nextval('{table_name}_{}_seq')", def.name));
        col.not_null = true;
    }

    let mut constraints = Vec::new();
    for c in &def.constraints {
        match c {
            RawColumnConstraint::NotNull => col.not_null = true,
            RawColumnConstraint::Null => col.not_null = false,
            RawColumnConstraint::Default(expr) => col.default_expr = Some(expr.clone()),
            RawColumnConstraint::Check { name, expr } => constraints.push(ConstraintPlan {
                name: name.clone().unwrap_or_else(|| format!("{table_name}_{}_check", def.name)),
                kind: ConstraintKind::Check,
                deferrable: false,
                initially_deferred: false,
                not_valid: false,
                check_expr: Some(expr.clone()),
                index_columns: Vec::new(),
                foreign_key: None,
            }),
            RawColumnConstraint::Unique => constraints.push(ConstraintPlan {
                name: format!("{table_name}_{}_key", def.name),
                kind: ConstraintKind::Unique,
                deferrable: false,
                initially_deferred: false,
                not_valid: false,
                check_expr: None,
                index_columns: vec![def.name.clone()],
                foreign_key: None,
            }),
            RawColumnConstraint::PrimaryKey => {
                col.not_null = true;
                constraints.push(ConstraintPlan {
                    name: format!("{table_name}_pkey"),
                    kind: ConstraintKind::Primary,
                    deferrable: false,
                    initially_deferred: false,
                    not_valid: false,
                    check_expr: None,
                    index_columns: vec![def.name.clone()],
                    foreign_key: None,
                });
            }
            RawColumnConstraint::References { table, column } => {
                let ref_columns: Vec<String> = column.iter().cloned().collect();
                let fk = lower_foreign_key(table_name, &[def.name.clone()], table, &ref_columns, catalog)?;
                constraints.push(ConstraintPlan {
                    name: format!("{table_name}_{}_fkey", def.name),
                    kind: ConstraintKind::Foreign,
                    deferrable: false,
                    initially_deferred: false,
                    not_valid: false,
                    check_expr: None,
                    index_columns: Vec::new(),
                    foreign_key: Some(fk),
                });
            }
            RawColumnConstraint::GeneratedSerial => {
                col.default_expr = Some(format!("nextval('{table_name}_{}_seq')", def.name));
            }
            RawColumnConstraint::GeneratedIdentity { always } => {
                col.identity = if *always { IdentityMode::Always } else { IdentityMode::ByDefault };
                col.not_null = true;
            }
        }
    }

    Ok((col, constraints))
}

pub(crate) fn lower_table_constraint(table_name: &str, tc: &RawTableConstraint, catalog: &dyn Catalog) -> Result<ConstraintPlan> {
    let (kind, index_columns, check_expr, foreign_key) = match &tc.kind {
        RawTableConstraintKind::Check(expr) => (ConstraintKind::Check, Vec::new(), Some(expr.clone()), None),
        RawTableConstraintKind::Unique(cols) => (ConstraintKind::Unique, cols.clone(), None, None),
        RawTableConstraintKind::Primary(cols) => (ConstraintKind::Primary, cols.clone(), None, None),
        RawTableConstraintKind::Exclusion(pairs) => {
            (ConstraintKind::Exclusion, pairs.iter().map(|(c, _)| c.clone()).collect(), None, None)
        }
        RawTableConstraintKind::Foreign { columns, ref_table, ref_columns } => {
            let fk = lower_foreign_key(table_name, columns, ref_table, ref_columns, catalog)?;
            (ConstraintKind::Foreign, Vec::new(), None, Some(fk))
        }
    };

    let default_name = match &tc.kind {
        RawTableConstraintKind::Check(_) => format!("{table_name}_check"),
        RawTableConstraintKind::Unique(cols) => format!("{table_name}_{}_key", cols.join("_")),
        RawTableConstraintKind::Primary(_) => format!("{table_name}_pkey"),
        RawTableConstraintKind::Exclusion(_) => format!("{table_name}_excl"),
        RawTableConstraintKind::Foreign { columns, .. } => format!("{table_name}_{}_fkey", columns.join("_")),
    };

    Ok(ConstraintPlan {
        name: tc.name.clone().unwrap_or(default_name),
        kind,
        deferrable: tc.deferrable,
        initially_deferred: tc.initially_deferred,
        not_valid: tc.not_valid,
        check_expr,
        index_columns,
        foreign_key,
    })
}

fn lower_foreign_key(
    _table_name: &str,
    local_columns: &[String],
    ref_table: &str,
    ref_columns: &[String],
    catalog: &dyn Catalog,
) -> Result<ForeignKeyPlan> {
    let referenced_relation = resolve_table(catalog, ref_table)?;
    let referenced_columns = if ref_columns.is_empty() {
        primary_key_columns(catalog, referenced_relation, ref_table)?
    } else {
        ref_columns.to_vec()
    };
    Ok(ForeignKeyPlan {
        local_columns: local_columns.to_vec(),
        referenced_relation,
        referenced_columns,
        on_delete: FkAction::NoAction,
        on_update: FkAction::NoAction,
    })
}

fn primary_key_columns(catalog: &dyn Catalog, rel: RelId, table_name: &str) -> Result<Vec<String>> {
    let pk: Option<&CatalogConstraint> = catalog.constraints(rel).into_iter().find(|c| c.kind == ConstraintKind::Primary);
    let pk = pk.ok_or_else(|| {
        TransformError::InvalidTableDefinition(format!("there is no unique constraint matching given keys for referenced table \"{table_name}\""))
    })?;
    let index = pk.index.ok_or_else(|| {
        TransformError::InvalidTableDefinition(format!("primary key of \"{table_name}\" has no backing index"))
    })?;
    let ix = catalog
        .get_index(index)
        .ok_or_else(|| TransformError::InvalidTableDefinition(format!("primary key index of \"{table_name}\" is missing")))?;
    Ok(ix
        .key_columns
        .iter()
        .filter_map(|kc| catalog.get_attribute(rel, kc.attnum))
        .map(|a| a.name.clone())
        .collect())
}

fn resolve_table(catalog: &dyn Catalog, name: &str) -> Result<RelId> {
    catalog
        .all_relation_ids()
        .into_iter()
        .find(|&id| catalog.get_relation(id).map(|r| r.name == name).unwrap_or(false))
        .ok_or_else(|| TransformError::UndefinedTable(name.to_string()))
}
