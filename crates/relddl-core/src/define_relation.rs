//! `define_relation` (C2): materializes a [`DefineRelationPlan`] into the
//! catalog. This is where the attribute/constraint merging across
//! `INHERITS` parents happens — `relddl-transform` deliberately stops short
//! of it, since it only has read access to the catalog and merging requires
//! allocating new attnums/constraint/index ids (`spec.md` §4.2 step 3,
//! §4.4.e).

use std::collections::HashMap;

use relddl_catalog::{
    AttNum, Attribute, Catalog, Constraint, ConstraintKind, DependKind, DistributionInfo, ForeignKeySpec, Index,
    IndexKeyColumn, RelId, RelKind, Relation, SubxactId,
};
use relddl_transform::{ColumnPlan, ConstraintPlan, DefineRelationPlan, DistributionKind};

use crate::error::{CoreError, Result};
use crate::oid_space;
use crate::oncommit_registry::OnCommitRegistry;
use crate::partition_manager;

/// One merged constraint awaiting an id plus (for index-backed kinds) the
/// column names its implicit index should key on; carried separately from
/// [`Constraint`] since that type only stores resolved `AttNum`s inside
/// `foreign_key`, not plain index key columns.
struct MergedConstraint {
    row: Constraint,
    index_columns: Vec<String>,
}

/// Nine steps, in order:
/// 1. Allocate the relation's oid and decide its `RelKind`.
/// 2. Merge `INHERITS` parents' attributes with the locally declared columns.
/// 3. Merge parents' inheritable (`CHECK`) constraints with local ones.
/// 4. Insert the relation row.
/// 5. Insert the merged attributes.
/// 6. Insert the merged constraints, each backed by an implicit index where
///    its kind requires one.
/// 7. Record inheritance/partition-of edges and dependency edges.
/// 8. Register an `ON COMMIT` action if the plan names one.
/// 9. Bump the command counter and invalidate the relcache.
pub fn define_relation(
    plan: DefineRelationPlan,
    catalog: &mut dyn Catalog,
    oncommit: &mut OnCommitRegistry,
    current_subxact: SubxactId,
) -> Result<RelId> {
    log::trace!("define_relation: name={} parents={:?}", plan.name, plan.inherits);

    // Step 1.
    let relid = catalog.allocate_oid();
    let kind = if plan.partition_key.is_some() { RelKind::PartitionedTable } else { RelKind::Table };
    let mut rel = Relation::new(relid, &plan.name, kind, plan.owner, plan.namespace);
    rel.persistence = plan.persistence;
    rel.tablespace = plan.tablespace;
    rel.reloptions = plan.reloptions.clone();
    rel.on_commit = plan.on_commit;
    rel.partition_key = plan.partition_key.clone();
    rel.distribution = Some(distribution_info(&plan));

    if let Some((parent_id, ref bound)) = plan.partition_of {
        partition_manager::check_no_overlap(catalog, parent_id, bound, None)?;
        rel.is_partition = true;
        rel.partition_bound = Some(bound.clone());
    }

    // Step 2.
    let merged_attrs = merge_inherited_attributes(&plan, catalog)?;
    rel.relnatts = merged_attrs.len() as i16;

    // Step 3.
    let merged_constraints = merge_inherited_constraints(&plan, catalog, relid)?;

    // Step 4.
    catalog.insert_relation(rel)?;

    // Step 5.
    for attr in merged_attrs {
        catalog.insert_attribute(relid, attr)?;
    }

    // Step 6.
    for merged in merged_constraints {
        let mut c = merged.row;
        c.id = catalog.allocate_constraint_id();

        if let ConstraintKind::Foreign = c.kind {
            // Foreign keys are never merged from parents (only CHECK is
            // inheritable), so `plan.constraints` still has the matching
            // `ConstraintPlan` with the unresolved `ForeignKeyPlan`.
            let fk_plan = plan
                .constraints
                .iter()
                .find(|cp| cp.name == c.name)
                .and_then(|cp| cp.foreign_key.as_ref())
                .ok_or_else(|| CoreError::Other(anyhow::anyhow!("foreign key \"{}\" lost its plan", c.name)))?;
            c.foreign_key = Some(build_foreign_key_spec(fk_plan, catalog, relid)?);
        }

        let needs_index = matches!(c.kind, ConstraintKind::Primary | ConstraintKind::Unique | ConstraintKind::Exclusion);
        if needs_index {
            let ix_id = catalog.allocate_index_id();
            let key_columns: Vec<IndexKeyColumn> = merged
                .index_columns
                .iter()
                .map(|name| {
                    let attnum = resolve_attnum_by_name(catalog, relid, name)
                        .ok_or_else(|| CoreError::Other(anyhow::anyhow!("column \"{name}\" not found for constraint index")))?;
                    Ok(IndexKeyColumn { attnum, opclass: "default".into(), collation: None })
                })
                .collect::<Result<_>>()?;
            let mut ix = Index::new(ix_id, relid, format!("{}_idx", c.name));
            ix.key_columns = key_columns;
            ix.unique = true;
            ix.primary = matches!(c.kind, ConstraintKind::Primary);
            ix.is_valid = true;
            catalog.insert_index(ix)?;
            c.index = Some(ix_id);
            catalog.add_dependency(oid_space::index_objid(ix_id), oid_space::constraint_objid(c.id), DependKind::Internal);
        }

        if let (ConstraintKind::Foreign, Some(fk)) = (c.kind, &c.foreign_key) {
            catalog.add_dependency(
                oid_space::constraint_objid(c.id),
                oid_space::relation_objid(fk.referenced_relation),
                DependKind::Normal,
            );
        }

        catalog.add_dependency(oid_space::constraint_objid(c.id), oid_space::relation_objid(relid), DependKind::Internal);
        catalog.insert_constraint(c)?;
    }

    // Step 7.
    for &parent in &plan.inherits {
        catalog.add_inheritance_edge(relid, parent);
        catalog.add_dependency(oid_space::relation_objid(relid), oid_space::relation_objid(parent), DependKind::Normal);
        if let Some(p) = catalog.get_relation_mut(parent) {
            p.has_subclass = true;
        }
    }
    if let Some((parent_id, _)) = plan.partition_of {
        catalog.add_inheritance_edge(relid, parent_id);
        catalog.add_dependency(oid_space::relation_objid(relid), oid_space::relation_objid(parent_id), DependKind::Auto);
        if let Some(p) = catalog.get_relation_mut(parent_id) {
            p.has_subclass = true;
        }
    }

    // Step 8.
    if let Some(action) = plan.on_commit {
        oncommit.register(catalog, relid, action, current_subxact)?;
    }

    // Step 9.
    catalog.command_counter_increment();
    catalog.invalidate(relid);

    Ok(relid)
}

fn distribution_info(plan: &DefineRelationPlan) -> DistributionInfo {
    let kind = match plan.distribution.kind {
        DistributionKind::Hash => "hash",
        DistributionKind::Modulo => "modulo",
        DistributionKind::Shard => "shard",
        DistributionKind::Replication => "replication",
        DistributionKind::RoundRobin => "round_robin",
    };
    DistributionInfo { kind: kind.into(), column: plan.distribution.column.clone() }
}

pub(crate) fn resolve_attnum_by_name(catalog: &dyn Catalog, relid: RelId, name: &str) -> Option<AttNum> {
    catalog.attributes(relid).into_iter().find(|a| !a.dropped && a.name == name).map(|a| a.attnum)
}

pub(crate) fn build_foreign_key_spec(
    fk: &relddl_transform::ForeignKeyPlan,
    catalog: &dyn Catalog,
    local_relid: RelId,
) -> Result<ForeignKeySpec> {
    let local_cols: Vec<AttNum> = fk
        .local_columns
        .iter()
        .map(|n| {
            resolve_attnum_by_name(catalog, local_relid, n)
                .ok_or_else(|| CoreError::Other(anyhow::anyhow!("column \"{n}\" not found for foreign key")))
        })
        .collect::<Result<_>>()?;
    let referenced_cols: Vec<AttNum> = fk
        .referenced_columns
        .iter()
        .map(|n| {
            resolve_attnum_by_name(catalog, fk.referenced_relation, n)
                .ok_or_else(|| CoreError::Other(anyhow::anyhow!("column \"{n}\" not found on referenced relation")))
        })
        .collect::<Result<_>>()?;

    let referenced_index = catalog
        .indexes_on(fk.referenced_relation)
        .into_iter()
        .find(|ix| ix.unique && same_key_set(&ix.key_columns, &referenced_cols))
        .map(|ix| ix.id)
        .ok_or_else(|| {
            CoreError::Other(anyhow::anyhow!(
                "no unique index on referenced columns for foreign key to relation {}",
                fk.referenced_relation
            ))
        })?;

    Ok(ForeignKeySpec {
        referenced_relation: fk.referenced_relation,
        referenced_index,
        local_cols,
        referenced_cols,
        on_delete: fk.on_delete,
        on_update: fk.on_update,
    })
}

fn same_key_set(key_columns: &[IndexKeyColumn], attnums: &[AttNum]) -> bool {
    let mut a: Vec<AttNum> = key_columns.iter().map(|k| k.attnum).collect();
    let mut b: Vec<AttNum> = attnums.to_vec();
    a.sort();
    b.sort();
    a == b
}

/// §4.2 step 3 / §4.4.e: inherited columns come first, in declaration order
/// of `plan.inherits`, de-duplicated by name across parents and against any
/// locally declared column of the same name; local-only columns follow.
fn merge_inherited_attributes(plan: &DefineRelationPlan, catalog: &dyn Catalog) -> Result<Vec<Attribute>> {
    let mut merged: Vec<Attribute> = Vec::new();
    let mut by_name: HashMap<String, usize> = HashMap::new();

    for &parent in &plan.inherits {
        for attr in catalog.attributes(parent) {
            if attr.dropped || attr.attnum.is_system_column() {
                continue;
            }
            if let Some(&idx) = by_name.get(&attr.name) {
                if !merged[idx].compatible_for_merge(attr) {
                    return Err(CoreError::Other(anyhow::anyhow!(
                        "column \"{}\" inherited from multiple parents with incompatible types",
                        attr.name
                    )));
                }
                merged[idx].inhcount += 1;
            } else {
                let mut inherited = attr.clone();
                inherited.is_local = false;
                inherited.inhcount = 1;
                by_name.insert(attr.name.clone(), merged.len());
                merged.push(inherited);
            }
        }
    }

    for local in &plan.columns {
        if let Some(&idx) = by_name.get(&local.name) {
            if !column_plan_compatible(local, &merged[idx]) {
                return Err(CoreError::Other(anyhow::anyhow!(
                    "column \"{}\" conflicts with an inherited column of the same name",
                    local.name
                )));
            }
            merged[idx].is_local = true;
            merged[idx].not_null = merged[idx].not_null || local.not_null;
            if local.default_expr.is_some() {
                merged[idx].default_expr = local.default_expr.clone();
                merged[idx].has_default = true;
            }
        } else {
            by_name.insert(local.name.clone(), merged.len());
            merged.push(column_plan_to_attribute(local));
        }
    }

    for (i, attr) in merged.iter_mut().enumerate() {
        attr.attnum = AttNum((i + 1) as i16);
    }

    Ok(merged)
}

fn column_plan_compatible(plan: &ColumnPlan, attr: &Attribute) -> bool {
    plan.type_id == attr.type_id && plan.typmod == attr.typmod && plan.collation == attr.collation
}

fn column_plan_to_attribute(plan: &ColumnPlan) -> Attribute {
    let mut attr = Attribute::new(AttNum::INVALID, &plan.name, plan.type_id);
    attr.typmod = plan.typmod;
    attr.collation = plan.collation;
    attr.storage = plan.storage;
    attr.not_null = plan.not_null;
    attr.has_default = plan.default_expr.is_some();
    attr.default_expr = plan.default_expr.clone();
    attr.identity = plan.identity;
    attr.is_local = true;
    attr.inhcount = 0;
    attr
}

/// §4.4.e: only `CHECK` constraints inherit; same name + same expression
/// merges (bumping `inhcount`), same name + different expression is a
/// conflicting redefinition, new name is adopted as-is. `PRIMARY`/`UNIQUE`/
/// `EXCLUSION`/`FOREIGN` never inherit, so every one of those in
/// `plan.constraints` is taken as-is.
fn merge_inherited_constraints(
    plan: &DefineRelationPlan,
    catalog: &dyn Catalog,
    relid: RelId,
) -> Result<Vec<MergedConstraint>> {
    let mut merged: Vec<MergedConstraint> = Vec::new();
    let mut by_name: HashMap<String, usize> = HashMap::new();

    for &parent in &plan.inherits {
        for c in catalog.constraints(parent) {
            if !c.is_inheritable() {
                continue;
            }
            if let Some(&idx) = by_name.get(&c.name) {
                if merged[idx].row.check_expr != c.check_expr {
                    return Err(CoreError::Other(anyhow::anyhow!(
                        "constraint \"{}\" inherited from multiple parents with conflicting definitions",
                        c.name
                    )));
                }
                merged[idx].row.inhcount += 1;
            } else {
                let mut inherited = c.clone();
                inherited.relation = relid;
                inherited.inhcount = 1;
                by_name.insert(c.name.clone(), merged.len());
                merged.push(MergedConstraint { row: inherited, index_columns: Vec::new() });
            }
        }
    }

    for local in &plan.constraints {
        if let Some(&idx) = by_name.get(&local.name) {
            if merged[idx].row.check_expr != local.check_expr {
                return Err(CoreError::Other(anyhow::anyhow!(
                    "constraint \"{}\" conflicts with an inherited constraint of the same name",
                    local.name
                )));
            }
        } else {
            by_name.insert(local.name.clone(), merged.len());
            merged.push(MergedConstraint { row: constraint_plan_to_row(local, relid), index_columns: local.index_columns.clone() });
        }
    }

    Ok(merged)
}

fn constraint_plan_to_row(plan: &ConstraintPlan, relid: RelId) -> Constraint {
    let mut c = Constraint::new(relddl_catalog::ConstraintId::INVALID, relid, &plan.name, plan.kind);
    c.deferrable = plan.deferrable;
    c.initially_deferred = plan.initially_deferred;
    c.validated = !plan.not_valid;
    c.check_expr = plan.check_expr.clone();
    c
}

#[cfg(test)]
mod tests {
    use super::*;
    use relddl_catalog::{MemoryCatalog, NamespaceId, Persistence, RoleId};
    use relddl_transform::{DistributionPlan, ForeignKeyPlan};

    fn base_plan(name: &str, columns: Vec<ColumnPlan>) -> DefineRelationPlan {
        DefineRelationPlan {
            namespace: NamespaceId(1),
            name: name.into(),
            columns,
            constraints: Vec::new(),
            inherits: Vec::new(),
            partition_key: None,
            partition_of: None,
            persistence: Persistence::Permanent,
            on_commit: None,
            tablespace: None,
            reloptions: Vec::new(),
            owner: RoleId(1),
            distribution: DistributionPlan { kind: DistributionKind::RoundRobin, column: None },
        }
    }

    fn col(name: &str, ty: relddl_catalog::TypeId) -> ColumnPlan {
        ColumnPlan {
            name: name.into(),
            type_id: ty,
            typmod: -1,
            collation: None,
            storage: relddl_catalog::StorageMode::Plain,
            not_null: false,
            default_expr: None,
            identity: relddl_catalog::IdentityMode::None,
        }
    }

    #[test]
    fn simple_table_gets_sequential_attnums() {
        let mut cat = MemoryCatalog::new();
        let mut oncommit = OnCommitRegistry::new();
        let plan = base_plan("t", vec![col("a", relddl_catalog::TypeId(23)), col("b", relddl_catalog::TypeId(25))]);
        let relid = define_relation(plan, &mut cat, &mut oncommit, SubxactId::TOP).unwrap();
        let attrs = cat.attributes(relid);
        assert_eq!(attrs.len(), 2);
        assert_eq!(cat.get_relation(relid).unwrap().relnatts, 2);
    }

    #[test]
    fn child_inherits_parent_columns_ahead_of_its_own() {
        let mut cat = MemoryCatalog::new();
        let mut oncommit = OnCommitRegistry::new();
        let parent_plan = base_plan("parent", vec![col("id", relddl_catalog::TypeId(23))]);
        let parent_id = define_relation(parent_plan, &mut cat, &mut oncommit, SubxactId::TOP).unwrap();

        let mut child_plan = base_plan("child", vec![col("extra", relddl_catalog::TypeId(25))]);
        child_plan.inherits = vec![parent_id];
        let child_id = define_relation(child_plan, &mut cat, &mut oncommit, SubxactId::TOP).unwrap();

        let attrs = cat.attributes(child_id);
        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs[0].name, "id");
        assert!(!attrs[0].is_local);
        assert_eq!(attrs[1].name, "extra");
        assert!(attrs[1].is_local);
    }

    #[test]
    fn incompatible_multi_parent_column_types_are_rejected() {
        let mut cat = MemoryCatalog::new();
        let mut oncommit = OnCommitRegistry::new();
        let p1 = define_relation(base_plan("p1", vec![col("x", relddl_catalog::TypeId(23))]), &mut cat, &mut oncommit, SubxactId::TOP).unwrap();
        let p2 = define_relation(base_plan("p2", vec![col("x", relddl_catalog::TypeId(25))]), &mut cat, &mut oncommit, SubxactId::TOP).unwrap();

        let mut child_plan = base_plan("child", vec![]);
        child_plan.inherits = vec![p1, p2];
        assert!(define_relation(child_plan, &mut cat, &mut oncommit, SubxactId::TOP).is_err());
    }

    #[test]
    fn foreign_key_resolves_against_referenced_primary_key_index() {
        let mut cat = MemoryCatalog::new();
        let mut oncommit = OnCommitRegistry::new();

        let mut parent_plan = base_plan("accounts", vec![col("id", relddl_catalog::TypeId(23))]);
        parent_plan.constraints.push(ConstraintPlan {
            name: "accounts_pkey".into(),
            kind: ConstraintKind::Primary,
            deferrable: false,
            initially_deferred: false,
            not_valid: false,
            check_expr: None,
            index_columns: vec!["id".into()],
            foreign_key: None,
        });
        let parent_id = define_relation(parent_plan, &mut cat, &mut oncommit, SubxactId::TOP).unwrap();

        let mut child_plan = base_plan("orders", vec![col("account_id", relddl_catalog::TypeId(23))]);
        child_plan.constraints.push(ConstraintPlan {
            name: "orders_account_id_fkey".into(),
            kind: ConstraintKind::Foreign,
            deferrable: false,
            initially_deferred: false,
            not_valid: false,
            check_expr: None,
            index_columns: vec![],
            foreign_key: Some(ForeignKeyPlan {
                local_columns: vec!["account_id".into()],
                referenced_relation: parent_id,
                referenced_columns: vec!["id".into()],
                on_delete: relddl_catalog::FkAction::NoAction,
                on_update: relddl_catalog::FkAction::NoAction,
            }),
        });
        let child_id = define_relation(child_plan, &mut cat, &mut oncommit, SubxactId::TOP).unwrap();

        let fk_constraint = cat.constraints(child_id).into_iter().find(|c| c.kind == ConstraintKind::Foreign).unwrap();
        assert!(fk_constraint.foreign_key.is_some());
    }
}
