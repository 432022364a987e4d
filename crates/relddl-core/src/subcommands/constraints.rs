//! `ALTER TABLE ... ADD CONSTRAINT` / `DROP CONSTRAINT` (`spec.md` §4.1
//! "Constraint-to-index/trigger transformation", §4.4.d).

use relddl_catalog::{Catalog, Constraint, ConstraintKind, DependKind, Index, IndexKeyColumn, RelId};
use relddl_transform::ConstraintPlan;

use crate::define_relation::{build_foreign_key_spec, resolve_attnum_by_name};
use crate::error::{CoreError, Result};
use crate::oid_space;
use crate::partition_manager;

pub fn add(catalog: &mut dyn Catalog, relid: RelId, plan: &ConstraintPlan) -> Result<()> {
    if catalog.find_constraint_by_name(relid, &plan.name).is_some() {
        return Err(CoreError::Other(anyhow::anyhow!("constraint \"{}\" already exists", plan.name)));
    }

    let id = catalog.allocate_constraint_id();
    let mut c = Constraint::new(id, relid, &plan.name, plan.kind);
    c.deferrable = plan.deferrable;
    c.initially_deferred = plan.initially_deferred;
    c.validated = !plan.not_valid;
    c.check_expr = plan.check_expr.clone();

    if plan.kind == ConstraintKind::Foreign {
        let fk_plan = plan
            .foreign_key
            .as_ref()
            .ok_or_else(|| CoreError::Other(anyhow::anyhow!("foreign key constraint missing its specification")))?;
        c.foreign_key = Some(build_foreign_key_spec(fk_plan, catalog, relid)?);
        let referenced_relation = c.foreign_key.as_ref().unwrap().referenced_relation;
        catalog.add_dependency(oid_space::constraint_objid(id), oid_space::relation_objid(referenced_relation), DependKind::Normal);
        create_foreign_key_triggers(catalog, id, relid, referenced_relation)?;
    }

    let needs_index = matches!(plan.kind, ConstraintKind::Primary | ConstraintKind::Unique | ConstraintKind::Exclusion);
    if needs_index {
        let key_columns: Vec<IndexKeyColumn> = plan
            .index_columns
            .iter()
            .map(|name| {
                resolve_attnum_by_name(catalog, relid, name)
                    .map(|attnum| IndexKeyColumn { attnum, opclass: "default".into(), collation: None })
                    .ok_or_else(|| CoreError::Other(anyhow::anyhow!("column \"{name}\" not found")))
            })
            .collect::<Result<_>>()?;
        let ix_id = catalog.allocate_index_id();
        let mut ix = Index::new(ix_id, relid, format!("{}_idx", plan.name));
        ix.key_columns = key_columns;
        ix.unique = true;
        ix.primary = plan.kind == ConstraintKind::Primary;
        ix.is_valid = true;
        catalog.insert_index(ix)?;
        c.index = Some(ix_id);
        catalog.add_dependency(oid_space::index_objid(ix_id), oid_space::constraint_objid(id), DependKind::Internal);

        if catalog.get_relation(relid).map(|r| r.kind.is_partitioned()).unwrap_or(false) {
            partition_manager::propagate_index_to_partitions(catalog, ix_id, relid)?;
        }
    }

    catalog.add_dependency(oid_space::constraint_objid(id), oid_space::relation_objid(relid), DependKind::Internal);
    catalog.insert_constraint(c)?;
    catalog.command_counter_increment();
    catalog.invalidate(relid);
    Ok(())
}

pub fn drop(catalog: &mut dyn Catalog, relid: RelId, name: &str, cascade: bool) -> Result<()> {
    let id = catalog
        .find_constraint_by_name(relid, name)
        .ok_or_else(|| CoreError::Other(anyhow::anyhow!("constraint \"{name}\" does not exist")))?;

    let dependents = catalog.dependents_of(oid_space::constraint_objid(id));
    let blocking: Vec<_> = dependents.into_iter().filter(|(_, kind)| !kind.cascades()).collect();
    if !blocking.is_empty() && !cascade {
        return Err(CoreError::Other(anyhow::anyhow!("other objects depend on constraint \"{name}\"")));
    }

    if let Some(c) = catalog.get_constraint(id).cloned() {
        if let Some(ix_id) = c.index {
            catalog.delete_index(ix_id)?;
        }
    }

    let trigger_ids: Vec<relddl_catalog::TriggerId> = catalog.triggers_for_constraint(id).iter().map(|t| t.id).collect();
    for tid in trigger_ids {
        catalog.remove_dependencies_of(oid_space::trigger_objid(tid));
        catalog.delete_trigger(tid)?;
    }

    catalog.remove_dependencies_of(oid_space::constraint_objid(id));
    catalog.delete_constraint(id)?;
    catalog.command_counter_increment();
    catalog.invalidate(relid);
    Ok(())
}

/// §4.4.d: a FOREIGN KEY constraint is enforced by five triggers rather than
/// directly by the constraint row — two on the referencing relation that
/// check on insert/update, and three on the referenced relation that react
/// to its key changing under the referencing rows' feet.
fn create_foreign_key_triggers(
    catalog: &mut dyn Catalog,
    constraint_id: relddl_catalog::ConstraintId,
    local: RelId,
    referenced: RelId,
) -> Result<()> {
    use relddl_catalog::{Trigger, TriggerKind};

    let rows = [
        (local, TriggerKind::CheckInsert),
        (local, TriggerKind::CheckUpdate),
        (referenced, TriggerKind::ActionOnDelete),
        (referenced, TriggerKind::ActionOnUpdate),
        (referenced, TriggerKind::ReferencedSide),
    ];
    for (relation, kind) in rows {
        let tid = catalog.allocate_trigger_id();
        catalog.insert_trigger(Trigger::new(tid, relation, constraint_id, kind))?;
        catalog.add_dependency(oid_space::trigger_objid(tid), oid_space::constraint_objid(constraint_id), DependKind::Internal);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use relddl_catalog::{Attribute, AttNum, MemoryCatalog, NamespaceId, RelKind, Relation, RoleId, TypeId};

    fn make_table(cat: &mut MemoryCatalog) -> RelId {
        let id = cat.allocate_oid();
        cat.insert_relation(Relation::new(id, "t", RelKind::Table, RoleId(1), NamespaceId(1))).unwrap();
        cat.insert_attribute(id, Attribute::new(AttNum(1), "id", TypeId(23))).unwrap();
        id
    }

    fn unique_plan() -> ConstraintPlan {
        ConstraintPlan {
            name: "t_id_key".into(),
            kind: ConstraintKind::Unique,
            deferrable: false,
            initially_deferred: false,
            not_valid: false,
            check_expr: None,
            index_columns: vec!["id".into()],
            foreign_key: None,
        }
    }

    #[test]
    fn add_unique_constraint_creates_backing_index() {
        let mut cat = MemoryCatalog::new();
        let relid = make_table(&mut cat);
        add(&mut cat, relid, &unique_plan()).unwrap();
        let c = cat.find_constraint_by_name(relid, "t_id_key").unwrap();
        assert!(cat.get_constraint(c).unwrap().index.is_some());
    }

    #[test]
    fn drop_constraint_also_drops_its_index() {
        let mut cat = MemoryCatalog::new();
        let relid = make_table(&mut cat);
        add(&mut cat, relid, &unique_plan()).unwrap();
        let ix_id = cat.get_constraint(cat.find_constraint_by_name(relid, "t_id_key").unwrap()).unwrap().index.unwrap();
        drop(&mut cat, relid, "t_id_key", false).unwrap();
        assert!(cat.get_index(ix_id).is_none());
        assert!(cat.find_constraint_by_name(relid, "t_id_key").is_none());
    }

    #[test]
    fn add_foreign_key_creates_five_triggers_split_across_both_relations() {
        let mut cat = MemoryCatalog::new();
        let referenced = make_table(&mut cat);
        add(&mut cat, referenced, &unique_plan()).unwrap();

        let local = cat.allocate_oid();
        cat.insert_relation(Relation::new(local, "orders", RelKind::Table, RoleId(1), NamespaceId(1))).unwrap();
        cat.insert_attribute(local, Attribute::new(AttNum(1), "customer_id", TypeId(23))).unwrap();

        let fk_plan = ConstraintPlan {
            name: "orders_customer_fkey".into(),
            kind: ConstraintKind::Foreign,
            deferrable: false,
            initially_deferred: false,
            not_valid: false,
            check_expr: None,
            index_columns: vec![],
            foreign_key: Some(relddl_transform::ForeignKeyPlan {
                local_columns: vec!["customer_id".into()],
                referenced_relation: referenced,
                referenced_columns: vec!["id".into()],
                on_delete: relddl_catalog::FkAction::NoAction,
                on_update: relddl_catalog::FkAction::NoAction,
            }),
        };
        add(&mut cat, local, &fk_plan).unwrap();

        let constraint_id = cat.find_constraint_by_name(local, "orders_customer_fkey").unwrap();
        let triggers = cat.triggers_for_constraint(constraint_id);
        assert_eq!(triggers.len(), 5);
        assert_eq!(triggers.iter().filter(|t| t.relation == local).count(), 2);
        assert_eq!(triggers.iter().filter(|t| t.relation == referenced).count(), 3);

        drop(&mut cat, local, "orders_customer_fkey", false).unwrap();
        assert!(cat.triggers_for_constraint(constraint_id).is_empty());
    }
}
