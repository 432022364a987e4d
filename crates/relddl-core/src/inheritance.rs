//! Inheritance maintenance and cascading drop (C6, `spec.md` §4.2 step 1
//! note I6, §4.4.e, §4.6). `ALTER TABLE ... INHERIT`/`NO INHERIT` merge or
//! unwind attribute/constraint sharing the same way `define_relation`'s
//! initial merge does; cascading drop walks the dependency graph the way
//! `relddl_catalog::depend::DependencyGraph::plan_deletion` does, but through
//! the [`Catalog`] trait's per-object queries since the trait doesn't expose
//! the graph type itself to callers outside the catalog crate.

use std::collections::HashSet;

use relddl_catalog::{AttNum, Catalog, DependKind, RelId};
use relddl_transform::AlterCmd;

use crate::error::{CoreError, Result};
use crate::oid_space;
use crate::oncommit_registry::OnCommitRegistry;

/// `ALTER TABLE child INHERIT parent`: merges `parent`'s non-system
/// attributes and `CHECK` constraints into `child`, the same compatibility
/// rules `define_relation`'s merge uses, then records the edge.
pub fn inherit(catalog: &mut dyn Catalog, child: RelId, parent: RelId) -> Result<()> {
    if catalog.parents_of(child).contains(&parent) {
        return Err(CoreError::Other(anyhow::anyhow!("relation already inherits from that parent")));
    }

    let parent_attrs: Vec<_> = catalog.attributes(parent).into_iter().filter(|a| !a.dropped && !a.attnum.is_system_column()).cloned().collect();
    let mut next_attnum = catalog.attributes(child).into_iter().map(|a| a.attnum.0).max().unwrap_or(0) + 1;

    for pattr in &parent_attrs {
        if let Some(existing) = catalog.attributes(child).into_iter().find(|a| !a.dropped && a.name == pattr.name) {
            if !existing.compatible_for_merge(pattr) {
                return Err(CoreError::Other(anyhow::anyhow!(
                    "column \"{}\" in child table has a type conflict with parent",
                    pattr.name
                )));
            }
            let attnum = existing.attnum;
            if let Some(a) = catalog.get_attribute_mut(child, attnum) {
                a.inhcount += 1;
            }
        } else {
            let mut new_attr = pattr.clone();
            new_attr.attnum = AttNum(next_attnum);
            new_attr.is_local = false;
            new_attr.inhcount = 1;
            next_attnum += 1;
            catalog.insert_attribute(child, new_attr)?;
        }
    }
    if let Some(rel) = catalog.get_relation_mut(child) {
        rel.relnatts = catalog.attributes(child).len() as i16;
    }

    let parent_constraints: Vec<_> = catalog.constraints(parent).into_iter().filter(|c| c.is_inheritable()).cloned().collect();
    for pc in &parent_constraints {
        if let Some(existing_id) = catalog.find_constraint_by_name(child, &pc.name) {
            let existing = catalog.get_constraint(existing_id).cloned();
            match existing {
                Some(e) if e.check_expr == pc.check_expr => {
                    if let Some(m) = catalog.get_constraint_mut(existing_id) {
                        m.inhcount += 1;
                    }
                }
                _ => {
                    return Err(CoreError::Other(anyhow::anyhow!(
                        "constraint \"{}\" conflicts with an existing constraint on the child",
                        pc.name
                    )))
                }
            }
        } else {
            let new_id = catalog.allocate_constraint_id();
            let mut c = pc.clone();
            c.id = new_id;
            c.relation = child;
            c.inhcount = 1;
            catalog.insert_constraint(c)?;
        }
    }

    catalog.add_inheritance_edge(child, parent);
    catalog.add_dependency(oid_space::relation_objid(child), oid_space::relation_objid(parent), DependKind::Normal);
    if let Some(p) = catalog.get_relation_mut(parent) {
        p.has_subclass = true;
    }
    Ok(())
}

/// `ALTER TABLE child NO INHERIT parent`: the reverse of [`inherit`].
/// Decrementing a shared column's `inhcount` to zero marks it `is_local` so
/// it survives on the child (I4) rather than vanishing.
pub fn no_inherit(catalog: &mut dyn Catalog, child: RelId, parent: RelId) -> Result<()> {
    if !catalog.parents_of(child).contains(&parent) {
        return Err(CoreError::Other(anyhow::anyhow!("relation does not inherit from that parent")));
    }

    let parent_attr_names: Vec<String> =
        catalog.attributes(parent).into_iter().filter(|a| !a.dropped).map(|a| a.name.clone()).collect();
    for name in parent_attr_names {
        if let Some(existing) = catalog.attributes(child).into_iter().find(|a| !a.dropped && a.name == name) {
            let attnum = existing.attnum;
            if let Some(a) = catalog.get_attribute_mut(child, attnum) {
                a.inhcount = (a.inhcount - 1).max(0);
                if a.inhcount == 0 {
                    a.is_local = true;
                }
            }
        }
    }

    let parent_constraint_names: Vec<String> =
        catalog.constraints(parent).into_iter().filter(|c| c.is_inheritable()).map(|c| c.name.clone()).collect();
    for name in parent_constraint_names {
        if let Some(id) = catalog.find_constraint_by_name(child, &name) {
            if let Some(c) = catalog.get_constraint_mut(id) {
                c.inhcount = (c.inhcount - 1).max(0);
            }
        }
    }

    catalog.remove_inheritance_edge(child, parent);
    let still_has_other_children = !catalog.children_of(parent).is_empty();
    if !still_has_other_children {
        if let Some(p) = catalog.get_relation_mut(parent) {
            p.has_subclass = false;
        }
    }
    Ok(())
}

/// I6: every non-`ONLY` `ALTER TABLE` sub-command set must also apply to
/// every existing descendant (inheritance child or partition) of the
/// target, not just the table named in the statement.
pub fn descendants(catalog: &dyn Catalog, parent: RelId) -> Vec<RelId> {
    let mut out = Vec::new();
    let mut frontier = vec![parent];
    while let Some(id) = frontier.pop() {
        for child in catalog.children_of(id) {
            if !out.contains(&child) {
                out.push(child);
                frontier.push(child);
            }
        }
    }
    out
}

/// Re-targets an already-resolved command set at a different relation (used
/// to fan a parent's `ADD COLUMN`/`ADD CONSTRAINT` etc. out to its
/// descendants); most variants carry no relation-specific state beyond
/// attnums/ids that are already correct because descendants share their
/// ancestor's attnum numbering for inherited columns (I4), so this is the
/// identity function today. Kept as a named seam because a future
/// sub-command (e.g. one naming a column by attnum that a particular
/// descendant dropped locally) would need real remapping here.
pub fn retarget_for_descendant(cmds: &[AlterCmd]) -> Vec<AlterCmd> {
    cmds.to_vec()
}

/// §4.6 `PERFORM_DELETION_INTERNAL`: walks outward from `roots` collecting
/// every relation that must be dropped alongside them, honoring `cascade`,
/// using only the per-object [`Catalog::dependents_of`] query (mirrors
/// `relddl_catalog::depend::DependencyGraph::plan_deletion`'s algorithm).
pub fn plan_cascade_drop(catalog: &dyn Catalog, roots: &[RelId], cascade: bool) -> Result<Vec<RelId>> {
    let mut pinned: HashSet<RelId> = roots.iter().copied().collect();
    let mut frontier: Vec<RelId> = roots.to_vec();

    while let Some(obj) = frontier.pop() {
        for (dependent, kind) in catalog.dependents_of(oid_space::relation_objid(obj)) {
            if pinned.contains(&dependent) {
                continue;
            }
            if kind.cascades() {
                pinned.insert(dependent);
                frontier.push(dependent);
            } else if !cascade {
                return Err(CoreError::DependentObjectsExist(obj, format!("relation {dependent} depends on it")));
            } else {
                pinned.insert(dependent);
                frontier.push(dependent);
            }
        }
    }

    let mut ordered: Vec<RelId> = pinned.into_iter().collect();
    // Children before parents: a relation with more outgoing edges still
    // inside the delete set sits deeper in the dependency chain.
    ordered.sort_by_key(|&id| std::cmp::Reverse(catalog.dependents_of(oid_space::relation_objid(id)).count()));
    Ok(ordered)
}

/// Executes a cascade-drop plan: removes every dependency edge, on-commit
/// registration, and relation row for the planned set.
pub fn execute_drop(
    catalog: &mut dyn Catalog,
    oncommit: &mut OnCommitRegistry,
    roots: &[RelId],
    cascade: bool,
    subxact: relddl_catalog::SubxactId,
) -> Result<Vec<RelId>> {
    let plan = plan_cascade_drop(catalog, roots, cascade)?;
    for &id in &plan {
        oncommit.tentatively_remove(id, subxact);
        for parent in catalog.parents_of(id) {
            catalog.remove_inheritance_edge(id, parent);
        }
        catalog.remove_dependencies_of(oid_space::relation_objid(id));
        catalog.invalidate(id);
        catalog.delete_relation(id)?;
        log::trace!("TABLE DROPPED: {id}");
    }
    Ok(plan)
}
