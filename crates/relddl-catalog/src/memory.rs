//! An in-process, single-transaction reference [`Catalog`] implementation.
//!
//! Grounded on the teacher's `locking_tx_datastore` (`mut_tx.rs`,
//! `committed_state.rs`): a set of maps keyed by oid, with sequences for id
//! allocation. Unlike the teacher this has no MVCC snapshotting of its
//! own — it exists so `relddl-core`'s executors can be exercised without a
//! real storage engine (design note "Catalog access").

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::attribute::Attribute;
use crate::catalog_trait::{Catalog, CommandId};
use crate::constraint::Constraint;
use crate::depend::{DependKind, DependencyGraph, ObjectId};
use crate::error::{RelationError, Result};
use crate::ids::{AttNum, ConstraintId, IndexId, NamespaceId, RelId, TriggerId};
use crate::index::Index;
use crate::oncommit::OnCommitItem;
use crate::relation::Relation;
use crate::trigger::Trigger;

/// Reserved id range for system bookkeeping, mirroring the teacher's
/// `ST_RESERVED_SEQUENCE_RANGE`; user relations start past it.
pub const RESERVED_OID_RANGE: u32 = 4096;

#[derive(Debug, Default)]
pub struct MemoryCatalog {
    next_oid: u32,
    next_constraint_id: u32,
    next_index_id: u32,
    next_trigger_id: u32,
    command_counter: u32,
    invalidations: u64,

    relations: IndexMap<RelId, Relation>,
    attributes: HashMap<RelId, IndexMap<AttNum, Attribute>>,
    constraints: HashMap<ConstraintId, Constraint>,
    indexes: HashMap<IndexId, Index>,
    triggers: HashMap<TriggerId, Trigger>,
    /// child -> parents, preserving declaration order (matters for the
    /// "ordered list of parents" merge rule of §4.2).
    inherits: HashMap<RelId, Vec<RelId>>,
    depends: DependencyGraph,
    on_commit: HashMap<RelId, OnCommitItem>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        MemoryCatalog {
            next_oid: RESERVED_OID_RANGE + 1,
            next_constraint_id: 1,
            next_index_id: 1,
            next_trigger_id: 1,
            ..Default::default()
        }
    }

    pub fn invalidation_count(&self) -> u64 {
        self.invalidations
    }
}

impl Catalog for MemoryCatalog {
    fn allocate_oid(&mut self) -> RelId {
        let id = RelId(self.next_oid);
        self.next_oid += 1;
        id
    }

    fn get_relation(&self, id: RelId) -> Option<&Relation> {
        self.relations.get(&id)
    }

    fn get_relation_mut(&mut self, id: RelId) -> Option<&mut Relation> {
        self.relations.get_mut(&id)
    }

    fn find_relation_by_name(&self, namespace: NamespaceId, name: &str) -> Option<RelId> {
        self.relations
            .values()
            .find(|r| r.namespace == namespace && r.name == name)
            .map(|r| r.id)
    }

    fn insert_relation(&mut self, rel: Relation) -> Result<()> {
        if self.find_relation_by_name(rel.namespace, &rel.name).is_some() {
            return Err(RelationError::AlreadyExists(rel.name).into());
        }
        let id = rel.id;
        self.relations.insert(id, rel);
        self.attributes.entry(id).or_default();
        Ok(())
    }

    fn delete_relation(&mut self, id: RelId) -> Result<()> {
        self.relations
            .shift_remove(&id)
            .ok_or(RelationError::IdNotFound(id))?;
        self.attributes.remove(&id);
        self.inherits.remove(&id);
        for parents in self.inherits.values_mut() {
            parents.retain(|&p| p != id);
        }
        self.triggers.retain(|_, t| t.relation != id);
        self.remove_dependencies_of(id);
        self.remove_on_commit_item(id);
        Ok(())
    }

    fn all_relation_ids(&self) -> Vec<RelId> {
        self.relations.keys().copied().collect()
    }

    fn attributes(&self, rel: RelId) -> Vec<&Attribute> {
        self.attributes.get(&rel).map(|m| m.values().collect()).unwrap_or_default()
    }

    fn get_attribute(&self, rel: RelId, attnum: AttNum) -> Option<&Attribute> {
        self.attributes.get(&rel)?.get(&attnum)
    }

    fn get_attribute_mut(&mut self, rel: RelId, attnum: AttNum) -> Option<&mut Attribute> {
        self.attributes.get_mut(&rel)?.get_mut(&attnum)
    }

    fn insert_attribute(&mut self, rel: RelId, attr: Attribute) -> Result<()> {
        self.attributes.entry(rel).or_default().insert(attr.attnum, attr);
        Ok(())
    }

    fn remove_uncommitted_attribute(&mut self, rel: RelId, attnum: AttNum) -> Result<()> {
        self.attributes.entry(rel).or_default().shift_remove(&attnum);
        Ok(())
    }

    fn allocate_constraint_id(&mut self) -> ConstraintId {
        let id = ConstraintId(self.next_constraint_id);
        self.next_constraint_id += 1;
        id
    }

    fn constraints(&self, rel: RelId) -> Vec<&Constraint> {
        self.constraints.values().filter(|c| c.relation == rel).collect()
    }

    fn get_constraint(&self, id: ConstraintId) -> Option<&Constraint> {
        self.constraints.get(&id)
    }

    fn get_constraint_mut(&mut self, id: ConstraintId) -> Option<&mut Constraint> {
        self.constraints.get_mut(&id)
    }

    fn find_constraint_by_name(&self, rel: RelId, name: &str) -> Option<ConstraintId> {
        self.constraints
            .values()
            .find(|c| c.relation == rel && c.name == name)
            .map(|c| c.id)
    }

    fn insert_constraint(&mut self, c: Constraint) -> Result<()> {
        self.constraints.insert(c.id, c);
        Ok(())
    }

    fn delete_constraint(&mut self, id: ConstraintId) -> Result<()> {
        self.constraints.remove(&id);
        Ok(())
    }

    fn allocate_index_id(&mut self) -> IndexId {
        let id = IndexId(self.next_index_id);
        self.next_index_id += 1;
        id
    }

    fn indexes_on(&self, rel: RelId) -> Vec<&Index> {
        self.indexes.values().filter(|i| i.rel == rel).collect()
    }

    fn get_index(&self, id: IndexId) -> Option<&Index> {
        self.indexes.get(&id)
    }

    fn get_index_mut(&mut self, id: IndexId) -> Option<&mut Index> {
        self.indexes.get_mut(&id)
    }

    fn insert_index(&mut self, ix: Index) -> Result<()> {
        self.indexes.insert(ix.id, ix);
        Ok(())
    }

    fn delete_index(&mut self, id: IndexId) -> Result<()> {
        self.indexes.remove(&id);
        Ok(())
    }

    fn allocate_trigger_id(&mut self) -> TriggerId {
        let id = TriggerId(self.next_trigger_id);
        self.next_trigger_id += 1;
        id
    }

    fn triggers_on(&self, rel: RelId) -> Vec<&Trigger> {
        self.triggers.values().filter(|t| t.relation == rel).collect()
    }

    fn triggers_for_constraint(&self, constraint: ConstraintId) -> Vec<&Trigger> {
        self.triggers.values().filter(|t| t.constraint == constraint).collect()
    }

    fn insert_trigger(&mut self, t: Trigger) -> Result<()> {
        self.triggers.insert(t.id, t);
        Ok(())
    }

    fn delete_trigger(&mut self, id: TriggerId) -> Result<()> {
        self.triggers.remove(&id);
        Ok(())
    }

    fn parents_of(&self, child: RelId) -> Vec<RelId> {
        self.inherits.get(&child).cloned().unwrap_or_default()
    }

    fn children_of(&self, parent: RelId) -> Vec<RelId> {
        self.inherits
            .iter()
            .filter(|(_, parents)| parents.contains(&parent))
            .map(|(&child, _)| child)
            .collect()
    }

    fn add_inheritance_edge(&mut self, child: RelId, parent: RelId) {
        let parents = self.inherits.entry(child).or_default();
        if !parents.contains(&parent) {
            parents.push(parent);
        }
    }

    fn remove_inheritance_edge(&mut self, child: RelId, parent: RelId) {
        if let Some(parents) = self.inherits.get_mut(&child) {
            parents.retain(|&p| p != parent);
        }
    }

    fn add_dependency(&mut self, referrer: ObjectId, referent: ObjectId, kind: DependKind) {
        self.depends.add_edge(referrer, referent, kind);
    }

    fn dependents_of(&self, obj: ObjectId) -> Vec<(ObjectId, DependKind)> {
        self.depends.dependents_of(obj).collect()
    }

    fn remove_dependencies_of(&mut self, obj: ObjectId) {
        self.depends.remove_object(obj);
    }

    fn on_commit_items(&self) -> Vec<&OnCommitItem> {
        self.on_commit.values().collect()
    }

    fn upsert_on_commit_item(&mut self, item: OnCommitItem) {
        self.on_commit.insert(item.relid, item);
    }

    fn remove_on_commit_item(&mut self, relid: RelId) {
        self.on_commit.remove(&relid);
    }

    fn command_counter_increment(&mut self) -> CommandId {
        self.command_counter += 1;
        CommandId(self.command_counter)
    }

    fn invalidate(&mut self, _id: RelId) {
        self.invalidations += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relation::RelKind;
    use crate::ids::RoleId;

    fn rel(cat: &mut MemoryCatalog, name: &str) -> RelId {
        let id = cat.allocate_oid();
        cat.insert_relation(Relation::new(id, name, RelKind::Table, RoleId(1), NamespaceId(1)))
            .unwrap();
        id
    }

    #[test]
    fn duplicate_name_in_same_namespace_is_rejected() {
        let mut cat = MemoryCatalog::new();
        rel(&mut cat, "t");
        let id2 = cat.allocate_oid();
        let err = cat
            .insert_relation(Relation::new(id2, "t", RelKind::Table, RoleId(1), NamespaceId(1)))
            .unwrap_err();
        assert!(matches!(err, crate::error::CatalogError::Relation(RelationError::AlreadyExists(_))));
    }

    #[test]
    fn deleting_a_relation_clears_its_inheritance_and_dependency_edges() {
        let mut cat = MemoryCatalog::new();
        let parent = rel(&mut cat, "p");
        let child = rel(&mut cat, "c");
        cat.add_inheritance_edge(child, parent);
        cat.add_dependency(child, parent, DependKind::Auto);

        cat.delete_relation(parent).unwrap();

        assert!(cat.parents_of(child).is_empty());
        assert!(cat.dependents_of(parent).is_empty());
    }
}
