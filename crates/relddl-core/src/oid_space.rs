//! Conversions into the dependency graph's shared object-id space
//! (`relddl_catalog::depend`'s `ObjectId = RelId`; see that module's doc
//! comment: non-relation catalog objects reuse `RelId`'s numberspace in
//! this simplified model, the same trick `relddl-transform::alter` already
//! applies to reconcile `IndexId`/`RelId` for `REPLICA IDENTITY USING
//! INDEX`). Centralized here so every call site agrees on the mapping.

use relddl_catalog::{ConstraintId, IndexId, ObjectId, RelId, TriggerId};

pub fn relation_objid(id: RelId) -> ObjectId {
    id
}

pub fn index_objid(id: IndexId) -> ObjectId {
    RelId(id.0)
}

pub fn constraint_objid(id: ConstraintId) -> ObjectId {
    RelId(id.0)
}

pub fn trigger_objid(id: TriggerId) -> ObjectId {
    RelId(id.0)
}
