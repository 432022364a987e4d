//! The injected `Catalog` trait (design note "Catalog access"): treats the
//! storage layer as a transactional key/value store over tuple-structured
//! tables keyed by OID (`spec.md` §1 "catalog storage layer ... treated as
//! ... external"). Every executor in `relddl-core` takes `&mut dyn Catalog`;
//! no executor has its own global state.

use crate::attribute::Attribute;
use crate::constraint::Constraint;
use crate::depend::{DependKind, ObjectId};
use crate::error::Result;
use crate::ids::{AttNum, ConstraintId, IndexId, NamespaceId, RelId, TriggerId};
use crate::index::Index;
use crate::oncommit::OnCommitItem;
use crate::relation::Relation;
use crate::trigger::Trigger;

/// A command-counter value (`spec.md` §4.2 "Ordering rationale", §5
/// "Ordering guarantees"): bumped between related sub-steps of one
/// statement so that later sub-commands can see catalog rows written by
/// earlier ones within the same transaction, without those rows being
/// visible to any other transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct CommandId(pub u32);

/// The catalog as seen by one in-flight transaction.
///
/// Implementors provide MVCC-correct storage; this crate's [`crate::memory`]
/// module provides a minimal in-process one for tests and for embedders
/// without a real storage engine (design note: "This makes testing possible
/// without a real storage engine").
pub trait Catalog {
    // -- relations --------------------------------------------------------
    fn allocate_oid(&mut self) -> RelId;
    fn get_relation(&self, id: RelId) -> Option<&Relation>;
    fn get_relation_mut(&mut self, id: RelId) -> Option<&mut Relation>;
    fn find_relation_by_name(&self, namespace: NamespaceId, name: &str) -> Option<RelId>;
    fn insert_relation(&mut self, rel: Relation) -> Result<()>;
    fn delete_relation(&mut self, id: RelId) -> Result<()>;
    fn all_relation_ids(&self) -> Vec<RelId>;

    // -- attributes ---------------------------------------------------------
    fn attributes(&self, rel: RelId) -> Vec<&Attribute>;
    fn get_attribute(&self, rel: RelId, attnum: AttNum) -> Option<&Attribute>;
    fn get_attribute_mut(&mut self, rel: RelId, attnum: AttNum) -> Option<&mut Attribute>;
    fn insert_attribute(&mut self, rel: RelId, attr: Attribute) -> Result<()>;
    /// Attributes are never actually removed (I1); "dropping" one is a
    /// mutation performed by the caller via `get_attribute_mut`, setting
    /// `dropped = true`. This method exists only for the rare legitimate
    /// case of unwinding a failed `ADD COLUMN` within the same statement,
    /// before it was ever visible to another sub-command.
    fn remove_uncommitted_attribute(&mut self, rel: RelId, attnum: AttNum) -> Result<()>;

    // -- constraints --------------------------------------------------------
    fn allocate_constraint_id(&mut self) -> ConstraintId;
    fn constraints(&self, rel: RelId) -> Vec<&Constraint>;
    fn get_constraint(&self, id: ConstraintId) -> Option<&Constraint>;
    fn get_constraint_mut(&mut self, id: ConstraintId) -> Option<&mut Constraint>;
    fn find_constraint_by_name(&self, rel: RelId, name: &str) -> Option<ConstraintId>;
    fn insert_constraint(&mut self, c: Constraint) -> Result<()>;
    fn delete_constraint(&mut self, id: ConstraintId) -> Result<()>;

    // -- indexes --------------------------------------------------------
    fn allocate_index_id(&mut self) -> IndexId;
    fn indexes_on(&self, rel: RelId) -> Vec<&Index>;
    fn get_index(&self, id: IndexId) -> Option<&Index>;
    fn get_index_mut(&mut self, id: IndexId) -> Option<&mut Index>;
    fn insert_index(&mut self, ix: Index) -> Result<()>;
    fn delete_index(&mut self, id: IndexId) -> Result<()>;

    // -- triggers (pg_trigger equivalent; §4.4.d FK enforcement rows) -------
    fn allocate_trigger_id(&mut self) -> TriggerId;
    fn triggers_on(&self, rel: RelId) -> Vec<&Trigger>;
    fn triggers_for_constraint(&self, constraint: ConstraintId) -> Vec<&Trigger>;
    fn insert_trigger(&mut self, t: Trigger) -> Result<()>;
    fn delete_trigger(&mut self, id: TriggerId) -> Result<()>;

    // -- inheritance (pg_inherits equivalent) --------------------------------
    fn parents_of(&self, child: RelId) -> Vec<RelId>;
    fn children_of(&self, parent: RelId) -> Vec<RelId>;
    fn add_inheritance_edge(&mut self, child: RelId, parent: RelId);
    fn remove_inheritance_edge(&mut self, child: RelId, parent: RelId);

    // -- dependencies (pg_depend equivalent) --------------------------------
    fn add_dependency(&mut self, referrer: ObjectId, referent: ObjectId, kind: DependKind);
    fn dependents_of(&self, obj: ObjectId) -> Vec<(ObjectId, DependKind)>;
    fn remove_dependencies_of(&mut self, obj: ObjectId);

    // -- on-commit registry storage (C7 uses this for persistence across
    // the session; the registry logic itself lives in relddl-core) --------
    fn on_commit_items(&self) -> Vec<&OnCommitItem>;
    fn upsert_on_commit_item(&mut self, item: OnCommitItem);
    fn remove_on_commit_item(&mut self, relid: RelId);

    // -- visibility ----------------------------------------------------
    /// Bumps the command counter so that subsequent reads in this same
    /// transaction observe everything written so far (§4.2).
    fn command_counter_increment(&mut self) -> CommandId;

    /// Broadcasts a relcache invalidation for `id` (§5 "Shared-resource
    /// policy"). The in-memory reference implementation just counts these;
    /// a real implementation would notify other sessions.
    fn invalidate(&mut self, id: RelId);
}
