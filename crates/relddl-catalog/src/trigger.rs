//! The `Trigger` catalog row (`spec.md` §4.4.d, §6 "pg_trigger"): the five
//! internal rows a FOREIGN KEY constraint creates to enforce referential
//! integrity. Modeled as catalog metadata only — this crate never executes
//! DML, so there is no trigger function body here, just the bookkeeping a
//! real engine would consult to find and fire one.

use serde::{Deserialize, Serialize};

use crate::ids::{ConstraintId, RelId, TriggerId};

/// Which referential-integrity check a row enforces (§4.4.d: "create five
/// trigger rows (check-ins, check-upd, action-del, action-upd,
/// referenced-side)").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriggerKind {
    /// Fires on INSERT into the referencing relation: the new row's FK
    /// value must already exist on the referenced side.
    CheckInsert,
    /// Fires on UPDATE of the referencing relation's FK columns.
    CheckUpdate,
    /// Fires on DELETE from the referenced relation; runs `on_delete`.
    ActionOnDelete,
    /// Fires on UPDATE of the referenced relation's key columns; runs `on_update`.
    ActionOnUpdate,
    /// Fires on INSERT/UPDATE of the referenced relation, re-checking its
    /// own uniqueness against concurrent inserts on the referencing side.
    ReferencedSide,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trigger {
    pub id: TriggerId,
    /// The relation this trigger actually fires on: the referencing
    /// relation for `CheckInsert`/`CheckUpdate`, the referenced relation for
    /// the other three kinds.
    pub relation: RelId,
    pub constraint: ConstraintId,
    pub kind: TriggerKind,
}

impl Trigger {
    pub fn new(id: TriggerId, relation: RelId, constraint: ConstraintId, kind: TriggerKind) -> Self {
        Trigger { id, relation, constraint, kind }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trigger_carries_the_constraint_and_relation_it_was_created_for() {
        let t = Trigger::new(TriggerId(1), RelId(10), ConstraintId(3), TriggerKind::CheckInsert);
        assert_eq!(t.relation, RelId(10));
        assert_eq!(t.constraint, ConstraintId(3));
    }
}
