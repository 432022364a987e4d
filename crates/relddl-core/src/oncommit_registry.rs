//! The `ON COMMIT` registry (C7, `spec.md` §3, §4.7): session-wide
//! bookkeeping of which relations have a pending end-of-transaction action.
//! `relddl_catalog::oncommit` only defines the inert [`OnCommitItem`] row;
//! this is where the register/remove/commit/abort state machine lives, per
//! that module's own doc comment.

use relddl_catalog::{Catalog, OnCommitAction, OnCommitItem, RelId, SubxactId};

use crate::error::{CoreError, Result};

#[derive(Debug, Default)]
pub struct OnCommitRegistry {
    items: Vec<OnCommitItem>,
}

impl OnCommitRegistry {
    pub fn new() -> Self {
        OnCommitRegistry::default()
    }

    /// Registers `action` for `relid`, created within `subxact`. Errors if
    /// the relation already has a live registration (`CREATE TABLE` only
    /// ever registers once per relation).
    pub fn register(&mut self, catalog: &mut dyn Catalog, relid: RelId, action: OnCommitAction, subxact: SubxactId) -> Result<()> {
        if self.items.iter().any(|i| i.relid == relid && i.deleting_subid.is_none()) {
            return Err(CoreError::OnCommitAlreadyRegistered(relid));
        }
        let item = OnCommitItem { relid, action, creating_subid: subxact, deleting_subid: None };
        catalog.upsert_on_commit_item(item.clone());
        self.items.push(item);
        Ok(())
    }

    /// Tentatively removes `relid`'s registration (the relation itself is
    /// being dropped within `subxact`); kept around with `deleting_subid`
    /// set so an abort of just this subtransaction can restore it (§4.7
    /// "Sub-transaction handling").
    pub fn tentatively_remove(&mut self, relid: RelId, subxact: SubxactId) {
        for item in self.items.iter_mut() {
            if item.relid == relid && item.deleting_subid.is_none() {
                item.deleting_subid = Some(subxact);
            }
        }
    }

    /// Resolves a subtransaction boundary: on commit, folds surviving items
    /// into the parent scope; on abort, discards anything the aborted
    /// subtransaction created and restores anything it only tentatively
    /// removed.
    pub fn at_end_subxact(&mut self, catalog: &mut dyn Catalog, subxact: SubxactId, committed: bool, parent: SubxactId) {
        if committed {
            for item in self.items.iter_mut() {
                if item.creating_subid == subxact {
                    item.creating_subid = parent;
                }
            }
            self.items.retain(|item| {
                if item.deleting_subid == Some(subxact) {
                    catalog.remove_on_commit_item(item.relid);
                    false
                } else {
                    true
                }
            });
        } else {
            self.items.retain(|item| item.creating_subid != subxact);
            for item in self.items.iter_mut() {
                if item.deleting_subid == Some(subxact) {
                    item.deleting_subid = None;
                }
            }
        }
    }

    /// §4.7: runs every live item's action at top-level transaction end,
    /// returning the relations that must actually be dropped (the caller —
    /// `inheritance::drop_relation` — performs the drop; this registry only
    /// decides which relations need one). `PRESERVE ROWS`/`DELETE ROWS`
    /// items stay registered for the next transaction; `DROP` items are
    /// removed once returned, since the relation they name won't exist to
    /// re-fire against.
    pub fn at_end_xact(&mut self, catalog: &mut dyn Catalog, committed: bool) -> Vec<RelId> {
        if !committed {
            // An aborted top-level transaction never got to run any action;
            // anything it created never really existed either.
            self.items.retain(|item| item.creating_subid == SubxactId::TOP && item.deleting_subid.is_none());
            return Vec::new();
        }

        let mut to_drop = Vec::new();
        self.items.retain(|item| {
            if item.deleting_subid.is_some() {
                // Already being dropped through an ordinary DROP TABLE;
                // don't also fire its ON COMMIT action.
                return false;
            }
            match item.action {
                OnCommitAction::Noop | OnCommitAction::PreserveRows | OnCommitAction::DeleteRows => true,
                OnCommitAction::Drop => {
                    to_drop.push(item.relid);
                    catalog.remove_on_commit_item(item.relid);
                    false
                }
            }
        });
        to_drop
    }

    pub fn live_items(&self) -> impl Iterator<Item = &OnCommitItem> {
        self.items.iter().filter(|i| i.deleting_subid.is_none())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relddl_catalog::MemoryCatalog;

    #[test]
    fn registering_twice_for_the_same_relation_is_rejected() {
        let mut cat = MemoryCatalog::new();
        let mut reg = OnCommitRegistry::new();
        reg.register(&mut cat, RelId(1), OnCommitAction::DeleteRows, SubxactId::TOP).unwrap();
        assert!(reg.register(&mut cat, RelId(1), OnCommitAction::DeleteRows, SubxactId::TOP).is_err());
    }

    #[test]
    fn on_commit_drop_fires_at_top_level_commit() {
        let mut cat = MemoryCatalog::new();
        let mut reg = OnCommitRegistry::new();
        reg.register(&mut cat, RelId(1), OnCommitAction::Drop, SubxactId::TOP).unwrap();
        let dropped = reg.at_end_xact(&mut cat, true);
        assert_eq!(dropped, vec![RelId(1)]);
        assert_eq!(reg.live_items().count(), 0);
    }

    #[test]
    fn delete_rows_survives_commit_for_next_transaction() {
        let mut cat = MemoryCatalog::new();
        let mut reg = OnCommitRegistry::new();
        reg.register(&mut cat, RelId(1), OnCommitAction::DeleteRows, SubxactId::TOP).unwrap();
        let dropped = reg.at_end_xact(&mut cat, true);
        assert!(dropped.is_empty());
        assert_eq!(reg.live_items().count(), 1);
    }

    #[test]
    fn aborted_subxact_restores_tentatively_removed_item() {
        let mut cat = MemoryCatalog::new();
        let mut reg = OnCommitRegistry::new();
        reg.register(&mut cat, RelId(1), OnCommitAction::Drop, SubxactId::TOP).unwrap();
        reg.tentatively_remove(RelId(1), SubxactId(1));
        reg.at_end_subxact(&mut cat, SubxactId(1), false, SubxactId::TOP);
        assert_eq!(reg.live_items().count(), 1);
    }

    #[test]
    fn aborted_subxact_discards_items_it_created() {
        let mut cat = MemoryCatalog::new();
        let mut reg = OnCommitRegistry::new();
        reg.register(&mut cat, RelId(2), OnCommitAction::Drop, SubxactId(1)).unwrap();
        reg.at_end_subxact(&mut cat, SubxactId(1), false, SubxactId::TOP);
        assert_eq!(reg.live_items().count(), 0);
    }
}
