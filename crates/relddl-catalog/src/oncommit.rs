//! On-commit action data model (`spec.md` §3, §4.7). The registry itself
//! (process/session-wide, stateful) lives in `relddl-core::oncommit_registry`
//! per the design note "ON COMMIT global state" — this crate only owns the
//! inert data.

use serde::{Deserialize, Serialize};

use crate::ids::RelId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OnCommitAction {
    Noop,
    PreserveRows,
    DeleteRows,
    Drop,
}

/// A sub-transaction id. `0` is the top-level transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SubxactId(pub u32);

impl SubxactId {
    pub const TOP: SubxactId = SubxactId(0);
}

/// One work-queue entry of the on-commit registry (`spec.md` §3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnCommitItem {
    pub relid: RelId,
    pub action: OnCommitAction,
    pub creating_subid: SubxactId,
    /// `None` while the entry is live; set to the sub-transaction that
    /// tentatively removed it, so an abort can restore it (§4.7 "Sub-
    /// transaction handling").
    pub deleting_subid: Option<SubxactId>,
}
