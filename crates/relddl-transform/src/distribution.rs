//! Distribution-strategy fallback resolution (`spec.md` §4.1 "Distribution
//! fallback"). The catalog layer never sees this except as an opaque
//! [`DistributionPlan`] (design note "Distribution layer"); all the
//! decision-making happens here, once, at `CREATE TABLE` time.

use relddl_catalog::ConstraintKind;

use crate::raw::RawDistributeBy;
use crate::resolved::{ColumnPlan, ConstraintPlan, DistributionKind, DistributionPlan};

/// §4.1 fallback priority, applied when the statement didn't name
/// `DISTRIBUTE BY` explicitly:
///
/// 1. a foreign key that forces replication wins outright;
/// 2. the first column of the primary key, if the table has one and that
///    column is hash-distributable;
/// 3. the first column of any unique index;
/// 4. the first declared column that is hash-distributable;
/// 5. round robin, if nothing else applies.
pub fn resolve_distribution(
    explicit: Option<&RawDistributeBy>,
    columns: &[ColumnPlan],
    constraints: &[ConstraintPlan],
    fk_forces_replication: bool,
) -> DistributionPlan {
    if let Some(explicit) = explicit {
        return DistributionPlan {
            kind: map_strategy(explicit.strategy),
            column: explicit.column.clone(),
        };
    }

    if fk_forces_replication {
        return DistributionPlan { kind: DistributionKind::Replication, column: None };
    }

    if let Some(pk) = constraints.iter().find(|c| c.kind == ConstraintKind::Primary) {
        if let Some(col) = pk.index_columns.first() {
            if is_hash_distributable(columns, col) {
                return DistributionPlan { kind: DistributionKind::Hash, column: Some(col.clone()) };
            }
        }
    }

    if let Some(uq) = constraints.iter().find(|c| c.kind == ConstraintKind::Unique) {
        if let Some(col) = uq.index_columns.first() {
            return DistributionPlan { kind: DistributionKind::Hash, column: Some(col.clone()) };
        }
    }

    if let Some(col) = columns.iter().find(|c| is_hash_distributable(columns, &c.name)) {
        return DistributionPlan { kind: DistributionKind::Hash, column: Some(col.name.clone()) };
    }

    DistributionPlan { kind: DistributionKind::RoundRobin, column: None }
}

fn map_strategy(strategy: crate::raw::RawDistributionStrategy) -> DistributionKind {
    use crate::raw::RawDistributionStrategy as R;
    match strategy {
        R::Hash => DistributionKind::Hash,
        R::Modulo => DistributionKind::Modulo,
        R::Shard => DistributionKind::Shard,
        R::Replication => DistributionKind::Replication,
        R::RoundRobin => DistributionKind::RoundRobin,
    }
}

/// A column is hash-distributable if it names a real, present column; types
/// without an equality/hash opclass are out of scope for this engine
/// (no type catalog is modeled here, so every named column qualifies).
fn is_hash_distributable(columns: &[ColumnPlan], name: &str) -> bool {
    columns.iter().any(|c| c.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use relddl_catalog::{IdentityMode, StorageMode, TypeId};

    fn col(name: &str) -> ColumnPlan {
        ColumnPlan {
            name: name.to_string(),
            type_id: TypeId(23),
            typmod: -1,
            collation: None,
            storage: StorageMode::Plain,
            not_null: false,
            default_expr: None,
            identity: IdentityMode::None,
        }
    }

    fn pk(column: &str) -> ConstraintPlan {
        ConstraintPlan {
            name: "pk".into(),
            kind: ConstraintKind::Primary,
            deferrable: false,
            initially_deferred: false,
            not_valid: false,
            check_expr: None,
            index_columns: vec![column.to_string()],
            foreign_key: None,
        }
    }

    #[test]
    fn explicit_distribution_always_wins() {
        let explicit = RawDistributeBy { strategy: crate::raw::RawDistributionStrategy::RoundRobin, column: None };
        let plan = resolve_distribution(Some(&explicit), &[col("id")], &[pk("id")], false);
        assert_eq!(plan.kind, DistributionKind::RoundRobin);
    }

    #[test]
    fn fk_forced_replication_beats_primary_key_fallback() {
        let plan = resolve_distribution(None, &[col("id")], &[pk("id")], true);
        assert_eq!(plan.kind, DistributionKind::Replication);
        assert!(plan.column.is_none());
    }

    #[test]
    fn falls_back_to_primary_key_column() {
        let plan = resolve_distribution(None, &[col("id"), col("name")], &[pk("id")], false);
        assert_eq!(plan.kind, DistributionKind::Hash);
        assert_eq!(plan.column.as_deref(), Some("id"));
    }

    #[test]
    fn falls_back_to_round_robin_with_no_keys_or_columns() {
        let plan = resolve_distribution(None, &[], &[], false);
        assert_eq!(plan.kind, DistributionKind::RoundRobin);
    }
}
