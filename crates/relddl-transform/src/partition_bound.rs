//! `transform_partition_bound`: coerces a raw `PARTITION OF ... FOR VALUES`
//! clause against the parent's partition strategy (`spec.md` §4.1
//! "Partition-bound validation").

use relddl_catalog::{PartitionBound, PartitionKey, PartitionStrategy, RangeDatum};

use crate::error::{Result, TransformError};
use crate::raw::{RawPartitionBoundSpec, RawRangeDatum};

/// Coerces and validates a raw bound spec against the parent's
/// [`PartitionKey`]. Does not check overlap against sibling partitions —
/// that's `relddl-core`'s `partition_manager` (C5), which needs the whole
/// sibling set and so can't live in this stateless crate.
pub fn transform_partition_bound(parent_key: &PartitionKey, spec: &RawPartitionBoundSpec) -> Result<PartitionBound> {
    match (parent_key.strategy, spec) {
        (PartitionStrategy::List, RawPartitionBoundSpec::List { values }) => {
            if values.is_empty() {
                return Err(TransformError::InvalidTableDefinition(
                    "a LIST partition must specify at least one value".into(),
                ));
            }
            let mut seen = std::collections::HashSet::new();
            for v in values {
                if !seen.insert(v.clone()) {
                    return Err(TransformError::InvalidTableDefinition(format!(
                        "duplicate partition value \"{v}\""
                    )));
                }
            }
            Ok(PartitionBound::List { values: values.clone() })
        }
        (PartitionStrategy::Range, RawPartitionBoundSpec::Range { from, to }) => {
            let from = coerce_range_tuple(from, parent_key.columns.len())?;
            let to = coerce_range_tuple(to, parent_key.columns.len())?;
            if !PartitionBound::range_tuple_is_contiguous(&from) || !PartitionBound::range_tuple_is_contiguous(&to) {
                return Err(TransformError::InvalidTableDefinition(
                    "MINVALUE/MAXVALUE must be trailing and uniform within a range bound tuple".into(),
                ));
            }
            if from >= to {
                return Err(TransformError::InvalidTableDefinition(
                    "range partition lower bound must be strictly less than the upper bound".into(),
                ));
            }
            Ok(PartitionBound::Range { from, to })
        }
        (PartitionStrategy::Hash, RawPartitionBoundSpec::Hash { modulus, remainder }) => {
            if !PartitionBound::hash_is_valid(*modulus, *remainder) {
                return Err(TransformError::InvalidTableDefinition(format!(
                    "modulus {modulus} must be positive and remainder {remainder} must be less than it"
                )));
            }
            Ok(PartitionBound::Hash { modulus: *modulus, remainder: *remainder })
        }
        (PartitionStrategy::List | PartitionStrategy::Range, RawPartitionBoundSpec::Default) => {
            Ok(PartitionBound::Default)
        }
        (PartitionStrategy::Hash, RawPartitionBoundSpec::Default) => Err(TransformError::InvalidTableDefinition(
            "a default partition is not allowed for a hash-partitioned table".into(),
        )),
        (PartitionStrategy::Interval, _) => Err(TransformError::FeatureNotSupported(
            "INTERVAL partitioning bounds are assigned automatically, not declared".into(),
        )),
        (strategy, _) => Err(TransformError::InvalidTableDefinition(format!(
            "partition bound spec does not match the parent's {strategy:?} partitioning strategy"
        ))),
    }
}

fn coerce_range_tuple(datums: &[RawRangeDatum], expected_len: usize) -> Result<Vec<RangeDatum>> {
    if datums.len() != expected_len {
        return Err(TransformError::InvalidTableDefinition(format!(
            "range bound has {} values but the partition key has {expected_len} columns",
            datums.len()
        )));
    }
    Ok(datums
        .iter()
        .map(|d| match d {
            RawRangeDatum::MinValue => RangeDatum::MinValue,
            RawRangeDatum::MaxValue => RangeDatum::MaxValue,
            RawRangeDatum::Literal(s) => RangeDatum::Value(s.clone()),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use relddl_catalog::PartitionKeyColumn;

    fn list_key() -> PartitionKey {
        PartitionKey {
            strategy: PartitionStrategy::List,
            columns: vec![PartitionKeyColumn {
                attnum: Some(relddl_catalog::AttNum(1)),
                expr: None,
                opclass: "default".into(),
                collation: None,
            }],
        }
    }

    fn range_key(n: usize) -> PartitionKey {
        PartitionKey {
            strategy: PartitionStrategy::Range,
            columns: (0..n)
                .map(|i| PartitionKeyColumn {
                    attnum: Some(relddl_catalog::AttNum((i + 1) as i16)),
                    expr: None,
                    opclass: "default".into(),
                    collation: None,
                })
                .collect(),
        }
    }

    fn hash_key() -> PartitionKey {
        PartitionKey {
            strategy: PartitionStrategy::Hash,
            columns: vec![PartitionKeyColumn {
                attnum: Some(relddl_catalog::AttNum(1)),
                expr: None,
                opclass: "default".into(),
                collation: None,
            }],
        }
    }

    #[test]
    fn list_bound_rejects_duplicates() {
        let key = list_key();
        let spec = RawPartitionBoundSpec::List { values: vec!["a".into(), "a".into()] };
        assert!(transform_partition_bound(&key, &spec).is_err());
    }

    #[test]
    fn range_bound_requires_matching_arity() {
        let key = range_key(2);
        let spec = RawPartitionBoundSpec::Range {
            from: vec![RawRangeDatum::MinValue],
            to: vec![RawRangeDatum::MaxValue],
        };
        assert!(transform_partition_bound(&key, &spec).is_err());
    }

    #[test]
    fn range_bound_rejects_lower_not_less_than_upper() {
        let key = range_key(1);
        let spec = RawPartitionBoundSpec::Range {
            from: vec![RawRangeDatum::Literal("10".into())],
            to: vec![RawRangeDatum::Literal("1".into())],
        };
        assert!(transform_partition_bound(&key, &spec).is_err());
    }

    #[test]
    fn range_bound_accepts_minvalue_to_maxvalue() {
        let key = range_key(1);
        let spec =
            RawPartitionBoundSpec::Range { from: vec![RawRangeDatum::MinValue], to: vec![RawRangeDatum::MaxValue] };
        assert!(transform_partition_bound(&key, &spec).is_ok());
    }

    #[test]
    fn hash_bound_rejects_remainder_past_modulus() {
        let key = hash_key();
        let spec = RawPartitionBoundSpec::Hash { modulus: 4, remainder: 4 };
        assert!(transform_partition_bound(&key, &spec).is_err());
    }

    #[test]
    fn default_partition_rejected_under_hash_strategy() {
        let key = hash_key();
        assert!(transform_partition_bound(&key, &RawPartitionBoundSpec::Default).is_err());
    }

    #[test]
    fn default_partition_accepted_under_list_strategy() {
        let key = list_key();
        assert!(transform_partition_bound(&key, &RawPartitionBoundSpec::Default).is_ok());
    }
}
