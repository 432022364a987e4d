//! Partition keys and bounds (`spec.md` §3, glossary "Partition key"/
//! "Partition bound").

use serde::{Deserialize, Serialize};

use crate::ids::{AttNum, CollationId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PartitionStrategy {
    List,
    Range,
    Hash,
    Interval,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartitionKeyColumn {
    pub attnum: Option<AttNum>,
    /// Present instead of `attnum` for an expression key column.
    pub expr: Option<String>,
    pub opclass: String,
    pub collation: Option<CollationId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartitionKey {
    pub strategy: PartitionStrategy,
    pub columns: Vec<PartitionKeyColumn>,
}

/// A single literal participating in a `LIST`/`RANGE` bound. Serialized
/// opaquely as text here since literal coercion to the key column's type is
/// `relddl-transform`'s job (§4.1 `transform_partition_bound`); this crate
/// only needs to compare and order them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RangeDatum {
    MinValue,
    Value(String),
    MaxValue,
}

impl RangeDatum {
    fn rank(&self) -> i8 {
        match self {
            RangeDatum::MinValue => -1,
            RangeDatum::Value(_) => 0,
            RangeDatum::MaxValue => 1,
        }
    }
}

impl PartialOrd for RangeDatum {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(match (self, other) {
            (RangeDatum::Value(a), RangeDatum::Value(b)) => compare_values(a, b),
            _ => self.rank().cmp(&other.rank()),
        })
    }
}

/// Bound literals are stored as opaque text (coercion to the key column's
/// type already happened in `relddl-transform`), but a byte-wise `String`
/// compare sorts "5" after "10" and silently misses overlapping numeric
/// ranges. Parse both sides as `f64` first; fall back to lexicographic
/// comparison only when one side doesn't parse (e.g. text-keyed ranges).
fn compare_values(a: &str, b: &str) -> std::cmp::Ordering {
    match (a.parse::<f64>(), b.parse::<f64>()) {
        (Ok(x), Ok(y)) => x.partial_cmp(&y).unwrap_or(std::cmp::Ordering::Equal),
        _ => a.cmp(b),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PartitionBound {
    List { values: Vec<String> },
    Range { from: Vec<RangeDatum>, to: Vec<RangeDatum> },
    Hash { modulus: u32, remainder: u32 },
    Default,
}

impl PartitionBound {
    /// §4.1 RANGE rule: once one element is `MINVALUE`/`MAXVALUE`, every
    /// element after it in the same tuple must share that same kind.
    pub fn range_tuple_is_contiguous(tuple: &[RangeDatum]) -> bool {
        let mut seen_sentinel: Option<&RangeDatum> = None;
        for d in tuple {
            if let Some(prev) = seen_sentinel {
                if !matches!(d, RangeDatum::MinValue | RangeDatum::MaxValue) || prev.rank() != d.rank() {
                    return false;
                }
            }
            if matches!(d, RangeDatum::MinValue | RangeDatum::MaxValue) {
                seen_sentinel = Some(d);
            }
        }
        true
    }

    /// §4.1 HASH rule.
    pub fn hash_is_valid(modulus: u32, remainder: u32) -> bool {
        modulus > 0 && remainder < modulus
    }
}
