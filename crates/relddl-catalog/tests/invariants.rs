//! Property-style checks for the catalog-level invariants of `spec.md` §3
//! that don't require the full ALTER controller (`relddl-core` owns the
//! rest, in its `tests/scenarios.rs`).

use proptest::prelude::*;
use relddl_catalog::{PartitionBound, RangeDatum};

proptest! {
    /// §4.1: HASH bounds are valid iff `modulus > 0 && remainder < modulus`.
    #[test]
    fn hash_bound_validity_matches_definition(modulus in 0u32..8, remainder in 0u32..8) {
        let valid = PartitionBound::hash_is_valid(modulus, remainder);
        prop_assert_eq!(valid, modulus > 0 && remainder < modulus);
    }

    /// §4.1: a RANGE tuple built from any prefix of plain values followed by
    /// a run of the *same* sentinel is always contiguous; interleaving a
    /// plain value after a sentinel never is.
    #[test]
    fn range_tuple_prefix_then_uniform_sentinel_is_contiguous(
        n_values in 0usize..4,
        n_sentinels in 0usize..4,
        use_max in any::<bool>(),
    ) {
        let mut tuple = Vec::new();
        for i in 0..n_values {
            tuple.push(RangeDatum::Value(i.to_string()));
        }
        let sentinel = if use_max { RangeDatum::MaxValue } else { RangeDatum::MinValue };
        for _ in 0..n_sentinels {
            tuple.push(sentinel.clone());
        }
        prop_assert!(PartitionBound::range_tuple_is_contiguous(&tuple));
    }
}

#[test]
fn range_tuple_with_value_after_sentinel_is_rejected() {
    let tuple = vec![RangeDatum::MaxValue, RangeDatum::Value("5".into())];
    assert!(!PartitionBound::range_tuple_is_contiguous(&tuple));
}
