//! Chakra affordability: typed pass, then the generic "Random" pass.

use arena_client::{
    error::LedgerError,
    game::{
        chakra::{can_cover, total_cost},
        types::{ChakraPool, CostVector},
    },
};
use proptest::prelude::*;
use std::collections::BTreeMap;

const TYPES: [&str; 4] = ["Power", "Blood", "Mind", "Speed"];

#[test]
fn typed_cost_within_pool_is_affordable() {
    let pool = ChakraPool::from([("Power", 2), ("Random", 0)]);
    assert_eq!(can_cover(&pool, &CostVector::from([("Power", 1)])), Ok(true));
}

#[test]
fn typed_cost_above_pool_is_not_affordable() {
    let pool = ChakraPool::from([("Power", 1)]);
    assert_eq!(can_cover(&pool, &CostVector::from([("Power", 2)])), Ok(false));
}

#[test]
fn leftover_of_another_type_covers_random() {
    let pool = ChakraPool::from([("Power", 1), ("Blood", 1)]);
    let cost = CostVector::from([("Power", 1), ("Random", 1)]);
    assert_eq!(can_cover(&pool, &cost), Ok(true));
}

#[test]
fn random_needs_something_left_after_typed_costs() {
    let pool = ChakraPool::from([("Power", 1)]);
    let cost = CostVector::from([("Power", 1), ("Random", 1)]);
    assert_eq!(can_cover(&pool, &cost), Ok(false));
}

#[test]
fn empty_cost_always_succeeds() {
    assert_eq!(can_cover(&ChakraPool::default(), &CostVector::default()), Ok(true));
}

#[test]
fn type_missing_from_pool_counts_as_zero() {
    let pool = ChakraPool::from([("Power", 5)]);
    assert_eq!(can_cover(&pool, &CostVector::from([("Mind", 1)])), Ok(false));
    assert_eq!(can_cover(&pool, &CostVector::from([("Mind", 0)])), Ok(true));
}

#[test]
fn negative_amount_is_rejected_not_clamped() {
    let pool = ChakraPool::from([("Power", 5)]);
    let err = can_cover(&pool, &CostVector::from([("Power", -1)])).unwrap_err();
    assert_eq!(
        err,
        LedgerError::NegativeAmount {
            kind: "Power".into(),
            amount: -1
        }
    );
}

#[test]
fn random_may_mix_several_leftover_types() {
    let pool = ChakraPool::from([("Power", 2), ("Blood", 1), ("Mind", 1)]);
    let cost = CostVector::from([("Power", 1), ("Random", 3)]);
    assert_eq!(can_cover(&pool, &cost), Ok(true));
    let cost = CostVector::from([("Power", 1), ("Random", 4)]);
    assert_eq!(can_cover(&pool, &cost), Ok(false));
}

#[test]
fn total_cost_sums_per_type() {
    let a = CostVector::from([("Power", 1), ("Random", 1)]);
    let b = CostVector::from([("Power", 2), ("Blood", 1)]);
    let total = total_cost([&a, &b]);
    assert_eq!(total, CostVector::from([("Power", 3), ("Blood", 1), ("Random", 1)]));
}

fn arb_pool() -> impl Strategy<Value = ChakraPool> {
    proptest::collection::vec(0u32..6, TYPES.len()).prop_map(|counts| {
        ChakraPool(
            TYPES
                .iter()
                .zip(counts)
                .map(|(k, v)| (k.to_string(), v))
                .collect::<BTreeMap<_, _>>(),
        )
    })
}

fn arb_typed_cost() -> impl Strategy<Value = CostVector> {
    proptest::collection::btree_map(proptest::sample::select(TYPES.to_vec()), 0i32..6, 0..4)
        .prop_map(|m| CostVector(m.into_iter().map(|(k, v)| (k.to_string(), v)).collect()))
}

proptest! {
    #[test]
    fn typed_only_cost_is_covered_iff_every_type_is(pool in arb_pool(), cost in arb_typed_cost()) {
        let expected = cost.iter().all(|(kind, amount)| pool.get(kind) >= amount as u32);
        prop_assert_eq!(can_cover(&pool, &cost), Ok(expected));
    }

    #[test]
    fn random_is_covered_iff_leftovers_suffice(
        pool in arb_pool(),
        typed in arb_typed_cost(),
        random in 1i32..10,
    ) {
        let typed_ok = typed.iter().all(|(kind, amount)| pool.get(kind) >= amount as u32);
        prop_assume!(typed_ok);

        let spent: u64 = typed.iter().map(|(_, amount)| amount as u64).sum();
        let leftover = pool.total() - spent;

        let mut cost = typed.clone();
        cost.0.insert("Random".into(), random);
        prop_assert_eq!(can_cover(&pool, &cost), Ok(leftover >= random as u64));
    }
}
