//! Chakra affordability, two-pass like the server's rule.

use crate::{
    error::LedgerError,
    game::types::{ChakraPool, CostVector, RANDOM},
};

/// Whether `pool` can pay `cost`.
///
/// Typed components are checked and deducted first; the `"Random"`
/// component is then covered by whatever is left, in any mix of types.
pub fn can_cover(pool: &ChakraPool, cost: &CostVector) -> Result<bool, LedgerError> {
    validate(cost)?;

    let mut left = pool.clone();

    // 1️⃣  Typed costs.
    for (kind, amount) in cost.iter().filter(|&(kind, _)| kind != RANDOM) {
        let need = amount as u32;
        let have = left.get(kind);
        if have < need {
            return Ok(false);
        }
        left.0.insert(kind.to_owned(), have - need);
    }

    // 2️⃣  Generic cost from the leftovers.
    let random = cost.get(RANDOM) as u64;
    Ok(random == 0 || left.total() >= random)
}

/// Rejects cost vectors with a negative component.
pub fn validate(cost: &CostVector) -> Result<(), LedgerError> {
    match cost.iter().find(|&(_, amount)| amount < 0) {
        Some((kind, amount)) => Err(LedgerError::NegativeAmount {
            kind: kind.to_owned(),
            amount,
        }),
        None => Ok(()),
    }
}

/// Sum of several cost vectors, per type.
pub fn total_cost<'a>(costs: impl IntoIterator<Item = &'a CostVector>) -> CostVector {
    let mut total = CostVector::default();
    for cost in costs {
        total.accumulate(cost);
    }
    total
}
