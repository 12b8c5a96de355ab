//! Liquidity share formulas.
//!
//! Shares are a proportional claim on both reserves. Because swap fees stay in
//! the reserves and are never booked against shares, the redemption value of a
//! share grows with trading volume.

use ethnum::U256;

use crate::error::PoolError;
use crate::math::{isqrt, mul_div, narrow, wide};
use crate::reserve::ReserveState;
use crate::types::Asset;

/// Shares minted by the first deposit into an empty pool: `floor(sqrt(a * b))`.
///
/// Independent of the ratio the pool is seeded at (Uniswap v2 whitepaper, §3.4).
pub fn initial_shares(amount_a: u128, amount_b: u128) -> Result<u128, PoolError> {
    narrow(isqrt(wide(amount_a) * wide(amount_b)))
}

/// Shares minted for depositing `(amount_a, amount_b)` into `state`.
///
/// For a non-empty pool the deposit is credited only for the side that matches
/// the current ratio: `min(a * T / ra, b * T / rb)`. Any excess on the other
/// side is donated to existing holders, so unbalanced deposits cannot extract value.
pub fn deposit_shares(
    state: &ReserveState,
    amount_a: u128,
    amount_b: u128,
) -> Result<u128, PoolError> {
    if amount_a == 0 || amount_b == 0 {
        return Err(PoolError::InvalidAmount);
    }

    let shares = if state.is_empty() {
        initial_shares(amount_a, amount_b)?
    } else {
        let (reserve_a, reserve_b) = state.reserves();
        let total = state.total_shares();
        let by_a = mul_div(amount_a, total, reserve_a)?;
        let by_b = mul_div(amount_b, total, reserve_b)?;
        by_a.min(by_b)
    };

    if shares == 0 {
        return Err(PoolError::InvalidAmount);
    }
    Ok(shares)
}

/// Amounts of A and B redeemed by burning `shares`: `reserve * shares / T`, floored.
///
/// A burn that would pay out zero of either asset is rejected rather than
/// silently destroying the shares.
pub fn withdrawal_amounts(state: &ReserveState, shares: u128) -> Result<(u128, u128), PoolError> {
    let total = state.total_shares();
    if shares == 0 || shares > total {
        return Err(PoolError::InsufficientShares { requested: shares, available: total });
    }

    let (reserve_a, reserve_b) = state.reserves();
    let amount_a = mul_div(reserve_a, shares, total)?;
    let amount_b = mul_div(reserve_b, shares, total)?;

    if amount_a == 0 || amount_b == 0 {
        return Err(PoolError::InvalidAmount);
    }
    Ok((amount_a, amount_b))
}

/// Amount of the opposite asset that keeps the pool ratio when depositing
/// `amount` of `provided`. Rounds up so the deposit is never short on that side.
pub fn matching_amount(
    state: &ReserveState,
    provided: Asset,
    amount: u128,
) -> Result<u128, PoolError> {
    let (reserve_provided, reserve_opposite) = state.swap_pair(provided);
    if reserve_provided == 0 || reserve_opposite == 0 {
        return Err(PoolError::ZeroReserve);
    }
    let numerator = wide(amount) * wide(reserve_opposite);
    let denominator = wide(reserve_provided);
    let quotient = numerator / denominator;
    let rounded = if quotient * denominator == numerator {
        quotient
    } else {
        quotient + U256::ONE
    };
    narrow(rounded)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(a: u128, b: u128) -> ReserveState {
        let mut state = ReserveState::default();
        let shares = initial_shares(a, b).unwrap();
        state.apply_deposit(a, b, shares).unwrap();
        state
    }

    #[test]
    fn first_deposit_mints_geometric_mean() {
        assert_eq!(initial_shares(100, 200).unwrap(), 141);
        assert_eq!(initial_shares(1, 1).unwrap(), 1);
        assert_eq!(initial_shares(4, 9).unwrap(), 6);
        assert_eq!(deposit_shares(&ReserveState::default(), 1, 1).unwrap(), 1);
    }

    #[test]
    fn first_deposit_is_symmetric() {
        assert_eq!(initial_shares(37, 1_234).unwrap(), initial_shares(1_234, 37).unwrap());
    }

    #[test]
    fn zero_amount_is_invalid() {
        let empty = ReserveState::default();
        assert_eq!(deposit_shares(&empty, 0, 100), Err(PoolError::InvalidAmount));
        assert_eq!(deposit_shares(&empty, 100, 0), Err(PoolError::InvalidAmount));
    }

    #[test]
    fn proportional_deposit_mints_proportional_shares() {
        let state = seeded(100, 200);
        // 50% more of each side → 50% more shares
        assert_eq!(deposit_shares(&state, 50, 100).unwrap(), 70);
    }

    #[test]
    fn unbalanced_deposit_is_credited_for_the_smaller_side() {
        let state = seeded(100, 200);
        let balanced = deposit_shares(&state, 50, 100).unwrap();
        let excess_b = deposit_shares(&state, 50, 1_000).unwrap();
        let excess_a = deposit_shares(&state, 500, 100).unwrap();
        assert_eq!(excess_b, balanced);
        assert_eq!(excess_a, balanced);
    }

    #[test]
    fn dust_deposit_into_deep_pool_mints_nothing() {
        let state = seeded(1_000_000, 1);
        assert_eq!(deposit_shares(&state, 1, 1), Err(PoolError::InvalidAmount));
    }

    #[test]
    fn withdrawal_pays_pro_rata_and_full_burn_empties() {
        let state = seeded(30, 150);
        let total = state.total_shares();
        assert_eq!(withdrawal_amounts(&state, total).unwrap(), (30, 150));

        let state = seeded(100, 100);
        assert_eq!(withdrawal_amounts(&state, 10).unwrap(), (10, 10));
    }

    #[test]
    fn withdrawal_bounds() {
        let state = seeded(100, 200);
        assert_eq!(
            withdrawal_amounts(&state, 0),
            Err(PoolError::InsufficientShares { requested: 0, available: 141 })
        );
        assert_eq!(
            withdrawal_amounts(&state, 142),
            Err(PoolError::InsufficientShares { requested: 142, available: 141 })
        );
        // 1 share of a (1, 10_000) pool is worth less than one unit of A
        let lopsided = seeded(1, 10_000);
        assert_eq!(withdrawal_amounts(&lopsided, 1), Err(PoolError::InvalidAmount));
    }

    #[test]
    fn matching_amount_rounds_up() {
        let state = seeded(100, 200);
        assert_eq!(matching_amount(&state, Asset::A, 50).unwrap(), 100);
        assert_eq!(matching_amount(&state, Asset::B, 3).unwrap(), 2);
        assert_eq!(
            matching_amount(&ReserveState::default(), Asset::A, 5),
            Err(PoolError::ZeroReserve)
        );
    }
}
