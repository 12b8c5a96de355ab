//! Spot price derived from reserves, as an integer scaled by [`PRICE_SCALE`].
//!
//! Prices are 256-bit: `reserve * 1e18` always fits, so any non-empty pool
//! has a price, however lopsided its decimals are.

use ethnum::U256;

use crate::error::PoolError;
use crate::math::wide;
use crate::reserve::ReserveState;
use crate::types::PRICE_SCALE;

fn scaled_ratio(numerator: u128, denominator: u128) -> Result<U256, PoolError> {
    if denominator == 0 {
        return Err(PoolError::ZeroReserve);
    }
    Ok(wide(numerator) * wide(PRICE_SCALE) / wide(denominator))
}

/// Price of one unit of A in units of B: `reserve_b * 1e18 / reserve_a`.
pub fn get_price(state: &ReserveState) -> Result<U256, PoolError> {
    let (reserve_a, reserve_b) = state.reserves();
    scaled_ratio(reserve_b, reserve_a)
}

/// Price of one unit of B in units of A, same scale.
pub fn get_inverse_price(state: &ReserveState) -> Result<U256, PoolError> {
    let (reserve_a, reserve_b) = state.reserves();
    scaled_ratio(reserve_a, reserve_b)
}
