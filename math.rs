//! Exact integer helpers shared by the pricing and share formulas.
//!
//! Amounts are stored as `u128`; every product goes through a 256-bit
//! intermediate so that `a * b / c` never overflows before the division.

use ethnum::U256;

use crate::error::PoolError;

#[inline]
pub fn wide(v: u128) -> U256 {
    U256::new(v)
}

/// Narrow a 256-bit result back to `u128`.
#[inline]
pub fn narrow(v: U256) -> Result<u128, PoolError> {
    let (hi, lo) = v.into_words();
    if hi != 0 {
        return Err(PoolError::Overflow);
    }
    Ok(lo)
}

/// `floor(a * b / denominator)` with a full-width product.
pub fn mul_div(a: u128, b: u128, denominator: u128) -> Result<u128, PoolError> {
    if denominator == 0 {
        return Err(PoolError::ZeroReserve);
    }
    narrow(wide(a) * wide(b) / wide(denominator))
}

/// Product of three factors, `None` if it does not fit in 256 bits.
pub fn checked_product(a: U256, b: U256, c: U256) -> Option<U256> {
    a.checked_mul(b)?.checked_mul(c)
}

/// Largest `x` such that `x * x <= y` (Newton's method, rounding down).
pub fn isqrt(y: U256) -> U256 {
    if y < U256::new(4) {
        return if y == U256::ZERO { U256::ZERO } else { U256::ONE };
    }
    let mut z = y;
    let two = U256::new(2);
    let mut x = y / two + U256::ONE;
    while x < z {
        z = x;
        x = (y / x + x) / two;
    }
    z
}
