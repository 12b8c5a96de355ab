//! Constant-product pricing with a fee retained on the input side.
//!
//! ```text
//! in_eff     = amount_in * (D - N) / D
//! amount_out = reserve_out * in_eff / (reserve_in + in_eff)
//! ```
//!
//! evaluated as a single floored fraction over `D` so no precision is lost to
//! an intermediate rounding of `in_eff`.

use crate::error::PoolError;
use crate::math::{checked_product, narrow, wide};
use crate::types::FeeRate;

/// Output for selling `amount_in` into a pool holding `(reserve_in, reserve_out)`.
///
/// Always `< reserve_out`: the opposite reserve can never be drained.
pub fn get_amount_out(
    amount_in: u128,
    reserve_in: u128,
    reserve_out: u128,
    fee: FeeRate,
) -> Result<u128, PoolError> {
    fee.validate()?;
    if amount_in == 0 {
        return Err(PoolError::InvalidAmount);
    }
    if reserve_in == 0 || reserve_out == 0 {
        return Err(PoolError::ZeroReserve);
    }

    let retained = wide(fee.retained());
    let numerator =
        checked_product(wide(amount_in), retained, wide(reserve_out)).ok_or(PoolError::Overflow)?;
    let denominator = wide(reserve_in)
        .checked_mul(wide(fee.denominator))
        .and_then(|scaled_reserve| {
            wide(amount_in).checked_mul(retained)?.checked_add(scaled_reserve)
        })
        .ok_or(PoolError::Overflow)?;

    narrow(numerator / denominator)
}

/// Smallest input whose output is at least `amount_out` (reverse quote).
pub fn get_amount_in(
    amount_out: u128,
    reserve_in: u128,
    reserve_out: u128,
    fee: FeeRate,
) -> Result<u128, PoolError> {
    fee.validate()?;
    if amount_out == 0 || amount_out >= reserve_out {
        return Err(PoolError::InvalidAmount);
    }
    if reserve_in == 0 {
        return Err(PoolError::ZeroReserve);
    }

    let numerator = checked_product(wide(reserve_in), wide(amount_out), wide(fee.denominator))
        .ok_or(PoolError::Overflow)?;
    let denominator = wide(reserve_out - amount_out)
        .checked_mul(wide(fee.retained()))
        .ok_or(PoolError::Overflow)?;

    narrow(numerator / denominator)?.checked_add(1).ok_or(PoolError::Overflow)
}

/// Portion of `amount_in` kept by the pool as fee, floored. Informational only:
/// the pricing formula above accounts for the fee exactly.
#[inline]
pub fn fee_portion(amount_in: u128, fee: FeeRate) -> Result<u128, PoolError> {
    fee.validate()?;
    crate::math::mul_div(amount_in, fee.numerator, fee.denominator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;
    use rand_chacha::rand_core::SeedableRng;

    const FEE: FeeRate = FeeRate::new(3, 1_000);

    #[test]
    fn reference_quote() {
        // 10 * 997 * 200 / (100 * 1000 + 10 * 997) = 1_994_000 / 109_970
        assert_eq!(get_amount_out(10, 100, 200, FEE).unwrap(), 18);
        // 100 in, 1000:2000 reserves → ~181.32 before flooring
        assert_eq!(get_amount_out(100, 1_000, 2_000, FEE).unwrap(), 181);
    }

    #[test]
    fn invalid_inputs() {
        assert_eq!(get_amount_out(0, 100, 200, FEE), Err(PoolError::InvalidAmount));
        assert_eq!(get_amount_out(10, 0, 200, FEE), Err(PoolError::ZeroReserve));
        assert_eq!(get_amount_out(10, 100, 0, FEE), Err(PoolError::ZeroReserve));
        assert_eq!(get_amount_in(200, 100, 200, FEE), Err(PoolError::InvalidAmount));
        assert_eq!(get_amount_in(0, 100, 200, FEE), Err(PoolError::InvalidAmount));
    }

    #[test]
    fn output_never_drains_reserve() {
        let out = get_amount_out(u128::MAX / 4, 1, 1_000, FeeRate::new(0, 1)).unwrap();
        assert!(out < 1_000);
        let out = get_amount_out(500 * 10u128.pow(18), 100 * 10u128.pow(18), 200 * 10u128.pow(18), FEE)
            .unwrap();
        assert!(out < 200 * 10u128.pow(18));
    }

    #[test]
    fn malformed_fee_is_rejected_not_panicking() {
        for fee in [FeeRate::new(0, 0), FeeRate::new(5, 3), FeeRate::new(1_000, 1_000)] {
            assert!(matches!(get_amount_out(10, 100, 200, fee), Err(PoolError::InvalidConfig(_))));
            assert!(matches!(get_amount_in(10, 100, 200, fee), Err(PoolError::InvalidConfig(_))));
            assert!(matches!(fee_portion(10, fee), Err(PoolError::InvalidConfig(_))));
        }
    }

    #[test]
    fn overflowing_product_is_reported() {
        assert_eq!(
            get_amount_out(u128::MAX, u128::MAX, u128::MAX, FEE),
            Err(PoolError::Overflow)
        );
    }

    #[test]
    fn output_is_monotone_in_each_argument() {
        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(7);
        for _ in 0..10_000 {
            let amount_in: u128 = rng.gen_range(1..=1_000_000_000);
            let reserve_in: u128 = rng.gen_range(1..=1_000_000_000_000);
            let reserve_out: u128 = rng.gen_range(1..=1_000_000_000_000);

            let base = get_amount_out(amount_in, reserve_in, reserve_out, FEE).unwrap();
            assert!(base < reserve_out);
            assert!(get_amount_out(amount_in + 1_000, reserve_in, reserve_out, FEE).unwrap() >= base);
            assert!(get_amount_out(amount_in, reserve_in, reserve_out + 1_000, FEE).unwrap() >= base);
            assert!(get_amount_out(amount_in, reserve_in + 1_000, reserve_out, FEE).unwrap() <= base);
        }
    }

    #[test]
    fn swap_never_decreases_k() {
        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(10);
        for _ in 0..10_000 {
            let amount_in: u128 = rng.gen_range(1..=10_000_000);
            let reserve_in: u128 = rng.gen_range(1..=10_000_000);
            let reserve_out: u128 = rng.gen_range(1..=10_000_000);
            let out = get_amount_out(amount_in, reserve_in, reserve_out, FEE).unwrap();

            let k_before = wide(reserve_in) * wide(reserve_out);
            let k_after = wide(reserve_in + amount_in) * wide(reserve_out - out);
            assert!(k_after >= k_before, "k fell: in={amount_in} ri={reserve_in} ro={reserve_out}");
        }
    }

    #[test]
    fn reverse_quote_is_tight() {
        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(3);
        for _ in 0..10_000 {
            let reserve_in: u128 = rng.gen_range(1_000..=10_000_000);
            let reserve_out: u128 = rng.gen_range(1_000..=10_000_000);
            let want: u128 = rng.gen_range(1..reserve_out / 2);

            let needed = get_amount_in(want, reserve_in, reserve_out, FEE).unwrap();
            assert!(get_amount_out(needed, reserve_in, reserve_out, FEE).unwrap() >= want);
        }
    }

    #[test]
    fn fee_portion_of_default_rate() {
        assert_eq!(fee_portion(1_000, FEE).unwrap(), 3);
        assert_eq!(fee_portion(10, FEE).unwrap(), 0);
    }
}
