//! Authoritative reserve and share totals of the pool.
//!
//! All mutators are crate-private and all-or-nothing: every new field is
//! computed with checked arithmetic before any of them is written.

use ethnum::U256;
use serde::Serialize;

use crate::error::PoolError;
use crate::math::wide;
use crate::types::Asset;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ReserveState {
    reserve_a: u128,
    reserve_b: u128,
    total_shares: u128,
}

impl ReserveState {
    #[inline]
    pub fn reserves(&self) -> (u128, u128) {
        (self.reserve_a, self.reserve_b)
    }

    #[inline]
    pub fn total_shares(&self) -> u128 {
        self.total_shares
    }

    #[inline]
    pub fn reserve_of(&self, asset: Asset) -> u128 {
        match asset {
            Asset::A => self.reserve_a,
            Asset::B => self.reserve_b,
        }
    }

    /// `(reserve_in, reserve_out)` for a swap that pays in `asset_in`.
    #[inline]
    pub fn swap_pair(&self, asset_in: Asset) -> (u128, u128) {
        (self.reserve_of(asset_in), self.reserve_of(asset_in.opposite()))
    }

    /// Constant product `k = reserve_a * reserve_b`, exact.
    #[inline]
    pub fn k(&self) -> U256 {
        wide(self.reserve_a) * wide(self.reserve_b)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.total_shares == 0
    }

    /// The pool is either fully empty or has all three totals non-zero.
    pub fn check_emptiness(&self) -> Result<(), PoolError> {
        let zeros = [self.reserve_a == 0, self.reserve_b == 0, self.total_shares == 0];
        if zeros.iter().all(|z| *z) || zeros.iter().all(|z| !*z) {
            Ok(())
        } else {
            Err(PoolError::InvariantViolation(format!(
                "partially empty pool: reserves ({}, {}), shares {}",
                self.reserve_a, self.reserve_b, self.total_shares
            )))
        }
    }

    pub(crate) fn apply_deposit(
        &mut self,
        amount_a: u128,
        amount_b: u128,
        shares: u128,
    ) -> Result<(), PoolError> {
        let reserve_a = self.reserve_a.checked_add(amount_a).ok_or(PoolError::Overflow)?;
        let reserve_b = self.reserve_b.checked_add(amount_b).ok_or(PoolError::Overflow)?;
        let total_shares = self.total_shares.checked_add(shares).ok_or(PoolError::Overflow)?;

        *self = Self { reserve_a, reserve_b, total_shares };
        Ok(())
    }

    pub(crate) fn apply_withdrawal(
        &mut self,
        amount_a: u128,
        amount_b: u128,
        shares: u128,
    ) -> Result<(), PoolError> {
        let total_shares = self.total_shares.checked_sub(shares).ok_or(
            PoolError::InsufficientShares { requested: shares, available: self.total_shares },
        )?;
        let reserve_a = self.reserve_a.checked_sub(amount_a).ok_or(PoolError::ZeroReserve)?;
        let reserve_b = self.reserve_b.checked_sub(amount_b).ok_or(PoolError::ZeroReserve)?;

        *self = Self { reserve_a, reserve_b, total_shares };
        Ok(())
    }

    /// Credit `amount_in` to the `asset_in` reserve and debit `amount_out` from the other.
    pub(crate) fn apply_swap(
        &mut self,
        asset_in: Asset,
        amount_in: u128,
        amount_out: u128,
    ) -> Result<(), PoolError> {
        let (reserve_in, reserve_out) = self.swap_pair(asset_in);
        let reserve_in = reserve_in.checked_add(amount_in).ok_or(PoolError::Overflow)?;
        // Draining the output side completely would break the emptiness invariant
        let reserve_out = match reserve_out.checked_sub(amount_out) {
            Some(r) if r > 0 => r,
            _ => return Err(PoolError::ZeroReserve),
        };

        match asset_in {
            Asset::A => {
                self.reserve_a = reserve_in;
                self.reserve_b = reserve_out;
            }
            Asset::B => {
                self.reserve_b = reserve_in;
                self.reserve_a = reserve_out;
            }
        }
        Ok(())
    }
}
