//! A [`Pool`] shareable across threads.
//!
//! Every call holds the lock for the whole operation, so two operations on
//! the same pool never interleave.

use std::sync::Arc;

use ethnum::U256;
use parking_lot::Mutex;

use crate::error::PoolError;
use crate::events::EventSink;
use crate::pool::{Pool, SwapReceipt};
use crate::token::AssetTransfer;
use crate::types::{AccountId, Asset};

pub struct SharedPool<T, S> {
    inner: Arc<Mutex<Pool<T, S>>>,
}

impl<T, S> Clone for SharedPool<T, S> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<T: AssetTransfer, S: EventSink> SharedPool<T, S> {
    pub fn new(pool: Pool<T, S>) -> Self {
        Self { inner: Arc::new(Mutex::new(pool)) }
    }

    /// Run `f` with exclusive access to the pool.
    pub fn with<R>(&self, f: impl FnOnce(&mut Pool<T, S>) -> R) -> R {
        let mut pool = self.inner.lock();
        f(&mut pool)
    }

    pub fn add_liquidity(
        &self,
        provider: &AccountId,
        amount_a: u128,
        amount_b: u128,
    ) -> Result<u128, PoolError> {
        self.with(|pool| pool.add_liquidity(provider, amount_a, amount_b))
    }

    pub fn remove_liquidity(
        &self,
        provider: &AccountId,
        shares: u128,
    ) -> Result<(u128, u128), PoolError> {
        self.with(|pool| pool.remove_liquidity(provider, shares))
    }

    pub fn swap_a_for_b(&self, trader: &AccountId, amount_in: u128) -> Result<u128, PoolError> {
        self.with(|pool| pool.swap_a_for_b(trader, amount_in))
    }

    pub fn swap_b_for_a(&self, trader: &AccountId, amount_in: u128) -> Result<u128, PoolError> {
        self.with(|pool| pool.swap_b_for_a(trader, amount_in))
    }

    pub fn swap(
        &self,
        trader: &AccountId,
        asset_in: Asset,
        amount_in: u128,
        min_amount_out: Option<u128>,
    ) -> Result<SwapReceipt, PoolError> {
        self.with(|pool| pool.swap(trader, asset_in, amount_in, min_amount_out))
    }

    pub fn get_reserves(&self) -> (u128, u128) {
        self.with(|pool| pool.get_reserves())
    }

    pub fn get_price(&self) -> Result<U256, PoolError> {
        self.with(|pool| pool.get_price())
    }

    pub fn check_invariants(&self) -> Result<(), PoolError> {
        self.with(|pool| pool.check_invariants())
    }

    /// Unwrap the pool if this is the last handle.
    pub fn into_inner(self) -> Option<Pool<T, S>> {
        Arc::try_unwrap(self.inner).ok().map(|pool| pool.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventLog;
    use crate::token::InMemoryToken;
    use crate::types::{PoolConfig, PRICE_SCALE};
    use rayon::prelude::*;

    #[test]
    fn concurrent_swaps_serialize_cleanly() {
        let config = PoolConfig::default();
        let mut token_a = InMemoryToken::new(config.asset_a.clone());
        let mut token_b = InMemoryToken::new(config.asset_b.clone());
        let traders: Vec<AccountId> = (0..16).map(|i| AccountId::new(format!("trader-{i}"))).collect();
        let lp = AccountId::new("lp");
        for account in traders.iter().chain(std::iter::once(&lp)) {
            for token in [&mut token_a, &mut token_b] {
                token.mint(account, 10_000 * PRICE_SCALE);
                token.approve(account, u128::MAX);
            }
        }
        let pool = SharedPool::new(Pool::new(config, token_a, token_b, EventLog::default()).unwrap());
        pool.add_liquidity(&lp, 1_000 * PRICE_SCALE, 2_000 * PRICE_SCALE).unwrap();
        let (ra, rb) = pool.get_reserves();
        let k_before = crate::math::wide(ra) * crate::math::wide(rb);

        traders.par_iter().enumerate().for_each(|(i, trader)| {
            let handle = pool.clone();
            for round in 0..20u128 {
                let amount = (round + 1) * PRICE_SCALE / 10;
                if (i + round as usize) % 2 == 0 {
                    handle.swap_a_for_b(trader, amount).unwrap();
                } else {
                    handle.swap_b_for_a(trader, amount).unwrap();
                }
                handle.check_invariants().unwrap();
            }
        });

        let pool = pool.into_inner().unwrap();
        assert_eq!(pool.events().len(), 1 + 16 * 20);
        assert!(pool.reserve_state().k() >= k_before);
        pool.check_invariants().unwrap();
    }
}
