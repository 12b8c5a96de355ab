use std::collections::btree_map::{BTreeMap, Entry};

use crate::error::PoolError;
use crate::types::AccountId;

/// Per-participant liquidity share balances.
///
/// Accounts with a zero balance are never stored, so `len()` is the number of
/// current liquidity providers.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SharesLedger {
    balances: BTreeMap<AccountId, u128>,
}

impl SharesLedger {
    pub fn balance_of(&self, account: &AccountId) -> u128 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.balances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AccountId, u128)> {
        self.balances.iter().map(|(k, v)| (k, *v))
    }

    /// Sum of every balance. `None` if it does not fit in `u128`, which would
    /// itself mean the ledger disagrees with the pool's share total.
    pub fn total(&self) -> Option<u128> {
        self.balances.values().try_fold(0u128, |acc, v| acc.checked_add(*v))
    }

    pub(crate) fn credit(&mut self, account: &AccountId, shares: u128) -> Result<(), PoolError> {
        if shares == 0 {
            return Ok(());
        }
        let balance = self.balances.entry(account.clone()).or_insert(0);
        *balance = balance.checked_add(shares).ok_or(PoolError::Overflow)?;
        Ok(())
    }

    /// Deduct `shares`; removes the entry when it reaches zero.
    pub(crate) fn debit(&mut self, account: &AccountId, shares: u128) -> Result<(), PoolError> {
        match self.balances.entry(account.clone()) {
            Entry::Vacant(_) => {
                Err(PoolError::InsufficientShares { requested: shares, available: 0 })
            }
            Entry::Occupied(mut entry) => {
                let available = *entry.get();
                let remaining = available
                    .checked_sub(shares)
                    .ok_or(PoolError::InsufficientShares { requested: shares, available })?;
                if remaining == 0 {
                    entry.remove();
                } else {
                    *entry.get_mut() = remaining;
                }
                Ok(())
            }
        }
    }

    /// Overwrite an account's balance; used to restore a snapshot on rollback.
    pub(crate) fn restore(&mut self, account: &AccountId, balance: u128) {
        if balance == 0 {
            self.balances.remove(account);
        } else {
            self.balances.insert(account.clone(), balance);
        }
    }
}
