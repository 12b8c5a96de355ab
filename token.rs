use std::collections::{BTreeMap, BTreeSet};

use crate::error::TransferError;
use crate::types::{AccountId, AssetId};

/// The pool's view of one asset's token implementation.
///
/// Balance storage and transfer authorization live behind this trait. The
/// pool never hands an implementation a reference to itself, so a transfer
/// cannot call back into a pool operation.
pub trait AssetTransfer {
    /// Identifier of the asset this implementation moves.
    fn asset(&self) -> &AssetId;

    /// Pull `amount` from `from` into the pool's custody.
    fn transfer_in(&mut self, from: &AccountId, amount: u128) -> Result<(), TransferError>;

    /// Push `amount` from the pool's custody to `to`.
    fn transfer_out(&mut self, to: &AccountId, amount: u128) -> Result<(), TransferError>;

    /// Undo a completed [`Self::transfer_in`] during rollback: return the funds
    /// and whatever authorization the pull consumed.
    ///
    /// The default pushes the funds back with `transfer_out`, which leaves a
    /// consumed allowance spent.
    fn revert_transfer_in(&mut self, from: &AccountId, amount: u128) -> Result<(), TransferError> {
        self.transfer_out(from, amount)
    }

    /// Undo a completed [`Self::transfer_out`] during rollback. The default
    /// pulls the funds back with `transfer_in`, so it needs an allowance.
    fn revert_transfer_out(&mut self, to: &AccountId, amount: u128) -> Result<(), TransferError> {
        self.transfer_in(to, amount)
    }

    /// Amount currently held on behalf of the pool, if the implementation can report it.
    fn custody(&self) -> Option<u128> {
        None
    }
}

/// In-process fungible token: wallet balances, allowances granted to the
/// pool, and the pool's custody balance.
///
/// An allowance of `u128::MAX` is treated as unlimited and never decremented.
#[derive(Clone, Debug)]
pub struct InMemoryToken {
    asset: AssetId,
    balances: BTreeMap<AccountId, u128>,
    allowances: BTreeMap<AccountId, u128>,
    frozen: BTreeSet<AccountId>,
    custody: u128,
}

impl InMemoryToken {
    pub fn new(asset: impl Into<AssetId>) -> Self {
        Self {
            asset: asset.into(),
            balances: BTreeMap::new(),
            allowances: BTreeMap::new(),
            frozen: BTreeSet::new(),
            custody: 0,
        }
    }

    pub fn mint(&mut self, account: &AccountId, amount: u128) {
        let balance = self.balances.entry(account.clone()).or_insert(0);
        *balance = balance.saturating_add(amount);
    }

    /// Authorize the pool to pull up to `amount` from `account`.
    pub fn approve(&mut self, account: &AccountId, amount: u128) {
        self.allowances.insert(account.clone(), amount);
    }

    pub fn balance_of(&self, account: &AccountId) -> u128 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    pub fn allowance_of(&self, account: &AccountId) -> u128 {
        self.allowances.get(account).copied().unwrap_or(0)
    }

    /// Reject every transfer to or from `account` until unfrozen.
    pub fn freeze(&mut self, account: &AccountId) {
        self.frozen.insert(account.clone());
    }

    pub fn unfreeze(&mut self, account: &AccountId) {
        self.frozen.remove(account);
    }

    fn ensure_active(&self, account: &AccountId) -> Result<(), TransferError> {
        if self.frozen.contains(account) {
            return Err(TransferError::Frozen(account.clone()));
        }
        Ok(())
    }
}

impl AssetTransfer for InMemoryToken {
    fn asset(&self) -> &AssetId {
        &self.asset
    }

    fn transfer_in(&mut self, from: &AccountId, amount: u128) -> Result<(), TransferError> {
        self.ensure_active(from)?;

        let approved = self.allowance_of(from);
        if approved < amount {
            return Err(TransferError::InsufficientAllowance {
                account: from.clone(),
                needed: amount,
                approved,
            });
        }
        let available = self.balance_of(from);
        if available < amount {
            return Err(TransferError::InsufficientBalance {
                account: from.clone(),
                needed: amount,
                available,
            });
        }
        let custody = self
            .custody
            .checked_add(amount)
            .ok_or_else(|| TransferError::Overflow(from.clone()))?;

        self.balances.insert(from.clone(), available - amount);
        if approved != u128::MAX {
            self.allowances.insert(from.clone(), approved - amount);
        }
        self.custody = custody;
        Ok(())
    }

    fn transfer_out(&mut self, to: &AccountId, amount: u128) -> Result<(), TransferError> {
        self.ensure_active(to)?;

        if self.custody < amount {
            return Err(TransferError::InsufficientCustody {
                needed: amount,
                available: self.custody,
            });
        }
        let balance = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or_else(|| TransferError::Overflow(to.clone()))?;

        self.custody -= amount;
        self.balances.insert(to.clone(), balance);
        Ok(())
    }

    /// Returns the funds and restores the allowance. Freezing is not checked:
    /// the pull being undone already passed it.
    fn revert_transfer_in(&mut self, from: &AccountId, amount: u128) -> Result<(), TransferError> {
        if self.custody < amount {
            return Err(TransferError::InsufficientCustody {
                needed: amount,
                available: self.custody,
            });
        }
        let balance = self
            .balance_of(from)
            .checked_add(amount)
            .ok_or_else(|| TransferError::Overflow(from.clone()))?;

        self.custody -= amount;
        self.balances.insert(from.clone(), balance);
        let approved = self.allowance_of(from);
        if approved != u128::MAX {
            self.allowances.insert(from.clone(), approved.saturating_add(amount));
        }
        Ok(())
    }

    /// Takes the payout back without consulting the allowance, which the
    /// payout never touched.
    fn revert_transfer_out(&mut self, to: &AccountId, amount: u128) -> Result<(), TransferError> {
        let available = self.balance_of(to);
        if available < amount {
            return Err(TransferError::InsufficientBalance {
                account: to.clone(),
                needed: amount,
                available,
            });
        }
        let custody = self
            .custody
            .checked_add(amount)
            .ok_or_else(|| TransferError::Overflow(to.clone()))?;

        self.balances.insert(to.clone(), available - amount);
        self.custody = custody;
        Ok(())
    }

    fn custody(&self) -> Option<u128> {
        Some(self.custody)
    }
}
