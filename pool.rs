//! The two-asset pool: transactional deposit, withdrawal and swap operations.
//!
//! Every operation follows the same shape:
//!
//! 1. validate and compute the new reserve/share values (no mutation),
//! 2. apply them to [`ReserveState`] and the [`SharesLedger`] together,
//! 3. move funds through the [`AssetTransfer`] collaborators,
//! 4. publish a [`PoolEvent`].
//!
//! If step 3 fails, the snapshot taken before step 2 is restored and any
//! transfer that already went through is reversed, so a failed operation
//! leaves no trace in the pool. Internal state is final before the first
//! external call, and operations take `&mut self`, so nothing can re-enter
//! the pool while a transfer is in flight.

use ethnum::U256;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::error::PoolError;
use crate::events::{EventSink, PoolEvent};
use crate::ledger::SharesLedger;
use crate::liquidity::{deposit_shares, withdrawal_amounts};
use crate::price;
use crate::reserve::ReserveState;
use crate::swap;
use crate::token::AssetTransfer;
use crate::types::{AccountId, Asset, FeeRate, PoolConfig};

/// Outcome of a swap.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SwapReceipt {
    pub asset_in: Asset,
    pub amount_in: u128,
    pub asset_out: Asset,
    pub amount_out: u128,
    /// Portion of `amount_in` retained as fee (informational, floored)
    pub fee: u128,
    pub reserves_after: (u128, u128),
}

// ─── Rollback journal ─────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug)]
enum Direction {
    In,
    Out,
}

#[derive(Clone, Copy, Debug)]
struct Movement {
    asset: Asset,
    direction: Direction,
    amount: u128,
}

/// State captured before an operation mutates anything.
struct Snapshot {
    reserve: ReserveState,
    account: AccountId,
    shares: u128,
}

// ─── Pool ─────────────────────────────────────────────────────────────────────

pub struct Pool<T, S> {
    config: PoolConfig,
    reserve: ReserveState,
    ledger: SharesLedger,
    token_a: T,
    token_b: T,
    events: S,
}

impl<T: AssetTransfer, S: EventSink> Pool<T, S> {
    /// Create an empty pool over two token collaborators.
    ///
    /// The collaborators must move the assets named in `config`, in order.
    pub fn new(config: PoolConfig, token_a: T, token_b: T, events: S) -> Result<Self, PoolError> {
        config.validate()?;
        for (asset, token) in [(Asset::A, &token_a), (Asset::B, &token_b)] {
            if token.asset() != config.asset_id(asset) {
                return Err(PoolError::InvalidConfig(format!(
                    "asset {asset} is configured as {} but its token moves {}",
                    config.asset_id(asset),
                    token.asset()
                )));
            }
        }

        info!(
            asset_a = %config.asset_a,
            asset_b = %config.asset_b,
            fee = %config.fee,
            "pool created"
        );

        Ok(Self {
            config,
            reserve: ReserveState::default(),
            ledger: SharesLedger::default(),
            token_a,
            token_b,
            events,
        })
    }

    // ── Liquidity ───────────────────────────────────────────────────────────

    /// Deposit `amount_a` of A and `amount_b` of B; returns the shares minted.
    pub fn add_liquidity(
        &mut self,
        provider: &AccountId,
        amount_a: u128,
        amount_b: u128,
    ) -> Result<u128, PoolError> {
        let shares = deposit_shares(&self.reserve, amount_a, amount_b)?;

        let snapshot = self.snapshot(provider);
        self.reserve.apply_deposit(amount_a, amount_b, shares)?;
        if let Err(e) = self.ledger.credit(provider, shares) {
            self.restore(snapshot);
            return Err(e);
        }

        self.settle(
            snapshot,
            provider,
            &[
                Movement { asset: Asset::A, direction: Direction::In, amount: amount_a },
                Movement { asset: Asset::B, direction: Direction::In, amount: amount_b },
            ],
        )?;

        debug!(%provider, amount_a, amount_b, shares, "liquidity added");
        self.events.publish(PoolEvent::LiquidityAdded {
            provider: provider.clone(),
            amount_a,
            amount_b,
            shares,
        });
        Ok(shares)
    }

    /// Burn `shares` of `provider`'s liquidity; returns the `(amount_a, amount_b)` paid out.
    pub fn remove_liquidity(
        &mut self,
        provider: &AccountId,
        shares: u128,
    ) -> Result<(u128, u128), PoolError> {
        let available = self.ledger.balance_of(provider);
        if shares == 0 || shares > available {
            return Err(PoolError::InsufficientShares { requested: shares, available });
        }
        let (amount_a, amount_b) = withdrawal_amounts(&self.reserve, shares)?;

        let snapshot = self.snapshot(provider);
        self.reserve.apply_withdrawal(amount_a, amount_b, shares)?;
        if let Err(e) = self.ledger.debit(provider, shares) {
            self.restore(snapshot);
            return Err(e);
        }

        self.settle(
            snapshot,
            provider,
            &[
                Movement { asset: Asset::A, direction: Direction::Out, amount: amount_a },
                Movement { asset: Asset::B, direction: Direction::Out, amount: amount_b },
            ],
        )?;

        debug!(%provider, amount_a, amount_b, shares, "liquidity removed");
        self.events.publish(PoolEvent::LiquidityRemoved {
            provider: provider.clone(),
            amount_a,
            amount_b,
            shares,
        });
        Ok((amount_a, amount_b))
    }

    // ── Swaps ───────────────────────────────────────────────────────────────

    /// Sell `amount_in` of A for B; returns the amount of B received.
    pub fn swap_a_for_b(&mut self, trader: &AccountId, amount_in: u128) -> Result<u128, PoolError> {
        self.swap(trader, Asset::A, amount_in, None).map(|r| r.amount_out)
    }

    /// Sell `amount_in` of B for A; returns the amount of A received.
    pub fn swap_b_for_a(&mut self, trader: &AccountId, amount_in: u128) -> Result<u128, PoolError> {
        self.swap(trader, Asset::B, amount_in, None).map(|r| r.amount_out)
    }

    /// Sell `amount_in` of `asset_in`, failing with `SlippageExceeded` if the
    /// output would fall below `min_amount_out`.
    pub fn swap(
        &mut self,
        trader: &AccountId,
        asset_in: Asset,
        amount_in: u128,
        min_amount_out: Option<u128>,
    ) -> Result<SwapReceipt, PoolError> {
        let receipt = self.quote(asset_in, amount_in)?;
        if let Some(min_amount_out) = min_amount_out {
            if receipt.amount_out < min_amount_out {
                return Err(PoolError::SlippageExceeded {
                    amount_out: receipt.amount_out,
                    min_amount_out,
                });
            }
        }

        let k_before = self.reserve.k();
        let snapshot = self.snapshot(trader);
        self.reserve.apply_swap(asset_in, amount_in, receipt.amount_out)?;
        if self.reserve.k() < k_before {
            self.restore(snapshot);
            return Err(PoolError::InvariantViolation("swap decreased k".into()));
        }

        self.settle(
            snapshot,
            trader,
            &[
                Movement { asset: asset_in, direction: Direction::In, amount: amount_in },
                Movement {
                    asset: receipt.asset_out,
                    direction: Direction::Out,
                    amount: receipt.amount_out,
                },
            ],
        )?;

        debug!(
            %trader,
            %asset_in,
            amount_in,
            amount_out = receipt.amount_out,
            "swap executed"
        );
        self.events.publish(PoolEvent::Swap {
            trader: trader.clone(),
            asset_in,
            amount_in,
            asset_out: receipt.asset_out,
            amount_out: receipt.amount_out,
        });
        Ok(receipt)
    }

    // ── Settlement ──────────────────────────────────────────────────────────

    /// Execute external transfers in order. On the first failure, restore
    /// `snapshot` and reverse the movements that already completed.
    fn settle(
        &mut self,
        snapshot: Snapshot,
        account: &AccountId,
        movements: &[Movement],
    ) -> Result<(), PoolError> {
        for (done, movement) in movements.iter().enumerate() {
            let token = self.token_mut(movement.asset);
            let result = match movement.direction {
                Direction::In => token.transfer_in(account, movement.amount),
                Direction::Out => token.transfer_out(account, movement.amount),
            };
            if let Err(source) = result {
                warn!(
                    %account,
                    asset = %movement.asset,
                    amount = movement.amount,
                    error = %source,
                    "transfer failed, rolling back"
                );
                self.restore(snapshot);
                self.compensate(account, &movements[..done]);
                return Err(PoolError::TransferFailure { asset: movement.asset, source });
            }
        }
        Ok(())
    }

    fn compensate(&mut self, account: &AccountId, completed: &[Movement]) {
        for movement in completed.iter().rev() {
            let token = self.token_mut(movement.asset);
            let result = match movement.direction {
                Direction::In => token.revert_transfer_in(account, movement.amount),
                Direction::Out => token.revert_transfer_out(account, movement.amount),
            };
            if let Err(e) = result {
                error!(
                    %account,
                    asset = %movement.asset,
                    amount = movement.amount,
                    error = %e,
                    "could not reverse transfer during rollback"
                );
            }
        }
    }

    fn snapshot(&self, account: &AccountId) -> Snapshot {
        Snapshot {
            reserve: self.reserve,
            account: account.clone(),
            shares: self.ledger.balance_of(account),
        }
    }

    fn restore(&mut self, snapshot: Snapshot) {
        self.reserve = snapshot.reserve;
        self.ledger.restore(&snapshot.account, snapshot.shares);
    }

    fn token_mut(&mut self, asset: Asset) -> &mut T {
        match asset {
            Asset::A => &mut self.token_a,
            Asset::B => &mut self.token_b,
        }
    }

    // ── Read-only queries ───────────────────────────────────────────────────

    /// Pure pricing at this pool's fee rate; does not read pool state.
    pub fn get_amount_out(
        &self,
        amount_in: u128,
        reserve_in: u128,
        reserve_out: u128,
    ) -> Result<u128, PoolError> {
        swap::get_amount_out(amount_in, reserve_in, reserve_out, self.config.fee)
    }

    /// Minimum input that buys at least `amount_out`; pure, like [`Self::get_amount_out`].
    pub fn get_amount_in(
        &self,
        amount_out: u128,
        reserve_in: u128,
        reserve_out: u128,
    ) -> Result<u128, PoolError> {
        swap::get_amount_in(amount_out, reserve_in, reserve_out, self.config.fee)
    }

    /// What a swap would return right now, without executing it.
    pub fn quote(&self, asset_in: Asset, amount_in: u128) -> Result<SwapReceipt, PoolError> {
        if amount_in == 0 {
            return Err(PoolError::InvalidAmount);
        }
        if self.reserve.is_empty() {
            return Err(PoolError::ZeroReserve);
        }

        let (reserve_in, reserve_out) = self.reserve.swap_pair(asset_in);
        let amount_out = self.get_amount_out(amount_in, reserve_in, reserve_out)?;
        if amount_out == 0 {
            return Err(PoolError::InvalidAmount);
        }

        let mut after = self.reserve;
        after.apply_swap(asset_in, amount_in, amount_out)?;
        Ok(SwapReceipt {
            asset_in,
            amount_in,
            asset_out: asset_in.opposite(),
            amount_out,
            fee: swap::fee_portion(amount_in, self.config.fee)?,
            reserves_after: after.reserves(),
        })
    }

    /// Shares a deposit would mint right now.
    pub fn preview_add_liquidity(&self, amount_a: u128, amount_b: u128) -> Result<u128, PoolError> {
        deposit_shares(&self.reserve, amount_a, amount_b)
    }

    /// Amounts `provider` would receive for burning `shares` right now.
    pub fn preview_remove_liquidity(
        &self,
        provider: &AccountId,
        shares: u128,
    ) -> Result<(u128, u128), PoolError> {
        let available = self.ledger.balance_of(provider);
        if shares == 0 || shares > available {
            return Err(PoolError::InsufficientShares { requested: shares, available });
        }
        withdrawal_amounts(&self.reserve, shares)
    }

    pub fn get_reserves(&self) -> (u128, u128) {
        self.reserve.reserves()
    }

    /// Spot price of A in B, scaled by 1e18.
    pub fn get_price(&self) -> Result<U256, PoolError> {
        price::get_price(&self.reserve)
    }

    /// Spot price of B in A, scaled by 1e18.
    pub fn get_inverse_price(&self) -> Result<U256, PoolError> {
        price::get_inverse_price(&self.reserve)
    }

    pub fn share_balance(&self, provider: &AccountId) -> u128 {
        self.ledger.balance_of(provider)
    }

    pub fn total_shares(&self) -> u128 {
        self.reserve.total_shares()
    }

    pub fn reserve_state(&self) -> &ReserveState {
        &self.reserve
    }

    pub fn ledger(&self) -> &SharesLedger {
        &self.ledger
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    pub fn fee(&self) -> FeeRate {
        self.config.fee
    }

    pub fn token(&self, asset: Asset) -> &T {
        match asset {
            Asset::A => &self.token_a,
            Asset::B => &self.token_b,
        }
    }

    /// Direct access to a collaborator, e.g. to fund wallets in tests or
    /// simulations. Changes made here bypass the pool's accounting.
    pub fn token_mut_unchecked(&mut self, asset: Asset) -> &mut T {
        self.token_mut(asset)
    }

    pub fn events(&self) -> &S {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut S {
        &mut self.events
    }

    /// Audit the pool invariants: all-or-nothing emptiness, ledger sum equal
    /// to total shares, and (when the collaborators report it) custody at
    /// least covering the reserves.
    pub fn check_invariants(&self) -> Result<(), PoolError> {
        self.reserve.check_emptiness()?;

        let ledger_total = self.ledger.total().ok_or(PoolError::Overflow)?;
        if ledger_total != self.reserve.total_shares() {
            return Err(PoolError::InvariantViolation(format!(
                "ledger holds {ledger_total} shares, pool records {}",
                self.reserve.total_shares()
            )));
        }

        for asset in [Asset::A, Asset::B] {
            if let Some(custody) = self.token(asset).custody() {
                let reserve = self.reserve.reserve_of(asset);
                if custody < reserve {
                    return Err(PoolError::InvariantViolation(format!(
                        "custody of {asset} is {custody}, reserve is {reserve}"
                    )));
                }
            }
        }
        Ok(())
    }
}
