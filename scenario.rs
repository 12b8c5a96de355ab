//! Scripted pool sessions loaded from JSON.
//!
//! ```json
//! {
//!   "pool": { "asset_a": "WETH", "asset_b": "USDC" },
//!   "operations": [
//!     { "fund": { "account": "alice", "amount_a": 1000, "amount_b": 2000 } },
//!     { "add_liquidity": { "account": "alice", "amount_a": 100, "amount_b": 200 } },
//!     { "swap": { "account": "alice", "asset_in": "A", "amount_in": 10 } }
//!   ]
//! }
//! ```
//!
//! Operations run in order. A failing operation is recorded and the replay
//! continues, which is how rollbacks show up in the report.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::PoolError;
use crate::events::{EventLog, PoolEvent};
use crate::pool::Pool;
use crate::token::InMemoryToken;
use crate::types::{AccountId, Asset, PoolConfig};

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub pool: PoolConfig,
    pub operations: Vec<Operation>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Mint wallet balances and approve the pool without limit.
    Fund { account: AccountId, amount_a: u128, amount_b: u128 },
    Approve { account: AccountId, asset: Asset, amount: u128 },
    Freeze { account: AccountId, asset: Asset },
    Unfreeze { account: AccountId, asset: Asset },
    AddLiquidity { account: AccountId, amount_a: u128, amount_b: u128 },
    RemoveLiquidity { account: AccountId, shares: u128 },
    Swap {
        account: AccountId,
        asset_in: Asset,
        amount_in: u128,
        #[serde(default)]
        min_amount_out: Option<u128>,
    },
}

#[derive(Clone, Debug, Serialize)]
pub struct StepOutcome {
    pub index: usize,
    pub operation: Operation,
    /// Human-readable result, e.g. `minted 141 shares`
    pub outcome: Result<String, String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ReplayReport {
    pub steps: Vec<StepOutcome>,
    pub events: Vec<PoolEvent>,
    pub reserves: (u128, u128),
    pub total_shares: u128,
    /// Spot price of A in B scaled by 1e18, as a decimal string
    pub price: Option<String>,
    pub shares: BTreeMap<AccountId, u128>,
}

impl ReplayReport {
    pub fn failures(&self) -> usize {
        self.steps.iter().filter(|s| s.outcome.is_err()).count()
    }
}

/// Run every operation of `scenario` against a fresh pool.
///
/// Only pool construction and the final invariant audit can fail the replay.
pub fn replay(scenario: &Scenario) -> Result<ReplayReport, PoolError> {
    let token_a = InMemoryToken::new(scenario.pool.asset_a.clone());
    let token_b = InMemoryToken::new(scenario.pool.asset_b.clone());
    let mut pool = Pool::new(scenario.pool.clone(), token_a, token_b, EventLog::default())?;

    let steps: Vec<StepOutcome> = scenario
        .operations
        .iter()
        .enumerate()
        .map(|(index, operation)| StepOutcome {
            index,
            operation: operation.clone(),
            outcome: apply(&mut pool, operation).map_err(|e| e.to_string()),
        })
        .collect();

    pool.check_invariants()?;
    info!(
        operations = steps.len(),
        failed = steps.iter().filter(|s| s.outcome.is_err()).count(),
        "replay finished"
    );

    Ok(ReplayReport {
        steps,
        events: pool.events().events().to_vec(),
        reserves: pool.get_reserves(),
        total_shares: pool.total_shares(),
        price: pool.get_price().ok().map(|p| p.to_string()),
        shares: pool.ledger().iter().map(|(a, s)| (a.clone(), s)).collect(),
    })
}

fn apply(pool: &mut Pool<InMemoryToken, EventLog>, operation: &Operation) -> Result<String, PoolError> {
    match operation {
        Operation::Fund { account, amount_a, amount_b } => {
            for (asset, amount) in [(Asset::A, *amount_a), (Asset::B, *amount_b)] {
                let token = pool.token_mut_unchecked(asset);
                token.mint(account, amount);
                token.approve(account, u128::MAX);
            }
            Ok(format!("funded {account}"))
        }
        Operation::Approve { account, asset, amount } => {
            pool.token_mut_unchecked(*asset).approve(account, *amount);
            Ok(format!("{account} approved {amount} of {asset}"))
        }
        Operation::Freeze { account, asset } => {
            pool.token_mut_unchecked(*asset).freeze(account);
            Ok(format!("{account} frozen on {asset}"))
        }
        Operation::Unfreeze { account, asset } => {
            pool.token_mut_unchecked(*asset).unfreeze(account);
            Ok(format!("{account} unfrozen on {asset}"))
        }
        Operation::AddLiquidity { account, amount_a, amount_b } => pool
            .add_liquidity(account, *amount_a, *amount_b)
            .map(|shares| format!("minted {shares} shares")),
        Operation::RemoveLiquidity { account, shares } => pool
            .remove_liquidity(account, *shares)
            .map(|(a, b)| format!("paid out {a} A and {b} B")),
        Operation::Swap { account, asset_in, amount_in, min_amount_out } => pool
            .swap(account, *asset_in, *amount_in, *min_amount_out)
            .map(|r| format!("received {} {}", r.amount_out, r.asset_out)),
    }
}
