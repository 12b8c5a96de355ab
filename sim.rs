//! Randomised workload simulation.
//!
//! Drives one pool with seeded deposit/withdraw/swap flow from
//! [`crate::market`], audits the pool invariants after every step and
//! records how the pool evolved. Failed operations are expected (dust swaps,
//! empty wallets) and are counted by error kind; an invariant violation
//! aborts the run.

use std::collections::BTreeMap;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::PoolError;
use crate::events::EventLog;
use crate::market::{generate_step, shares_for_fraction, Action, FlowParams};
use crate::math::{isqrt, narrow};
use crate::pool::Pool;
use crate::token::InMemoryToken;
use crate::types::{AccountId, SimConfig};

// ─── Simulation Result ────────────────────────────────────────────────────────

#[derive(Clone, Debug, Serialize)]
pub struct SimResult {
    pub seed: u64,
    pub steps: usize,
    pub swaps: usize,
    pub deposits: usize,
    pub withdrawals: usize,
    /// Failed operations by error kind
    pub failures: BTreeMap<String, usize>,
    pub events: usize,
    pub final_reserves: (u128, u128),
    /// Spot price of A in B scaled by 1e18, as a decimal string
    pub final_price: Option<String>,
    /// sqrt(k) at the end over sqrt(k) after seeding
    pub k_growth: f64,
    /// sqrt(k) per share at the end over the same after seeding
    pub share_value_growth: f64,
}

impl SimResult {
    pub fn failure_count(&self) -> usize {
        self.failures.values().sum()
    }
}

fn provider_id(i: usize) -> AccountId {
    AccountId::new(format!("lp-{i}"))
}

fn trader_id(i: usize) -> AccountId {
    AccountId::new(format!("trader-{i}"))
}

/// sqrt(k) and sqrt(k) per share, in floating point for reporting.
fn depth(pool: &Pool<InMemoryToken, EventLog>) -> Result<(f64, f64), PoolError> {
    let root = narrow(isqrt(pool.reserve_state().k()))? as f64;
    let shares = pool.total_shares();
    let per_share = if shares == 0 { 0.0 } else { root / shares as f64 };
    Ok((root, per_share))
}

// ─── Core Simulation ──────────────────────────────────────────────────────────

/// Run one complete simulation.
pub fn run_simulation(config: &SimConfig, seed: u64) -> Result<SimResult, PoolError> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    // ── 1. Sample flow parameters ──────────────────────────────────────────────
    let params = FlowParams::sample(config, &mut rng);

    // ── 2. Fund participants and seed the pool ─────────────────────────────────
    let mut token_a = InMemoryToken::new(config.pool.asset_a.clone());
    let mut token_b = InMemoryToken::new(config.pool.asset_b.clone());
    let accounts = (0..config.providers)
        .map(provider_id)
        .chain((0..config.traders).map(trader_id));
    for account in accounts {
        for token in [&mut token_a, &mut token_b] {
            token.mint(&account, config.initial_balance);
            token.approve(&account, u128::MAX);
        }
    }

    let mut pool = Pool::new(config.pool.clone(), token_a, token_b, EventLog::default())?;
    let mut failures: BTreeMap<String, usize> = BTreeMap::new();
    let (mut swaps, mut deposits, mut withdrawals) = (0usize, 0usize, 0usize);

    if config.providers > 0 {
        let (amount_a, amount_b) = config.seed_liquidity;
        match pool.add_liquidity(&provider_id(0), amount_a, amount_b) {
            Ok(_) => deposits += 1,
            Err(e) => *failures.entry(e.kind().to_string()).or_default() += 1,
        }
    }
    let (root_start, per_share_start) = depth(&pool)?;

    // ── 3. Main loop ───────────────────────────────────────────────────────────
    for step in 0..config.total_steps {
        let actions = generate_step(&params, pool.reserve_state(), config, &mut rng);

        for action in actions {
            let outcome = match action {
                Action::Deposit { provider, amount_a, amount_b } => pool
                    .add_liquidity(&provider_id(provider), amount_a, amount_b)
                    .map(|_| deposits += 1),
                Action::Withdraw { provider, fraction } => {
                    let id = provider_id(provider);
                    let shares = shares_for_fraction(pool.share_balance(&id), fraction);
                    pool.remove_liquidity(&id, shares).map(|_| withdrawals += 1)
                }
                Action::Swap { trader, asset_in, amount_in } => pool
                    .swap(&trader_id(trader), asset_in, amount_in, None)
                    .map(|_| swaps += 1),
            };
            if let Err(e) = outcome {
                debug!(step, error = %e, "action rejected");
                *failures.entry(e.kind().to_string()).or_default() += 1;
            }
        }

        if let Err(e) = pool.check_invariants() {
            warn!(seed, step, error = %e, "invariant violated");
            return Err(e);
        }
    }

    // ── 4. Build result ────────────────────────────────────────────────────────
    let (root_end, per_share_end) = depth(&pool)?;
    let ratio = |end: f64, start: f64| if start > 0.0 { end / start } else { 0.0 };

    Ok(SimResult {
        seed,
        steps: config.total_steps,
        swaps,
        deposits,
        withdrawals,
        failures,
        events: pool.events().len(),
        final_reserves: pool.get_reserves(),
        final_price: pool.get_price().ok().map(|p| p.to_string()),
        k_growth: ratio(root_end, root_start),
        share_value_growth: ratio(per_share_end, per_share_start),
    })
}

// ─── Parallel Multi-simulation Runner ────────────────────────────────────────

/// Run `n_sims` simulations in parallel over consecutive seeds.
pub fn run_parallel(
    config: &SimConfig,
    n_sims: usize,
    seed_start: u64,
) -> Result<AggregatedResult, PoolError> {
    let results: Vec<SimResult> = (0..n_sims)
        .into_par_iter()
        .map(|i| run_simulation(config, seed_start + i as u64))
        .collect::<Result<_, _>>()?;

    Ok(aggregate_results(&results))
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct AggregatedResult {
    pub runs: usize,
    pub mean_swaps: f64,
    pub mean_k_growth: f64,
    pub std_k_growth: f64,
    pub mean_share_value_growth: f64,
    pub min_share_value_growth: f64,
    /// Failures by error kind, summed over all runs
    pub failures: BTreeMap<String, usize>,
}

pub fn aggregate_results(sims: &[SimResult]) -> AggregatedResult {
    if sims.is_empty() {
        return AggregatedResult::default();
    }
    let n = sims.len() as f64;

    let growth: Vec<f64> = sims.iter().map(|s| s.k_growth).collect();
    let mean = growth.iter().sum::<f64>() / n;
    let var = growth.iter().map(|g| (g - mean).powi(2)).sum::<f64>() / n;

    let mut failures: BTreeMap<String, usize> = BTreeMap::new();
    for sim in sims {
        for (kind, count) in &sim.failures {
            *failures.entry(kind.clone()).or_default() += count;
        }
    }

    AggregatedResult {
        runs: sims.len(),
        mean_swaps: sims.iter().map(|s| s.swaps as f64).sum::<f64>() / n,
        mean_k_growth: mean,
        std_k_growth: var.sqrt(),
        mean_share_value_growth: sims.iter().map(|s| s.share_value_growth).sum::<f64>() / n,
        min_share_value_growth: sims
            .iter()
            .map(|s| s.share_value_growth)
            .fold(f64::INFINITY, f64::min),
        failures,
    }
}
