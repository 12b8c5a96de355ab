use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, LogNormal, Poisson};

use crate::liquidity::matching_amount;
use crate::reserve::ReserveState;
use crate::types::{Asset, SimConfig};

// ─── Flow Parameters (sampled once per simulation) ───────────────────────────

#[derive(Clone, Debug)]
pub struct FlowParams {
    /// Poisson arrival rate of swaps (per step)
    pub swap_rate: f64,
    /// Log-normal mean swap size, as a fraction of the input reserve
    pub swap_size_mean: f64,
    /// Log-normal shape of swap sizes
    pub swap_size_sigma: f64,
    /// Probability that a swap sells A
    pub sell_a_bias: f64,
    pub deposit_probability: f64,
    pub withdraw_probability: f64,
}

impl FlowParams {
    /// Take rates from `config`; sample the shape parameters with `rng`.
    pub fn sample(config: &SimConfig, rng: &mut ChaCha8Rng) -> Self {
        let swap_size_sigma = rng.gen_range(0.6f64..=1.4);
        let sell_a_bias = rng.gen_range(0.4f64..=0.6);

        Self {
            swap_rate: config.swap_rate,
            swap_size_mean: config.swap_size_mean,
            swap_size_sigma,
            sell_a_bias,
            deposit_probability: config.deposit_probability,
            withdraw_probability: config.withdraw_probability,
        }
    }
}

// ─── Actions ──────────────────────────────────────────────────────────────────

/// One participant action. Participants are indices into the simulation's
/// provider and trader lists.
#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    Deposit { provider: usize, amount_a: u128, amount_b: u128 },
    /// Burn `fraction` of the provider's current shares
    Withdraw { provider: usize, fraction: f64 },
    Swap { trader: usize, asset_in: Asset, amount_in: u128 },
}

/// Largest swap, as a fraction of the input reserve.
const MAX_SWAP_FRACTION: f64 = 0.5;

/// Generate swaps for one step: Poisson count, each sized log-normally
/// against the reserve it sells into.
pub fn generate_swaps(
    params: &FlowParams,
    state: &ReserveState,
    traders: usize,
    rng: &mut ChaCha8Rng,
) -> Vec<Action> {
    if traders == 0 || params.swap_rate <= 0.0 {
        return Vec::new();
    }
    let count = match Poisson::new(params.swap_rate) {
        Ok(pois) => pois.sample(rng) as usize,
        Err(_) => return Vec::new(),
    };

    // E[X] = exp(μ + σ²/2) → μ = ln(E[X]) - σ²/2
    let sigma_ln = params.swap_size_sigma;
    let mu_ln = params.swap_size_mean.ln() - 0.5 * sigma_ln * sigma_ln;
    let Ok(ln_dist) = LogNormal::new(mu_ln, sigma_ln) else {
        return Vec::new();
    };

    (0..count)
        .map(|_| {
            let asset_in = if rng.gen_bool(params.sell_a_bias) { Asset::A } else { Asset::B };
            let fraction = ln_dist.sample(rng).min(MAX_SWAP_FRACTION);
            let reserve_in = state.reserve_of(asset_in);
            Action::Swap {
                trader: rng.gen_range(0..traders),
                asset_in,
                // f64 → u128 saturates; the pool rejects zero
                amount_in: (reserve_in as f64 * fraction) as u128,
            }
        })
        .collect()
}

/// A balanced deposit of 0.1%..5% of the pool, or `bootstrap` if the pool is empty.
pub fn maybe_deposit(
    params: &FlowParams,
    state: &ReserveState,
    providers: usize,
    bootstrap: (u128, u128),
    rng: &mut ChaCha8Rng,
) -> Option<Action> {
    if providers == 0 || !rng.gen_bool(params.deposit_probability.clamp(0.0, 1.0)) {
        return None;
    }
    let provider = rng.gen_range(0..providers);
    if state.is_empty() {
        let (amount_a, amount_b) = bootstrap;
        return Some(Action::Deposit { provider, amount_a, amount_b });
    }

    let fraction = rng.gen_range(0.001f64..=0.05);
    let amount_a = ((state.reserve_of(Asset::A) as f64 * fraction) as u128).max(1);
    let amount_b = matching_amount(state, Asset::A, amount_a).ok()?;
    Some(Action::Deposit { provider, amount_a, amount_b })
}

pub fn maybe_withdraw(
    params: &FlowParams,
    providers: usize,
    rng: &mut ChaCha8Rng,
) -> Option<Action> {
    if providers == 0 || !rng.gen_bool(params.withdraw_probability.clamp(0.0, 1.0)) {
        return None;
    }
    Some(Action::Withdraw {
        provider: rng.gen_range(0..providers),
        fraction: rng.gen_range(0.05f64..=0.5),
    })
}

/// All actions for one step: liquidity changes first, then swaps.
pub fn generate_step(
    params: &FlowParams,
    state: &ReserveState,
    config: &SimConfig,
    rng: &mut ChaCha8Rng,
) -> Vec<Action> {
    let mut actions = Vec::new();
    actions.extend(maybe_deposit(params, state, config.providers, config.seed_liquidity, rng));
    actions.extend(maybe_withdraw(params, config.providers, rng));
    actions.extend(generate_swaps(params, state, config.traders, rng));
    actions
}

/// Shares to burn for a `fraction` withdrawal of `balance`, at least one.
pub fn shares_for_fraction(balance: u128, fraction: f64) -> u128 {
    ((balance as f64 * fraction) as u128).clamp(1, balance.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::liquidity::initial_shares;
    use rand::SeedableRng;

    fn params() -> FlowParams {
        FlowParams {
            swap_rate: 0.8,
            swap_size_mean: 0.01,
            swap_size_sigma: 1.0,
            sell_a_bias: 0.5,
            deposit_probability: 0.1,
            withdraw_probability: 0.1,
        }
    }

    fn seeded(a: u128, b: u128) -> ReserveState {
        let mut state = ReserveState::default();
        state.apply_deposit(a, b, initial_shares(a, b).unwrap()).unwrap();
        state
    }

    #[test]
    fn swap_arrivals_approximately_poisson() {
        let mut rng = ChaCha8Rng::seed_from_u64(99);
        let state = seeded(1_000_000, 2_000_000);
        let n_steps = 10_000;
        let total: usize = (0..n_steps)
            .map(|_| generate_swaps(&params(), &state, 4, &mut rng).len())
            .sum();

        let mean = total as f64 / n_steps as f64;
        assert!((mean - 0.8).abs() < 0.05, "mean swaps/step = {mean:.3}, expected ≈ 0.8");
    }

    #[test]
    fn swaps_are_bounded_by_reserve_fraction() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let state = seeded(1_000_000, 2_000_000);
        for _ in 0..5_000 {
            for action in generate_swaps(&params(), &state, 4, &mut rng) {
                let Action::Swap { trader, asset_in, amount_in } = action else {
                    panic!("non-swap action from generate_swaps");
                };
                assert!(trader < 4);
                assert!(amount_in <= state.reserve_of(asset_in) / 2);
            }
        }
    }

    #[test]
    fn deposits_keep_pool_ratio() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let state = seeded(1_000_000, 3_000_000);
        let mut seen = 0;
        for _ in 0..1_000 {
            if let Some(Action::Deposit { amount_a, amount_b, .. }) =
                maybe_deposit(&params(), &state, 2, (1, 1), &mut rng)
            {
                assert_eq!(amount_b, amount_a * 3);
                seen += 1;
            }
        }
        assert!(seen > 0);
    }

    #[test]
    fn empty_pool_gets_bootstrap_deposit() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let always = FlowParams { deposit_probability: 1.0, ..params() };
        let action = maybe_deposit(&always, &ReserveState::default(), 1, (10, 20), &mut rng);
        assert_eq!(action, Some(Action::Deposit { provider: 0, amount_a: 10, amount_b: 20 }));
    }

    #[test]
    fn withdrawal_share_count_is_clamped() {
        assert_eq!(shares_for_fraction(100, 0.25), 25);
        assert_eq!(shares_for_fraction(3, 0.01), 1);
        assert_eq!(shares_for_fraction(0, 0.5), 1);
    }
}
