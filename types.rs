use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::PoolError;

/// Fixed-point scale for spot prices: 1.0 = 1e18
pub const PRICE_SCALE: u128 = 1_000_000_000_000_000_000;

/// Default swap fee: 3 per mille (0.3%), so 997/1000 of each input is priced.
pub const DEFAULT_FEE_NUMERATOR: u128 = 3;
pub const DEFAULT_FEE_DENOMINATOR: u128 = 1_000;

// ─── Identities ───────────────────────────────────────────────────────────────

/// One of the two sides of the pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Asset {
    A,
    B,
}

impl Asset {
    #[inline]
    pub fn opposite(self) -> Self {
        match self {
            Asset::A => Asset::B,
            Asset::B => Asset::A,
        }
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Asset::A => f.write_str("A"),
            Asset::B => f.write_str("B"),
        }
    }
}

/// Identifier of a fungible asset backing one side of the pool (e.g. a token symbol or address).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(String);

impl AssetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AssetId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Identity of a participant (liquidity provider or trader).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AccountId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

// ─── Fee ──────────────────────────────────────────────────────────────────────

/// Swap fee as an exact rational `numerator / denominator` of the input amount.
///
/// The fee portion is never paid out: it stays in the input reserve and raises `k`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeRate {
    pub numerator: u128,
    pub denominator: u128,
}

impl FeeRate {
    pub const fn new(numerator: u128, denominator: u128) -> Self {
        Self { numerator, denominator }
    }

    /// Fraction of the input that is priced, as a numerator over `denominator`.
    /// Zero for a fee of 100% or more, which [`Self::validate`] rejects.
    #[inline]
    pub fn retained(&self) -> u128 {
        self.denominator.saturating_sub(self.numerator)
    }

    pub fn validate(&self) -> Result<(), PoolError> {
        if self.denominator == 0 {
            return Err(PoolError::InvalidConfig("fee denominator must be non-zero".into()));
        }
        if self.numerator >= self.denominator {
            return Err(PoolError::InvalidConfig(format!(
                "fee {}/{} must be below 100%",
                self.numerator, self.denominator
            )));
        }
        Ok(())
    }
}

impl Default for FeeRate {
    fn default() -> Self {
        Self::new(DEFAULT_FEE_NUMERATOR, DEFAULT_FEE_DENOMINATOR)
    }
}

impl fmt::Display for FeeRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

// ─── Configuration ────────────────────────────────────────────────────────────

/// Fixed parameters of a pool, set once at construction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    pub asset_a: AssetId,
    pub asset_b: AssetId,
    pub fee: FeeRate,
}

impl PoolConfig {
    pub fn validate(&self) -> Result<(), PoolError> {
        if self.asset_a == self.asset_b {
            return Err(PoolError::InvalidConfig(format!(
                "cannot pair asset {} with itself",
                self.asset_a
            )));
        }
        self.fee.validate()
    }

    pub fn asset_id(&self, asset: Asset) -> &AssetId {
        match asset {
            Asset::A => &self.asset_a,
            Asset::B => &self.asset_b,
        }
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            asset_a: AssetId::new("TKA"),
            asset_b: AssetId::new("TKB"),
            fee: FeeRate::default(),
        }
    }
}

/// Configuration for a randomised workload run against a single pool.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Total simulation steps
    pub total_steps: usize,
    /// Random seed
    pub seed: u64,
    /// Number of liquidity providers
    pub providers: usize,
    /// Number of traders
    pub traders: usize,
    /// Starting wallet balance of every participant, per asset (smallest units)
    pub initial_balance: u128,
    /// Initial deposit of the seeding provider (A, B)
    pub seed_liquidity: (u128, u128),
    /// Poisson arrival rate of swaps per step
    pub swap_rate: f64,
    /// Log-normal mean swap size as a fraction of the input reserve
    pub swap_size_mean: f64,
    /// Probability per step that a provider deposits
    pub deposit_probability: f64,
    /// Probability per step that a provider withdraws part of their shares
    pub withdraw_probability: f64,
    pub pool: PoolConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            total_steps: 1_000,
            seed: 0,
            providers: 4,
            traders: 8,
            initial_balance: 1_000_000 * PRICE_SCALE,
            seed_liquidity: (100 * PRICE_SCALE, 200 * PRICE_SCALE),
            swap_rate: 0.8,
            swap_size_mean: 0.01,
            deposit_probability: 0.05,
            withdraw_probability: 0.03,
            pool: PoolConfig::default(),
        }
    }
}
