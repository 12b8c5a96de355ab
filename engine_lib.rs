extern crate self as pair_amm;

pub mod error;
pub mod events;
pub mod ledger;
pub mod liquidity;
pub mod market;
pub mod math;
pub mod pool;
pub mod price;
pub mod reserve;
pub mod scenario;
pub mod shared;
pub mod sim;
pub mod swap;
pub mod token;
pub mod types;

pub use error::{PoolError, TransferError};
pub use events::{EventLog, EventSink, PoolEvent, TracingSink};
pub use pool::{Pool, SwapReceipt};
pub use shared::SharedPool;
pub use token::{AssetTransfer, InMemoryToken};
pub use types::{AccountId, Asset, AssetId, FeeRate, PoolConfig};

#[cfg(test)]
#[path = "tests.rs"]
mod tests;
