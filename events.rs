//! Outbound notifications.
//!
//! Events are published only after an operation has fully succeeded, so a
//! sink never observes an operation that was later rolled back.

use serde::Serialize;
use tracing::info;

use crate::types::{AccountId, Asset};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "event")]
pub enum PoolEvent {
    LiquidityAdded {
        provider: AccountId,
        amount_a: u128,
        amount_b: u128,
        shares: u128,
    },
    LiquidityRemoved {
        provider: AccountId,
        amount_a: u128,
        amount_b: u128,
        shares: u128,
    },
    Swap {
        trader: AccountId,
        asset_in: Asset,
        amount_in: u128,
        asset_out: Asset,
        amount_out: u128,
    },
}

impl PoolEvent {
    pub fn name(&self) -> &'static str {
        match self {
            PoolEvent::LiquidityAdded { .. } => "LiquidityAdded",
            PoolEvent::LiquidityRemoved { .. } => "LiquidityRemoved",
            PoolEvent::Swap { .. } => "Swap",
        }
    }
}

pub trait EventSink {
    fn publish(&mut self, event: PoolEvent);
}

/// Records every event in order.
#[derive(Clone, Debug, Default)]
pub struct EventLog {
    events: Vec<PoolEvent>,
}

impl EventLog {
    pub fn events(&self) -> &[PoolEvent] {
        &self.events
    }

    pub fn last(&self) -> Option<&PoolEvent> {
        self.events.last()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn drain(&mut self) -> Vec<PoolEvent> {
        std::mem::take(&mut self.events)
    }
}

impl EventSink for EventLog {
    fn publish(&mut self, event: PoolEvent) {
        self.events.push(event);
    }
}

/// Emits each event as a structured `tracing` record.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn publish(&mut self, event: PoolEvent) {
        match &event {
            PoolEvent::LiquidityAdded { provider, amount_a, amount_b, shares } => {
                info!(%provider, amount_a, amount_b, shares, "LiquidityAdded");
            }
            PoolEvent::LiquidityRemoved { provider, amount_a, amount_b, shares } => {
                info!(%provider, amount_a, amount_b, shares, "LiquidityRemoved");
            }
            PoolEvent::Swap { trader, asset_in, amount_in, asset_out, amount_out } => {
                info!(%trader, %asset_in, amount_in, %asset_out, amount_out, "Swap");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_keeps_publication_order() {
        let mut log = EventLog::default();
        let alice = AccountId::new("alice");
        log.publish(PoolEvent::LiquidityAdded {
            provider: alice.clone(),
            amount_a: 1,
            amount_b: 2,
            shares: 1,
        });
        log.publish(PoolEvent::Swap {
            trader: alice,
            asset_in: Asset::A,
            amount_in: 1,
            asset_out: Asset::B,
            amount_out: 0,
        });
        assert_eq!(log.len(), 2);
        assert_eq!(log.last().map(PoolEvent::name), Some("Swap"));
        assert_eq!(log.drain().len(), 2);
        assert!(log.is_empty());
    }

    #[test]
    fn events_serialize_with_tag() {
        let event = PoolEvent::LiquidityRemoved {
            provider: AccountId::new("bob"),
            amount_a: 5,
            amount_b: 10,
            shares: 7,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "LiquidityRemoved");
        assert_eq!(json["provider"], "bob");
        assert_eq!(json["shares"], 7);
    }
}
