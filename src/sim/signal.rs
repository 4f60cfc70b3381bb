use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// A notification published by the simulation for other subsystems
/// (faction logic, client sync, audit).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Signal {
    /// Control of a territory was (re)assigned.
    TerritoryControlChanged {
        territory_id: String,
        previous_faction: Option<String>,
        new_faction: String,
        contested: bool,
    },

    /// A world event was created.
    EventCreated { event_id: u64, kind: String },

    /// A world event passed its expiry and was removed by the sweep.
    EventExpired { event_id: u64, kind: String },

    /// The economic snapshot was patched or recomputed.
    EconomicStateChanged {
        law_enforcement_activity: f64,
        business_activity: f64,
    },

    /// A price tick finished.
    PricesUpdated { items: usize },

    ItemPurchased {
        player_id: String,
        item_id: String,
        quantity: i64,
        total: f64,
    },

    ItemSold {
        player_id: String,
        item_id: String,
        quantity: i64,
        total: f64,
    },
}

impl Signal {
    /// The notification name subscribers key on.
    pub fn name(&self) -> &'static str {
        match self {
            Signal::TerritoryControlChanged { .. } => "territoryControlChanged",
            Signal::EventCreated { .. } => "eventCreated",
            Signal::EventExpired { .. } => "eventExpired",
            Signal::EconomicStateChanged { .. } => "economicStateChanged",
            Signal::PricesUpdated { .. } => "pricesUpdated",
            Signal::ItemPurchased { .. } => "itemPurchased",
            Signal::ItemSold { .. } => "itemSold",
        }
    }
}

/// In-process publish/subscribe for `Signal`s.
///
/// Cloning yields another handle onto the same subscriber list. Delivery is
/// unbounded and never blocks the emitter; a dropped receiver is pruned on
/// the next emit.
#[derive(Debug, Clone, Default)]
pub struct SignalBus {
    subscribers: Arc<Mutex<Vec<mpsc::UnboundedSender<Signal>>>>,
}

impl SignalBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<Signal> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.lock().push(tx);
        rx
    }

    pub fn emit(&self, signal: Signal) {
        tracing::debug!(signal = signal.name(), "emit");
        let mut subs = self.subscribers.lock();
        subs.retain(|tx| tx.send(signal.clone()).is_ok());
    }

    pub fn emit_all(&self, signals: impl IntoIterator<Item = Signal>) {
        for signal in signals {
            self.emit(signal);
        }
    }

    /// Drop every subscriber. Their receivers drain what was already sent
    /// and then close.
    pub fn detach_all(&self) {
        self.subscribers.lock().clear();
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expired(id: u64) -> Signal {
        Signal::EventExpired {
            event_id: id,
            kind: "police_raid".to_string(),
        }
    }

    #[test]
    fn every_subscriber_receives_each_signal() {
        let bus = SignalBus::new();
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();

        bus.emit(expired(1));

        assert_eq!(a.try_recv().unwrap(), expired(1));
        assert_eq!(b.try_recv().unwrap(), expired(1));
        assert!(a.try_recv().is_err());
    }

    #[test]
    fn dropped_receivers_are_pruned() {
        let bus = SignalBus::new();
        let rx = bus.subscribe();
        let _keep = bus.subscribe();
        drop(rx);

        bus.emit(expired(1));
        assert_eq!(bus.subscriber_count(), 1);
    }

    #[test]
    fn detach_all_closes_receivers() {
        let bus = SignalBus::new();
        let mut rx = bus.subscribe();
        bus.emit(expired(7));
        bus.detach_all();
        bus.emit(expired(8));

        assert_eq!(rx.try_recv().unwrap(), expired(7));
        assert_eq!(
            rx.try_recv(),
            Err(mpsc::error::TryRecvError::Disconnected)
        );
    }

    #[test]
    fn signal_serializes_with_type_tag() {
        let json = serde_json::to_value(expired(3)).unwrap();
        assert_eq!(json["type"], "event_expired");
        assert_eq!(json["event_id"], 3);
        assert_eq!(expired(3).name(), "eventExpired");
    }
}
