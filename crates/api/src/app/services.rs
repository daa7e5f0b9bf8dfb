use std::sync::Arc;

use stockledger_adjustments::AdjustmentEvent;
use stockledger_catalog::InMemoryProductRepo;
use stockledger_events::{Event, EventBus, EventEnvelope, InMemoryEventBus};
use stockledger_infra::{AdjustmentLedger, InMemoryAdjustmentRepo, LedgerConfig};

pub type Catalog = Arc<InMemoryProductRepo>;
pub type Records = Arc<InMemoryAdjustmentRepo>;
pub type Bus = Arc<InMemoryEventBus<EventEnvelope<AdjustmentEvent>>>;
pub type Ledger = AdjustmentLedger<Catalog, Records, Bus>;

/// Process-wide services shared by every handler.
pub struct AppServices {
    ledger: Ledger,
}

impl AppServices {
    pub fn new(config: LedgerConfig) -> Self {
        Self::with_catalog(InMemoryProductRepo::new(), config)
    }

    pub fn with_catalog(catalog: InMemoryProductRepo, config: LedgerConfig) -> Self {
        let bus: Bus = Arc::new(InMemoryEventBus::new());
        spawn_event_log(&bus);

        let ledger = AdjustmentLedger::new(
            Arc::new(catalog),
            Arc::new(InMemoryAdjustmentRepo::new()),
            bus,
            config,
        );
        Self { ledger }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }
}

/// Log every committed ledger event from a background consumer thread.
fn spawn_event_log(bus: &Bus) {
    let sub = bus.subscribe();
    std::thread::spawn(move || {
        while let Ok(envelope) = sub.recv() {
            tracing::info!(
                event_type = envelope.payload().event_type(),
                adjustment_id = %envelope.aggregate_id(),
                sequence = envelope.sequence_number(),
                "ledger event"
            );
        }
    });
}
