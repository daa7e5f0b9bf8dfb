//! Domain events and their distribution.
//!
//! Events are published **after** the record they describe has been persisted;
//! the bus distributes them, it never stores them.

pub mod bus;
pub mod envelope;
pub mod event;
pub mod in_memory_bus;

pub use bus::{EventBus, Subscription};
pub use envelope::EventEnvelope;
pub use event::Event;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
