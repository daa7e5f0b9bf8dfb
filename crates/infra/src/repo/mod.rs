//! Adjustment persistence boundary.
//!
//! The ledger depends on [`AdjustmentRepo`] only. Two adapters ship here: a typed
//! in-memory map, and a JSON-per-key adapter over any [`KeyValueStore`].

pub mod in_memory;
pub mod key_value;
pub mod r#trait;

pub use in_memory::InMemoryAdjustmentRepo;
pub use key_value::{InMemoryKeyValueStore, KeyValueAdjustmentRepo, KeyValueStore};
pub use r#trait::{AdjustmentRepo, RepoError};
