//! Infrastructure layer: repositories, configuration, the adjustment ledger and
//! its reporting projection.

pub mod config;
pub mod ledger;
pub mod projections;
pub mod repo;


pub use config::{ApprovalPolicy, ConfigError, HttpConfig, LedgerConfig};
pub use ledger::{AdjustmentLedger, LedgerError, LedgerResult};
pub use projections::adjustment_report::{AdjustmentFilter, AdjustmentSummary, Totals};
pub use repo::{
    AdjustmentRepo, InMemoryAdjustmentRepo, InMemoryKeyValueStore, KeyValueAdjustmentRepo,
    KeyValueStore, RepoError,
};
