use std::sync::Arc;

use thiserror::Error;

use stockledger_adjustments::StockAdjustment;
use stockledger_core::{AdjustmentId, ExpectedVersion};

/// Repository operation error.
///
/// These are **storage errors** (versions, keys, encoding) as opposed to domain
/// errors (validation, lifecycle).
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("optimistic concurrency check failed: {0}")]
    Concurrency(String),

    #[error("record already exists: {0}")]
    Duplicate(String),

    #[error("record not found: {0}")]
    NotFound(String),

    #[error("record encoding failed: {0}")]
    Serialization(String),

    #[error("storage lock poisoned")]
    Poisoned,
}

/// Persisted ledger records, keyed by adjustment id.
///
/// Implementations must:
/// - reject `insert` of an id that already exists
/// - compare the stored record's version with `expected` before `update`/`remove`
/// - return `list` ordered by creation time
pub trait AdjustmentRepo: Send + Sync {
    fn get(&self, id: AdjustmentId) -> Result<Option<StockAdjustment>, RepoError>;

    fn insert(&self, adjustment: StockAdjustment) -> Result<(), RepoError>;

    fn update(&self, adjustment: StockAdjustment, expected: ExpectedVersion) -> Result<(), RepoError>;

    fn remove(&self, id: AdjustmentId, expected: ExpectedVersion) -> Result<StockAdjustment, RepoError>;

    fn list(&self) -> Result<Vec<StockAdjustment>, RepoError>;

    /// Next value of the adjustment-number counter (1, 2, 3, ...).
    fn next_sequence(&self) -> Result<u64, RepoError>;
}

impl<S> AdjustmentRepo for Arc<S>
where
    S: AdjustmentRepo + ?Sized,
{
    fn get(&self, id: AdjustmentId) -> Result<Option<StockAdjustment>, RepoError> {
        (**self).get(id)
    }

    fn insert(&self, adjustment: StockAdjustment) -> Result<(), RepoError> {
        (**self).insert(adjustment)
    }

    fn update(&self, adjustment: StockAdjustment, expected: ExpectedVersion) -> Result<(), RepoError> {
        (**self).update(adjustment, expected)
    }

    fn remove(&self, id: AdjustmentId, expected: ExpectedVersion) -> Result<StockAdjustment, RepoError> {
        (**self).remove(id, expected)
    }

    fn list(&self) -> Result<Vec<StockAdjustment>, RepoError> {
        (**self).list()
    }

    fn next_sequence(&self) -> Result<u64, RepoError> {
        (**self).next_sequence()
    }
}

pub(crate) fn version_mismatch(expected: ExpectedVersion, actual: u64) -> RepoError {
    RepoError::Concurrency(format!("expected {expected:?}, found {actual}"))
}

/// Creation-time order, ties broken by id (UUIDv7, so also time-ordered).
pub(crate) fn sort_by_creation(records: &mut [StockAdjustment]) {
    records.sort_by(|a, b| {
        a.created_at()
            .cmp(&b.created_at())
            .then_with(|| a.id_typed().cmp(&b.id_typed()))
    });
}
