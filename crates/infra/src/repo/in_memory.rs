use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

use stockledger_adjustments::StockAdjustment;
use stockledger_core::{AdjustmentId, AggregateRoot, ExpectedVersion};

use super::r#trait::{AdjustmentRepo, RepoError, sort_by_creation, version_mismatch};

/// In-memory adjustment records.
///
/// Intended for tests/dev and for the single-process HTTP server.
#[derive(Debug, Default)]
pub struct InMemoryAdjustmentRepo {
    rows: RwLock<HashMap<AdjustmentId, StockAdjustment>>,
    sequence: AtomicU64,
}

impl InMemoryAdjustmentRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AdjustmentRepo for InMemoryAdjustmentRepo {
    fn get(&self, id: AdjustmentId) -> Result<Option<StockAdjustment>, RepoError> {
        let rows = self.rows.read().map_err(|_| RepoError::Poisoned)?;
        Ok(rows.get(&id).cloned())
    }

    fn insert(&self, adjustment: StockAdjustment) -> Result<(), RepoError> {
        let mut rows = self.rows.write().map_err(|_| RepoError::Poisoned)?;
        let id = adjustment.id_typed();
        if rows.contains_key(&id) {
            return Err(RepoError::Duplicate(id.to_string()));
        }
        rows.insert(id, adjustment);
        Ok(())
    }

    fn update(&self, adjustment: StockAdjustment, expected: ExpectedVersion) -> Result<(), RepoError> {
        let mut rows = self.rows.write().map_err(|_| RepoError::Poisoned)?;
        let id = adjustment.id_typed();
        let current = rows
            .get(&id)
            .ok_or_else(|| RepoError::NotFound(id.to_string()))?
            .version();

        if !expected.matches(current) {
            return Err(version_mismatch(expected, current));
        }
        rows.insert(id, adjustment);
        Ok(())
    }

    fn remove(&self, id: AdjustmentId, expected: ExpectedVersion) -> Result<StockAdjustment, RepoError> {
        let mut rows = self.rows.write().map_err(|_| RepoError::Poisoned)?;
        let current = rows
            .get(&id)
            .ok_or_else(|| RepoError::NotFound(id.to_string()))?
            .version();

        if !expected.matches(current) {
            return Err(version_mismatch(expected, current));
        }
        rows.remove(&id).ok_or_else(|| RepoError::NotFound(id.to_string()))
    }

    fn list(&self) -> Result<Vec<StockAdjustment>, RepoError> {
        let rows = self.rows.read().map_err(|_| RepoError::Poisoned)?;
        let mut out: Vec<StockAdjustment> = rows.values().cloned().collect();
        sort_by_creation(&mut out);
        Ok(out)
    }

    fn next_sequence(&self) -> Result<u64, RepoError> {
        Ok(self.sequence.fetch_add(1, Ordering::SeqCst) + 1)
    }
}
