//! Adjustment records stored as JSON documents in a string key-value store.
//!
//! Layout:
//! - `stock_adjustments/{id}` holds one serialized [`StockAdjustment`]
//! - `stock_adjustments:sequence` holds the adjustment-number counter

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, RwLock};

use stockledger_adjustments::StockAdjustment;
use stockledger_core::{AdjustmentId, AggregateRoot, ExpectedVersion};

use super::r#trait::{AdjustmentRepo, RepoError, sort_by_creation, version_mismatch};

const RECORD_PREFIX: &str = "stock_adjustments/";
const SEQUENCE_KEY: &str = "stock_adjustments:sequence";

/// Minimal string store (a browser-style local storage, a file, a KV service).
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, RepoError>;
    fn set(&self, key: &str, value: String) -> Result<(), RepoError>;
    fn remove(&self, key: &str) -> Result<Option<String>, RepoError>;
    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, RepoError>;
}

impl<S> KeyValueStore for Arc<S>
where
    S: KeyValueStore + ?Sized,
{
    fn get(&self, key: &str) -> Result<Option<String>, RepoError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: String) -> Result<(), RepoError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<Option<String>, RepoError> {
        (**self).remove(key)
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, RepoError> {
        (**self).keys_with_prefix(prefix)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryKeyValueStore {
    entries: RwLock<BTreeMap<String, String>>,
}

impl InMemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for InMemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, RepoError> {
        let entries = self.entries.read().map_err(|_| RepoError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: String) -> Result<(), RepoError> {
        let mut entries = self.entries.write().map_err(|_| RepoError::Poisoned)?;
        entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<Option<String>, RepoError> {
        let mut entries = self.entries.write().map_err(|_| RepoError::Poisoned)?;
        Ok(entries.remove(key))
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, RepoError> {
        let entries = self.entries.read().map_err(|_| RepoError::Poisoned)?;
        Ok(entries
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, _)| k.clone())
            .collect())
    }
}

/// [`AdjustmentRepo`] over any [`KeyValueStore`].
///
/// The store itself offers no compare-and-set, so read-check-write sequences are
/// serialized through `write_lock`.
#[derive(Debug)]
pub struct KeyValueAdjustmentRepo<S> {
    store: S,
    write_lock: Mutex<()>,
}

impl<S: KeyValueStore> KeyValueAdjustmentRepo<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn key(id: AdjustmentId) -> String {
        format!("{RECORD_PREFIX}{id}")
    }

    fn decode(raw: &str) -> Result<StockAdjustment, RepoError> {
        serde_json::from_str(raw).map_err(|e| RepoError::Serialization(e.to_string()))
    }

    fn encode(adjustment: &StockAdjustment) -> Result<String, RepoError> {
        serde_json::to_string(adjustment).map_err(|e| RepoError::Serialization(e.to_string()))
    }

    fn load(&self, id: AdjustmentId) -> Result<Option<StockAdjustment>, RepoError> {
        self.store
            .get(&Self::key(id))?
            .map(|raw| Self::decode(&raw))
            .transpose()
    }
}

impl<S: KeyValueStore> AdjustmentRepo for KeyValueAdjustmentRepo<S> {
    fn get(&self, id: AdjustmentId) -> Result<Option<StockAdjustment>, RepoError> {
        self.load(id)
    }

    fn insert(&self, adjustment: StockAdjustment) -> Result<(), RepoError> {
        let _guard = self.write_lock.lock().map_err(|_| RepoError::Poisoned)?;
        let id = adjustment.id_typed();
        if self.store.get(&Self::key(id))?.is_some() {
            return Err(RepoError::Duplicate(id.to_string()));
        }
        self.store.set(&Self::key(id), Self::encode(&adjustment)?)
    }

    fn update(&self, adjustment: StockAdjustment, expected: ExpectedVersion) -> Result<(), RepoError> {
        let _guard = self.write_lock.lock().map_err(|_| RepoError::Poisoned)?;
        let id = adjustment.id_typed();
        let current = self
            .load(id)?
            .ok_or_else(|| RepoError::NotFound(id.to_string()))?
            .version();

        if !expected.matches(current) {
            return Err(version_mismatch(expected, current));
        }
        self.store.set(&Self::key(id), Self::encode(&adjustment)?)
    }

    fn remove(&self, id: AdjustmentId, expected: ExpectedVersion) -> Result<StockAdjustment, RepoError> {
        let _guard = self.write_lock.lock().map_err(|_| RepoError::Poisoned)?;
        let existing = self
            .load(id)?
            .ok_or_else(|| RepoError::NotFound(id.to_string()))?;

        if !expected.matches(existing.version()) {
            return Err(version_mismatch(expected, existing.version()));
        }
        self.store.remove(&Self::key(id))?;
        Ok(existing)
    }

    fn list(&self) -> Result<Vec<StockAdjustment>, RepoError> {
        let mut out = Vec::new();
        for key in self.store.keys_with_prefix(RECORD_PREFIX)? {
            if let Some(raw) = self.store.get(&key)? {
                out.push(Self::decode(&raw)?);
            }
        }
        sort_by_creation(&mut out);
        Ok(out)
    }

    fn next_sequence(&self) -> Result<u64, RepoError> {
        let _guard = self.write_lock.lock().map_err(|_| RepoError::Poisoned)?;
        let current = match self.store.get(SEQUENCE_KEY)? {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map_err(|e| RepoError::Serialization(format!("sequence counter: {e}")))?,
            None => 0,
        };
        let next = current + 1;
        self.store.set(SEQUENCE_KEY, next.to_string())?;
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repo::in_memory::tests::sample_draft;

    fn repo() -> KeyValueAdjustmentRepo<Arc<InMemoryKeyValueStore>> {
        KeyValueAdjustmentRepo::new(Arc::new(InMemoryKeyValueStore::new()))
    }

    #[test]
    fn records_are_stored_as_json_under_prefixed_keys() {
        let repo = repo();
        let adj = sample_draft();
        repo.insert(adj.clone()).unwrap();

        let raw = repo
            .store()
            .get(&format!("stock_adjustments/{}", adj.id_typed()))
            .unwrap()
            .unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["status"], "draft");
        assert_eq!(json["totalValue"], "5.00");
        assert_eq!(repo.get(adj.id_typed()).unwrap(), Some(adj));
    }

    #[test]
    fn corrupt_record_surfaces_serialization_error() {
        let repo = repo();
        let id = AdjustmentId::new();
        repo.store()
            .set(&format!("stock_adjustments/{id}"), "{not json".to_string())
            .unwrap();

        assert!(matches!(repo.get(id), Err(RepoError::Serialization(_))));
        assert!(matches!(repo.list(), Err(RepoError::Serialization(_))));
    }

    #[test]
    fn sequence_counter_persists_in_store() {
        let repo = repo();
        assert_eq!(repo.next_sequence().unwrap(), 1);
        assert_eq!(repo.next_sequence().unwrap(), 2);
        assert_eq!(repo.store().get("stock_adjustments:sequence").unwrap().as_deref(), Some("2"));
    }

    #[test]
    fn remove_checks_version_and_deletes_key() {
        let repo = repo();
        let adj = sample_draft();
        let id = adj.id_typed();
        repo.insert(adj).unwrap();

        assert!(matches!(
            repo.remove(id, ExpectedVersion::Exact(3)),
            Err(RepoError::Concurrency(_))
        ));
        repo.remove(id, ExpectedVersion::Exact(0)).unwrap();
        assert!(repo.store().keys_with_prefix("stock_adjustments/").unwrap().is_empty());
    }
}
