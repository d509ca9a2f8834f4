//! Write-back document cache over a key/value storage backend.
//!
//! All persisted records flow through one cache per record kind. Reads after
//! first load are memory-only; writes replace the cached record, mark it
//! dirty and arm a single debounced flush deadline. Storage failures keep the
//! record dirty so the next flush cycle retries.

use std::collections::{HashMap, HashSet};

use log::warn;
use serde::de::DeserializeOwned;
use serde::Serialize;

use tycoon_logic::config::SAVE_DEBOUNCE_MS;

use crate::errors::StorageError;

/// Key/value storage backend for JSON documents. Implementations are
/// expected to be durable; the engine only ever sees them through the cache.
pub trait KvBackend {
    fn load(&self, key: &str) -> Result<Option<serde_json::Value>, StorageError>;
    fn save(&mut self, key: &str, value: &serde_json::Value) -> Result<(), StorageError>;
}

/// In-memory backend for tests and headless runs.
#[derive(Debug, Default)]
pub struct MemoryKv {
    docs: HashMap<String, serde_json::Value>,
    /// When set, every save fails. Used to exercise the retry path.
    pub fail_saves: bool,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn doc(&self, key: &str) -> Option<&serde_json::Value> {
        self.docs.get(key)
    }

    pub fn insert_doc(&mut self, key: &str, value: serde_json::Value) {
        self.docs.insert(key.to_string(), value);
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}

impl KvBackend for MemoryKv {
    fn load(&self, key: &str) -> Result<Option<serde_json::Value>, StorageError> {
        Ok(self.docs.get(key).cloned())
    }

    fn save(&mut self, key: &str, value: &serde_json::Value) -> Result<(), StorageError> {
        if self.fail_saves {
            return Err(StorageError::Backend("save rejected".to_string()));
        }
        self.docs.insert(key.to_string(), value.clone());
        Ok(())
    }
}

/// A record kind the cache knows how to decode and stamp.
pub trait Document: Serialize + DeserializeOwned + Clone {
    /// Decode a stored document, tolerating missing fields and older schema
    /// versions. Must never fail; unrecognizable input decodes to defaults.
    fn migrate(value: serde_json::Value) -> Self;

    /// Stamp schema version and update time before the record is cached.
    fn stamp(&mut self, now: u64);
}

/// Write-back cache for one document kind.
pub struct WriteBackCache<D: Document> {
    records: HashMap<String, D>,
    dirty: HashSet<String>,
    flush_deadline: Option<u64>,
}

impl<D: Document> Default for WriteBackCache<D> {
    fn default() -> Self {
        Self {
            records: HashMap::new(),
            dirty: HashSet::new(),
            flush_deadline: None,
        }
    }
}

impl<D: Document> WriteBackCache<D> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached record, if loaded.
    pub fn get(&self, key: &str) -> Option<&D> {
        self.records.get(key)
    }

    /// Record for `key`, loading from the backend on first touch. A load
    /// failure or missing document falls back to `default_fn`; fresh
    /// defaults are marked dirty so they reach storage.
    pub fn ensure_with<B, F>(&mut self, backend: &B, key: &str, now: u64, default_fn: F) -> &D
    where
        B: KvBackend,
        F: FnOnce() -> D,
    {
        if !self.records.contains_key(key) {
            let loaded = match backend.load(key) {
                Ok(Some(value)) => Some(D::migrate(value)),
                Ok(None) => None,
                Err(e) => {
                    warn!("load failed for {key}, using defaults: {e}");
                    None
                }
            };
            match loaded {
                Some(record) => {
                    self.records.insert(key.to_string(), record);
                }
                None => {
                    let mut record = default_fn();
                    record.stamp(now);
                    self.records.insert(key.to_string(), record);
                    self.mark_dirty(key, now);
                }
            }
        }
        &self.records[key]
    }

    /// Replace the cached record and schedule a flush. The only mutation
    /// path: whole-record replacement.
    pub fn write(&mut self, key: &str, mut record: D, now: u64) {
        record.stamp(now);
        self.records.insert(key.to_string(), record);
        self.mark_dirty(key, now);
    }

    fn mark_dirty(&mut self, key: &str, now: u64) {
        self.dirty.insert(key.to_string());
        // Arm-if-absent: bursts of writes coalesce into one flush.
        if self.flush_deadline.is_none() {
            self.flush_deadline = Some(now + SAVE_DEBOUNCE_MS);
        }
    }

    pub fn dirty_count(&self) -> usize {
        self.dirty.len()
    }

    /// All cached records with their storage keys.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &D)> {
        self.records.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn flush_deadline(&self) -> Option<u64> {
        self.flush_deadline
    }

    /// Flush dirty records if the debounce deadline has passed. Failed saves
    /// stay dirty and the deadline is re-armed for another attempt.
    pub fn flush_due<B: KvBackend>(&mut self, backend: &mut B, now: u64) {
        match self.flush_deadline {
            Some(deadline) if now >= deadline => self.flush(backend, now),
            _ => {}
        }
    }

    /// Flush all dirty records immediately (shutdown path).
    pub fn flush_all<B: KvBackend>(&mut self, backend: &mut B, now: u64) {
        self.flush(backend, now);
    }

    fn flush<B: KvBackend>(&mut self, backend: &mut B, now: u64) {
        self.flush_deadline = None;
        let keys: Vec<String> = self.dirty.drain().collect();
        for key in keys {
            let Some(record) = self.records.get(&key) else {
                continue;
            };
            let result = serde_json::to_value(record)
                .map_err(StorageError::from)
                .and_then(|value| backend.save(&key, &value));
            if let Err(e) = result {
                warn!("flush failed for {key}, will retry: {e}");
                self.dirty.insert(key);
                if self.flush_deadline.is_none() {
                    self.flush_deadline = Some(now + SAVE_DEBOUNCE_MS);
                }
            }
        }
    }
}
