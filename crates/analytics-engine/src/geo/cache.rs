//! Process-wide memo of lookup outcomes, keyed by normalized CEP or CNPJ.
//!
//! Entries are written once and never evicted: a key that failed once is
//! never retried within the process lifetime, which is what keeps the
//! external call volume bounded across aggregation runs.

use std::collections::HashMap;
use std::sync::Mutex;

/// Outcome of one resolution attempt. `Unresolvable` is an explicit
/// negative: not found, wrong region, or the collaborator errored.
#[derive(Debug, Clone, PartialEq)]
pub enum GeoCacheEntry {
    Resolved {
        latitude: f64,
        longitude: f64,
        city: String,
        state: String,
    },
    Unresolvable,
}

#[derive(Debug, Default)]
pub struct GeoCache {
    entries: Mutex<HashMap<String, GeoCacheEntry>>,
}

impl GeoCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<GeoCacheEntry> {
        self.lock().get(key).cloned()
    }

    pub fn has(&self, key: &str) -> bool {
        self.lock().contains_key(key)
    }

    /// First write wins; later puts for the same key are ignored.
    pub fn put(&self, key: &str, entry: GeoCacheEntry) {
        self.lock().entry(key.to_string()).or_insert(entry);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, GeoCacheEntry>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
