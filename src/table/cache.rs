// src/table/cache.rs
//! Memoization of the normalized table, keyed by source identity.
//!
//! Explicit, injectable object rather than ambient global state: the pipeline
//! stays referentially transparent and the cache can be exercised directly in
//! tests. `invalidate` is wired to the dashboard "refresh" action.

use std::sync::{Arc, RwLock};

use crate::table::types::NormalizedTable;

/// HIT/MISS outcome of a cached load, exposed to callers for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    Hit,
    Miss,
}

impl CacheOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheOutcome::Hit => "HIT",
            CacheOutcome::Miss => "MISS",
        }
    }
}

#[derive(Debug)]
struct Slot {
    key: String,
    table: Arc<NormalizedTable>,
}

/// Single-slot cache: one backing source per process, so one entry suffices.
/// A changed fingerprint simply replaces the previous table.
#[derive(Debug, Default)]
pub struct TableCache {
    slot: RwLock<Option<Slot>>,
}

impl TableCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the table memoized under `key`.
    pub fn get(&self, key: &str) -> Option<Arc<NormalizedTable>> {
        let guard = self.slot.read().expect("table cache lock poisoned");
        guard
            .as_ref()
            .filter(|s| s.key == key)
            .map(|s| Arc::clone(&s.table))
    }

    /// Store `table` under `key`, replacing whatever was memoized before.
    pub fn put(&self, key: String, table: NormalizedTable) -> Arc<NormalizedTable> {
        let table = Arc::new(table);
        let mut guard = self.slot.write().expect("table cache lock poisoned");
        *guard = Some(Slot {
            key,
            table: Arc::clone(&table),
        });
        table
    }

    /// Drop the memoized table; the next load re-reads the backing source.
    pub fn invalidate(&self) {
        let mut guard = self.slot.write().expect("table cache lock poisoned");
        *guard = None;
    }
}
