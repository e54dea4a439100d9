//! Read-through TTL cache over a data provider.
//!
//! Keyed by `(symbol, start, end)`. Entries older than the TTL are refetched,
//! never served. Concurrent lookups of the same key share a single in-flight
//! fetch. Failures are handed to whoever was waiting on that fetch and then
//! evicted, so the next lookup retries.

use super::provider::{DataError, DataProvider, FetchResult};
use crate::domain::Symbol;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};
use std::time::{Duration, Instant};

/// Default freshness window: 30 minutes.
pub const DEFAULT_TTL: Duration = Duration::from_secs(30 * 60);

type CacheKey = (Symbol, NaiveDate, NaiveDate);

#[derive(Debug)]
struct Entry {
    fetched_at: Instant,
    result: Result<FetchResult, DataError>,
}

/// One cache slot. The `OnceLock` is the in-flight marker: every caller that
/// grabbed this slot blocks on the same initialization.
#[derive(Debug, Default)]
struct Slot {
    cell: OnceLock<Entry>,
}

impl Slot {
    fn is_stale(&self, ttl: Duration) -> bool {
        match self.cell.get() {
            // in flight
            None => false,
            Some(entry) => entry.result.is_err() || entry.fetched_at.elapsed() >= ttl,
        }
    }
}

/// A `DataProvider` that memoizes another one.
pub struct CachedProvider<P> {
    inner: P,
    ttl: Duration,
    slots: Mutex<HashMap<CacheKey, Arc<Slot>>>,
}

impl<P: DataProvider> CachedProvider<P> {
    pub fn new(inner: P) -> Self {
        Self::with_ttl(inner, DEFAULT_TTL)
    }

    pub fn with_ttl(inner: P, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    /// Number of keys currently held, fresh or not.
    pub fn len(&self) -> usize {
        self.lock_slots().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.lock_slots().clear();
    }

    fn lock_slots(&self) -> std::sync::MutexGuard<'_, HashMap<CacheKey, Arc<Slot>>> {
        // A panic while holding the lock cannot leave the map half-updated,
        // so a poisoned lock is still usable.
        self.slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Find the live slot for `key`, replacing a stale one. Stale slots for
    /// other keys are dropped on the way.
    fn slot_for(&self, key: &CacheKey) -> Arc<Slot> {
        let mut slots = self.lock_slots();
        slots.retain(|k, slot| k == key || !slot.is_stale(self.ttl));
        match slots.get(key) {
            Some(slot) if !slot.is_stale(self.ttl) => Arc::clone(slot),
            _ => {
                let slot = Arc::new(Slot::default());
                slots.insert(key.clone(), Arc::clone(&slot));
                slot
            }
        }
    }

    fn evict(&self, key: &CacheKey, slot: &Arc<Slot>) {
        let mut slots = self.lock_slots();
        if slots.get(key).is_some_and(|current| Arc::ptr_eq(current, slot)) {
            slots.remove(key);
        }
    }
}

impl<P: DataProvider> DataProvider for CachedProvider<P> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn fetch(
        &self,
        symbol: &Symbol,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<FetchResult, DataError> {
        let key = (symbol.clone(), start, end);
        let slot = self.slot_for(&key);

        if slot.cell.get().is_some() {
            tracing::debug!(%symbol, %start, %end, "cache hit");
        }

        let entry = slot.cell.get_or_init(|| {
            tracing::debug!(%symbol, %start, %end, provider = self.inner.name(), "cache miss");
            Entry {
                result: self.inner.fetch(symbol, start, end),
                fetched_at: Instant::now(),
            }
        });

        if entry.result.is_err() {
            self.evict(&key, &slot);
        }
        entry.result.clone()
    }
}
