//! Expiring key/value cache used by the geo proxy.
//!
//! Storage sits behind [`CacheStore`] so the in-memory map can be replaced by
//! a persistent backend without touching [`TtlCache`] callers.

use chrono::{Duration, NaiveDateTime};
use log::debug;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, RwLock};

use crate::clock::Clock;

pub const DEFAULT_TTL_HOURS: i64 = 24;

#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<V> {
    pub key: String,
    pub value: V,
    pub expires_at: NaiveDateTime,
}

impl<V> CacheEntry<V> {
    pub fn is_live(&self, now: NaiveDateTime) -> bool {
        now < self.expires_at
    }
}

pub trait CacheStore<V>: Send + Sync {
    /// Live entry for `key` at `now`, if any.
    fn get(&self, key: &str, now: NaiveDateTime) -> Option<V>;
    /// Store `entry`, dropping anything no longer live at `now`.
    fn put(&self, entry: CacheEntry<V>, now: NaiveDateTime);
    fn len(&self) -> usize;
}

pub struct MemoryStore<V> {
    entries: RwLock<HashMap<String, CacheEntry<V>>>,
}

impl<V> Default for MemoryStore<V> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl<V: Clone + Send + Sync> CacheStore<V> for MemoryStore<V> {
    fn get(&self, key: &str, now: NaiveDateTime) -> Option<V> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries
            .get(key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.value.clone())
    }

    fn put(&self, entry: CacheEntry<V>, now: NaiveDateTime) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.retain(|_, existing| existing.is_live(now));
        entries.insert(entry.key.clone(), entry);
    }

    fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }
}

pub struct TtlCache<V> {
    store: Arc<dyn CacheStore<V>>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl<V: Clone + Send + Sync + 'static> TtlCache<V> {
    pub fn in_memory(clock: Arc<dyn Clock>) -> Self {
        Self::new(Arc::new(MemoryStore::default()), clock)
    }

    pub fn new(store: Arc<dyn CacheStore<V>>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            ttl: Duration::hours(DEFAULT_TTL_HOURS),
        }
    }

    /// Return the live value for `key`, or run `fetch` and remember its result.
    ///
    /// Errors from `fetch` are returned as-is and leave the cache untouched.
    /// Two callers missing on the same key at once will both fetch.
    pub async fn get_or_fetch<F, Fut, E>(&self, key: &str, fetch: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(hit) = self.store.get(key, self.clock.now()) {
            debug!("cache hit: {}", key);
            return Ok(hit);
        }

        debug!("cache miss: {}", key);
        let value = fetch().await?;
        let now = self.clock.now();
        self.store.put(
            CacheEntry {
                key: key.to_string(),
                value: value.clone(),
                expires_at: now + self.ttl,
            },
            now,
        );
        Ok(value)
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
