//! In-memory LRU cache with TTL expiry, memory bounds, and
//! stale-while-revalidate reads.
//!
//! The ordered map is `lru::LruCache` (O(1) move-to-front) constructed
//! unbounded; entry-count and memory limits are enforced here, before an
//! insert completes, so every eviction passes through the same accounting.
//! Expired entries are not removed eagerly — a read either deletes them
//! (plain `get`) or serves them stale while a detached refresh runs
//! (`get_or_revalidate`). A periodic `cleanup` sweep handles entries nothing
//! reads anymore.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use lru::LruCache;
use parking_lot::Mutex;
use serde::Serialize;

struct Entry<V> {
    value: V,
    created_at: Instant,
    ttl: Duration,
    size_bytes: usize,
}

impl<V> Entry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.created_at) > self.ttl
    }
}

#[derive(Default)]
struct Counters {
    hits: u64,
    misses: u64,
    stale_hits: u64,
    evictions: u64,
    expirations: u64,
}

struct Inner<V> {
    entries: LruCache<String, Entry<V>>,
    memory_bytes: usize,
    /// Keys with a background refresh in flight; guarantees exactly one
    /// refresh per key no matter how many readers see the entry stale.
    refreshing: HashSet<String>,
    counters: Counters,
}

/// Point-in-time cache statistics for the admin surface
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub stale_hits: u64,
    pub evictions: u64,
    pub expirations: u64,
    pub entries: usize,
    pub memory_bytes: usize,
    pub hit_rate: f64,
}

/// LRU + TTL cache with stale-while-revalidate reads
pub struct SwrCache<V> {
    inner: Arc<Mutex<Inner<V>>>,
    max_entries: usize,
    max_memory_bytes: usize,
    default_ttl: Duration,
}

impl<V> Clone for SwrCache<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            max_entries: self.max_entries,
            max_memory_bytes: self.max_memory_bytes,
            default_ttl: self.default_ttl,
        }
    }
}

impl<V> SwrCache<V>
where
    V: Clone + Serialize + Send + Sync + 'static,
{
    pub fn new(max_entries: usize, max_memory_bytes: usize, default_ttl: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                entries: LruCache::unbounded(),
                memory_bytes: 0,
                refreshing: HashSet::new(),
                counters: Counters::default(),
            })),
            max_entries: max_entries.max(1),
            max_memory_bytes,
            default_ttl,
        }
    }

    /// Serialized-size approximation of a value. Estimation failure is not an
    /// error; such values are accounted at zero cost.
    fn estimate_size(value: &V) -> usize {
        serde_json::to_vec(value).map(|b| b.len()).unwrap_or(0)
    }

    /// Pure TTL read. A fresh hit promotes the entry to MRU; an expired
    /// entry is deleted and reported as a miss.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        let mut guard = self.inner.lock();
        let inner = &mut *guard;

        let expired = match inner.entries.get(key) {
            Some(entry) if !entry.is_expired(now) => {
                inner.counters.hits += 1;
                return Some(entry.value.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            if let Some(entry) = inner.entries.pop(key) {
                inner.memory_bytes -= entry.size_bytes;
                inner.counters.expirations += 1;
            }
        }
        inner.counters.misses += 1;
        None
    }

    /// Stale-while-revalidate read.
    ///
    /// Missing: runs `factory` inline, stores a `Some` result, returns it.
    /// Stale: returns the stale value immediately and spawns one detached
    /// refresh; refresh failures (`factory` yielding `None`) are logged and
    /// leave the stale entry in place for the next reader.
    pub async fn get_or_revalidate<F, Fut>(&self, key: &str, factory: F) -> Option<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Option<V>> + Send + 'static,
    {
        let now = Instant::now();
        enum ReadState<V> {
            Fresh(V),
            Stale(V, bool),
            Missing,
        }

        let state = {
            let mut guard = self.inner.lock();
            let inner = &mut *guard;
            match inner.entries.get(key) {
                Some(entry) if !entry.is_expired(now) => {
                    inner.counters.hits += 1;
                    ReadState::Fresh(entry.value.clone())
                }
                Some(entry) => {
                    let value = entry.value.clone();
                    inner.counters.stale_hits += 1;
                    let claimed = inner.refreshing.insert(key.to_string());
                    ReadState::Stale(value, claimed)
                }
                None => {
                    inner.counters.misses += 1;
                    ReadState::Missing
                }
            }
        };

        match state {
            ReadState::Fresh(value) => Some(value),
            ReadState::Stale(value, claimed) => {
                if claimed {
                    self.spawn_refresh(key.to_string(), factory());
                }
                Some(value)
            }
            ReadState::Missing => {
                let value = factory().await?;
                self.set(key, value.clone());
                Some(value)
            }
        }
    }

    fn spawn_refresh(&self, key: String, fut: impl Future<Output = Option<V>> + Send + 'static) {
        let cache = self.clone();
        tokio::spawn(async move {
            let result = fut.await;
            match result {
                Some(value) => {
                    cache.set(&key, value);
                    tracing::debug!(key = %key, "Cache entry revalidated");
                }
                None => {
                    tracing::warn!(key = %key, "Cache revalidation produced no value");
                }
            }
            cache.inner.lock().refreshing.remove(&key);
        });
    }

    /// Inserts with the default TTL
    pub fn set(&self, key: &str, value: V) {
        self.set_with_ttl(key, value, self.default_ttl);
    }

    /// Inserts with an explicit TTL, evicting LRU-oldest entries until both
    /// the entry-count and memory bounds hold
    pub fn set_with_ttl(&self, key: &str, value: V, ttl: Duration) {
        let size_bytes = Self::estimate_size(&value);
        let mut inner = self.inner.lock();

        // Replacing a key must release its old size before the new size is
        // added, or the accounting drifts
        if let Some(old) = inner.entries.pop(key) {
            inner.memory_bytes -= old.size_bytes;
        }

        while inner.entries.len() >= self.max_entries
            || (!inner.entries.is_empty()
                && inner.memory_bytes + size_bytes > self.max_memory_bytes)
        {
            match inner.entries.pop_lru() {
                Some((evicted_key, evicted)) => {
                    inner.memory_bytes -= evicted.size_bytes;
                    inner.counters.evictions += 1;
                    tracing::trace!(key = %evicted_key, "Evicted LRU cache entry");
                }
                None => break,
            }
        }

        inner.memory_bytes += size_bytes;
        inner.entries.put(
            key.to_string(),
            Entry {
                value,
                created_at: Instant::now(),
                ttl,
                size_bytes,
            },
        );
    }

    /// Removes one entry. Returns whether it was present.
    pub fn delete(&self, key: &str) -> bool {
        let mut inner = self.inner.lock();
        match inner.entries.pop(key) {
            Some(entry) => {
                inner.memory_bytes -= entry.size_bytes;
                true
            }
            None => false,
        }
    }

    /// True only for entries that are present and not expired. Does not
    /// promote.
    pub fn has(&self, key: &str) -> bool {
        let now = Instant::now();
        let inner = self.inner.lock();
        inner
            .entries
            .peek(key)
            .map(|entry| !entry.is_expired(now))
            .unwrap_or(false)
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.memory_bytes = 0;
    }

    /// Idempotent sweep of expired entries. Runs from a periodic task, never
    /// on the hot path.
    pub fn cleanup(&self) -> usize {
        let now = Instant::now();
        let mut inner = self.inner.lock();

        let expired: Vec<String> = inner
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            if let Some(entry) = inner.entries.pop(key) {
                inner.memory_bytes -= entry.size_bytes;
                inner.counters.expirations += 1;
            }
        }

        if !expired.is_empty() {
            tracing::debug!(removed = expired.len(), "Cache cleanup sweep");
        }
        expired.len()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        let c = &inner.counters;
        let lookups = c.hits + c.stale_hits + c.misses;
        let hit_rate = if lookups == 0 {
            0.0
        } else {
            (c.hits + c.stale_hits) as f64 / lookups as f64
        };
        CacheStats {
            hits: c.hits,
            misses: c.misses,
            stale_hits: c.stale_hits,
            evictions: c.evictions,
            expirations: c.expirations,
            entries: inner.entries.len(),
            memory_bytes: inner.memory_bytes,
            hit_rate,
        }
    }
}
