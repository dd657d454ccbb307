//! Key to shared-result cache with age expiry and a size bound.

use chrono::{DateTime, Utc};
use regex::Regex;
use std::collections::HashMap;
use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use super::clock::{Clock, SystemClock};
use super::shared::SharedResult;

/// Per-call cache settings.
///
/// Both limits are optional: without `max_age` entries never expire, without
/// `max_size` the cache is unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheConfig {
    pub max_age: Option<Duration>,
    pub max_size: Option<NonZeroUsize>,
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = Some(max_age);
        self
    }

    /// Bound the number of entries. Zero means unbounded.
    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = NonZeroUsize::new(max_size);
        self
    }
}

/// Statistics about cache usage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub entry_count: u64,
}

impl CacheStats {
    /// Calculate the hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

struct CacheEntry<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    payload: SharedResult<T, E>,
    created_at: DateTime<Utc>,
    /// Insertion order; breaks timestamp ties during eviction.
    seq: u64,
}

impl<T, E> CacheEntry<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    fn is_fresh(&self, now: DateTime<Utc>, max_age: Option<Duration>) -> bool {
        let Some(max_age) = max_age else {
            return true;
        };
        let age = now
            .signed_duration_since(self.created_at)
            .to_std()
            .unwrap_or(Duration::ZERO);
        age < max_age
    }
}

struct CacheState<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    entries: HashMap<String, CacheEntry<T, E>>,
    next_seq: u64,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl<T, E> CacheState<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    fn evict_oldest(&mut self) -> Option<String> {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| (entry.created_at, entry.seq))
            .map(|(key, _)| key.clone())?;
        self.entries.remove(&oldest);
        self.evictions += 1;
        Some(oldest)
    }
}

/// Memoizes idempotent reads by key.
///
/// Holds at most one entry per key. A lookup that finds a fresh entry hands
/// back that entry's [`SharedResult`] without running the producer; otherwise
/// the producer runs once, its future is wrapped for replay, and the wrapper
/// replaces whatever was stored. An entry whose result has settled as an
/// error is treated as absent so failures are retried on the next lookup.
///
/// One instance is meant to be created at startup and shared by reference
/// (usually behind an `Arc`) with every component that reads through it.
pub struct ResponseCache<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    state: Mutex<CacheState<T, E>>,
    clock: Arc<dyn Clock>,
}

impl<T, E> ResponseCache<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(CacheState {
                entries: HashMap::new(),
                next_seq: 0,
                hits: 0,
                misses: 0,
                evictions: 0,
            }),
            clock,
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheState<T, E>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Return the stored result for `key`, or run `producer` and store its
    /// result.
    ///
    /// The returned handle is available immediately; the producer's future
    /// runs when the handle (or any clone of it) is first polled. `producer`
    /// is called while the cache is locked and must not call back into it.
    pub fn get<F, Fut>(&self, key: &str, producer: F, config: &CacheConfig) -> SharedResult<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let now = self.clock.now();
        let mut state = self.lock();

        if let Some(entry) = state.entries.get(key) {
            if entry.is_fresh(now, config.max_age) && !entry.payload.is_failed() {
                let payload = entry.payload.clone();
                state.hits += 1;
                tracing::debug!(key, "Cache hit");
                return payload;
            }
        }

        state.misses += 1;
        let payload = SharedResult::new(producer());
        let seq = state.next_seq;
        state.next_seq += 1;
        state.entries.insert(
            key.to_string(),
            CacheEntry {
                payload: payload.clone(),
                created_at: now,
                seq,
            },
        );
        tracing::debug!(key, "Cache miss, stored new entry");

        if let Some(max_size) = config.max_size {
            if state.entries.len() > max_size.get() {
                if let Some(evicted) = state.evict_oldest() {
                    tracing::debug!(
                        key = %evicted,
                        max_size = max_size.get(),
                        "Evicted oldest cache entry"
                    );
                }
            }
        }

        payload
    }

    /// Whether an entry exists for `key`, fresh or not.
    pub fn has(&self, key: &str) -> bool {
        self.lock().entries.contains_key(key)
    }

    /// Remove the entry for `key`. Returns whether one existed.
    pub fn invalidate(&self, key: &str) -> bool {
        let removed = self.lock().entries.remove(key).is_some();
        if removed {
            tracing::debug!(key, "Invalidated cache entry");
        }
        removed
    }

    /// Remove every entry whose key satisfies `matcher`. Returns the count removed.
    pub fn invalidate_matching<M>(&self, matcher: M) -> usize
    where
        M: Fn(&str) -> bool,
    {
        let mut state = self.lock();
        let before = state.entries.len();
        state.entries.retain(|key, _| !matcher(key));
        let removed = before - state.entries.len();
        tracing::debug!(removed, "Invalidated matching cache entries");
        removed
    }

    /// Remove every entry whose key matches `pattern`.
    pub fn invalidate_pattern(&self, pattern: &Regex) -> usize {
        self.invalidate_matching(|key| pattern.is_match(key))
    }

    pub fn clear(&self) {
        self.lock().entries.clear();
    }

    pub fn size(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> Vec<String> {
        let state = self.lock();
        let mut keyed: Vec<(u64, &String)> = state
            .entries
            .iter()
            .map(|(key, entry)| (entry.seq, key))
            .collect();
        keyed.sort_by_key(|(seq, _)| *seq);
        keyed.into_iter().map(|(_, key)| key.clone()).collect()
    }

    pub fn stats(&self) -> CacheStats {
        let state = self.lock();
        CacheStats {
            hits: state.hits,
            misses: state.misses,
            evictions: state.evictions,
            entry_count: state.entries.len() as u64,
        }
    }
}

impl<T, E> Default for ResponseCache<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> std::fmt::Debug for ResponseCache<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseCache")
            .field("stats", &self.stats())
            .finish()
    }
}
