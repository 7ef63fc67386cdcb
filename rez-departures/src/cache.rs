//! In-memory TTL cache for upstream responses and travel-time estimates.
//!
//! Each entry carries its own time-to-live. Reading an expired entry removes
//! it and reports a miss, so correctness never depends on the background
//! sweep, which only reclaims memory.
//!
//! When the cache is full, inserting a new key first evicts the oldest fifth
//! of the entries (by insertion time).

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::trace;

/// Source of the current instant for expiry checks.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall clock backed by [`Instant::now`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to. Useful for exercising expiry.
#[derive(Debug, Clone)]
pub struct ManualClock {
    start: Instant,
    offset: Arc<Mutex<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            offset: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        let mut offset = self.offset.lock().unwrap_or_else(PoisonError::into_inner);
        *offset += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        let offset = self.offset.lock().unwrap_or_else(PoisonError::into_inner);
        self.start + *offset
    }
}

/// Configuration for a [`TtlCache`].
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of entries before eviction kicks in.
    pub max_size: usize,

    /// TTL used by [`TtlCache::insert`].
    pub default_ttl: Duration,

    /// Period of the background expiry sweep.
    pub sweep_interval: Duration,
}

impl CacheConfig {
    pub fn new(max_size: usize, default_ttl: Duration) -> Self {
        Self {
            max_size,
            default_ttl,
            ..Self::default()
        }
    }

    /// Set the sweep period.
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_size: 100,
            default_ttl: Duration::from_secs(30),
            sweep_interval: Duration::from_secs(60),
        }
    }
}

/// Snapshot of cache occupancy and hit counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub size: usize,
    pub max_size: usize,
    pub hits: u64,
    pub misses: u64,
}

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    stored_at: Instant,
    ttl: Duration,
}

impl<V> CacheEntry<V> {
    fn is_fresh(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.stored_at) < self.ttl
    }
}

/// Key/value store with per-entry expiry and bounded size.
///
/// All operations take a short internal lock and never suspend, so the cache
/// can be shared freely between concurrent fetches.
pub struct TtlCache<K, V> {
    entries: Mutex<HashMap<K, CacheEntry<V>>>,
    config: CacheConfig,
    clock: Arc<dyn Clock>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Create a cache driven by the system clock.
    pub fn new(config: CacheConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a cache driven by the given clock.
    pub fn with_clock(mut config: CacheConfig, clock: Arc<dyn Clock>) -> Self {
        config.max_size = config.max_size.max(1);
        Self {
            entries: Mutex::new(HashMap::new()),
            config,
            clock,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<K, CacheEntry<V>>> {
        // Entries are whole-value replacements, so a poisoned map is still consistent.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Look up a live entry. Expired entries are removed and count as a miss.
    pub fn get(&self, key: &K) -> Option<V> {
        let now = self.clock.now();
        let mut entries = self.lock();

        let fresh = match entries.get(key) {
            Some(entry) if entry.is_fresh(now) => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        };

        match fresh {
            Some(_) => self.hits.fetch_add(1, Ordering::Relaxed),
            None => self.misses.fetch_add(1, Ordering::Relaxed),
        };
        fresh
    }

    /// Store a value with an explicit TTL.
    pub fn set(&self, key: K, value: V, ttl: Duration) {
        let now = self.clock.now();
        let mut entries = self.lock();

        if !entries.contains_key(&key) && entries.len() >= self.config.max_size {
            let evicted = evict_oldest(&mut entries, self.config.max_size);
            trace!(evicted, max_size = self.config.max_size, "cache full, evicted oldest entries");
        }

        entries.insert(
            key,
            CacheEntry {
                value,
                stored_at: now,
                ttl,
            },
        );
    }

    /// Store a value with the configured default TTL.
    pub fn insert(&self, key: K, value: V) {
        self.set(key, value, self.config.default_ttl);
    }

    /// Whether a live entry exists. Expired entries are removed.
    pub fn has(&self, key: &K) -> bool {
        let now = self.clock.now();
        let mut entries = self.lock();
        match entries.get(key) {
            Some(entry) if entry.is_fresh(now) => true,
            Some(_) => {
                entries.remove(key);
                false
            }
            None => false,
        }
    }

    /// Remove an entry. Returns whether one was present.
    pub fn delete(&self, key: &K) -> bool {
        self.lock().remove(key).is_some()
    }

    /// Remove every entry.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Number of stored entries, including ones that expired but were not yet swept.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, entry| entry.is_fresh(now));
        before - entries.len()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            size: self.len(),
            max_size: self.config.max_size,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Spawn the periodic expiry sweep.
    ///
    /// The task holds only a weak reference and stops once the cache is dropped.
    pub fn spawn_sweeper(self: &Arc<Self>) -> JoinHandle<()> {
        let cache = Arc::downgrade(self);
        let period = self.config.sweep_interval;

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.tick().await; // First tick is immediate, skip it
            loop {
                interval.tick().await;
                let Some(cache) = cache.upgrade() else {
                    break;
                };
                let purged = cache.purge_expired();
                if purged > 0 {
                    trace!(purged, "swept expired cache entries");
                }
            }
        })
    }
}

/// Remove the oldest 20% (rounded up) of `max_size` entries.
fn evict_oldest<K, V>(entries: &mut HashMap<K, CacheEntry<V>>, max_size: usize) -> usize
where
    K: Eq + Hash + Clone,
{
    let to_remove = max_size.div_ceil(5);

    let mut by_age: Vec<(K, Instant)> = entries
        .iter()
        .map(|(key, entry)| (key.clone(), entry.stored_at))
        .collect();
    by_age.sort_by_key(|(_, stored_at)| *stored_at);

    let mut removed = 0;
    for (key, _) in by_age.into_iter().take(to_remove) {
        if entries.remove(&key).is_some() {
            removed += 1;
        }
    }
    removed
}
