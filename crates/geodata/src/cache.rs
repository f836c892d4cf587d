//! In-memory LRU cache for IBGE metadata responses.
//!
//! Entries are keyed by request URL and hold the decoded JSON body. Expiry
//! is lazy: an entry past its deadline is dropped the next time it is read.
//! Time comes from a [`Clock`] so tests can move it forward explicitly.

use lru::LruCache;
use serde_json::Value;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

/// Default number of cached responses.
pub const DEFAULT_CAPACITY: usize = 100;

/// Default time-to-live for a cached response.
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// Source of the current instant.
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

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    offset_millis: AtomicU64,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset_millis: AtomicU64::new(0),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.offset_millis
            .fetch_add(by.as_millis() as u64, Ordering::SeqCst);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + Duration::from_millis(self.offset_millis.load(Ordering::SeqCst))
    }
}

/// Capacity and TTL of a [`MetadataCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    pub capacity: usize,
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            ttl: DEFAULT_TTL,
        }
    }
}

struct CacheEntry {
    value: Value,
    expires_at: Instant,
}

/// Counters for the metadata cache.
///
/// All fields are atomic for lock-free reads from the metrics endpoint.
#[derive(Debug, Default)]
pub struct MetadataCacheStats {
    pub hits: AtomicU64,
    pub misses: AtomicU64,
    /// Entries dropped because their TTL had passed.
    pub expired: AtomicU64,
    /// Entries pushed out by LRU order at capacity.
    pub evictions: AtomicU64,
}

impl MetadataCacheStats {
    /// Hit rate as a percentage (0-100).
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        if total == 0 {
            0.0
        } else {
            (hits as f64 / total as f64) * 100.0
        }
    }
}

/// Bounded, TTL-aware cache of decoded JSON responses.
pub struct MetadataCache {
    entries: RwLock<LruCache<String, CacheEntry>>,
    ttl: Duration,
    capacity: usize,
    clock: Arc<dyn Clock>,
    stats: MetadataCacheStats,
}

impl MetadataCache {
    pub fn new(config: CacheConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: CacheConfig, clock: Arc<dyn Clock>) -> Self {
        let capacity = NonZeroUsize::new(config.capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: RwLock::new(LruCache::new(capacity)),
            ttl: config.ttl,
            capacity: capacity.get(),
            clock,
            stats: MetadataCacheStats::default(),
        }
    }

    /// Look up a response, dropping it if it has expired.
    pub async fn get(&self, key: &str) -> Option<Value> {
        let now = self.clock.now();
        // LRU reads reorder the list, so even lookups take the write lock.
        let mut entries = self.entries.write().await;

        let expired = match entries.get(key) {
            Some(entry) if now < entry.expires_at => {
                self.stats.hits.fetch_add(1, Ordering::Relaxed);
                return Some(entry.value.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            entries.pop(key);
            self.stats.expired.fetch_add(1, Ordering::Relaxed);
            debug!(key = %key, "Metadata cache entry expired");
        }
        self.stats.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Store a response, evicting the least recently used entry at capacity.
    pub async fn insert(&self, key: impl Into<String>, value: Value) {
        let key = key.into();
        let entry = CacheEntry {
            value,
            expires_at: self.clock.now() + self.ttl,
        };

        let mut entries = self.entries.write().await;
        if let Some((evicted_key, _)) = entries.push(key.clone(), entry) {
            if evicted_key != key {
                self.stats.evictions.fetch_add(1, Ordering::Relaxed);
                debug!(key = %evicted_key, "Metadata cache evicted LRU entry");
            }
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn stats(&self) -> &MetadataCacheStats {
        &self.stats
    }
}
