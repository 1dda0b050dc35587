//! In-memory TTL cache for name resolutions.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use parking_lot::{RwLock, RwLockUpgradableReadGuard};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use worm_core::constants::{DEFAULT_CACHE_MAX_ENTRIES, DEFAULT_CACHE_TTL_SECONDS};
use worm_core::types::{normalize_name, Endpoint, Resolution, TransportKind};

use crate::clock::{Clock, SystemClock};

/// A cached resolution.
///
/// Entries are immutable once stored; a refresh replaces the whole entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheEntry {
    /// Normalized symbolic name
    pub name: String,
    /// Resolved endpoint
    pub endpoint: Endpoint,
    /// Resolved transport kind
    pub transport: TransportKind,
    /// Monotonic insertion time, used for expiry
    pub inserted_at: Instant,
    /// Wall-clock insertion time, for display only
    pub resolved_at: DateTime<Utc>,
    /// Validity window
    pub ttl: Duration,
}

impl CacheEntry {
    /// An entry is valid iff strictly less than `ttl` has passed since insertion.
    pub fn is_valid_at(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.inserted_at) < self.ttl
    }

    /// Time left before the entry expires, zero if it already has.
    pub fn remaining_at(&self, now: Instant) -> Duration {
        self.ttl
            .saturating_sub(now.saturating_duration_since(self.inserted_at))
    }

    /// The resolution this entry holds.
    pub fn resolution(&self) -> Resolution {
        Resolution {
            endpoint: self.endpoint.clone(),
            transport: self.transport.clone(),
        }
    }
}

/// Cache configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of entries
    pub max_entries: usize,
    /// Default TTL in seconds
    pub default_ttl_seconds: u64,
    /// Whether to sweep expired entries before evicting at capacity
    pub auto_cleanup: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_CACHE_MAX_ENTRIES,
            default_ttl_seconds: DEFAULT_CACHE_TTL_SECONDS,
            auto_cleanup: true,
        }
    }
}

impl CacheConfig {
    /// Default TTL as a [`Duration`].
    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_seconds)
    }
}

/// In-memory cache mapping symbolic names to resolutions.
///
/// Thread-safe; every read that finds an expired entry removes it under the
/// same lock acquisition, so a lookup never returns stale data and no two
/// callers can race on the same eviction.
#[derive(Debug)]
pub struct ResolutionCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    config: CacheConfig,
    clock: Arc<dyn Clock>,
    hits: AtomicU64,
    misses: AtomicU64,
    expirations: AtomicU64,
    evictions: AtomicU64,
}

impl ResolutionCache {
    /// Creates a new cache with default configuration.
    pub fn new() -> Self {
        Self::with_config(CacheConfig::default())
    }

    /// Creates a cache with custom configuration.
    pub fn with_config(config: CacheConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Creates a cache reading time from `clock`.
    pub fn with_clock(config: CacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::with_capacity(config.max_entries.min(1024))),
            config,
            clock,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            expirations: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Returns the configuration in use.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Gets a valid entry by name.
    ///
    /// Returns None if not cached or expired; an expired entry is evicted.
    pub fn get(&self, name: &str) -> Option<CacheEntry> {
        let key = normalize_name(name);
        let now = self.clock.now();

        let entries = self.entries.upgradable_read();
        let found = entries
            .get(&key)
            .map(|entry| entry.is_valid_at(now).then(|| entry.clone()));

        match found {
            Some(Some(entry)) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry)
            }
            Some(None) => {
                let mut entries = RwLockUpgradableReadGuard::upgrade(entries);
                entries.remove(&key);
                self.expirations.fetch_add(1, Ordering::Relaxed);
                self.misses.fetch_add(1, Ordering::Relaxed);
                debug!(name = %key, "Evicted expired resolution");
                None
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Caches a resolution with the default TTL, replacing any previous one.
    pub fn put(&self, name: &str, resolution: Resolution) -> CacheEntry {
        self.put_with_ttl(name, resolution, self.config.default_ttl())
    }

    /// Caches a resolution with a custom TTL.
    pub fn put_with_ttl(&self, name: &str, resolution: Resolution, ttl: Duration) -> CacheEntry {
        let key = normalize_name(name);
        let now = self.clock.now();
        let entry = CacheEntry {
            name: key.clone(),
            endpoint: resolution.endpoint,
            transport: resolution.transport,
            inserted_at: now,
            resolved_at: Utc::now(),
            ttl,
        };

        let mut entries = self.entries.write();

        if !entries.contains_key(&key) && entries.len() >= self.config.max_entries {
            if self.config.auto_cleanup {
                self.sweep(&mut entries, now);
            }

            // Still at capacity? Remove oldest entry
            if entries.len() >= self.config.max_entries {
                if let Some(oldest_key) = entries
                    .iter()
                    .min_by_key(|(_, e)| e.inserted_at)
                    .map(|(k, _)| k.clone())
                {
                    entries.remove(&oldest_key);
                    self.evictions.fetch_add(1, Ordering::Relaxed);
                    debug!(name = %oldest_key, "Evicted oldest resolution at capacity");
                }
            }
        }

        trace!(name = %key, endpoint = %entry.endpoint, transport = %entry.transport, "Cached resolution");
        entries.insert(key, entry.clone());
        entry
    }

    /// Removes a cached entry. Returns true if one was present.
    pub fn invalidate(&self, name: &str) -> bool {
        let key = normalize_name(name);
        self.entries.write().remove(&key).is_some()
    }

    /// Clears all cached entries.
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Removes all expired entries and returns how many were dropped.
    pub fn cleanup_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.write();
        self.sweep(&mut entries, now)
    }

    fn sweep(&self, entries: &mut HashMap<String, CacheEntry>, now: Instant) -> usize {
        let before = entries.len();
        entries.retain(|_, entry| entry.is_valid_at(now));
        let removed = before - entries.len();
        if removed > 0 {
            self.expirations.fetch_add(removed as u64, Ordering::Relaxed);
        }
        removed
    }

    /// Returns a snapshot of all valid entries, sorted by name.
    pub fn entries(&self) -> Vec<CacheEntry> {
        let now = self.clock.now();
        let mut valid: Vec<CacheEntry> = self
            .entries
            .read()
            .values()
            .filter(|e| e.is_valid_at(now))
            .cloned()
            .collect();
        valid.sort_by(|a, b| a.name.cmp(&b.name));
        valid
    }

    /// Returns the number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Returns true if an entry, valid or not, is stored for `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.read().contains_key(&normalize_name(name))
    }

    /// Returns the current instant according to the cache's clock.
    pub fn now(&self) -> Instant {
        self.clock.now()
    }

    /// Returns cache statistics.
    pub fn stats(&self) -> CacheStats {
        let now = self.clock.now();
        let entries = self.entries.read();
        let expired = entries.values().filter(|e| !e.is_valid_at(now)).count();

        CacheStats {
            total_entries: entries.len(),
            expired_entries: expired,
            valid_entries: entries.len() - expired,
            capacity: self.config.max_entries,
            ttl_seconds: self.config.default_ttl_seconds,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            expirations: self.expirations.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }
}

impl Default for ResolutionCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Cache statistics.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Total entries (including expired)
    pub total_entries: usize,
    /// Expired entries not yet evicted
    pub expired_entries: usize,
    /// Valid (non-expired) entries
    pub valid_entries: usize,
    /// Maximum capacity
    pub capacity: usize,
    /// Default TTL in seconds
    pub ttl_seconds: u64,
    /// Lookups that returned an entry
    pub hits: u64,
    /// Lookups that returned nothing
    pub misses: u64,
    /// Entries removed because they expired
    pub expirations: u64,
    /// Entries removed to make room
    pub evictions: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use proptest::prelude::*;

    fn resolution(endpoint: &str, transport: &str) -> Resolution {
        Resolution::new(endpoint, transport)
    }

    fn manual_cache(ttl_seconds: u64) -> (ResolutionCache, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let config = CacheConfig {
            default_ttl_seconds: ttl_seconds,
            ..Default::default()
        };
        (ResolutionCache::with_clock(config, clock.clone()), clock)
    }

    #[test]
    fn test_cache_put_get() {
        let cache = ResolutionCache::new();
        cache.put("node.amalgam", resolution("127.0.0.1:8080", "tcp"));

        let entry = cache.get("node.amalgam").unwrap();
        assert_eq!(entry.endpoint.as_str(), "127.0.0.1:8080");
        assert_eq!(entry.transport.as_str(), "tcp");
        assert_eq!(entry.ttl, Duration::from_secs(DEFAULT_CACHE_TTL_SECONDS));
    }

    #[test]
    fn test_cache_normalize_name() {
        let cache = ResolutionCache::new();
        cache.put("NODE.Amalgam", resolution("127.0.0.1:8080", "tcp"));

        assert!(cache.get("node.amalgam").is_some());
        assert!(cache.get("  NODE.amalgam  ").is_some());
    }

    #[test]
    fn test_cache_miss() {
        let cache = ResolutionCache::new();
        assert!(cache.get("node.ghost").is_none());
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_valid_just_before_ttl() {
        let (cache, clock) = manual_cache(300);
        cache.put("node.a", resolution("203.0.113.5:9000", "direct"));

        clock.advance(Duration::from_secs(300) - Duration::from_millis(1));
        assert!(cache.get("node.a").is_some());
    }

    #[test]
    fn test_expired_at_exactly_ttl() {
        let (cache, clock) = manual_cache(300);
        cache.put("node.a", resolution("203.0.113.5:9000", "direct"));

        clock.advance(Duration::from_secs(300));
        assert!(cache.get("node.a").is_none());
    }

    #[test]
    fn test_expired_entry_is_evicted_on_get() {
        let (cache, clock) = manual_cache(300);
        cache.put("node.a", resolution("203.0.113.5:9000", "direct"));

        clock.advance(Duration::from_secs(301));
        assert!(cache.contains("node.a"));
        assert!(cache.get("node.a").is_none());
        assert!(!cache.contains("node.a"));
        assert!(cache.get("node.a").is_none());

        let stats = cache.stats();
        assert_eq!(stats.expirations, 1);
        assert_eq!(stats.misses, 2);
    }

    #[test]
    fn test_put_overwrites_entry_and_timestamp() {
        let (cache, clock) = manual_cache(300);
        let first = cache.put("node.a", resolution("203.0.113.5:9000", "direct"));

        clock.advance(Duration::from_secs(200));
        let second = cache.put("node.a", resolution("203.0.113.9:9001", "anonymized"));
        assert!(second.inserted_at > first.inserted_at);

        // The first entry would be expired here, the replacement is not
        clock.advance(Duration::from_secs(200));
        let entry = cache.get("node.a").unwrap();
        assert_eq!(entry.endpoint.as_str(), "203.0.113.9:9001");
        assert_eq!(entry.transport, TransportKind::anonymized());
        assert_eq!(entry.inserted_at, second.inserted_at);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_remaining_at() {
        let (cache, clock) = manual_cache(10);
        let entry = cache.put("node.a", resolution("a:1", "direct"));

        clock.advance(Duration::from_secs(4));
        assert_eq!(entry.remaining_at(cache.now()), Duration::from_secs(6));

        clock.advance(Duration::from_secs(40));
        assert_eq!(entry.remaining_at(cache.now()), Duration::ZERO);
    }

    #[test]
    fn test_cache_invalidate() {
        let cache = ResolutionCache::new();
        cache.put("node.a", resolution("a:1", "direct"));

        assert!(cache.invalidate("NODE.A"));
        assert!(!cache.invalidate("node.a"));
        assert!(cache.get("node.a").is_none());
    }

    #[test]
    fn test_cache_clear() {
        let cache = ResolutionCache::new();
        cache.put("node.a", resolution("a:1", "direct"));
        cache.put("node.b", resolution("b:1", "direct"));

        cache.clear();

        assert!(cache.is_empty());
    }

    #[test]
    fn test_cache_cleanup_expired() {
        let (cache, clock) = manual_cache(300);
        cache.put_with_ttl("node.a", resolution("a:1", "direct"), Duration::from_secs(1));
        cache.put("node.b", resolution("b:1", "direct"));

        clock.advance(Duration::from_secs(2));

        assert_eq!(cache.cleanup_expired(), 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.get("node.b").is_some());
    }

    #[test]
    fn test_cache_capacity_eviction() {
        let clock = Arc::new(ManualClock::new());
        let config = CacheConfig {
            max_entries: 2,
            default_ttl_seconds: 3600,
            auto_cleanup: true,
        };
        let cache = ResolutionCache::with_clock(config, clock.clone());

        cache.put("node.a", resolution("a:1", "direct"));
        clock.advance(Duration::from_millis(1));
        cache.put("node.b", resolution("b:1", "direct"));
        clock.advance(Duration::from_millis(1));
        cache.put("node.c", resolution("c:1", "direct"));

        // Should have evicted oldest
        assert_eq!(cache.len(), 2);
        assert!(cache.get("node.a").is_none());
        assert!(cache.get("node.c").is_some());
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_overwrite_at_capacity_does_not_evict() {
        let config = CacheConfig {
            max_entries: 2,
            ..Default::default()
        };
        let cache = ResolutionCache::with_config(config);
        cache.put("node.a", resolution("a:1", "direct"));
        cache.put("node.b", resolution("b:1", "direct"));
        cache.put("node.a", resolution("a:2", "direct"));

        assert_eq!(cache.len(), 2);
        assert!(cache.get("node.b").is_some());
        assert_eq!(cache.stats().evictions, 0);
    }

    #[test]
    fn test_capacity_prefers_expired_entries() {
        let clock = Arc::new(ManualClock::new());
        let config = CacheConfig {
            max_entries: 2,
            default_ttl_seconds: 3600,
            auto_cleanup: true,
        };
        let cache = ResolutionCache::with_clock(config, clock.clone());

        cache.put("node.a", resolution("a:1", "direct"));
        cache.put_with_ttl("node.b", resolution("b:1", "direct"), Duration::from_secs(1));
        clock.advance(Duration::from_secs(2));
        cache.put("node.c", resolution("c:1", "direct"));

        assert!(cache.get("node.a").is_some());
        assert!(cache.get("node.c").is_some());
        assert_eq!(cache.stats().evictions, 0);
    }

    #[test]
    fn test_entries_snapshot_skips_expired() {
        let (cache, clock) = manual_cache(300);
        cache.put("node.b", resolution("b:1", "direct"));
        cache.put("node.a", resolution("a:1", "tor"));
        cache.put_with_ttl("node.c", resolution("c:1", "direct"), Duration::from_secs(1));
        clock.advance(Duration::from_secs(2));

        let names: Vec<String> = cache.entries().into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["node.a".to_string(), "node.b".to_string()]);
    }

    #[test]
    fn test_cache_stats() {
        let (cache, clock) = manual_cache(300);
        cache.put("node.a", resolution("a:1", "direct"));
        cache.put_with_ttl("node.b", resolution("b:1", "direct"), Duration::from_secs(1));
        clock.advance(Duration::from_secs(2));
        cache.get("node.a");

        let stats = cache.stats();
        assert_eq!(stats.total_entries, 2);
        assert_eq!(stats.valid_entries, 1);
        assert_eq!(stats.expired_entries, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.ttl_seconds, 300);
    }

    #[test]
    fn test_concurrent_readers_never_see_mixed_entries() {
        let cache = Arc::new(ResolutionCache::new());
        cache.put("node.a", resolution("old:1", "direct"));

        let writer = {
            let cache = cache.clone();
            std::thread::spawn(move || {
                for i in 0..500 {
                    if i % 2 == 0 {
                        cache.put("node.a", resolution("new:2", "anonymized"));
                    } else {
                        cache.put("node.a", resolution("old:1", "direct"));
                    }
                }
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let cache = cache.clone();
                std::thread::spawn(move || {
                    for _ in 0..500 {
                        let entry = cache.get("node.a").unwrap();
                        match entry.endpoint.as_str() {
                            "old:1" => assert_eq!(entry.transport.as_str(), "direct"),
                            "new:2" => assert_eq!(entry.transport.as_str(), "anonymized"),
                            other => panic!("unexpected endpoint {other}"),
                        }
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }
    }

    proptest! {
        #[test]
        fn prop_entry_valid_strictly_inside_ttl(ttl_ms in 2u64..1_000_000, eps_ms in 1u64..1_000) {
            prop_assume!(eps_ms < ttl_ms);
            let clock = Arc::new(ManualClock::new());
            let cache = ResolutionCache::with_clock(CacheConfig::default(), clock.clone());
            let ttl = Duration::from_millis(ttl_ms);
            let eps = Duration::from_millis(eps_ms);

            cache.put_with_ttl("node.p", resolution("p:1", "direct"), ttl);

            clock.advance(ttl - eps);
            prop_assert!(cache.get("node.p").is_some());

            clock.advance(eps * 2);
            prop_assert!(cache.get("node.p").is_none());
            prop_assert!(cache.get("node.p").is_none());
            prop_assert!(cache.is_empty());
        }
    }
}
