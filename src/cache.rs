//! Adaptive cache store for dashboard datasets.
//!
//! This module provides the `CacheStore` used to keep fetched feed data
//! between refresh cycles: entries carry a creation timestamp, an expiry
//! timestamp derived from a priority-based TTL table, and are lazily evicted
//! on read once expired. Hit/miss accounting feeds the cache monitoring UI.

use ahash::AHashMap as HashMap;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::debug;

/// Default bound on entries per store.
pub const DEFAULT_MAX_ENTRIES: usize = 256;

/// Volatility class of a cached dataset, used to select its TTL.
///
/// High priority means staleness is costly (short TTL); low priority data
/// changes rarely and may live long.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

/// Priority-to-TTL mapping, in seconds.
///
/// This is configuration data, not a formula: operators tune the values in
/// the config file without a redeploy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TtlPolicy {
    /// TTL for high-priority (volatile) entries, e.g. the new-tickets list.
    #[serde(default = "default_high_ttl_secs")]
    pub high_secs: u64,

    /// TTL for medium-priority entries, e.g. the technician ranking.
    #[serde(default = "default_medium_ttl_secs")]
    pub medium_secs: u64,

    /// TTL for low-priority (slow-moving) entries, e.g. system status.
    #[serde(default = "default_low_ttl_secs")]
    pub low_secs: u64,
}

fn default_high_ttl_secs() -> u64 {
    30
}
fn default_medium_ttl_secs() -> u64 {
    120
}
fn default_low_ttl_secs() -> u64 {
    300
}

impl Default for TtlPolicy {
    fn default() -> Self {
        Self {
            high_secs: default_high_ttl_secs(),
            medium_secs: default_medium_ttl_secs(),
            low_secs: default_low_ttl_secs(),
        }
    }
}

impl TtlPolicy {
    /// Resolves the TTL for a priority class.
    ///
    /// Clamped to at least one millisecond so `expires_at > created_at`
    /// holds even for a zeroed config value.
    pub fn ttl_for(&self, priority: Priority) -> Duration {
        let secs = match priority {
            Priority::High => self.high_secs,
            Priority::Medium => self.medium_secs,
            Priority::Low => self.low_secs,
        };
        Duration::from_secs(secs).max(Duration::from_millis(1))
    }
}

/// A cached value with its expiry and priority metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub value: V,
    pub created_at: Instant,
    pub expires_at: Instant,
    pub priority: Priority,
}

impl<V> CacheEntry<V> {
    /// An entry is live while `now` is before its expiry timestamp.
    pub fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Derived cache statistics, recomputed on demand.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Live (unexpired) entries at computation time.
    pub size: usize,
    pub hits: u64,
    pub misses: u64,
    /// hits / (hits + misses), 0.0 when no reads happened yet.
    pub hit_rate: f64,
    pub average_lookup_ms: f64,
    pub high_priority: usize,
    pub medium_priority: usize,
    pub low_priority: usize,
    /// Mean configured TTL among live entries, in seconds.
    pub average_ttl_secs: f64,
}

/// Running average of read latencies.
#[derive(Default)]
struct LookupStat {
    count: u64,
    total_ms: f64,
}

impl LookupStat {
    fn add(&mut self, ms: f64) {
        self.count += 1;
        self.total_ms += ms;
    }

    fn average_ms(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total_ms / self.count as f64
        }
    }
}

/// Cache store for one logical dataset (e.g. "new_tickets").
///
/// Reads never fail: a missing or expired entry is a miss, storage pressure
/// is resolved by deterministic oldest-first eviction, and all accounting is
/// interior so the store can be shared behind an `Arc`.
pub struct CacheStore<V> {
    name: String,
    policy: TtlPolicy,
    max_entries: usize,
    entries: Mutex<HashMap<String, CacheEntry<V>>>,
    hits: AtomicU64,
    misses: AtomicU64,
    lookup: Mutex<LookupStat>,
}

impl<V: Clone> CacheStore<V> {
    /// Creates a store with the given TTL policy and capacity bound.
    pub fn new(name: &str, policy: TtlPolicy, max_entries: usize) -> Self {
        Self {
            name: name.to_string(),
            policy,
            max_entries: max_entries.max(1),
            entries: Mutex::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            lookup: Mutex::new(LookupStat::default()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Reads a value. A live entry is a hit; a missing or expired entry is a
    /// miss, and an expired entry is evicted at this point.
    pub fn get(&self, key: &str) -> Option<V> {
        self.get_at(key, Instant::now())
    }

    /// Clock-injected variant of [`get`](Self::get).
    pub fn get_at(&self, key: &str, now: Instant) -> Option<V> {
        let started = Instant::now();

        let value = {
            let Ok(mut map) = self.entries.lock() else {
                return None;
            };
            match map.get(key) {
                Some(entry) if entry.is_live(now) => Some(entry.value.clone()),
                Some(_) => {
                    debug!("cache '{}': entry '{}' expired, evicting", self.name, key);
                    map.remove(key);
                    None
                }
                None => None,
            }
        };

        let lookup_ms = started.elapsed().as_secs_f64() * 1000.0;
        if let Ok(mut stat) = self.lookup.lock() {
            stat.add(lookup_ms);
        }

        match value {
            Some(v) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(v)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Stores a value with the TTL derived from the policy table.
    pub fn set(&self, key: &str, value: V, priority: Priority) {
        let ttl = self.policy.ttl_for(priority);
        self.set_at(key, value, priority, ttl, Instant::now());
    }

    /// Stores a value with an explicit TTL, bypassing the policy table.
    pub fn set_with_ttl(&self, key: &str, value: V, priority: Priority, ttl: Duration) {
        self.set_at(key, value, priority, ttl, Instant::now());
    }

    /// Clock-injected variant of [`set_with_ttl`](Self::set_with_ttl).
    pub fn set_at(&self, key: &str, value: V, priority: Priority, ttl: Duration, now: Instant) {
        let ttl = ttl.max(Duration::from_millis(1));

        let Ok(mut map) = self.entries.lock() else {
            return;
        };

        if !map.contains_key(key) && map.len() >= self.max_entries {
            evict_oldest(&self.name, &mut map);
        }

        map.insert(
            key.to_string(),
            CacheEntry {
                value,
                created_at: now,
                expires_at: now + ttl,
                priority,
            },
        );
    }

    /// Drops all entries.
    ///
    /// Hit/miss counters are retained: the exposed hit rate is a cumulative
    /// session metric, so a manual clear does not fabricate a fresh 100%
    /// rate on the monitoring page.
    pub fn clear(&self) {
        if let Ok(mut map) = self.entries.lock() {
            map.clear();
        }
        debug!("cache '{}' cleared", self.name);
    }

    /// Derives statistics from the current entry population. Read-only.
    pub fn stats(&self) -> CacheStats {
        self.stats_at(Instant::now())
    }

    /// Clock-injected variant of [`stats`](Self::stats).
    pub fn stats_at(&self, now: Instant) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        };

        let average_lookup_ms = match self.lookup.lock() {
            Ok(stat) => stat.average_ms(),
            Err(_) => 0.0,
        };

        let mut stats = CacheStats {
            hits,
            misses,
            hit_rate,
            average_lookup_ms,
            ..CacheStats::default()
        };

        let Ok(map) = self.entries.lock() else {
            return stats;
        };

        let mut ttl_sum_secs = 0.0;
        for entry in map.values().filter(|e| e.is_live(now)) {
            stats.size += 1;
            ttl_sum_secs += entry
                .expires_at
                .saturating_duration_since(entry.created_at)
                .as_secs_f64();
            match entry.priority {
                Priority::High => stats.high_priority += 1,
                Priority::Medium => stats.medium_priority += 1,
                Priority::Low => stats.low_priority += 1,
            }
        }
        if stats.size > 0 {
            stats.average_ttl_secs = ttl_sum_secs / stats.size as f64;
        }

        stats
    }
}

/// Removes the entry with the oldest creation timestamp.
fn evict_oldest<V>(name: &str, map: &mut HashMap<String, CacheEntry<V>>) {
    let oldest = map
        .iter()
        .min_by_key(|(_, entry)| entry.created_at)
        .map(|(key, _)| key.clone());
    if let Some(key) = oldest {
        debug!("cache '{}' full, evicting oldest entry '{}'", name, key);
        map.remove(&key);
    }
}
