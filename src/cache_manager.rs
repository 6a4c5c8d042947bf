//! Cache manager for the named per-dataset stores.
//!
//! This module provides the `CacheManager`, which maintains one `CacheStore`
//! per logical dashboard dataset (metrics, system status, technician
//! ranking, new tickets), created on demand with a shared TTL policy, and
//! aggregates their statistics for the monitoring surface.

use dashmap::DashMap;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;

use crate::cache::{CacheStats, CacheStore, Priority, TtlPolicy};

/// Per-store statistics with the store name attached.
#[derive(Debug, Clone, Serialize)]
pub struct NamedCacheStats {
    pub name: String,
    #[serde(flatten)]
    pub stats: CacheStats,
}

/// Statistics aggregated across every store the manager owns.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AggregateCacheStats {
    pub store_count: usize,
    pub total_size: usize,
    pub total_hits: u64,
    pub total_misses: u64,
    /// hits / (hits + misses) across all stores, 0.0 with no reads.
    pub overall_hit_rate: f64,
    /// Mean TTL across all live entries, weighted by store population.
    pub average_ttl_secs: f64,
    pub stores: Vec<NamedCacheStats>,
}

/// Manager for the named cache stores.
///
/// Stores share one TTL policy and capacity bound; both come from the
/// configuration so operational tuning does not require a redeploy.
pub struct CacheManager {
    stores: DashMap<String, Arc<CacheStore<Value>>>,
    policy: TtlPolicy,
    max_entries_per_store: usize,
}

impl CacheManager {
    /// Creates a manager; stores are created lazily on first access.
    pub fn new(policy: TtlPolicy, max_entries_per_store: usize) -> Self {
        Self {
            stores: DashMap::new(),
            policy,
            max_entries_per_store: max_entries_per_store.max(1),
        }
    }

    /// Returns the store for `name`, creating it if needed.
    pub fn store(&self, name: &str) -> Arc<CacheStore<Value>> {
        self.stores
            .entry(name.to_string())
            .or_insert_with(|| {
                Arc::new(CacheStore::new(
                    name,
                    self.policy.clone(),
                    self.max_entries_per_store,
                ))
            })
            .clone()
    }

    /// Reads a value from a named store, with hit/miss accounting.
    pub fn get(&self, store: &str, key: &str) -> Option<Value> {
        self.store(store).get(key)
    }

    /// Stores a value in a named store with a policy-derived TTL.
    pub fn set(&self, store: &str, key: &str, value: Value, priority: Priority) {
        self.store(store).set(key, value, priority);
    }

    /// Drops all entries in one named store (counters are retained, see
    /// [`CacheStore::clear`]).
    pub fn clear(&self, store: &str) {
        if let Some(entry) = self.stores.get(store) {
            entry.clear();
        }
    }

    /// Drops all entries in every store.
    pub fn clear_all(&self) {
        for entry in self.stores.iter() {
            entry.value().clear();
        }
    }

    /// Returns a list of all known store names.
    pub fn store_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.stores.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Aggregates statistics across every store. Read-only.
    pub fn aggregate_stats(&self) -> AggregateCacheStats {
        self.aggregate_stats_at(Instant::now())
    }

    /// Clock-injected variant of [`aggregate_stats`](Self::aggregate_stats).
    pub fn aggregate_stats_at(&self, now: Instant) -> AggregateCacheStats {
        let mut aggregate = AggregateCacheStats::default();
        let mut ttl_weighted_sum = 0.0;

        for entry in self.stores.iter() {
            let stats = entry.value().stats_at(now);
            aggregate.total_size += stats.size;
            aggregate.total_hits += stats.hits;
            aggregate.total_misses += stats.misses;
            ttl_weighted_sum += stats.average_ttl_secs * stats.size as f64;
            aggregate.stores.push(NamedCacheStats {
                name: entry.key().clone(),
                stats,
            });
        }

        aggregate.stores.sort_by(|a, b| a.name.cmp(&b.name));
        aggregate.store_count = aggregate.stores.len();

        let total_reads = aggregate.total_hits + aggregate.total_misses;
        if total_reads > 0 {
            aggregate.overall_hit_rate = aggregate.total_hits as f64 / total_reads as f64;
        }
        if aggregate.total_size > 0 {
            aggregate.average_ttl_secs = ttl_weighted_sum / aggregate.total_size as f64;
        }

        aggregate
    }
}
