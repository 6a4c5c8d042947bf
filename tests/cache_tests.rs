//! Integration tests for the cache store and cache manager.
//!
//! TTL behavior uses the clock-injected variants so expiry is simulated
//! deterministically instead of sleeping.

use deskflow_telemetry::{CacheManager, CacheStore, Priority, TtlPolicy};
use serde_json::json;
use std::time::{Duration, Instant};

fn policy() -> TtlPolicy {
    TtlPolicy {
        high_secs: 30,
        medium_secs: 120,
        low_secs: 300,
    }
}

#[test]
fn test_set_then_get_hits_and_returns_value() {
    let cache: CacheStore<String> = CacheStore::new("tickets", policy(), 16);

    cache.set("current", "page".to_string(), Priority::High);
    assert_eq!(cache.get("current").as_deref(), Some("page"));

    let stats = cache.stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 0);
}

#[test]
fn test_unknown_key_misses() {
    let cache: CacheStore<String> = CacheStore::new("tickets", policy(), 16);

    assert!(cache.get("absent").is_none());

    let stats = cache.stats();
    assert_eq!(stats.hits, 0);
    assert_eq!(stats.misses, 1);
}

#[test]
fn test_entry_expires_after_ttl() {
    let cache: CacheStore<u32> = CacheStore::new("tickets", policy(), 16);
    let t0 = Instant::now();

    cache.set_at("current", 7, Priority::High, Duration::from_millis(100), t0);

    // 150ms later the entry is expired: miss, and absent from size.
    assert!(cache
        .get_at("current", t0 + Duration::from_millis(150))
        .is_none());
    assert_eq!(cache.stats_at(t0 + Duration::from_millis(150)).size, 0);
}

#[test]
fn test_hit_rate_three_hits_one_miss() {
    let cache: CacheStore<u32> = CacheStore::new("metrics", policy(), 16);
    cache.set("summary", 1, Priority::Medium);

    assert!(cache.get("summary").is_some());
    assert!(cache.get("summary").is_some());
    assert!(cache.get("summary").is_some());
    assert!(cache.get("nothing").is_none());

    let stats = cache.stats();
    assert!((stats.hit_rate - 0.75).abs() < 1e-9);
}

#[test]
fn test_average_ttl_matches_priority_table() {
    let cache: CacheStore<u32> = CacheStore::new("status", policy(), 16);

    // Single low-priority entry: the average TTL is exactly the table value.
    cache.set("current", 1, Priority::Low);

    let stats = cache.stats();
    assert_eq!(stats.size, 1);
    assert!((stats.average_ttl_secs - 300.0).abs() < 1e-6);
}

#[test]
fn test_hit_rate_guards_against_divide_by_zero() {
    let cache: CacheStore<u32> = CacheStore::new("empty", policy(), 16);

    let stats = cache.stats();
    assert_eq!(stats.hit_rate, 0.0);
    assert!(stats.hit_rate.is_finite());
    assert_eq!(stats.average_ttl_secs, 0.0);
    assert_eq!(stats.average_lookup_ms, 0.0);
}

#[test]
fn test_storage_pressure_evicts_deterministically() {
    let cache: CacheStore<u32> = CacheStore::new("bounded", policy(), 3);
    let t0 = Instant::now();

    for i in 0..3 {
        cache.set_at(
            &format!("k{}", i),
            i,
            Priority::Medium,
            Duration::from_secs(60),
            t0 + Duration::from_millis(i as u64),
        );
    }
    // Full store: the next insert evicts the oldest creation ("k0").
    cache.set_at(
        "k3",
        3,
        Priority::Medium,
        Duration::from_secs(60),
        t0 + Duration::from_millis(10),
    );

    let probe = t0 + Duration::from_millis(20);
    assert!(cache.get_at("k0", probe).is_none());
    assert!(cache.get_at("k1", probe).is_some());
    assert!(cache.get_at("k3", probe).is_some());
    assert_eq!(cache.stats_at(probe).size, 3);
}

#[test]
fn test_manager_routes_to_named_stores() {
    let manager = CacheManager::new(policy(), 16);

    manager.set("new_tickets", "current", json!([1, 2]), Priority::High);
    manager.set("system_status", "current", json!("ok"), Priority::Low);

    assert_eq!(manager.get("new_tickets", "current"), Some(json!([1, 2])));
    assert_eq!(manager.get("system_status", "current"), Some(json!("ok")));
    assert_eq!(
        manager.store_names(),
        vec!["new_tickets".to_string(), "system_status".to_string()]
    );
}

#[test]
fn test_manager_aggregate_hit_rate_and_ttl() {
    let manager = CacheManager::new(policy(), 16);

    manager.set("a", "k", json!(1), Priority::High); // ttl 30
    manager.set("b", "k", json!(2), Priority::Low); // ttl 300

    assert!(manager.get("a", "k").is_some());
    assert!(manager.get("b", "k").is_some());
    assert!(manager.get("b", "absent").is_none());

    let stats = manager.aggregate_stats();
    assert_eq!(stats.total_size, 2);
    assert!((stats.overall_hit_rate - 2.0 / 3.0).abs() < 1e-9);
    // Weighted mean over one 30s and one 300s entry.
    assert!((stats.average_ttl_secs - 165.0).abs() < 1e-6);
}

#[test]
fn test_clear_keeps_cumulative_counters() {
    let manager = CacheManager::new(policy(), 16);
    manager.set("metrics", "current", json!(1), Priority::Medium);
    assert!(manager.get("metrics", "current").is_some());

    manager.clear_all();

    let stats = manager.aggregate_stats();
    assert_eq!(stats.total_size, 0);
    assert_eq!(stats.total_hits, 1);
}
