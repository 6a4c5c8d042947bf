//! Integration tests for stale-while-revalidate feed behavior.
//!
//! These tests drive the feed controller together with the cache store the
//! way the service does: a TTL expiry makes the next read a miss, which
//! starts a revalidation while the retained data keeps rendering.

use deskflow_telemetry::swr::{FeedController, FeedPhase, FeedView};
use deskflow_telemetry::{CacheStore, Priority, TtlPolicy};
use std::time::{Duration, Instant};

#[test]
fn test_rendered_list_stable_across_revalidation() {
    let mut feed: FeedController<Vec<&str>> = FeedController::new();

    let t0 = feed.begin_fetch();
    assert!(feed.complete(t0, vec!["A", "B"]));

    // A new fetch starts: the UI must keep showing [A, B].
    let t1 = feed.begin_fetch();
    assert!(feed.is_updating());
    assert_eq!(
        feed.view(),
        FeedView::Data {
            data: vec!["A", "B"],
            stale: true
        }
    );

    // Resolution swaps in the new list and clears the updating flag.
    assert!(feed.complete(t1, vec!["A", "B", "C"]));
    assert!(!feed.is_updating());
    assert_eq!(
        feed.view(),
        FeedView::Data {
            data: vec!["A", "B", "C"],
            stale: false
        }
    );
}

#[test]
fn test_ttl_expiry_triggers_revalidation_not_empty() {
    let cache: CacheStore<Vec<String>> =
        CacheStore::new("technician_ranking", TtlPolicy::default(), 8);
    let mut feed: FeedController<Vec<String>> = FeedController::new();

    // Initial load fills the cache and the controller.
    let ranking = vec!["M. Rivera".to_string(), "A. Chen".to_string()];
    let t0 = Instant::now();
    cache.set_at(
        "current",
        ranking.clone(),
        Priority::Medium,
        Duration::from_millis(100),
        t0,
    );
    let ticket = feed.begin_fetch();
    feed.complete(ticket, ranking.clone());

    // The entry expires; the next read is a miss...
    let miss_time = t0 + Duration::from_millis(150);
    assert!(cache.get_at("current", miss_time).is_none());

    // ...which starts a revalidation. The feed is never blanked: the stale
    // ranking keeps rendering while the refresh runs.
    feed.begin_fetch();
    assert_eq!(feed.phase(), FeedPhase::Revalidating);
    assert_eq!(
        feed.view(),
        FeedView::Data {
            data: ranking,
            stale: true
        }
    );
}

#[test]
fn test_failed_refresh_reports_error_but_keeps_data() {
    let mut feed: FeedController<Vec<&str>> = FeedController::new();
    let t0 = feed.begin_fetch();
    feed.complete(t0, vec!["A", "B"]);

    let t1 = feed.begin_fetch();
    assert!(feed.fail(t1, "HTTP 502"));

    assert_eq!(feed.phase(), FeedPhase::Cached);
    assert_eq!(feed.last_error(), Some("HTTP 502"));
    assert_eq!(
        feed.view(),
        FeedView::Data {
            data: vec!["A", "B"],
            stale: false
        }
    );
}

#[test]
fn test_initial_failure_without_cache_shows_error() {
    let mut feed: FeedController<Vec<&str>> = FeedController::new();

    let t0 = feed.begin_fetch();
    assert_eq!(feed.view(), FeedView::Skeleton);
    assert!(feed.fail(t0, "connection refused"));

    // No cache, no data, fetch failed: the retry affordance case.
    assert_eq!(
        feed.view(),
        FeedView::Error {
            message: "connection refused".to_string()
        }
    );
}

#[test]
fn test_out_of_order_response_cannot_win() {
    let mut feed: FeedController<u64> = FeedController::new();

    // Rapid refresh triggering: two fetches race.
    let slow = feed.begin_fetch();
    let fast = feed.begin_fetch();

    // The newer request completes first.
    assert!(feed.complete(fast, 200));
    // The superseded response arrives afterwards and must be discarded.
    assert!(!feed.complete(slow, 100));

    assert_eq!(
        feed.view(),
        FeedView::Data {
            data: 200,
            stale: false
        }
    );
}

#[test]
fn test_settle_clears_fresh_without_touching_data() {
    let mut feed: FeedController<u64> = FeedController::new();
    let t0 = feed.begin_fetch();
    feed.complete(t0, 1);
    assert_eq!(feed.phase(), FeedPhase::Fresh);

    feed.settle();
    assert_eq!(feed.phase(), FeedPhase::Cached);
    assert_eq!(feed.view(), FeedView::Data { data: 1, stale: false });

    // Settling is idempotent and only applies to Fresh.
    feed.settle();
    assert_eq!(feed.phase(), FeedPhase::Cached);
}

#[test]
fn test_explicit_clear_is_the_only_path_to_empty() {
    let mut feed: FeedController<u64> = FeedController::new();
    let t0 = feed.begin_fetch();
    feed.complete(t0, 9);

    // Failures and refreshes never blank the feed...
    let t1 = feed.begin_fetch();
    feed.fail(t1, "oops");
    assert!(feed.has_data());

    // ...only the explicit clear does.
    feed.clear();
    assert_eq!(feed.phase(), FeedPhase::Empty);
    assert!(!feed.has_data());
    assert_eq!(feed.view(), FeedView::Skeleton);
}
