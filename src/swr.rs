//! Stale-while-revalidate controller for dashboard feeds.
//!
//! Each data feed owns a `FeedController` that decides what the dashboard
//! renders while fetches are in flight: previously fetched data keeps being
//! displayed (optionally marked stale) during a background refresh instead
//! of flashing back to a loading skeleton. A failed refresh keeps the last
//! good data; only an explicit clear blanks a feed.
//!
//! Fetches are identified by monotonic tickets so a slow, superseded
//! response can never overwrite a newer one.

use serde::Serialize;
use tracing::debug;

/// Lifecycle phase of one data feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedPhase {
    /// No data and no fetch in flight.
    Empty,
    /// First fetch in flight with nothing cached to show.
    Loading,
    /// Showing retained data, no fetch in flight.
    Cached,
    /// Showing retained data while a background refresh is in flight.
    Revalidating,
    /// Showing data that arrived from the most recent fetch.
    Fresh,
}

/// Identifies one fetch attempt. Tickets are monotonic per controller;
/// completions carrying a superseded ticket are discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket(u64);

/// What the dashboard should render for a feed right now.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeedView<T> {
    /// Nothing to show yet; render the loading skeleton.
    Skeleton,
    /// Render `data`; `stale` is set while a background refresh is in flight.
    Data { data: T, stale: bool },
    /// No cached data and the fetch failed; surface a retry affordance.
    Error { message: String },
}

/// Per-feed stale-while-revalidate state machine.
pub struct FeedController<T> {
    phase: FeedPhase,
    last_good: Option<T>,
    last_error: Option<String>,
    next_ticket: u64,
    in_flight: Option<u64>,
}

impl<T: Clone> FeedController<T> {
    pub fn new() -> Self {
        Self {
            phase: FeedPhase::Empty,
            last_good: None,
            last_error: None,
            next_ticket: 0,
            in_flight: None,
        }
    }

    pub fn phase(&self) -> FeedPhase {
        self.phase
    }

    /// True while a fetch is in flight.
    pub fn is_updating(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn has_data(&self) -> bool {
        self.last_good.is_some()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Registers a new fetch attempt and returns its ticket.
    ///
    /// With retained data the feed keeps rendering it (Revalidating);
    /// without any it drops to the loading skeleton. A fetch started while
    /// another is in flight simply supersedes it: the older ticket's
    /// completion will be discarded.
    pub fn begin_fetch(&mut self) -> FetchTicket {
        let ticket = self.next_ticket;
        self.next_ticket += 1;

        if self.in_flight.is_some() {
            debug!("feed fetch #{} supersedes an in-flight fetch", ticket);
        }
        self.in_flight = Some(ticket);

        self.phase = if self.last_good.is_some() {
            FeedPhase::Revalidating
        } else {
            FeedPhase::Loading
        };

        FetchTicket(ticket)
    }

    /// Delivers fetched data for `ticket`.
    ///
    /// Returns false (and changes nothing) when the ticket was superseded by
    /// a newer fetch; arrival order does not decide which response wins.
    pub fn complete(&mut self, ticket: FetchTicket, data: T) -> bool {
        if self.in_flight != Some(ticket.0) {
            debug!("discarding out-of-order completion for fetch #{}", ticket.0);
            return false;
        }

        self.in_flight = None;
        self.last_good = Some(data);
        self.last_error = None;
        self.phase = FeedPhase::Fresh;
        true
    }

    /// Reports a failed fetch for `ticket`.
    ///
    /// Retained data is kept unchanged; the error only becomes user-visible
    /// when there is nothing cached to fall back to. Returns false for a
    /// superseded ticket.
    pub fn fail(&mut self, ticket: FetchTicket, error: &str) -> bool {
        if self.in_flight != Some(ticket.0) {
            debug!("discarding out-of-order failure for fetch #{}", ticket.0);
            return false;
        }

        self.in_flight = None;
        self.last_error = Some(error.to_string());
        self.phase = if self.last_good.is_some() {
            FeedPhase::Cached
        } else {
            FeedPhase::Empty
        };
        true
    }

    /// Settles a freshly arrived feed back to Cached once the UI's short
    /// settle window has passed (avoids a one-frame stale-indicator flicker
    /// when new data is structurally identical to the old).
    pub fn settle(&mut self) {
        if self.phase == FeedPhase::Fresh {
            self.phase = FeedPhase::Cached;
        }
    }

    /// Explicit clear: the only transition that blanks a feed. Natural TTL
    /// expiry never does this; it only makes the next read a miss, which
    /// triggers a revalidation.
    pub fn clear(&mut self) {
        self.phase = FeedPhase::Empty;
        self.last_good = None;
        self.last_error = None;
        self.in_flight = None;
    }

    /// What the dashboard should render right now.
    pub fn view(&self) -> FeedView<T> {
        if let Some(data) = &self.last_good {
            return FeedView::Data {
                data: data.clone(),
                stale: self.phase == FeedPhase::Revalidating,
            };
        }

        match (&self.phase, &self.last_error) {
            (FeedPhase::Loading, _) => FeedView::Skeleton,
            (_, Some(message)) => FeedView::Error {
                message: message.clone(),
            },
            _ => FeedView::Skeleton,
        }
    }
}

impl<T: Clone> Default for FeedController<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_fetch_goes_through_loading() {
        let mut feed: FeedController<Vec<&str>> = FeedController::new();
        assert_eq!(feed.phase(), FeedPhase::Empty);
        assert_eq!(feed.view(), FeedView::Skeleton);

        let ticket = feed.begin_fetch();
        assert_eq!(feed.phase(), FeedPhase::Loading);
        assert_eq!(feed.view(), FeedView::Skeleton);

        assert!(feed.complete(ticket, vec!["A", "B"]));
        assert_eq!(feed.phase(), FeedPhase::Fresh);
        assert_eq!(
            feed.view(),
            FeedView::Data {
                data: vec!["A", "B"],
                stale: false
            }
        );
    }

    #[test]
    fn test_revalidation_keeps_rendering_last_good() {
        let mut feed: FeedController<Vec<&str>> = FeedController::new();
        let t0 = feed.begin_fetch();
        feed.complete(t0, vec!["A", "B"]);
        feed.settle();
        assert_eq!(feed.phase(), FeedPhase::Cached);

        // A refresh starts: the old list stays on screen, marked stale.
        let t1 = feed.begin_fetch();
        assert_eq!(feed.phase(), FeedPhase::Revalidating);
        assert!(feed.is_updating());
        assert_eq!(
            feed.view(),
            FeedView::Data {
                data: vec!["A", "B"],
                stale: true
            }
        );

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
    fn test_failed_revalidation_retains_data() {
        let mut feed: FeedController<Vec<&str>> = FeedController::new();
        let t0 = feed.begin_fetch();
        feed.complete(t0, vec!["A"]);

        let t1 = feed.begin_fetch();
        assert!(feed.fail(t1, "backend unreachable"));

        assert_eq!(feed.phase(), FeedPhase::Cached);
        assert_eq!(feed.last_error(), Some("backend unreachable"));
        // The error never blanks the feed while data is retained.
        assert_eq!(
            feed.view(),
            FeedView::Data {
                data: vec!["A"],
                stale: false
            }
        );
    }

    #[test]
    fn test_initial_fetch_failure_surfaces_error() {
        let mut feed: FeedController<Vec<&str>> = FeedController::new();
        let t0 = feed.begin_fetch();
        assert!(feed.fail(t0, "timeout"));

        assert_eq!(feed.phase(), FeedPhase::Empty);
        assert_eq!(
            feed.view(),
            FeedView::Error {
                message: "timeout".to_string()
            }
        );
    }

    #[test]
    fn test_superseded_ticket_is_discarded() {
        let mut feed: FeedController<u32> = FeedController::new();

        let slow = feed.begin_fetch();
        let fast = feed.begin_fetch();

        // Newer fetch resolves first.
        assert!(feed.complete(fast, 2));
        // The older response arrives late and must not overwrite it.
        assert!(!feed.complete(slow, 1));
        assert_eq!(feed.view(), FeedView::Data { data: 2, stale: false });

        // A stale failure is discarded the same way.
        let t2 = feed.begin_fetch();
        let t3 = feed.begin_fetch();
        assert!(feed.complete(t3, 3));
        assert!(!feed.fail(t2, "late error"));
        assert!(feed.last_error().is_none());
    }

    #[test]
    fn test_only_clear_blanks_a_feed() {
        let mut feed: FeedController<u32> = FeedController::new();
        let t0 = feed.begin_fetch();
        feed.complete(t0, 42);

        // An expiry-triggered refresh keeps the data visible.
        feed.begin_fetch();
        assert!(matches!(feed.view(), FeedView::Data { .. }));

        feed.clear();
        assert_eq!(feed.phase(), FeedPhase::Empty);
        assert!(!feed.has_data());
        assert_eq!(feed.view(), FeedView::Skeleton);
    }
}
