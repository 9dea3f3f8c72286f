//! Cache Item Module
//!
//! One page of one lookup, plus the state machine that tracks it through
//! the batching pipeline:
//!
//! ```text
//! Awaiting -> Processing -> Done
//!                        -> Error -> (retry) -> Awaiting
//! ```

use serde::Serialize;

use crate::remote::{Part, PartsMatchQuery};

// == Item State ==
/// Progress of a cache item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemState {
    /// Waiting to be claimed by a dispatch
    Awaiting,
    /// Claimed by an in-flight batch
    Processing,
    /// The batch failed or the remote service reported an error for this item
    Error,
    /// A response was received and applied
    Done,
}

// == Cache Item ==
/// A paginated query request and its outcome.
#[derive(Debug, Clone)]
pub struct CacheItem {
    key: String,
    start: u32,
    limit: u32,
    state: ItemState,
    /// Error text in `Error`, advisory text for an empty `Done`
    error: Option<String>,
    /// Total result count reported by the remote service
    hits: u64,
    results: Vec<Part>,
}

impl CacheItem {
    // == Constructor ==
    /// Creates a new item in the `Awaiting` state.
    ///
    /// # Arguments
    /// * `key` - Normalized cache key
    /// * `start` - Pagination offset of this page
    /// * `limit` - Number of records requested for this page
    pub fn new(key: impl Into<String>, start: u32, limit: u32) -> Self {
        Self {
            key: key.into(),
            start,
            limit,
            state: ItemState::Awaiting,
            error: None,
            hits: 0,
            results: Vec::new(),
        }
    }

    /// Creates an item that is already failed, used when it can never be
    /// dispatched (no credential available at creation time).
    pub fn failed(key: impl Into<String>, start: u32, limit: u32, message: impl Into<String>) -> Self {
        let mut item = Self::new(key, start, limit);
        item.state = ItemState::Error;
        item.error = Some(message.into());
        item
    }

    // == Accessors ==
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn state(&self) -> ItemState {
        self.state
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn results(&self) -> &[Part] {
        &self.results
    }

    /// The remote query this item stands for. The key doubles as the
    /// correlation reference echoed back by the service.
    pub fn query(&self) -> PartsMatchQuery {
        PartsMatchQuery {
            mpn: self.key.clone(),
            start: self.start,
            limit: self.limit,
            reference: self.key.clone(),
        }
    }

    // == Transitions ==
    /// `Awaiting -> Processing`. Returns false if the item was not awaiting.
    pub fn claim(&mut self) -> bool {
        if self.state != ItemState::Awaiting {
            return false;
        }
        self.state = ItemState::Processing;
        true
    }

    /// `Processing -> Done`, appending the page's parts.
    ///
    /// An empty page still completes, carrying `advisory` as its message.
    ///
    /// # Panics
    /// If the item is not `Processing`; only a claimed item can complete.
    pub fn complete(&mut self, parts: Vec<Part>, hits: u64, advisory: &str) {
        assert_eq!(
            self.state,
            ItemState::Processing,
            "completing item {}:{} that was never claimed",
            self.key,
            self.start
        );
        self.error = if parts.is_empty() {
            Some(advisory.to_string())
        } else {
            None
        };
        self.results.extend(parts);
        self.hits = hits;
        self.state = ItemState::Done;
    }

    /// `Processing -> Error`.
    ///
    /// # Panics
    /// If the item is not `Processing`.
    pub fn fail(&mut self, message: impl Into<String>) {
        assert_eq!(
            self.state,
            ItemState::Processing,
            "failing item {}:{} that was never claimed",
            self.key,
            self.start
        );
        self.error = Some(message.into());
        self.state = ItemState::Error;
    }

    /// `Error -> Awaiting`, clearing the error. No-op in any other state.
    ///
    /// Returns true if the item transitioned.
    pub fn retry(&mut self) -> bool {
        if self.state != ItemState::Error {
            return false;
        }
        self.error = None;
        self.state = ItemState::Awaiting;
        true
    }

    /// Puts a settled (`Done` or `Error`) item back to `Awaiting` as part of a
    /// whole-key retry, dropping whatever it had accumulated so the page is
    /// refetched from scratch. In-flight items are left alone.
    pub fn reset(&mut self) -> bool {
        match self.state {
            ItemState::Error => self.retry(),
            ItemState::Done => {
                self.results.clear();
                self.hits = 0;
                self.error = None;
                self.state = ItemState::Awaiting;
                true
            }
            ItemState::Awaiting | ItemState::Processing => false,
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn part(mpn: &str) -> Part {
        Part {
            mpn: mpn.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_item_starts_awaiting() {
        let item = CacheItem::new("lm317", 0, 1);
        assert_eq!(item.state(), ItemState::Awaiting);
        assert!(item.error().is_none());
        assert!(item.results().is_empty());
    }

    #[test]
    fn test_failed_item() {
        let item = CacheItem::failed("lm317", 0, 1, "no client");
        assert_eq!(item.state(), ItemState::Error);
        assert_eq!(item.error(), Some("no client"));
    }

    #[test]
    fn test_claim_only_from_awaiting() {
        let mut item = CacheItem::new("lm317", 0, 1);
        assert!(item.claim());
        assert_eq!(item.state(), ItemState::Processing);
        assert!(!item.claim(), "a processing item cannot be claimed twice");
    }

    #[test]
    fn test_complete_with_parts() {
        let mut item = CacheItem::new("lm317", 0, 1);
        item.claim();
        item.complete(vec![part("LM317T")], 5, "advisory");

        assert_eq!(item.state(), ItemState::Done);
        assert_eq!(item.hits(), 5);
        assert_eq!(item.results().len(), 1);
        assert!(item.error().is_none());
    }

    #[test]
    fn test_complete_empty_is_done_with_advisory() {
        let mut item = CacheItem::new("nothing", 0, 1);
        item.claim();
        item.complete(Vec::new(), 0, "widen your search");

        assert_eq!(item.state(), ItemState::Done);
        assert_eq!(item.error(), Some("widen your search"));
    }

    #[test]
    #[should_panic(expected = "never claimed")]
    fn test_complete_unclaimed_panics() {
        let mut item = CacheItem::new("lm317", 0, 1);
        item.complete(Vec::new(), 0, "");
    }

    #[test]
    fn test_fail_and_retry() {
        let mut item = CacheItem::new("lm317", 0, 1);
        item.claim();
        item.fail("boom");
        assert_eq!(item.state(), ItemState::Error);
        assert_eq!(item.error(), Some("boom"));

        assert!(item.retry());
        assert_eq!(item.state(), ItemState::Awaiting);
        assert!(item.error().is_none());

        // Second retry on an awaiting item does nothing
        assert!(!item.retry());
        assert_eq!(item.state(), ItemState::Awaiting);
    }

    #[test]
    fn test_reset_done_clears_results() {
        let mut item = CacheItem::new("lm317", 0, 1);
        item.claim();
        item.complete(vec![part("LM317T")], 5, "");

        assert!(item.reset());
        assert_eq!(item.state(), ItemState::Awaiting);
        assert!(item.results().is_empty());
        assert_eq!(item.hits(), 0);
    }

    #[test]
    fn test_reset_leaves_in_flight_items() {
        let mut item = CacheItem::new("lm317", 0, 1);
        item.claim();
        assert!(!item.reset());
        assert_eq!(item.state(), ItemState::Processing);
    }

    #[test]
    fn test_query_uses_key_as_reference() {
        let item = CacheItem::new("ina225*", 2, 1);
        let query = item.query();
        assert_eq!(query.mpn, "ina225*");
        assert_eq!(query.reference, "ina225*");
        assert_eq!(query.start, 2);
        assert_eq!(query.limit, 1);
    }
}
