//! Cache Store Module
//!
//! Holds every cache item for the lifetime of the process, keyed by
//! `(key, start)`. The store itself is not synchronized; the dispatcher keeps
//! it behind a single lock so compound check-then-act sequences stay atomic.

use std::collections::HashMap;

use crate::cache::{CacheItem, DispatchStats, ItemState};
use crate::remote::{MultiMatch, Part};

/// Identifies one page of one lookup.
pub type PageId = (String, u32);

// == Cache Store ==
/// Append-mostly collection of cache items.
#[derive(Debug, Default)]
pub struct CacheStore {
    /// Items by (key, start)
    items: HashMap<PageId, CacheItem>,
    /// Page ids in creation order
    order: Vec<PageId>,
    /// Starts per key, in creation order
    pages: HashMap<String, Vec<u32>>,
    /// Bumped on every clear so in-flight batches can tell they are stale
    epoch: u64,
    /// Batching statistics
    stats: DispatchStats,
}

impl CacheStore {
    // == Constructor ==
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    // == Insert ==
    /// Adds a new item. Returns false, leaving the store untouched, if an
    /// item already exists for the same `(key, start)`.
    pub fn insert(&mut self, item: CacheItem) -> bool {
        let id = (item.key().to_string(), item.start());
        if self.items.contains_key(&id) {
            return false;
        }

        self.pages.entry(id.0.clone()).or_default().push(id.1);
        self.order.push(id.clone());
        self.items.insert(id, item);
        self.stats.set_total_items(self.items.len());
        true
    }

    // == Lookup ==
    /// Returns the item for `(key, start)`, if any.
    pub fn find(&self, key: &str, start: u32) -> Option<&CacheItem> {
        self.items.get(&(key.to_string(), start))
    }

    /// Mutable variant of [`find`](Self::find).
    pub fn find_mut(&mut self, key: &str, start: u32) -> Option<&mut CacheItem> {
        self.items.get_mut(&(key.to_string(), start))
    }

    /// All pages for `key`, any state, in creation order.
    pub fn items_for_key(&self, key: &str) -> Vec<&CacheItem> {
        self.pages
            .get(key)
            .map(|starts| {
                starts
                    .iter()
                    .filter_map(|start| self.items.get(&(key.to_string(), *start)))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Results of every `Done` page for `key`, flattened in creation order.
    pub fn parts_for_key(&self, key: &str) -> Vec<Part> {
        self.items_for_key(key)
            .into_iter()
            .filter(|item| item.state() == ItemState::Done)
            .flat_map(|item| item.results().iter().cloned())
            .collect()
    }

    // == Is Exhausted ==
    /// True iff at least one page is `Done` and the accumulated parts equal
    /// the largest hit count any `Done` page reported.
    pub fn is_exhausted(&self, key: &str) -> bool {
        let done: Vec<&CacheItem> = self
            .items_for_key(key)
            .into_iter()
            .filter(|item| item.state() == ItemState::Done)
            .collect();

        let Some(max_hits) = done.iter().map(|item| item.hits()).max() else {
            return false;
        };

        let total: usize = done.iter().map(|item| item.results().len()).sum();
        total as u64 == max_hits
    }

    /// Message of the first page of `key` in `Error`, if any.
    pub fn last_error(&self, key: &str) -> Option<String> {
        self.items_for_key(key)
            .into_iter()
            .find(|item| item.state() == ItemState::Error)
            .and_then(|item| item.error().map(str::to_string))
    }

    pub fn has_error(&self, key: &str) -> bool {
        self.items_for_key(key)
            .iter()
            .any(|item| item.state() == ItemState::Error)
    }

    /// True if any page of `key` is awaiting dispatch or in flight.
    pub fn has_in_flight(&self, key: &str) -> bool {
        self.items_for_key(key)
            .iter()
            .any(|item| matches!(item.state(), ItemState::Awaiting | ItemState::Processing))
    }

    /// Highest `start` among the pages of `key`.
    pub fn max_start(&self, key: &str) -> Option<u32> {
        self.pages.get(key).and_then(|starts| starts.iter().copied().max())
    }

    /// Number of items in `state` across the whole store.
    pub fn count_in_state(&self, state: ItemState) -> usize {
        self.items.values().filter(|item| item.state() == state).count()
    }

    // == Reset Key ==
    /// Whole-key retry: every settled page of `key` goes back to `Awaiting`.
    ///
    /// Returns the number of items that transitioned.
    pub fn reset_key(&mut self, key: &str) -> usize {
        let starts = self.pages.get(key).cloned().unwrap_or_default();
        let mut reset = 0;
        for start in starts {
            if let Some(item) = self.items.get_mut(&(key.to_string(), start)) {
                if item.reset() {
                    reset += 1;
                }
            }
        }
        reset
    }

    // == Claim Awaiting ==
    /// Snapshots every `Awaiting` item in creation order and flips it to
    /// `Processing`, returning the claimed page ids.
    pub fn claim_awaiting(&mut self) -> Vec<PageId> {
        let mut claimed = Vec::new();
        for id in &self.order {
            if let Some(item) = self.items.get_mut(id) {
                if item.claim() {
                    claimed.push(id.clone());
                }
            }
        }
        claimed
    }

    // == Apply Batch ==
    /// Marks every page of a failed batch as `Error` with `message`.
    pub fn fail_batch(&mut self, batch: &[PageId], message: &str) {
        for (key, start) in batch {
            if let Some(item) = self.find_mut(key, *start) {
                item.fail(message);
            }
        }
        self.stats.record_batch_failure();
    }

    /// Applies one response entry to its page.
    ///
    /// `None` means the response carried no entry for this page.
    pub fn apply_match(
        &mut self,
        (key, start): &PageId,
        entry: Option<MultiMatch>,
        advisory: &str,
    ) -> ItemState {
        let Some(item) = self.items.get_mut(&(key.clone(), *start)) else {
            // Cleared while the batch was in flight
            return ItemState::Error;
        };

        match entry {
            None => item.fail(format!("No response was returned for '{}'", key)),
            Some(MultiMatch {
                error: Some(error), ..
            }) if !error.is_empty() => item.fail(error),
            Some(MultiMatch { parts: None, .. }) => {
                item.fail("Query did not provide an adequate response")
            }
            Some(MultiMatch {
                parts: Some(parts),
                hits,
                ..
            }) => item.complete(parts, hits, advisory),
        }

        let state = item.state();
        if state == ItemState::Error {
            self.stats.record_item_error();
        }
        state
    }

    // == Clear ==
    /// Drops every item. Statistics counters are kept.
    pub fn clear(&mut self) {
        self.items.clear();
        self.order.clear();
        self.pages.clear();
        self.epoch += 1;
        self.stats.set_total_items(0);
    }

    /// Current clear generation.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    // == Stats ==
    /// Returns current dispatch statistics.
    pub fn stats(&self) -> DispatchStats {
        let mut stats = self.stats.clone();
        stats.set_total_items(self.items.len());
        stats.set_census(
            self.count_in_state(ItemState::Awaiting),
            self.count_in_state(ItemState::Processing),
            self.count_in_state(ItemState::Done),
            self.count_in_state(ItemState::Error),
        );
        stats
    }

    pub fn stats_mut(&mut self) -> &mut DispatchStats {
        &mut self.stats
    }

    // == Length ==
    /// Returns the current number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    // == Is Empty ==
    /// Returns true if the store holds no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
