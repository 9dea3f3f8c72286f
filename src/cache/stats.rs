//! Dispatch Statistics Module
//!
//! Tracks batching activity: how often each trigger fired, how many items
//! were sent, and how many came back as errors.

use serde::Serialize;

// == Dispatch Trigger ==
/// What caused a dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchTrigger {
    /// The awaiting count reached the threshold
    Count,
    /// The idle timer fired
    Idle,
}

// == Dispatch Stats ==
/// Batching counters.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DispatchStats {
    /// Number of remote calls issued
    pub batches: u64,
    /// Number of items carried by those calls
    pub items_dispatched: u64,
    /// Dispatches caused by the count trigger
    pub count_triggers: u64,
    /// Dispatches caused by the idle timer
    pub idle_triggers: u64,
    /// Batches that failed as a whole
    pub batch_failures: u64,
    /// Items that ended in `Error` for an item-level reason
    pub item_errors: u64,
    /// Current number of items in the store
    pub total_items: usize,
    /// Items per state, taken at read time
    pub awaiting: usize,
    pub processing: usize,
    pub done: usize,
    pub errored: usize,
}

impl DispatchStats {
    // == Constructor ==
    /// Creates a new DispatchStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Average Batch Size ==
    /// Returns items_dispatched / batches, or 0.0 if nothing was dispatched.
    pub fn average_batch_size(&self) -> f64 {
        if self.batches == 0 {
            0.0
        } else {
            self.items_dispatched as f64 / self.batches as f64
        }
    }

    // == Record Batch ==
    /// Records one dispatched batch of `size` items.
    pub fn record_batch(&mut self, trigger: DispatchTrigger, size: usize) {
        self.batches += 1;
        self.items_dispatched += size as u64;
        match trigger {
            DispatchTrigger::Count => self.count_triggers += 1,
            DispatchTrigger::Idle => self.idle_triggers += 1,
        }
    }

    // == Record Failures ==
    pub fn record_batch_failure(&mut self) {
        self.batch_failures += 1;
    }

    pub fn record_item_error(&mut self) {
        self.item_errors += 1;
    }

    // == Update Item Count ==
    /// Updates the total items count.
    pub fn set_total_items(&mut self, count: usize) {
        self.total_items = count;
    }

    /// Records how many items are in each state.
    pub fn set_census(&mut self, awaiting: usize, processing: usize, done: usize, errored: usize) {
        self.awaiting = awaiting;
        self.processing = processing;
        self.done = done;
        self.errored = errored;
    }
}
