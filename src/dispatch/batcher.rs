//! Batch Dispatcher
//!
//! Turns individual lookups into pages in the cache store and sends every
//! awaiting page in one remote call when either trigger fires:
//!
//! - **count**: the number of awaiting items across the store reaches the
//!   threshold; the dispatch runs inline on the caller that enqueued.
//! - **idle**: no enqueue happened for the idle interval; the dispatch runs
//!   from the background idle task (see `tasks::spawn_idle_trigger`).
//!
//! All store mutation happens under one write lock. The lock is never held
//! across the remote call.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::futures::Notified;
use tokio::sync::{Notify, RwLock};
use tracing::{debug, error, warn};

use crate::cache::{
    normalize, CacheItem, CacheStore, DispatchStats, DispatchTrigger, ItemState, PageId,
};
use crate::config::DispatchConfig;
use crate::credentials::CredentialProvider;
use crate::dispatch::demux;
use crate::error::{MISSING_CLIENT, NO_RESULT};
use crate::remote::{MatchRequest, MultiMatch, Part, PartsMatchQuery, RemoteClient, RemoteError};

/// What `request_next_page` decided to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PageRequest {
    /// A new page was created and is awaiting dispatch
    Enqueued { start: u32 },
    /// A new page was created directly in `Error` (no credential)
    Rejected { start: u32 },
    /// The key had errors; its pages were put back to `Awaiting`
    Retried { pages: usize },
    /// A fetch is in flight, the key is exhausted or the ceiling was reached
    Unchanged,
}

/// Read-only view of one page.
#[derive(Debug, Clone, Serialize)]
pub struct PageSummary {
    pub start: u32,
    pub limit: u32,
    pub state: ItemState,
    pub error: Option<String>,
    pub hits: u64,
    pub results: usize,
}

// == Batch Dispatcher ==
/// Owns the cache store and coordinates batching against the remote client.
pub struct BatchDispatcher {
    store: RwLock<CacheStore>,
    client: Arc<dyn RemoteClient>,
    credentials: Arc<dyn CredentialProvider>,
    config: DispatchConfig,
    /// Arms (or re-arms) the idle trigger
    idle: Notify,
    /// Signalled after every batch settles
    settled: Notify,
}

impl BatchDispatcher {
    // == Constructor ==
    /// Creates a dispatcher with an empty store.
    ///
    /// The idle trigger only fires once `tasks::spawn_idle_trigger` is running
    /// for this dispatcher.
    pub fn new(
        config: DispatchConfig,
        client: Arc<dyn RemoteClient>,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Self {
        Self {
            store: RwLock::new(CacheStore::new()),
            client,
            credentials,
            config,
            idle: Notify::new(),
            settled: Notify::new(),
        }
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    // == Request Next Page ==
    /// Asks for more data for `raw_key`; call on every lookup evaluation.
    ///
    /// - no page yet: create page 0
    /// - any page in `Error`: put every page of the key back to `Awaiting`
    /// - nothing in flight, below the ceiling and not exhausted: create the next page
    /// - otherwise nothing happens
    pub async fn request_next_page(&self, raw_key: &str) -> PageRequest {
        let key = normalize(raw_key);
        if key.is_empty() {
            debug!("ignoring lookup {:?} with an empty key", raw_key);
            return PageRequest::Unchanged;
        }

        let (outcome, awaiting) = {
            let mut store = self.store.write().await;
            let outcome = match store.max_start(&key) {
                None => self.enqueue(&mut store, &key, 0),
                Some(_) if store.has_error(&key) => {
                    let pages = store.reset_key(&key);
                    debug!("retrying {} page(s) of {}", pages, key);
                    PageRequest::Retried { pages }
                }
                Some(max_start)
                    if !store.has_in_flight(&key)
                        && max_start < self.config.record_start_max
                        && !store.is_exhausted(&key) =>
                {
                    self.enqueue(&mut store, &key, max_start + self.config.record_limit)
                }
                Some(_) => PageRequest::Unchanged,
            };
            (outcome, store.count_in_state(ItemState::Awaiting))
        };

        match outcome {
            PageRequest::Enqueued { .. } if awaiting >= self.config.count_trigger => {
                debug!("TRIGGER: count ({} awaiting)", awaiting);
                self.process_query(DispatchTrigger::Count).await;
            }
            PageRequest::Enqueued { .. } | PageRequest::Retried { .. } => self.arm_idle_timer(),
            PageRequest::Rejected { .. } | PageRequest::Unchanged => {}
        }

        outcome
    }

    /// Creates page `start` of `key`. Must be called with the store locked.
    fn enqueue(&self, store: &mut CacheStore, key: &str, start: u32) -> PageRequest {
        let limit = self.config.record_limit;

        if self.credentials.current_token().is_none() {
            error!("supply client is not specified; {}:{} not queued", key, start);
            store.insert(CacheItem::failed(key, start, limit, MISSING_CLIENT));
            return PageRequest::Rejected { start };
        }

        debug!("adding {}:{}:{} to the queue", key, start, limit);
        store.insert(CacheItem::new(key, start, limit));
        PageRequest::Enqueued { start }
    }

    // == Process Query ==
    /// Claims every awaiting page and resolves them with one remote call.
    ///
    /// Returns the number of pages that were sent.
    pub async fn process_query(&self, trigger: DispatchTrigger) -> usize {
        let (batch, queries, epoch) = {
            let mut store = self.store.write().await;
            let batch = store.claim_awaiting();
            if !batch.is_empty() {
                store.stats_mut().record_batch(trigger, batch.len());
            }
            let queries: Vec<PartsMatchQuery> = batch
                .iter()
                .filter_map(|(key, start)| store.find(key, *start).map(CacheItem::query))
                .collect();
            (batch, queries, store.epoch())
        };

        if batch.is_empty() {
            debug!("no parts to search");
            return 0;
        }

        debug!("performing search of {} items ({:?} trigger)", batch.len(), trigger);
        let result = self.call_remote(queries).await;

        {
            let mut store = self.store.write().await;
            if store.epoch() != epoch {
                debug!("cache was cleared while a batch was in flight, dropping response");
            } else {
                Self::settle(&mut store, &batch, result);
            }
        }

        self.settled.notify_waiters();
        batch.len()
    }

    async fn call_remote(
        &self,
        queries: Vec<PartsMatchQuery>,
    ) -> Result<Vec<MultiMatch>, RemoteError> {
        let token = self
            .credentials
            .current_token()
            .ok_or(RemoteError::MissingToken)?;

        let request = MatchRequest {
            queries,
            token,
            features: self.credentials.features(),
            timeout: self.config.http_timeout,
        };

        tokio::time::timeout(self.config.http_timeout, self.client.parts_match(request))
            .await
            .unwrap_or(Err(RemoteError::Timeout))
    }

    fn settle(
        store: &mut CacheStore,
        batch: &[PageId],
        result: Result<Vec<MultiMatch>, RemoteError>,
    ) {
        match result {
            Err(RemoteError::MissingToken) => {
                error!("supply client is not specified; failing batch of {}", batch.len());
                store.fail_batch(batch, MISSING_CLIENT);
            }
            Err(e) => {
                warn!("batch of {} failed: {}", batch.len(), e);
                store.fail_batch(batch, &e.batch_message());
            }
            Ok(matches) => {
                for (page, entry) in batch.iter().zip(demux::assign(batch, matches)) {
                    if store.apply_match(page, entry, NO_RESULT) == ItemState::Error {
                        warn!(
                            "response error for {}:{}: {}",
                            page.0,
                            page.1,
                            store.last_error(&page.0).unwrap_or_default()
                        );
                    }
                }
            }
        }
    }

    // == Idle Trigger ==
    /// Starts (or restarts) the idle countdown.
    pub fn arm_idle_timer(&self) {
        self.idle.notify_one();
    }

    /// Resolves when the idle trigger is armed.
    pub(crate) fn idle_armed(&self) -> Notified<'_> {
        self.idle.notified()
    }

    /// Resolves after the next batch settles.
    pub fn settled(&self) -> Notified<'_> {
        self.settled.notified()
    }

    // == Operational Controls ==
    /// Parts of every completed page of the key.
    pub async fn get_parts(&self, raw_key: &str) -> Vec<Part> {
        self.store.read().await.parts_for_key(&normalize(raw_key))
    }

    /// Error text of the first failed page of the key, if any.
    pub async fn get_last_error(&self, raw_key: &str) -> Option<String> {
        self.store.read().await.last_error(&normalize(raw_key))
    }

    /// True once everything the remote service has for the key was fetched.
    pub async fn is_exhausted(&self, raw_key: &str) -> bool {
        self.store.read().await.is_exhausted(&normalize(raw_key))
    }

    /// True if a page of the key is awaiting dispatch or in flight.
    pub async fn is_pending(&self, raw_key: &str) -> bool {
        self.store.read().await.has_in_flight(&normalize(raw_key))
    }

    /// Summary of every page of the key.
    pub async fn pages(&self, raw_key: &str) -> Vec<PageSummary> {
        let key = normalize(raw_key);
        self.store
            .read()
            .await
            .items_for_key(&key)
            .into_iter()
            .map(|item| PageSummary {
                start: item.start(),
                limit: item.limit(),
                state: item.state(),
                error: item.error().map(str::to_string),
                hits: item.hits(),
                results: item.results().len(),
            })
            .collect()
    }

    /// Drops every cached page; later lookups start from scratch.
    pub async fn clear_all(&self) -> usize {
        let mut store = self.store.write().await;
        let dropped = store.len();
        store.clear();
        debug!("cache cleared, {} items dropped", dropped);
        dropped
    }

    pub async fn stats(&self) -> DispatchStats {
        self.store.read().await.stats()
    }
}
