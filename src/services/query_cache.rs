//! Request cache for the domain listing.
//!
//! Keyed by the full [`QueryKey`] tuple. Serves fresh hits without touching
//! the network, answers stale hits immediately while revalidating in the
//! background, deduplicates concurrent fetches for one key, and evicts
//! lazily. A fetch result is only ever committed to the key it was issued
//! for; superseded requests land in the cache for later callers instead of
//! being pushed at whatever the UI is looking at now.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::{Mutex, broadcast, watch};
use tracing::{debug, warn};

use crate::config::CacheConfig;
use crate::domain::events::NotificationEvent;
use crate::error::PipelineError;
use crate::models::domain::PageResult;
use crate::models::query::QueryKey;

/// Source of truth behind the cache. Faked in tests, implemented by
/// `BackendClient` in production.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_page(&self, key: &QueryKey) -> Result<PageResult, PipelineError>;
}

/// Observable lifecycle of one cache slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    Fresh,
    Stale,
    Fetching,
    /// Stale data is still served, but the last revalidation failed; the
    /// next resolver fetches in the foreground and sees the outcome.
    Error,
}

struct CacheEntry {
    data: PageResult,
    fetched_at: Instant,
    revalidation_failed: bool,
}

#[derive(Clone)]
enum FetchPhase {
    Pending,
    Done(Result<PageResult, PipelineError>),
}

struct Inner {
    entries: HashMap<QueryKey, CacheEntry>,
    inflight: HashMap<QueryKey, watch::Sender<FetchPhase>>,
}

#[derive(Clone)]
pub struct QueryCache {
    inner: Arc<Mutex<Inner>>,
    fetcher: Arc<dyn PageFetcher>,
    stale_after: Duration,
    evict_after: Duration,
    event_bus: broadcast::Sender<NotificationEvent>,
}

impl QueryCache {
    #[must_use]
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        stale_after: Duration,
        evict_after: Duration,
        event_bus: broadcast::Sender<NotificationEvent>,
    ) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                entries: HashMap::new(),
                inflight: HashMap::new(),
            })),
            fetcher,
            stale_after,
            evict_after,
            event_bus,
        }
    }

    #[must_use]
    pub fn from_config(
        fetcher: Arc<dyn PageFetcher>,
        config: &CacheConfig,
        event_bus: broadcast::Sender<NotificationEvent>,
    ) -> Self {
        Self::new(
            fetcher,
            Duration::from_secs(config.stale_minutes * 60),
            Duration::from_secs(config.eviction_minutes * 60),
            event_bus,
        )
    }

    /// Resolves one page for `key`.
    ///
    /// Fresh hit: returns the cached page, no network. Stale hit: returns
    /// the cached page and kicks off at most one background revalidation.
    /// Miss (or evicted, or stale-after-failed-revalidation): fetches in
    /// the foreground, sharing any fetch already in flight for this key.
    pub async fn resolve(&self, key: &QueryKey) -> Result<PageResult, PipelineError> {
        let rx = {
            let mut inner = self.inner.lock().await;

            if let Some(entry) = inner.entries.get(key)
                && entry.fetched_at.elapsed() >= self.evict_after
            {
                debug!("Evicting cache entry past eviction window");
                inner.entries.remove(key);
            }

            if let Some(entry) = inner.entries.get(key) {
                if entry.fetched_at.elapsed() < self.stale_after {
                    return Ok(entry.data.clone());
                }
                if !entry.revalidation_failed {
                    let placeholder = entry.data.clone();
                    if !inner.inflight.contains_key(key) {
                        self.spawn_fetch(&mut inner, key, true);
                    }
                    return Ok(placeholder);
                }
                // Stale with a failed revalidation behind it: fall through
                // and make this caller wait on a real fetch.
            }

            match inner.inflight.get(key) {
                Some(tx) => tx.subscribe(),
                None => self.spawn_fetch(&mut inner, key, false),
            }
        };

        Self::await_shared(rx).await
    }

    /// Current state of the slot for `key`, if the cache knows anything
    /// about it. Eviction is not applied here; this is a pure read.
    pub async fn entry_state(&self, key: &QueryKey) -> Option<EntryState> {
        let inner = self.inner.lock().await;
        if let Some(entry) = inner.entries.get(key) {
            let age = entry.fetched_at.elapsed();
            if age >= self.evict_after {
                return None;
            }
            if age < self.stale_after {
                return Some(EntryState::Fresh);
            }
            if entry.revalidation_failed {
                return Some(EntryState::Error);
            }
            return Some(EntryState::Stale);
        }
        inner
            .inflight
            .contains_key(key)
            .then_some(EntryState::Fetching)
    }

    /// Registers an in-flight slot and spawns the fetch as its own task,
    /// so dropping a waiting caller never loses the result: whatever comes
    /// back is committed for this key regardless.
    fn spawn_fetch(
        &self,
        inner: &mut Inner,
        key: &QueryKey,
        background: bool,
    ) -> watch::Receiver<FetchPhase> {
        let (tx, rx) = watch::channel(FetchPhase::Pending);
        inner.inflight.insert(key.clone(), tx);

        let cache = self.clone();
        let fetch_key = key.clone();
        tokio::spawn(async move {
            let _ = cache.run_fetch(fetch_key, background).await;
        });
        rx
    }

    async fn await_shared(
        mut rx: watch::Receiver<FetchPhase>,
    ) -> Result<PageResult, PipelineError> {
        let phase = rx
            .wait_for(|phase| matches!(phase, FetchPhase::Done(_)))
            .await
            .map_err(|_| PipelineError::Network("shared fetch was aborted".to_string()))?
            .clone();
        match phase {
            FetchPhase::Done(result) => result,
            FetchPhase::Pending => {
                Err(PipelineError::Network("shared fetch never settled".to_string()))
            }
        }
    }

    /// Performs the network fetch for `key` and commits the outcome.
    ///
    /// The commit is keyed by `key` alone, so a superseded fetch can never
    /// cross-write another key's slot. Background failures keep the stale
    /// entry and are only logged here; the error itself surfaces to the
    /// next foreground resolver.
    async fn run_fetch(
        &self,
        key: QueryKey,
        background: bool,
    ) -> Result<PageResult, PipelineError> {
        let result = self.fetcher.fetch_page(&key).await;

        {
            let mut inner = self.inner.lock().await;
            match &result {
                Ok(data) => {
                    inner.entries.insert(
                        key.clone(),
                        CacheEntry {
                            data: data.clone(),
                            fetched_at: Instant::now(),
                            revalidation_failed: false,
                        },
                    );
                }
                Err(e) => {
                    if background
                        && let Some(entry) = inner.entries.get_mut(&key)
                    {
                        entry.revalidation_failed = true;
                        warn!("Background revalidation failed, keeping stale page: {}", e);
                    }
                    // A foreground failure never invalidates whatever the
                    // cache already holds for this key.
                }
            }
            if let Some(tx) = inner.inflight.remove(&key) {
                let _ = tx.send(FetchPhase::Done(result.clone()));
            }
        }

        if background && result.is_ok() {
            let _ = self.event_bus.send(NotificationEvent::DomainPageUpdated);
        }

        result
    }
}
