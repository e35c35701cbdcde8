//! Crawl dispatch: keyword working set, schedule saves, ad-hoc jobs.
//!
//! Keywords added in the UI live in the working set with a local id until
//! `save_configuration` lands; only server-assigned ids ever reach the
//! backend's edit/delete endpoints. Ad-hoc dispatches fold the backend's
//! per-keyword results into aggregate counts, treating malformed items as
//! zeros rather than failures.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::domain::events::NotificationEvent;
use crate::error::PipelineError;
use crate::models::keyword::{
    CrawlEngine, KeywordCrawlResult, KeywordEntry, KeywordId, KeywordRecord, MultiKeywordResponse,
};
use crate::services::schedule::ScheduleOption;

/// Backend surface the coordinator needs; faked in tests.
#[async_trait]
pub trait DispatchBackend: Send + Sync {
    async fn save_schedule(
        &self,
        keywords: &[String],
        schedule: &str,
        crawl_engine: &str,
    ) -> Result<(), PipelineError>;

    async fn dispatch_crawl(
        &self,
        keywords: &[String],
        crawl_engine: &str,
        ai_reasoning: bool,
        tld_whitelist: Option<&str>,
    ) -> Result<MultiKeywordResponse, PipelineError>;
}

#[async_trait]
impl DispatchBackend for crate::clients::BackendClient {
    async fn save_schedule(
        &self,
        keywords: &[String],
        schedule: &str,
        crawl_engine: &str,
    ) -> Result<(), PipelineError> {
        Self::save_schedule(self, keywords, schedule, crawl_engine).await
    }

    async fn dispatch_crawl(
        &self,
        keywords: &[String],
        crawl_engine: &str,
        ai_reasoning: bool,
        tld_whitelist: Option<&str>,
    ) -> Result<MultiKeywordResponse, PipelineError> {
        self.scrape_multi_keyword(keywords, crawl_engine, ai_reasoning, tld_whitelist)
            .await
    }
}

/// Aggregate of one multi-keyword dispatch.
#[derive(Debug, Clone, Default)]
pub struct CrawlAggregate {
    pub total_saved: u64,
    pub total_inference_triggered: u64,
    pub results: Vec<KeywordCrawlResult>,
}

impl CrawlAggregate {
    /// Sums per-keyword counts. The lenient deserializer already turned
    /// malformed fields into zeros, so a bad item dilutes the totals
    /// instead of poisoning the dispatch.
    #[must_use]
    pub fn from_results(results: Vec<KeywordCrawlResult>) -> Self {
        let total_saved = results.iter().map(|r| r.total_saved).sum();
        let total_inference_triggered = results.iter().map(|r| r.inference_triggered).sum();
        Self {
            total_saved,
            total_inference_triggered,
            results,
        }
    }
}

pub struct CrawlDispatchCoordinator {
    backend: Arc<dyn DispatchBackend>,
    event_bus: broadcast::Sender<NotificationEvent>,
    entries: Vec<KeywordEntry>,
}

impl CrawlDispatchCoordinator {
    #[must_use]
    pub const fn new(
        backend: Arc<dyn DispatchBackend>,
        event_bus: broadcast::Sender<NotificationEvent>,
    ) -> Self {
        Self {
            backend,
            event_bus,
            entries: Vec::new(),
        }
    }

    /// Replaces the working set with the server's authoritative list,
    /// dropping any local entries (they either just got persisted or are
    /// being abandoned).
    pub fn set_persisted(&mut self, records: Vec<KeywordRecord>) {
        self.entries = records
            .into_iter()
            .map(|r| KeywordEntry {
                id: KeywordId::Saved(r.id),
                keyword: r.keyword,
            })
            .collect();
    }

    /// Adds a keyword locally under a temporary id. Rejects empty strings
    /// and duplicates; order is preserved.
    pub fn add_local(&mut self, keyword: &str) -> Result<KeywordId, PipelineError> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Err(PipelineError::validation("keyword cannot be empty"));
        }
        if self.entries.iter().any(|e| e.keyword == keyword) {
            return Err(PipelineError::validation(format!(
                "keyword '{keyword}' is already in the list"
            )));
        }
        let id = KeywordId::local();
        self.entries.push(KeywordEntry {
            id,
            keyword: keyword.to_string(),
        });
        Ok(id)
    }

    /// Removes an entry from the working set. For local entries this is
    /// the whole operation; persisted entries additionally need a backend
    /// delete keyed by the server id this returns.
    pub fn remove(&mut self, id: KeywordId) -> Option<KeywordEntry> {
        let idx = self.entries.iter().position(|e| e.id == id)?;
        Some(self.entries.remove(idx))
    }

    #[must_use]
    pub fn entries(&self) -> &[KeywordEntry] {
        &self.entries
    }

    #[must_use]
    pub fn keywords(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.keyword.clone()).collect()
    }

    #[must_use]
    pub fn unsaved(&self) -> usize {
        self.entries.iter().filter(|e| !e.is_persisted()).count()
    }

    /// Persists the full keyword + schedule + engine tuple as one atomic
    /// backend call. The caller should refetch the keyword list afterwards
    /// and feed it back through [`Self::set_persisted`]; the server owns
    /// the generated ids.
    pub async fn save_configuration(
        &self,
        schedule: ScheduleOption,
        engine: CrawlEngine,
    ) -> Result<(), PipelineError> {
        let keywords = self.keywords();
        if keywords.is_empty() {
            return Err(PipelineError::validation(
                "at least one keyword is required before saving a schedule",
            ));
        }

        self.backend
            .save_schedule(&keywords, schedule.cron(), engine.as_str())
            .await?;

        info!(
            "Saved crawl configuration: {} keywords, {} on {}",
            keywords.len(),
            schedule,
            engine
        );
        Ok(())
    }

    /// Fires one ad-hoc crawl over `keywords` and folds the per-keyword
    /// results into aggregate counts.
    pub async fn dispatch_adhoc(
        &self,
        keywords: &[String],
        engine: CrawlEngine,
        ai_reasoning: bool,
        tld_whitelist: &[String],
    ) -> Result<CrawlAggregate, PipelineError> {
        if keywords.is_empty() {
            return Err(PipelineError::validation(
                "at least one keyword is required to dispatch a crawl",
            ));
        }
        if keywords.iter().any(|k| k.trim().is_empty()) {
            return Err(PipelineError::validation("keywords cannot be empty"));
        }

        let _ = self.event_bus.send(NotificationEvent::CrawlDispatchStarted {
            keywords: keywords.len(),
        });

        let tlds = if tld_whitelist.is_empty() {
            None
        } else {
            Some(tld_whitelist.join(","))
        };

        let response = match self
            .backend
            .dispatch_crawl(keywords, engine.as_str(), ai_reasoning, tlds.as_deref())
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!("Crawl dispatch failed: {}", e);
                let _ = self.event_bus.send(NotificationEvent::Error {
                    message: format!("crawl dispatch failed: {e}"),
                });
                return Err(e);
            }
        };

        let aggregate = CrawlAggregate::from_results(response.results);
        let _ = self
            .event_bus
            .send(NotificationEvent::CrawlDispatchFinished {
                total_saved: aggregate.total_saved,
                total_inference_triggered: aggregate.total_inference_triggered,
            });

        info!(
            "Dispatch complete: {} saved, {} inferences across {} keywords",
            aggregate.total_saved,
            aggregate.total_inference_triggered,
            aggregate.results.len()
        );
        Ok(aggregate)
    }
}
