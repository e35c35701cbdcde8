//! Draft state for a verification decision on one opened domain record.
//!
//! The machine diffs a local (status, reasoning) edit against the selected
//! crawl's last-known persisted value. Selecting another crawl re-seeds the
//! baseline and discards any uncommitted edit without a confirmation
//! prompt: last-write-wins, a known UX trade-off.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::debug;

use crate::domain::events::NotificationEvent;
use crate::error::PipelineError;
use crate::models::domain::{DomainDetail, DomainStatus};

/// The one backend call a commit needs; kept as a seam so the machine can
/// be driven against a fake in tests.
#[async_trait]
pub trait VerificationBackend: Send + Sync {
    async fn update_status(&self, id: i64, status: DomainStatus) -> Result<(), PipelineError>;
}

#[async_trait]
impl VerificationBackend for crate::clients::BackendClient {
    async fn update_status(&self, id: i64, status: DomainStatus) -> Result<(), PipelineError> {
        self.update_domain_status(id, status).await.map(|_| ())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftState {
    Clean,
    Dirty,
    Committing,
}

pub struct VerificationDraft {
    backend: Arc<dyn VerificationBackend>,
    event_bus: broadcast::Sender<NotificationEvent>,
    record_id: i64,
    detail: DomainDetail,
    crawl_index: usize,
    baseline_status: DomainStatus,
    baseline_reasoning: String,
    draft_status: DomainStatus,
    draft_reasoning: String,
    state: DraftState,
}

impl fmt::Debug for VerificationDraft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerificationDraft")
            .field("record_id", &self.record_id)
            .field("detail", &self.detail)
            .field("crawl_index", &self.crawl_index)
            .field("baseline_status", &self.baseline_status)
            .field("baseline_reasoning", &self.baseline_reasoning)
            .field("draft_status", &self.draft_status)
            .field("draft_reasoning", &self.draft_reasoning)
            .field("state", &self.state)
            .finish()
    }
}

impl VerificationDraft {
    /// Seeds a draft from the selected crawl of a freshly fetched record.
    pub fn open(
        backend: Arc<dyn VerificationBackend>,
        event_bus: broadcast::Sender<NotificationEvent>,
        record_id: i64,
        detail: DomainDetail,
        crawl_index: usize,
    ) -> Result<Self, PipelineError> {
        let crawl = detail.crawls.get(crawl_index).ok_or_else(|| {
            PipelineError::validation(format!(
                "crawl index {crawl_index} out of range ({} crawls)",
                detail.crawls.len()
            ))
        })?;

        let status = crawl.status;
        let reasoning = crawl.reasoning.clone().unwrap_or_default();
        Ok(Self {
            backend,
            event_bus,
            record_id,
            crawl_index,
            baseline_status: status,
            baseline_reasoning: reasoning.clone(),
            draft_status: status,
            draft_reasoning: reasoning,
            state: DraftState::Clean,
            detail,
        })
    }

    /// Re-seeds from another crawl of the same record. Any uncommitted
    /// edit is discarded.
    pub fn select_crawl(&mut self, crawl_index: usize) -> Result<(), PipelineError> {
        let crawl = self.detail.crawls.get(crawl_index).ok_or_else(|| {
            PipelineError::validation(format!(
                "crawl index {crawl_index} out of range ({} crawls)",
                self.detail.crawls.len()
            ))
        })?;

        if self.state == DraftState::Dirty {
            debug!(
                "Discarding uncommitted draft for domain {} on crawl change",
                self.record_id
            );
        }
        self.crawl_index = crawl_index;
        self.baseline_status = crawl.status;
        self.baseline_reasoning = crawl.reasoning.clone().unwrap_or_default();
        self.draft_status = self.baseline_status;
        self.draft_reasoning = self.baseline_reasoning.clone();
        self.state = DraftState::Clean;
        Ok(())
    }

    pub fn set_status(&mut self, status: DomainStatus) {
        self.draft_status = status;
        self.recompute();
    }

    pub fn set_reasoning(&mut self, reasoning: impl Into<String>) {
        self.draft_reasoning = reasoning.into();
        self.recompute();
    }

    fn recompute(&mut self) {
        self.state = if self.draft_status == self.baseline_status
            && self.draft_reasoning == self.baseline_reasoning
        {
            DraftState::Clean
        } else {
            DraftState::Dirty
        };
    }

    /// Persists the draft. Valid only from `Dirty`.
    ///
    /// On success the baseline catches up to the draft and interested
    /// views get a `DomainVerified` event. On failure the draft stays
    /// dirty, edits intact, ready to resubmit.
    pub async fn commit(&mut self) -> Result<(), PipelineError> {
        if self.state != DraftState::Dirty {
            return Err(PipelineError::validation(
                "nothing to commit: draft matches the persisted record",
            ));
        }

        self.state = DraftState::Committing;
        match self
            .backend
            .update_status(self.record_id, self.draft_status)
            .await
        {
            Ok(()) => {
                self.baseline_status = self.draft_status;
                self.baseline_reasoning = self.draft_reasoning.clone();
                // Keep our snapshot of the record in step so re-selecting
                // this crawl later seeds from what the server now holds.
                if let Some(crawl) = self.detail.crawls.get_mut(self.crawl_index) {
                    crawl.status = self.draft_status;
                    crawl.reasoning = Some(self.draft_reasoning.clone());
                }
                self.state = DraftState::Clean;
                let _ = self.event_bus.send(NotificationEvent::DomainVerified {
                    domain_id: self.record_id,
                    status: self.draft_status,
                    reasoning: self.draft_reasoning.clone(),
                });
                Ok(())
            }
            Err(e) => {
                self.state = DraftState::Dirty;
                Err(e)
            }
        }
    }

    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        matches!(self.state, DraftState::Dirty)
    }

    #[must_use]
    pub const fn state(&self) -> DraftState {
        self.state
    }

    #[must_use]
    pub const fn record_id(&self) -> i64 {
        self.record_id
    }

    #[must_use]
    pub const fn crawl_index(&self) -> usize {
        self.crawl_index
    }

    #[must_use]
    pub const fn draft(&self) -> (DomainStatus, &String) {
        (self.draft_status, &self.draft_reasoning)
    }

    #[must_use]
    pub const fn baseline(&self) -> (DomainStatus, &String) {
        (self.baseline_status, &self.baseline_reasoning)
    }
}
