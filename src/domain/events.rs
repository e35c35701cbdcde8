//! Domain events for the review pipeline.
//!
//! Sent via the broadcast event bus so list views, the schedule selector
//! and health widgets can reconcile their state without a full refetch.

use serde::Serialize;

use crate::models::domain::DomainStatus;

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", content = "payload")]
pub enum NotificationEvent {
    /// A background revalidation replaced a cached domain page.
    DomainPageUpdated,

    /// A verification commit landed; carries enough for list views to
    /// patch their cached summary rows in place.
    DomainVerified {
        domain_id: i64,
        status: DomainStatus,
        reasoning: String,
    },

    CrawlDispatchStarted {
        keywords: usize,
    },
    CrawlDispatchFinished {
        total_saved: u64,
        total_inference_triggered: u64,
    },

    HealthCheckStarted {
        total: usize,
    },
    HealthCheckProgress {
        current: usize,
        total: usize,
        service_id: String,
    },
    HealthCheckFinished {
        checked: usize,
    },

    /// The backend rejected our credential; local session state is gone.
    SessionExpired,

    Error {
        message: String,
    },
    Info {
        message: String,
    },
}
