//! Bulk health checks over the configured service targets.
//!
//! Probes run with bounded concurrency (1 falls back to the sequential
//! baseline). Each probe settles into its own service's state under one
//! lock acquisition, so two probes finishing out of order can never tear
//! an update, and one failing probe is recorded as data without touching
//! its siblings. The aggregate summary goes out only after every targeted
//! probe has settled.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use async_trait::async_trait;
use chrono::Utc;
use futures::StreamExt;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::config::{HealthConfig, ServiceTarget};
use crate::domain::events::NotificationEvent;
use crate::error::PipelineError;
use crate::models::health::{HealthStatus, HealthSummary, ServiceHealth};

/// One async probe against one service. Implemented over HTTP in
/// production, faked in tests.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    /// Returns the measured response time on success.
    async fn probe(&self, target: &ServiceTarget) -> Result<u64, PipelineError>;
}

/// Default probe: a GET against the target URL, healthy on any 2xx.
pub struct HttpHealthProbe {
    client: reqwest::Client,
}

impl HttpHealthProbe {
    pub fn new(timeout_seconds: u64) -> Result<Self, PipelineError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| PipelineError::Config(format!("failed to build probe client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HealthProbe for HttpHealthProbe {
    async fn probe(&self, target: &ServiceTarget) -> Result<u64, PipelineError> {
        let started = Instant::now();
        let response = self.client.get(&target.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(PipelineError::server(
                status.as_u16(),
                format!("{} returned {}", target.id, status),
            ));
        }
        Ok(u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX))
    }
}

pub struct BulkHealthCheckRunner {
    probe: Arc<dyn HealthProbe>,
    targets: Vec<ServiceTarget>,
    concurrency: usize,
    statuses: Arc<Mutex<HashMap<String, ServiceHealth>>>,
    event_bus: broadcast::Sender<NotificationEvent>,
}

impl BulkHealthCheckRunner {
    #[must_use]
    pub fn new(
        probe: Arc<dyn HealthProbe>,
        config: &HealthConfig,
        event_bus: broadcast::Sender<NotificationEvent>,
    ) -> Self {
        let statuses = config
            .services
            .iter()
            .map(|t| (t.id.clone(), ServiceHealth::unknown(&t.id)))
            .collect();
        Self {
            probe,
            targets: config.services.clone(),
            concurrency: config.probe_concurrency.max(1),
            statuses: Arc::new(Mutex::new(statuses)),
            event_bus,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, ServiceHealth>> {
        self.statuses.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sweeps every configured service.
    pub async fn run_all(&self) -> HealthSummary {
        let ids: Vec<String> = self.targets.iter().map(|t| t.id.clone()).collect();
        self.run_selected(&ids).await
    }

    /// Probes the selected subset. Unknown ids are skipped with a warning;
    /// each probe settles independently and the summary is reported once
    /// all of them have.
    pub async fn run_selected(&self, ids: &[String]) -> HealthSummary {
        let targets: Vec<ServiceTarget> = ids
            .iter()
            .filter_map(|id| {
                let target = self.targets.iter().find(|t| &t.id == id).cloned();
                if target.is_none() {
                    warn!("Skipping unknown service id '{}'", id);
                }
                target
            })
            .collect();

        let total = targets.len();
        let _ = self
            .event_bus
            .send(NotificationEvent::HealthCheckStarted { total });

        let completed = AtomicUsize::new(0);
        let outcomes: Vec<HealthStatus> = futures::stream::iter(targets)
            .map(|target| {
                let completed = &completed;
                async move {
                    let health = self.probe_one(&target).await;
                    let status = health.status;

                    // One lock acquisition per settled probe; the write is
                    // all-or-nothing for this service.
                    self.lock().insert(target.id.clone(), health);

                    let current = completed.fetch_add(1, Ordering::SeqCst) + 1;
                    let _ = self.event_bus.send(NotificationEvent::HealthCheckProgress {
                        current,
                        total,
                        service_id: target.id.clone(),
                    });
                    status
                }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let summary = HealthSummary {
            checked: outcomes.len(),
            ok: outcomes.iter().filter(|s| **s == HealthStatus::Ok).count(),
            failed: outcomes
                .iter()
                .filter(|s| **s == HealthStatus::Error)
                .count(),
        };

        let _ = self.event_bus.send(NotificationEvent::HealthCheckFinished {
            checked: summary.checked,
        });
        info!(
            "Health check finished: {}/{} ok",
            summary.ok, summary.checked
        );
        summary
    }

    /// Checks one service by id, outside any bulk sweep.
    pub async fn run_single(&self, id: &str) -> Option<ServiceHealth> {
        let target = self.targets.iter().find(|t| t.id == id)?.clone();
        let health = self.probe_one(&target).await;
        self.lock().insert(target.id.clone(), health.clone());
        Some(health)
    }

    async fn probe_one(&self, target: &ServiceTarget) -> ServiceHealth {
        let checked_at = Utc::now().to_rfc3339();
        match self.probe.probe(target).await {
            Ok(elapsed_ms) => {
                debug!("Service {} healthy in {}ms", target.id, elapsed_ms);
                ServiceHealth {
                    id: target.id.clone(),
                    status: HealthStatus::Ok,
                    last_checked_at: Some(checked_at),
                    response_time_ms: Some(elapsed_ms),
                    detail: None,
                }
            }
            // A failed probe is a data point, never an abort.
            Err(e) => {
                debug!("Service {} unhealthy: {}", target.id, e);
                ServiceHealth {
                    id: target.id.clone(),
                    status: HealthStatus::Error,
                    last_checked_at: Some(checked_at),
                    response_time_ms: None,
                    detail: Some(e.to_string()),
                }
            }
        }
    }

    /// Snapshot of every service's last known state.
    #[must_use]
    pub fn statuses(&self) -> Vec<ServiceHealth> {
        let mut all: Vec<ServiceHealth> = self.lock().values().cloned().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }

    #[must_use]
    pub fn status_of(&self, id: &str) -> Option<ServiceHealth> {
        self.lock().get(id).cloned()
    }
}
