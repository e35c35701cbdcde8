//! Tests for the bulk health-check runner: isolated failures, per-service
//! updates, selected subsets and the settle-then-summarize contract.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::broadcast;

use judolwatch::config::{HealthConfig, ServiceTarget};
use judolwatch::domain::events::NotificationEvent;
use judolwatch::error::PipelineError;
use judolwatch::models::health::HealthStatus;
use judolwatch::services::health::{BulkHealthCheckRunner, HealthProbe};

struct ScriptedProbe {
    failing: HashSet<String>,
    probed: Mutex<Vec<String>>,
}

impl ScriptedProbe {
    fn new(failing: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            failing: failing.iter().map(|s| (*s).to_string()).collect(),
            probed: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl HealthProbe for ScriptedProbe {
    async fn probe(&self, target: &ServiceTarget) -> Result<u64, PipelineError> {
        self.probed.lock().unwrap().push(target.id.clone());
        if self.failing.contains(&target.id) {
            return Err(PipelineError::Network("connection refused".to_string()));
        }
        Ok(12)
    }
}

fn config(ids: &[&str], concurrency: usize) -> HealthConfig {
    HealthConfig {
        probe_concurrency: concurrency,
        probe_timeout_seconds: 5,
        services: ids
            .iter()
            .map(|id| ServiceTarget {
                id: (*id).to_string(),
                url: format!("http://{id}.internal/health"),
            })
            .collect(),
    }
}

#[tokio::test]
async fn one_failing_probe_does_not_disturb_its_siblings() {
    let probe = ScriptedProbe::new(&["scraper"]);
    let (bus, _) = broadcast::channel(32);
    let runner = BulkHealthCheckRunner::new(
        probe.clone(),
        &config(&["backend", "scraper", "inference"], 2),
        bus,
    );

    let summary = runner.run_all().await;

    assert_eq!(summary.checked, 3);
    assert_eq!(summary.ok, 2);
    assert_eq!(summary.failed, 1);

    let scraper = runner.status_of("scraper").unwrap();
    assert_eq!(scraper.status, HealthStatus::Error);
    assert!(scraper.detail.as_deref().unwrap().contains("connection refused"));
    assert_eq!(scraper.response_time_ms, None);

    for healthy in ["backend", "inference"] {
        let health = runner.status_of(healthy).unwrap();
        assert_eq!(health.status, HealthStatus::Ok);
        assert_eq!(health.response_time_ms, Some(12));
        assert!(health.last_checked_at.is_some());
    }
}

#[tokio::test]
async fn sequential_baseline_probes_every_target_once() {
    let probe = ScriptedProbe::new(&[]);
    let (bus, _) = broadcast::channel(32);
    let runner = BulkHealthCheckRunner::new(
        probe.clone(),
        &config(&["a", "b", "c", "d"], 1),
        bus,
    );

    let summary = runner.run_all().await;
    assert_eq!(summary.checked, 4);

    let mut probed = probe.probed.lock().unwrap().clone();
    probed.sort();
    assert_eq!(probed, vec!["a", "b", "c", "d"]);
}

#[tokio::test]
async fn selected_subset_leaves_the_rest_unknown() {
    let probe = ScriptedProbe::new(&[]);
    let (bus, _) = broadcast::channel(32);
    let runner = BulkHealthCheckRunner::new(
        probe.clone(),
        &config(&["backend", "scraper", "inference"], 4),
        bus,
    );

    let summary = runner
        .run_selected(&["backend".to_string(), "ghost".to_string()])
        .await;

    assert_eq!(summary.checked, 1, "unknown ids are skipped, not probed");
    assert_eq!(
        runner.status_of("backend").unwrap().status,
        HealthStatus::Ok
    );
    assert_eq!(
        runner.status_of("scraper").unwrap().status,
        HealthStatus::Unknown
    );
    assert_eq!(
        runner.status_of("inference").unwrap().status,
        HealthStatus::Unknown
    );
}

#[tokio::test]
async fn completion_event_arrives_after_every_probe_settled() {
    let probe = ScriptedProbe::new(&["b"]);
    let (bus, mut rx) = broadcast::channel(32);
    let runner = BulkHealthCheckRunner::new(probe, &config(&["a", "b", "c"], 3), bus);

    runner.run_all().await;

    let mut progress = 0;
    let mut finished_at_end = false;
    while let Ok(event) = rx.try_recv() {
        match event {
            NotificationEvent::HealthCheckStarted { total } => assert_eq!(total, 3),
            NotificationEvent::HealthCheckProgress { current, total, .. } => {
                progress += 1;
                assert!(current <= total);
            }
            NotificationEvent::HealthCheckFinished { checked } => {
                assert_eq!(checked, 3);
                assert_eq!(progress, 3, "summary must come after every probe settled");
                finished_at_end = true;
            }
            _ => {}
        }
    }
    assert!(finished_at_end);
}
