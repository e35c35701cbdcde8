//! Background refresh loop for the daemon command.
//!
//! On each tick the current domain listing key is re-resolved (keeping the
//! cache warm past its stale window) and a full health sweep runs. The
//! tick cadence comes from the configured schedule label through the same
//! translation the backend schedule uses, or from a raw cron expression
//! when one is set.

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::RwLock;
use tokio::time::Duration;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

use crate::config::SchedulerConfig;
use crate::services::domain_query::DomainQueryEngine;
use crate::services::health::BulkHealthCheckRunner;
use crate::services::schedule::ScheduleOption;

pub struct RefreshScheduler {
    engine: DomainQueryEngine,
    health: Arc<BulkHealthCheckRunner>,
    config: SchedulerConfig,
    running: Arc<RwLock<bool>>,
}

impl RefreshScheduler {
    #[must_use]
    pub fn new(
        engine: DomainQueryEngine,
        health: Arc<BulkHealthCheckRunner>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            engine,
            health,
            config,
            running: Arc::new(RwLock::new(false)),
        }
    }

    fn cron_expression(&self) -> Result<String> {
        if let Some(cron) = &self.config.cron_expression {
            return Ok(cron.clone());
        }
        let option = ScheduleOption::from_label(&self.config.interval)?;
        Ok(option.cron().to_string())
    }

    pub async fn start(&self) -> Result<()> {
        if !self.config.enabled {
            info!("Refresh scheduler is disabled in config");
            return Ok(());
        }

        let cron_expr = self.cron_expression()?;
        *self.running.write().await = true;

        let mut sched = JobScheduler::new().await?;

        let engine = self.engine.clone();
        let health = Arc::clone(&self.health);
        let running = Arc::clone(&self.running);

        let job = Job::new_async(cron_expr.as_str(), move |_uuid, _lock| {
            let engine = engine.clone();
            let health = Arc::clone(&health);
            let running = Arc::clone(&running);
            Box::pin(async move {
                if !*running.read().await {
                    return;
                }
                if let Err(e) = run_tick(&engine, &health).await {
                    error!("Scheduled refresh failed: {}", e);
                }
            })
        })?;

        sched.add(job).await?;
        sched.start().await?;

        info!("Refresh scheduler running with cron: {}", cron_expr);

        loop {
            if !*self.running.read().await {
                break;
            }
            tokio::time::sleep(Duration::from_secs(1)).await;
        }

        sched.shutdown().await?;
        Ok(())
    }

    pub async fn stop(&self) {
        info!("Stopping refresh scheduler...");
        *self.running.write().await = false;
    }

    pub async fn is_running(&self) -> bool {
        *self.running.read().await
    }

    pub async fn run_once(&self) -> Result<()> {
        info!("Running manual refresh...");
        run_tick(&self.engine, &self.health).await
    }
}

async fn run_tick(engine: &DomainQueryEngine, health: &BulkHealthCheckRunner) -> Result<()> {
    engine.refresh().await?;

    let summary = health.run_all().await;
    info!(
        "Refresh tick complete: {}/{} services ok",
        summary.ok, summary.checked
    );
    Ok(())
}
