//! Service health command handler

use std::sync::Arc;

use crate::config::Config;
use crate::models::health::HealthStatus;
use crate::services::health::{BulkHealthCheckRunner, HttpHealthProbe};

pub async fn cmd_health(config: &Config, ids: &[String]) -> anyhow::Result<()> {
    if config.health.services.is_empty() {
        println!("No services configured.");
        println!();
        println!("Add [[health.services]] entries to config.toml first.");
        return Ok(());
    }

    let bus = super::event_bus(config);
    let probe = Arc::new(HttpHealthProbe::new(config.health.probe_timeout_seconds)?);
    let runner = BulkHealthCheckRunner::new(probe, &config.health, bus);

    let summary = if ids.is_empty() {
        runner.run_all().await
    } else {
        runner.run_selected(ids).await
    };

    println!("Service Health");
    println!("{:-<70}", "");

    for health in runner.statuses() {
        let indicator = match health.status {
            HealthStatus::Ok => "✓",
            HealthStatus::Error => "✗",
            HealthStatus::Unknown => "•",
        };
        let latency = health
            .response_time_ms
            .map(|ms| format!("{ms}ms"))
            .unwrap_or_else(|| "-".to_string());

        println!("{} {} [{}] {}", indicator, health.id, health.status, latency);
        if let Some(detail) = &health.detail {
            println!("    {detail}");
        }
    }

    println!();
    println!(
        "Checked {} service(s): {} ok, {} failing",
        summary.checked, summary.ok, summary.failed
    );

    Ok(())
}
