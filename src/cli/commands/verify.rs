//! Verification command handler

use crate::config::Config;
use crate::models::domain::DomainStatus;
use crate::services::verification::VerificationDraft;

pub async fn cmd_verify(
    config: &Config,
    id: i64,
    status: &str,
    reasoning: Option<&str>,
    crawl_index: usize,
) -> anyhow::Result<()> {
    let status = DomainStatus::parse(status)?;

    let bus = super::event_bus(config);
    let backend = super::backend(config, &bus)?;

    let detail = backend.get_domain(id).await?;
    let domain_name = detail.domain_name.clone();

    let mut draft = VerificationDraft::open(backend, bus, id, detail, crawl_index)?;

    let (baseline_status, baseline_reasoning) = draft.baseline();
    println!(
        "Current: {} (reasoning: {})",
        baseline_status,
        if baseline_reasoning.is_empty() {
            "none"
        } else {
            baseline_reasoning.as_str()
        }
    );

    draft.set_status(status);
    if let Some(reasoning) = reasoning {
        draft.set_reasoning(reasoning);
    }

    if !draft.is_dirty() {
        println!("No change: {domain_name} is already {status}.");
        return Ok(());
    }

    match draft.commit().await {
        Ok(()) => {
            println!("✓ Verified {domain_name} as {status}");
            if let Some(reasoning) = reasoning {
                println!("  Reasoning: {reasoning}");
            }
        }
        Err(e) => {
            // The draft keeps the edit; in the dashboard the user would
            // resubmit from where they left off.
            println!("✗ Verification failed: {e}");
        }
    }

    Ok(())
}
