//! Schedule configuration command handler

use crate::config::Config;
use crate::models::keyword::CrawlEngine;
use crate::services::dispatch::CrawlDispatchCoordinator;
use crate::services::schedule::ScheduleOption;

pub async fn cmd_save_schedule(
    config: &Config,
    interval: &str,
    engine: Option<&str>,
    extra_keywords: &[String],
) -> anyhow::Result<()> {
    // Fails closed on a label outside the closed option set.
    let schedule = ScheduleOption::from_label(interval)?;
    let engine = CrawlEngine::parse(engine.unwrap_or(&config.crawl.default_engine))?;

    let bus = super::event_bus(config);
    let backend = super::backend(config, &bus)?;

    let mut coordinator = CrawlDispatchCoordinator::new(backend.clone(), bus);

    let listing = backend.list_keywords(1, 100).await?;
    coordinator.set_persisted(listing.keywords);

    for keyword in extra_keywords {
        coordinator.add_local(keyword)?;
    }

    if coordinator.unsaved() > 0 {
        println!(
            "Adding {} new keyword(s) with this save.",
            coordinator.unsaved()
        );
    }

    coordinator.save_configuration(schedule, engine).await?;

    // The server owns keyword ids; refetch rather than trusting our list.
    let refreshed = backend.list_keywords(1, 100).await?;
    coordinator.set_persisted(refreshed.keywords);

    println!(
        "✓ Schedule saved: every {} on {} with {} keyword(s)",
        schedule,
        engine,
        coordinator.entries().len()
    );
    println!("  Cron: {}", schedule.cron());

    Ok(())
}
