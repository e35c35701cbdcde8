//! Keyword management command handlers

use crate::config::Config;
use crate::services::schedule::ScheduleOption;

pub async fn cmd_list_keywords(config: &Config, page: u64, limit: u64) -> anyhow::Result<()> {
    let bus = super::event_bus(config);
    let backend = super::backend(config, &bus)?;

    let listing = backend.list_keywords(page, limit).await?;

    if listing.keywords.is_empty() {
        println!("No keywords configured.");
        println!();
        println!("Add one with: judolwatch keywords add \"<keyword>\"");
        return Ok(());
    }

    println!("Crawl Keywords ({} total)", listing.total);
    println!("{:-<70}", "");

    for record in &listing.keywords {
        println!("• {} (ID: {})", record.keyword, record.id);
    }

    println!();
    if let Some(cron) = listing.schedule.as_deref() {
        // Backend cron formatting is not guaranteed; when it matches no
        // known interval, show it raw instead of guessing.
        match ScheduleOption::from_cron(cron) {
            Some(option) => println!("Schedule: every {option} ({cron})"),
            None => println!("Schedule: unrecognized cron '{cron}'"),
        }
    } else {
        println!("Schedule: not set");
    }
    if let Some(engine) = listing.crawl_engine.as_deref() {
        println!("Engine:   {engine}");
    }
    println!("Page {} of {}", page, listing.total_pages.max(1));

    Ok(())
}

pub async fn cmd_add_keyword(config: &Config, keyword: &str) -> anyhow::Result<()> {
    let trimmed = keyword.trim();
    if trimmed.is_empty() {
        anyhow::bail!("keyword cannot be empty");
    }

    let bus = super::event_bus(config);
    let backend = super::backend(config, &bus)?;

    let record = backend.create_keyword(trimmed).await?;
    println!("✓ Added keyword '{}' (ID: {})", record.keyword, record.id);

    Ok(())
}

pub async fn cmd_remove_keyword(config: &Config, id: i64) -> anyhow::Result<()> {
    let bus = super::event_bus(config);
    let backend = super::backend(config, &bus)?;

    backend.delete_keyword(id).await?;
    println!("✓ Removed keyword {id}");

    Ok(())
}
