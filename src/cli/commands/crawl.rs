//! Ad-hoc crawl dispatch command handler

use crate::config::Config;
use crate::models::keyword::CrawlEngine;
use crate::services::dispatch::CrawlDispatchCoordinator;

pub async fn cmd_crawl(
    config: &Config,
    keywords: &[String],
    engine: Option<&str>,
    ai_reasoning: Option<bool>,
    tlds: &[String],
) -> anyhow::Result<()> {
    let engine = CrawlEngine::parse(engine.unwrap_or(&config.crawl.default_engine))?;
    let ai_reasoning = ai_reasoning.unwrap_or(config.crawl.ai_reasoning);
    let tlds = if tlds.is_empty() {
        config.crawl.tld_whitelist.as_slice()
    } else {
        tlds
    };

    let bus = super::event_bus(config);
    let backend = super::backend(config, &bus)?;
    let coordinator = CrawlDispatchCoordinator::new(backend, bus);

    println!(
        "Dispatching {} keyword(s) to {}...",
        keywords.len(),
        engine
    );

    let aggregate = coordinator
        .dispatch_adhoc(keywords, engine, ai_reasoning, tlds)
        .await?;

    println!();
    println!("Per-keyword results:");
    println!("{:-<70}", "");
    for result in &aggregate.results {
        println!(
            "• {} | saved: {} | inferences: {}",
            result.keyword.as_deref().unwrap_or("(unnamed)"),
            result.total_saved,
            result.inference_triggered
        );
    }

    println!();
    println!("{:-<70}", "");
    println!("Crawl dispatched!");
    println!("  Pages saved:          {}", aggregate.total_saved);
    println!(
        "  Inferences triggered: {}",
        aggregate.total_inference_triggered
    );

    Ok(())
}
