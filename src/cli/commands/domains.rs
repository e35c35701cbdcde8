//! Domain listing and detail command handlers

use std::sync::Arc;

use crate::config::Config;
use crate::models::domain::DomainStatus;
use crate::models::query::SortColumn;
use crate::prefs::FilePreferenceStore;
use crate::services::domain_query::{DomainFilters, DomainQueryEngine, RefreshOutcome};
use crate::services::query_cache::QueryCache;

#[derive(Debug, Default)]
pub struct DomainListOptions {
    pub search: Option<String>,
    pub status: Option<String>,
    pub min_score: Option<i64>,
    pub max_score: Option<i64>,
    pub reasoning: Option<bool>,
    pub page: u64,
    pub page_size: Option<u64>,
    pub sort: Option<String>,
    pub desc: bool,
}

fn parse_sort_column(name: &str) -> anyhow::Result<SortColumn> {
    match name {
        "domain" | "domain_name" => Ok(SortColumn::DomainName),
        "status" => Ok(SortColumn::Status),
        "score" | "confidence_score" => Ok(SortColumn::ConfidenceScore),
        "verified" | "last_verified_at" => Ok(SortColumn::LastVerified),
        "crawled" | "last_crawled_at" => Ok(SortColumn::LastCrawled),
        other => anyhow::bail!(
            "unknown sort column '{other}' (expected domain, status, score, verified or crawled)"
        ),
    }
}

const fn status_indicator(status: DomainStatus) -> &'static str {
    match status {
        DomainStatus::Judol => "⛔",
        DomainStatus::NonJudol => "✓",
        DomainStatus::ManualCheck => "❓",
    }
}

pub async fn cmd_list_domains(config: &Config, options: DomainListOptions) -> anyhow::Result<()> {
    let bus = super::event_bus(config);
    let backend = super::backend(config, &bus)?;
    let cache = QueryCache::from_config(backend, &config.cache, bus.clone());
    let prefs = Arc::new(FilePreferenceStore::open_default());
    let engine = DomainQueryEngine::new(cache, prefs);

    let status = options
        .status
        .as_deref()
        .map(DomainStatus::parse)
        .transpose()?;
    engine.set_filters(DomainFilters {
        search: options.search.unwrap_or_default(),
        status,
        score_min: options.min_score,
        score_max: options.max_score,
        reasoning: options.reasoning,
    })?;

    if let Some(page_size) = options.page_size {
        engine.set_page_size(page_size)?;
    }

    if let Some(sort) = options.sort.as_deref() {
        let column = parse_sort_column(sort)?;
        engine.set_sort(column);
        if options.desc {
            // Same column again flips ascending to descending.
            engine.set_sort(column);
        }
    }

    engine.set_page(options.page);

    let view = match engine.refresh().await? {
        RefreshOutcome::Current(view) => view,
        RefreshOutcome::Superseded => anyhow::bail!("listing parameters changed mid-fetch"),
    };

    if view.items.is_empty() {
        println!("No domains matched the current filter.");
        return Ok(());
    }

    println!("Crawled Domains ({} total)", view.total);
    println!("{:-<78}", "");

    for domain in &view.items {
        let score = domain
            .confidence_score
            .map(|s| format!("{s:.0}"))
            .unwrap_or_else(|| "-".to_string());
        let verified = domain.last_verified_at.as_deref().unwrap_or("never");

        println!(
            "{} {} [{}]",
            status_indicator(domain.status),
            domain.domain_name,
            domain.status
        );
        println!(
            "  ID: {} | Score: {} | Keyword: {} | Verified: {}",
            domain.id,
            score,
            domain.latest_keyword.as_deref().unwrap_or("-"),
            verified
        );
    }

    println!();
    println!(
        "Page {} of {} | {} per page",
        view.page, view.total_pages, view.page_size
    );
    println!("Legend: ⛔ Judol | ✓ Clean | ❓ Needs manual check");

    Ok(())
}

pub async fn cmd_show_domain(config: &Config, id: i64) -> anyhow::Result<()> {
    let bus = super::event_bus(config);
    let backend = super::backend(config, &bus)?;

    let detail = backend.get_domain(id).await?;

    println!("Domain: {}", detail.domain_name);
    println!("{:-<78}", "");
    println!("Crawls: {}", detail.crawls.len());
    println!();

    for (index, crawl) in detail.crawls.iter().enumerate() {
        let score = crawl
            .confidence_score
            .map(|s| format!("{s:.0}"))
            .unwrap_or_else(|| "-".to_string());
        let vit = crawl
            .vit_score
            .map(|s| format!("{s:.0}"))
            .unwrap_or_else(|| "-".to_string());

        println!(
            "[{}] {} {} ({})",
            index,
            status_indicator(crawl.status),
            crawl.url,
            crawl.created_at
        );
        println!(
            "    Status: {} | Score: {} | ViT: {} | AMP: {}",
            crawl.status,
            score,
            vit,
            if crawl.is_amp { "yes" } else { "no" }
        );
        if let Some(keyword) = &crawl.keyword {
            println!("    Keyword: {keyword}");
        }
        if let Some(reasoning) = &crawl.reasoning {
            if !reasoning.is_empty() {
                println!("    Reasoning: {reasoning}");
            }
        }
        println!();
    }

    println!("Verify with: judolwatch verify {id} <status> [--reasoning \"...\"]");

    Ok(())
}
