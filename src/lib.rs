pub mod cli;
pub mod clients;
pub mod config;
pub mod constants;
pub mod domain;
pub mod error;
pub mod models;
pub mod prefs;
pub mod services;

use std::sync::Arc;

use clap::Parser;
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands, DomainListOptions, KeywordCommands};
pub use config::Config;
pub use error::PipelineError;
use prefs::FilePreferenceStore;
use services::{
    BulkHealthCheckRunner, DomainQueryEngine, HttpHealthProbe, QueryCache, RefreshScheduler,
};

pub async fn run() -> anyhow::Result<()> {
    let config = Config::load()?;
    config.validate()?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Domains {
            search,
            status,
            min_score,
            max_score,
            reasoning,
            page,
            page_size,
            sort,
            desc,
        }) => {
            cli::cmd_list_domains(
                &config,
                DomainListOptions {
                    search,
                    status,
                    min_score,
                    max_score,
                    reasoning,
                    page,
                    page_size,
                    sort,
                    desc,
                },
            )
            .await
        }

        Some(Commands::Show { id }) => cli::cmd_show_domain(&config, id).await,

        Some(Commands::Verify {
            id,
            status,
            reasoning,
            crawl,
        }) => cli::cmd_verify(&config, id, &status, reasoning.as_deref(), crawl).await,

        Some(Commands::Keywords { command }) => match command {
            None => cli::cmd_list_keywords(&config, 1, 25).await,
            Some(KeywordCommands::List { page, limit }) => {
                cli::cmd_list_keywords(&config, page, limit).await
            }
            Some(KeywordCommands::Add { keyword }) => {
                cli::cmd_add_keyword(&config, &keyword).await
            }
            Some(KeywordCommands::Remove { id }) => cli::cmd_remove_keyword(&config, id).await,
        },

        Some(Commands::Schedule {
            interval,
            engine,
            keywords,
        }) => cli::cmd_save_schedule(&config, &interval, engine.as_deref(), &keywords).await,

        Some(Commands::Crawl {
            keywords,
            engine,
            ai_reasoning,
            tlds,
        }) => cli::cmd_crawl(&config, &keywords, engine.as_deref(), ai_reasoning, &tlds).await,

        Some(Commands::Health { ids }) => cli::cmd_health(&config, &ids).await,

        Some(Commands::Login { username }) => cli::cmd_login(&config, &username).await,

        Some(Commands::Daemon) => run_daemon(config).await,

        Some(Commands::Init) => {
            Config::create_default_if_missing()?;
            println!("✓ Config file created. Edit config.toml and run again.");
            Ok(())
        }

        None => {
            cli::cmd_list_domains(&config, DomainListOptions::default()).await
        }
    }
}

async fn run_daemon(config: Config) -> anyhow::Result<()> {
    info!(
        "judolwatch v{} starting in daemon mode...",
        env!("CARGO_PKG_VERSION")
    );

    let (event_bus, _) = broadcast::channel(config.general.event_bus_buffer_size.max(1));

    let backend = Arc::new(clients::BackendClient::new(
        &config.backend,
        event_bus.clone(),
    )?);
    let cache = QueryCache::from_config(backend.clone(), &config.cache, event_bus.clone());
    let prefs = Arc::new(FilePreferenceStore::open_default());
    let engine = DomainQueryEngine::new(cache, prefs);

    let probe = Arc::new(HttpHealthProbe::new(config.health.probe_timeout_seconds)?);
    let health = Arc::new(BulkHealthCheckRunner::new(
        probe,
        &config.health,
        event_bus.clone(),
    ));

    let scheduler = Arc::new(RefreshScheduler::new(
        engine,
        health,
        config.scheduler.clone(),
    ));

    let scheduler_handle = {
        let scheduler = Arc::clone(&scheduler);
        tokio::spawn(async move {
            if let Err(e) = scheduler.start().await {
                error!("Refresh scheduler error: {}", e);
            }
        })
    };

    info!("Daemon running. Press Ctrl+C to stop.");

    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Shutdown signal received");
        }
        Err(e) => {
            error!("Error listening for shutdown: {}", e);
        }
    }

    scheduler.stop().await;
    scheduler_handle.abort();
    info!("Daemon stopped");

    Ok(())
}
