use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub backend: BackendConfig,

    pub cache: CacheConfig,

    pub crawl: CrawlConfig,

    pub scheduler: SchedulerConfig,

    pub health: HealthConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub log_level: String,

    /// Event bus buffer size (default: 100)
    pub event_bus_buffer_size: usize,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            event_bus_buffer_size: 100,
            worker_threads: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the classification backend, no trailing slash.
    pub base_url: String,

    /// Request timeout in seconds (default: 30)
    pub request_timeout_seconds: u64,

    /// Bearer token to attach to every request. Usually obtained through
    /// `judolwatch login` or the `JUDOLWATCH_TOKEN` environment variable.
    pub access_token: Option<String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            request_timeout_seconds: 30,
            access_token: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Minutes before a cached page is considered stale (default: 5)
    pub stale_minutes: u64,

    /// Minutes before a cached page is evicted outright (default: 30)
    pub eviction_minutes: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            stale_minutes: 5,
            eviction_minutes: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    /// Engine used when a dispatch does not name one: google, baidu or bing.
    pub default_engine: String,

    /// Whether ad-hoc dispatches ask the backend for AI reasoning.
    pub ai_reasoning: bool,

    /// TLDs the crawler should restrict itself to, e.g. ["id", "com"].
    pub tld_whitelist: Vec<String>,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            default_engine: "google".to_string(),
            ai_reasoning: true,
            tld_whitelist: vec![],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub enabled: bool,

    /// Refresh interval as a schedule label ("30m", "1h", ... "12h").
    pub interval: String,

    /// Raw cron expression; overrides `interval` when set.
    pub cron_expression: Option<String>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: "1h".to_string(),
            cron_expression: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthConfig {
    /// Maximum probes in flight at once (default: 4). 1 means sequential.
    pub probe_concurrency: usize,

    /// Per-probe timeout in seconds (default: 10)
    pub probe_timeout_seconds: u64,

    /// Services the bulk health check sweeps over.
    pub services: Vec<ServiceTarget>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceTarget {
    pub id: String,
    pub url: String,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            probe_concurrency: 4,
            probe_timeout_seconds: 10,
            services: vec![],
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let paths = Self::config_paths();

        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                return Self::load_from_path(path);
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::default_config_path();
        self.save_to_path(&path)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![];

        paths.push(PathBuf::from("config.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("judolwatch").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".judolwatch").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.backend.base_url.is_empty() {
            anyhow::bail!("Backend base URL cannot be empty");
        }

        url::Url::parse(&self.backend.base_url)
            .with_context(|| format!("Invalid backend base URL: {}", self.backend.base_url))?;

        if self.cache.stale_minutes == 0 || self.cache.eviction_minutes <= self.cache.stale_minutes
        {
            anyhow::bail!(
                "Cache windows must satisfy 0 < stale_minutes < eviction_minutes (got {} / {})",
                self.cache.stale_minutes,
                self.cache.eviction_minutes
            );
        }

        if self.health.probe_concurrency == 0 {
            anyhow::bail!("health.probe_concurrency must be at least 1");
        }

        Ok(())
    }
}
