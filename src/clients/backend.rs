//! HTTP client for the domain-classification backend.
//!
//! Carries an opaque bearer token. A 401 from any endpoint tears the local
//! session down: the token is dropped, `SessionExpired` goes out on the
//! event bus, and every later call fails fast until the next login.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use tokio::sync::{RwLock, broadcast};
use tracing::{debug, warn};

use crate::config::BackendConfig;
use crate::domain::events::NotificationEvent;
use crate::error::PipelineError;
use crate::models::domain::{DomainDetail, DomainStatus, PageResult};
use crate::models::keyword::{KeywordListPage, KeywordRecord, MultiKeywordResponse};
use crate::models::query::QueryKey;
use crate::services::query_cache::PageFetcher;

#[derive(Debug, Deserialize)]
struct LoginResponse {
    access_token: String,
    #[allow(dead_code)]
    token_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ScheduleResponse {
    success: bool,
    #[serde(default)]
    message: Option<String>,
}

/// Body of `GET /domains`.
#[derive(Debug, Deserialize)]
struct DomainListResponse {
    domains: Vec<crate::models::domain::DomainSummary>,
    total: u64,
}

/// Server error bodies come in a couple of shapes; take whichever detail
/// field is present.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

pub struct BackendClient {
    client: Client,
    base_url: String,
    token: RwLock<Option<String>>,
    session_invalidated: AtomicBool,
    event_bus: broadcast::Sender<NotificationEvent>,
}

impl BackendClient {
    pub fn new(
        config: &BackendConfig,
        event_bus: broadcast::Sender<NotificationEvent>,
    ) -> Result<Self, PipelineError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout_seconds))
            .user_agent(concat!("judolwatch/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PipelineError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: RwLock::new(config.access_token.clone()),
            session_invalidated: AtomicBool::new(false),
            event_bus,
        })
    }

    /// OAuth2 password grant against `POST /auth/login`. Stores the token
    /// for every subsequent call and returns it so callers can persist it.
    pub async fn login(&self, username: &str, password: &str) -> Result<String, PipelineError> {
        let url = format!("{}/auth/login", self.base_url);
        let params = [
            ("grant_type", "password"),
            ("username", username),
            ("password", password),
        ];

        let response = self.client.post(&url).form(&params).send().await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(PipelineError::Auth);
        }
        let response = self.check(response).await?;
        let login: LoginResponse = response.json().await?;

        *self.token.write().await = Some(login.access_token.clone());
        self.session_invalidated.store(false, Ordering::SeqCst);
        debug!("Authenticated against {}", self.base_url);

        Ok(login.access_token)
    }

    pub async fn has_token(&self) -> bool {
        self.token.read().await.is_some()
    }

    async fn authorized(&self, builder: RequestBuilder) -> Result<RequestBuilder, PipelineError> {
        if self.session_invalidated.load(Ordering::SeqCst) {
            return Err(PipelineError::Auth);
        }
        let token = self.token.read().await;
        Ok(match token.as_deref() {
            Some(t) => builder.bearer_auth(t),
            None => builder,
        })
    }

    async fn invalidate_session(&self) {
        self.token.write().await.take();
        self.session_invalidated.store(true, Ordering::SeqCst);
        let _ = self.event_bus.send(NotificationEvent::SessionExpired);
        warn!("Backend rejected credential, local session invalidated");
    }

    /// Maps non-2xx responses into the pipeline error taxonomy.
    async fn check(&self, response: Response) -> Result<Response, PipelineError> {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            self.invalidate_session().await;
            return Err(PipelineError::Auth);
        }
        if status.is_success() {
            return Ok(response);
        }

        let raw = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&raw)
            .ok()
            .and_then(|b| b.detail.or(b.message))
            .unwrap_or(raw);
        Err(PipelineError::server(status.as_u16(), message))
    }

    pub async fn list_domains(&self, key: &QueryKey) -> Result<PageResult, PipelineError> {
        let url = format!("{}/domains", self.base_url);
        let request = self
            .authorized(self.client.get(&url))
            .await?
            .query(&key.to_query_params());

        let response = self.check(request.send().await?).await?;
        let body: DomainListResponse = response.json().await?;

        Ok(PageResult {
            items: body.domains,
            total: body.total,
        })
    }

    pub async fn get_domain(&self, id: i64) -> Result<DomainDetail, PipelineError> {
        let url = format!("{}/domains/{}", self.base_url, id);
        let request = self.authorized(self.client.get(&url)).await?;

        let response = self.check(request.send().await?).await?;
        Ok(response.json().await?)
    }

    pub async fn update_domain_status(
        &self,
        id: i64,
        status: DomainStatus,
    ) -> Result<UpdateStatusResponse, PipelineError> {
        let url = format!("{}/domains/{}/status", self.base_url, id);
        let body = serde_json::json!({ "status": status });
        let request = self.authorized(self.client.patch(&url)).await?.json(&body);

        let response = self.check(request.send().await?).await?;
        let update: UpdateStatusResponse = response.json().await?;

        if !update.success {
            return Err(PipelineError::server(
                200,
                update
                    .message
                    .unwrap_or_else(|| "status update rejected".to_string()),
            ));
        }
        Ok(update)
    }

    pub async fn list_keywords(
        &self,
        page: u64,
        limit: u64,
    ) -> Result<KeywordListPage, PipelineError> {
        let url = format!("{}/keywords", self.base_url);
        let request = self
            .authorized(self.client.get(&url))
            .await?
            .query(&[("page", page.to_string()), ("limit", limit.to_string())]);

        let response = self.check(request.send().await?).await?;
        Ok(response.json().await?)
    }

    pub async fn create_keyword(&self, keyword: &str) -> Result<KeywordRecord, PipelineError> {
        let url = format!("{}/keywords", self.base_url);
        let body = serde_json::json!({ "keyword": keyword });
        let request = self.authorized(self.client.post(&url)).await?.json(&body);

        let response = self.check(request.send().await?).await?;
        Ok(response.json().await?)
    }

    pub async fn update_keyword(
        &self,
        id: i64,
        keyword: &str,
    ) -> Result<KeywordRecord, PipelineError> {
        let url = format!("{}/keywords/{}", self.base_url, id);
        let body = serde_json::json!({ "keyword": keyword });
        let request = self.authorized(self.client.put(&url)).await?.json(&body);

        let response = self.check(request.send().await?).await?;
        Ok(response.json().await?)
    }

    pub async fn delete_keyword(&self, id: i64) -> Result<(), PipelineError> {
        let url = format!("{}/keywords/{}", self.base_url, id);
        let request = self.authorized(self.client.delete(&url)).await?;

        self.check(request.send().await?).await?;
        Ok(())
    }

    /// Fires one multi-keyword scrape job; the response carries one result
    /// item per keyword.
    pub async fn scrape_multi_keyword(
        &self,
        keywords: &[String],
        crawl_engine: &str,
        ai_reasoning: bool,
        tld_whitelist: Option<&str>,
    ) -> Result<MultiKeywordResponse, PipelineError> {
        let url = format!("{}/scrape/multi-keyword", self.base_url);
        let mut body = serde_json::json!({
            "keywords": keywords,
            "crawl_engine": crawl_engine,
            "ai_reasoning": ai_reasoning,
        });
        if let Some(tlds) = tld_whitelist {
            body["tld_whitelist"] = serde_json::Value::String(tlds.to_string());
        }
        let request = self.authorized(self.client.post(&url)).await?.json(&body);

        let response = self.check(request.send().await?).await?;
        Ok(response.json().await?)
    }

    /// Persists the keyword + schedule + engine tuple as one atomic call.
    pub async fn save_schedule(
        &self,
        keywords: &[String],
        schedule: &str,
        crawl_engine: &str,
    ) -> Result<(), PipelineError> {
        let url = format!("{}/keywords/schedule", self.base_url);
        let body = serde_json::json!({
            "keywords": keywords,
            "schedule": schedule,
            "crawl_engine": crawl_engine,
        });
        let request = self.authorized(self.client.post(&url)).await?.json(&body);

        let response = self.check(request.send().await?).await?;
        let saved: ScheduleResponse = response.json().await?;
        if !saved.success {
            return Err(PipelineError::server(
                200,
                saved
                    .message
                    .unwrap_or_else(|| "schedule save rejected".to_string()),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl PageFetcher for BackendClient {
    async fn fetch_page(&self, key: &QueryKey) -> Result<PageResult, PipelineError> {
        self.list_domains(key).await
    }
}
