use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::PipelineError;

/// Crawl engine the scrape backend fans keywords out to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrawlEngine {
    Google,
    Baidu,
    Bing,
}

impl CrawlEngine {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::Baidu => "baidu",
            Self::Bing => "bing",
        }
    }

    pub fn parse(s: &str) -> Result<Self, PipelineError> {
        match s {
            "google" => Ok(Self::Google),
            "baidu" => Ok(Self::Baidu),
            "bing" => Ok(Self::Bing),
            other => Err(PipelineError::validation(format!(
                "unknown crawl engine '{other}' (expected google, baidu or bing)"
            ))),
        }
    }
}

impl fmt::Display for CrawlEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifier for a keyword entry.
///
/// Keywords added locally but not yet saved carry a `Local` id so nothing
/// can mistake them for server records; the server is the source of truth
/// for real ids and the list is refetched after every successful save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordId {
    Saved(i64),
    Local(Uuid),
}

impl KeywordId {
    #[must_use]
    pub fn local() -> Self {
        Self::Local(Uuid::new_v4())
    }

    #[must_use]
    pub const fn server_id(self) -> Option<i64> {
        match self {
            Self::Saved(id) => Some(id),
            Self::Local(_) => None,
        }
    }
}

/// One keyword entry, persisted or still local.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordEntry {
    pub id: KeywordId,
    pub keyword: String,
}

impl KeywordEntry {
    #[must_use]
    pub const fn is_persisted(&self) -> bool {
        matches!(self.id, KeywordId::Saved(_))
    }
}

/// A keyword record as the backend returns it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordRecord {
    pub id: i64,
    pub keyword: String,
}

/// Envelope of `GET /keywords`: the page plus the active schedule/engine.
#[derive(Debug, Clone, Deserialize)]
pub struct KeywordListPage {
    pub keywords: Vec<KeywordRecord>,
    pub total: u64,
    pub total_pages: u64,
    #[serde(default)]
    pub schedule: Option<String>,
    #[serde(default)]
    pub crawl_engine: Option<String>,
}

/// Per-keyword outcome of a multi-keyword scrape dispatch.
///
/// The count fields are deliberately lenient: a malformed value in one
/// item must degrade to zero, not fail the whole response.
#[derive(Debug, Clone, Deserialize)]
pub struct KeywordCrawlResult {
    #[serde(default)]
    pub keyword: Option<String>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub total_saved: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub inference_triggered: u64,
}

fn lenient_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value.as_u64().unwrap_or(0))
}

#[derive(Debug, Clone, Deserialize)]
pub struct MultiKeywordResponse {
    #[serde(default)]
    pub results: Vec<KeywordCrawlResult>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lenient_count_tolerates_garbage() {
        let parsed: KeywordCrawlResult = serde_json::from_value(serde_json::json!({
            "keyword": "slot gacor",
            "total_saved": "bad",
            "inference_triggered": 2,
        }))
        .unwrap();
        assert_eq!(parsed.total_saved, 0);
        assert_eq!(parsed.inference_triggered, 2);
    }

    #[test]
    fn lenient_count_tolerates_missing_fields() {
        let parsed: KeywordCrawlResult =
            serde_json::from_value(serde_json::json!({ "keyword": "maxwin" })).unwrap();
        assert_eq!(parsed.total_saved, 0);
        assert_eq!(parsed.inference_triggered, 0);
    }

    #[test]
    fn local_keyword_ids_never_expose_a_server_id() {
        let entry = KeywordEntry {
            id: KeywordId::local(),
            keyword: "rtp live".to_string(),
        };
        assert!(!entry.is_persisted());
        assert_eq!(entry.id.server_id(), None);
    }
}
