use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// Verification verdict for a crawled domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainStatus {
    Judol,
    NonJudol,
    ManualCheck,
}

impl DomainStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Judol => "judol",
            Self::NonJudol => "non_judol",
            Self::ManualCheck => "manual_check",
        }
    }

    pub fn parse(s: &str) -> Result<Self, PipelineError> {
        match s {
            "judol" => Ok(Self::Judol),
            "non_judol" => Ok(Self::NonJudol),
            "manual_check" => Ok(Self::ManualCheck),
            other => Err(PipelineError::validation(format!(
                "unknown domain status '{other}' (expected judol, non_judol or manual_check)"
            ))),
        }
    }
}

impl fmt::Display for DomainStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the paged domain listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainSummary {
    pub id: i64,
    pub domain_name: String,
    pub status: DomainStatus,
    pub confidence_score: Option<f64>,
    pub latest_keyword: Option<String>,
    pub last_crawled_at: Option<String>,
    pub last_verified_at: Option<String>,
}

/// One page of the domain listing plus the total count under the filter.
///
/// `total` is independent of page size; it is what pagination math runs on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResult {
    pub items: Vec<DomainSummary>,
    pub total: u64,
}

/// Full record for one domain: every captured crawl, newest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainDetail {
    pub domain_name: String,
    pub crawls: Vec<CrawlItem>,
}

/// A single captured snapshot of a domain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlItem {
    pub id: i64,
    pub url: String,
    pub screenshot_path: Option<String>,
    pub extracted_text: Option<String>,
    pub keyword: Option<String>,
    pub confidence_score: Option<f64>,
    pub status: DomainStatus,
    #[serde(default)]
    pub reasoning: Option<String>,
    pub created_at: String,
    #[serde(default)]
    pub is_amp: bool,
    pub vit_score: Option<f64>,
}
