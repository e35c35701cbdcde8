use std::fmt;

use crate::models::domain::DomainStatus;

/// Column the domain listing can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortColumn {
    #[default]
    DomainName,
    Status,
    ConfidenceScore,
    LastVerified,
    LastCrawled,
}

impl SortColumn {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DomainName => "domain_name",
            Self::Status => "status",
            Self::ConfidenceScore => "confidence_score",
            Self::LastVerified => "last_verified_at",
            Self::LastCrawled => "last_crawled_at",
        }
    }
}

impl fmt::Display for SortColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl SortOrder {
    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ascending => "asc",
            Self::Descending => "desc",
        }
    }
}

/// The full tuple of listing parameters.
///
/// Value equality over every field is what indexes the query cache; two
/// views asking the same question share one entry and one fetch.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    pub search: String,
    pub status: Option<DomainStatus>,
    pub score_min: Option<i64>,
    pub score_max: Option<i64>,
    pub reasoning: Option<bool>,
    pub page: u64,
    pub page_size: u64,
    pub sort_by: SortColumn,
    pub order: SortOrder,
}

impl Default for QueryKey {
    fn default() -> Self {
        Self {
            search: String::new(),
            status: None,
            score_min: None,
            score_max: None,
            reasoning: None,
            page: 1,
            page_size: crate::constants::paging::DEFAULT_PAGE_SIZE,
            sort_by: SortColumn::default(),
            order: SortOrder::default(),
        }
    }
}

impl QueryKey {
    /// Backend query-string pairs for `GET /domains`.
    #[must_use]
    pub fn to_query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::with_capacity(9);
        if !self.search.is_empty() {
            params.push(("search", self.search.clone()));
        }
        if let Some(status) = self.status {
            params.push(("status", status.as_str().to_string()));
        }
        if let Some(min) = self.score_min {
            params.push(("min_score", min.to_string()));
        }
        if let Some(max) = self.score_max {
            params.push(("max_score", max.to_string()));
        }
        if let Some(reasoning) = self.reasoning {
            params.push(("reasoning", reasoning.to_string()));
        }
        params.push(("page", self.page.to_string()));
        params.push(("limit", self.page_size.to_string()));
        params.push(("sort_by", self.sort_by.as_str().to_string()));
        params.push(("order", self.order.as_str().to_string()));
        params
    }
}
