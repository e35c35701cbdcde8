use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Ok,
    Error,
    Unknown,
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Ok => "ok",
            Self::Error => "error",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Last known probe outcome for one monitored service.
///
/// Only the health runner (or a single-service check) writes these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceHealth {
    pub id: String,
    pub status: HealthStatus,
    pub last_checked_at: Option<String>,
    pub response_time_ms: Option<u64>,
    pub detail: Option<String>,
}

impl ServiceHealth {
    #[must_use]
    pub fn unknown(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: HealthStatus::Unknown,
            last_checked_at: None,
            response_time_ms: None,
            detail: None,
        }
    }
}

/// Aggregate reported once every targeted probe has settled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HealthSummary {
    pub checked: usize,
    pub ok: usize,
    pub failed: usize,
}
