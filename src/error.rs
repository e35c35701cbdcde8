//! Error taxonomy shared by the whole review pipeline.
//!
//! The enum is `Clone` on purpose: the query cache fans a single fetch
//! result out to every deduplicated waiter, failures included.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PipelineError {
    /// Transport-level failure: connection refused, DNS, timeout.
    #[error("network error: {0}")]
    Network(String),

    /// Non-2xx response with whatever detail the server supplied.
    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// Client-side precondition failed before any network call.
    #[error("validation error: {0}")]
    Validation(String),

    /// Programming-error-class mapping failure (unresolved enum, bad cron).
    #[error("configuration error: {0}")]
    Config(String),

    /// Expired or rejected credential. Session state must be torn down.
    #[error("authentication expired or rejected")]
    Auth,
}

impl PipelineError {
    #[must_use]
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    #[must_use]
    pub fn server(status: u16, message: impl Into<String>) -> Self {
        Self::Server {
            status,
            message: message.into(),
        }
    }

    /// True for failures worth showing the user a notification for.
    #[must_use]
    pub const fn is_user_visible(&self) -> bool {
        !matches!(self, Self::Config(_))
    }
}

impl From<reqwest::Error> for PipelineError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Network(format!("request timed out: {err}"))
        } else {
            Self::Network(err.to_string())
        }
    }
}
