//! Shared error types for the services crate.

use std::time::Duration;

use thiserror::Error;

/// Errors emitted by a `QuestionSource`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProviderError {
    #[error("question generator is not configured")]
    Disabled,
    #[error("question provider unavailable: {0}")]
    Unavailable(String),
    #[error("question provider returned status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error("question provider timed out after {0:?}")]
    Timeout(Duration),
    #[error("malformed question data: {0}")]
    MalformedResponse(String),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl ProviderError {
    /// True for failures of the transport or the remote service, as opposed
    /// to a response that arrived but could not be understood.
    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            Self::Unavailable(_) | Self::HttpStatus(_) | Self::Timeout(_) | Self::Http(_)
        )
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedResponse(err.to_string())
    }
}
