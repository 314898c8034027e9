// src/error.rs
//! Typed failures for the search pipeline

use thiserror::Error;

/// Errors surfaced by option loading and the source clients.
///
/// The chat layer maps all of these to a generic user-facing failure
/// message; the variants exist so callers and tests can tell startup
/// problems apart from per-request ones.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Option maps could not be loaded from cache or remote.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Credential exchange with a board failed.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// A board API call returned a non-success status.
    #[error("upstream returned status {status}: {message}")]
    Upstream { status: u16, message: String },

    /// A required page fetch failed or timed out.
    #[error("fetch failed: {0}")]
    Fetch(String),

    /// A response body could not be parsed into the expected shape.
    #[error("parse failed: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for SearchError {
    fn from(err: reqwest::Error) -> Self {
        SearchError::Fetch(err.to_string())
    }
}
