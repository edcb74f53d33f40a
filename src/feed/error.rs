//! Feed error types

use std::time::Duration;

/// Failure to obtain a snapshot from the upstream feed.
///
/// All variants are transient from the poller's point of view: they are
/// logged and the next poll proceeds as usual.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("upstream returned {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("malformed upstream document: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("upstream did not answer within {0:?}")]
    Timeout(Duration),

    #[error("feed unavailable: {0}")]
    Unavailable(String),
}
