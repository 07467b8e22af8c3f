//! Error taxonomy for the fetch-decode-normalize pipeline.

use thiserror::Error;

/// Everything that can fail a feed request as a whole.
///
/// Individual entities that lack vehicle or position data are not errors;
/// the normalizer skips them.
#[derive(Debug, Error)]
pub enum FeedError {
    /// Transport failure talking to the feed provider (timeout, DNS, reset).
    #[error("feed provider unreachable: {0}")]
    UpstreamUnavailable(#[from] reqwest::Error),

    /// The feed provider answered with a non-success status.
    #[error("feed provider returned {status}")]
    UpstreamStatus { status: reqwest::StatusCode },

    /// The configured feed URL cannot be parsed.
    #[error("invalid feed url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The payload is not a GTFS-Realtime `FeedMessage`.
    #[error("malformed feed: {0}")]
    MalformedFeed(#[from] prost::DecodeError),
}

/// Coarse classification attached to error logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    UpstreamUnavailable,
    MalformedFeed,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::UpstreamUnavailable => "upstream_unavailable",
            ErrorKind::MalformedFeed => "malformed_feed",
        }
    }
}

impl FeedError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FeedError::UpstreamUnavailable(_)
            | FeedError::UpstreamStatus { .. }
            | FeedError::InvalidUrl { .. } => ErrorKind::UpstreamUnavailable,
            FeedError::MalformedFeed(_) => ErrorKind::MalformedFeed,
        }
    }
}
