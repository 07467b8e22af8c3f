//! Retrieval of raw feed bytes from the upstream provider.

mod basic;
mod client;

pub use basic::BasicClient;
pub use client::HttpClient;

use bytes::Bytes;
use tracing::debug;

use crate::error::FeedError;

/// Downloads the feed at `url` in a single attempt.
///
/// # Errors
///
/// Returns [`FeedError::UpstreamStatus`] when the provider answers with a
/// non-success status and [`FeedError::UpstreamUnavailable`] when the
/// transport fails or times out.
pub async fn fetch_bytes<C: HttpClient + ?Sized>(
    client: &C,
    url: &str,
) -> Result<Bytes, FeedError> {
    let parsed = reqwest::Url::parse(url).map_err(|e| FeedError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    let req = reqwest::Request::new(reqwest::Method::GET, parsed);

    let resp = client.execute(req).await?;
    let status = resp.status();
    if !status.is_success() {
        return Err(FeedError::UpstreamStatus { status });
    }

    let bytes = resp.bytes().await?;
    debug!(bytes = bytes.len(), "Feed bytes received");
    Ok(bytes)
}
