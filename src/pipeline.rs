//! Fetch → decode → normalize, run once per request.

use tracing::debug;

use crate::error::FeedError;
use crate::fetch::{HttpClient, fetch_bytes};
use crate::normalize::{Normalized, normalize_feed};
use crate::output::TrainsEnvelope;
use crate::parser::parse_feed;

/// Fetches the feed at `url` and turns it into a response envelope.
///
/// # Errors
///
/// Fails as a whole when the provider is unreachable or the payload does not
/// decode; there is no partial result.
#[tracing::instrument(skip(client))]
pub async fn fetch_trains<C: HttpClient + ?Sized>(
    client: &C,
    url: &str,
    source: &str,
) -> Result<TrainsEnvelope, FeedError> {
    let bytes = fetch_bytes(client, url).await?;
    trains_from_bytes(&bytes, source)
}

/// Decodes and normalizes an already-downloaded feed.
pub fn trains_from_bytes(bytes: &[u8], source: &str) -> Result<TrainsEnvelope, FeedError> {
    let feed = parse_feed(bytes)?;
    let Normalized { trains, summary } = normalize_feed(&feed);

    debug!(
        feed_timestamp = ?summary.feed_timestamp,
        total_entities = summary.total_entities,
        vehicles = summary.vehicles,
        skipped_no_vehicle = summary.skipped_no_vehicle,
        skipped_no_position = summary.skipped_no_position,
        unknown_identity = summary.unknown_identity,
        unscheduled = summary.unscheduled,
        with_speed = summary.with_speed,
        "Feed normalized"
    );

    Ok(TrainsEnvelope::new(source, trains))
}
