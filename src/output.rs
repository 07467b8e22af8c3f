//! JSON envelopes returned to clients, and log-based rendering of them.

use anyhow::Result;
use serde::Serialize;
use tracing::{debug, info};

use crate::normalize::SimplifiedVehicle;

/// Label published in the `source` field of every successful response.
pub const DEFAULT_SOURCE: &str = "KTMB Realtime";

/// Message sent to clients whenever the feed cannot be served.
pub const FETCH_FAILED_MESSAGE: &str = "Failed to fetch train data";

/// Successful response body: `{ source, count, trains }`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainsEnvelope {
    pub source: String,
    pub count: usize,
    pub trains: Vec<SimplifiedVehicle>,
}

impl TrainsEnvelope {
    /// Wraps `trains`, deriving `count` so the two never disagree.
    pub fn new(source: impl Into<String>, trains: Vec<SimplifiedVehicle>) -> Self {
        Self {
            source: source.into(),
            count: trains.len(),
            trains,
        }
    }
}

/// Failure response body: `{ error }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorEnvelope {
    pub error: String,
}

impl ErrorEnvelope {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Logs an envelope using Rust's debug pretty-print format.
pub fn print_pretty(envelope: &TrainsEnvelope) {
    debug!("{:#?}", envelope);
}

/// Logs an envelope as pretty-printed JSON.
pub fn print_json(envelope: &TrainsEnvelope) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(envelope)?);
    Ok(())
}
