//! HTTP surface: one route serving the normalized train feed.

pub mod cors;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router, middleware};
use tracing::{error, info};

use crate::error::FeedError;
use crate::fetch::{BasicClient, HttpClient};
use crate::output::{ErrorEnvelope, FETCH_FAILED_MESSAGE, TrainsEnvelope};
use crate::pipeline::fetch_trains;

pub const TRAINS_ROUTE: &str = "/api/train";

/// Everything needed to start the relay.
#[derive(Debug, Clone)]
pub struct ServeConfig {
    pub bind: SocketAddr,
    pub feed_url: String,
    pub source: String,
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

/// Read-only state shared by all requests.
#[derive(Clone)]
pub struct AppState {
    client: Arc<dyn HttpClient>,
    feed_url: Arc<str>,
    source: Arc<str>,
}

impl AppState {
    pub fn new(client: impl HttpClient + 'static, feed_url: &str, source: &str) -> Self {
        Self {
            client: Arc::new(client),
            feed_url: feed_url.into(),
            source: source.into(),
        }
    }
}

/// A request-level failure, rendered as `500 {"error": ...}`.
#[derive(Debug)]
pub struct ApiError(FeedError);

impl From<FeedError> for ApiError {
    fn from(err: FeedError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error!(kind = self.0.kind().as_str(), error = %self.0, "Feed request failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorEnvelope::new(FETCH_FAILED_MESSAGE)),
        )
            .into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            TRAINS_ROUTE,
            get(trains).options(preflight).fallback(method_not_allowed),
        )
        .layer(middleware::map_response(cors::apply_cors))
        .with_state(state)
}

#[tracing::instrument(skip(state))]
async fn trains(State(state): State<AppState>) -> Result<Json<TrainsEnvelope>, ApiError> {
    let envelope = fetch_trains(state.client.as_ref(), &state.feed_url, &state.source).await?;
    info!(count = envelope.count, "Trains served");
    Ok(Json(envelope))
}

async fn preflight() -> StatusCode {
    StatusCode::OK
}

async fn method_not_allowed() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::ALLOW, "GET, OPTIONS")],
        Json(ErrorEnvelope::new("Method not allowed")),
    )
}

/// Binds `config.bind` and serves until Ctrl+C.
pub async fn serve(config: ServeConfig) -> Result<()> {
    let client = BasicClient::with_timeouts(config.timeout, config.connect_timeout)
        .context("Failed to build feed HTTP client")?;
    let state = AppState::new(client, &config.feed_url, &config.source);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind))?;

    info!(
        addr = %config.bind,
        route = TRAINS_ROUTE,
        feed_url = %config.feed_url,
        "Relay listening"
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Relay stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        // Without a signal handler the server runs until killed.
        error!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}
