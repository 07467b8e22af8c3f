//! CLI entry point for the KTMB realtime train relay.
//!
//! `serve` runs the HTTP relay; `snapshot` runs the pipeline once against a
//! URL or a local protobuf file and logs the resulting JSON.

use std::ffi::OsStr;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use ktmb_relay::{
    fetch::{BasicClient, fetch_bytes},
    output::{DEFAULT_SOURCE, print_json, print_pretty},
    pipeline::trains_from_bytes,
    server::{ServeConfig, serve},
};
use tracing::info;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

const DEFAULT_FEED_URL: &str = "https://api.data.gov.my/gtfs-realtime/vehicle-position/ktmb";
const DEFAULT_TIMEOUT_SECS: u64 = 15;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Parser)]
#[command(name = "ktmb_relay")]
#[command(about = "Relays the KTMB GTFS-RT vehicle feed as simplified JSON", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the normalized feed over HTTP
    Serve(ServeArgs),
    /// Normalize a GTFS-RT feed once from a file or URL and log the JSON
    Snapshot {
        /// Path to file or URL to fetch
        #[arg(value_name = "FILE_OR_URL", default_value = DEFAULT_FEED_URL)]
        source: String,

        /// Label written to the `source` field
        #[arg(long, env = "FEED_SOURCE", default_value = DEFAULT_SOURCE)]
        label: String,

        /// Total timeout for the upstream fetch, in seconds
        #[arg(long, env = "FETCH_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
        timeout_secs: u64,

        /// Connect timeout for the upstream fetch, in seconds
        #[arg(
            long,
            env = "FETCH_CONNECT_TIMEOUT_SECS",
            default_value_t = DEFAULT_CONNECT_TIMEOUT_SECS
        )]
        connect_timeout_secs: u64,
    },
}

#[derive(Args)]
struct ServeArgs {
    /// Address to listen on
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:3000")]
    bind: SocketAddr,

    /// Upstream GTFS-RT vehicle position feed
    #[arg(long, env = "FEED_URL", default_value = DEFAULT_FEED_URL)]
    feed_url: String,

    /// Label written to the `source` field
    #[arg(long, env = "FEED_SOURCE", default_value = DEFAULT_SOURCE)]
    source: String,

    /// Total timeout for one upstream fetch, in seconds
    #[arg(long, env = "FETCH_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,

    /// Connect timeout for one upstream fetch, in seconds
    #[arg(
        long,
        env = "FETCH_CONNECT_TIMEOUT_SECS",
        default_value_t = DEFAULT_CONNECT_TIMEOUT_SECS
    )]
    connect_timeout_secs: u64,
}

impl From<ServeArgs> for ServeConfig {
    fn from(args: ServeArgs) -> Self {
        ServeConfig {
            bind: args.bind,
            feed_url: args.feed_url,
            source: args.source,
            timeout: Duration::from_secs(args.timeout_secs),
            connect_timeout: Duration::from_secs(args.connect_timeout_secs),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/ktmb_relay.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("ktmb_relay.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(env_filter("RUST_LOG", LevelFilter::INFO));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(env_filter("RUST_LOG_JSON", LevelFilter::DEBUG));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve(args) => {
            serve(args.into()).await?;
        }
        Commands::Snapshot {
            source,
            label,
            timeout_secs,
            connect_timeout_secs,
        } => {
            let bytes = fetcher(
                &source,
                Duration::from_secs(timeout_secs),
                Duration::from_secs(connect_timeout_secs),
            )
            .await?;
            let envelope = trains_from_bytes(&bytes, &label)?;
            info!(count = envelope.count, "Snapshot normalized");

            print_pretty(&envelope);
            print_json(&envelope)?;
        }
    }

    Ok(())
}

/// Filter read from `var`, falling back to `default` when the variable is
/// unset or empty.
fn env_filter(var: &str, default: LevelFilter) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(default.into())
        .with_env_var(var)
        .from_env_lossy()
}

/// Loads feed data from a local file path or fetches it over HTTP.
#[tracing::instrument(fields(source = %url))]
async fn fetcher(url: &str, timeout: Duration, connect_timeout: Duration) -> Result<Vec<u8>> {
    let bytes = if url.starts_with("http") {
        let client = BasicClient::with_timeouts(timeout, connect_timeout)?;
        fetch_bytes(&client, url).await?.to_vec()
    } else {
        std::fs::read(url)?
    };
    Ok(bytes)
}
