use async_trait::async_trait;
use reqwest::{Request, Response};

/// Executes an outbound request to the feed provider.
///
/// Kept as a trait so the relay can run against a shared, preconfigured
/// client in production and a plain one in tests.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}
