//! Cross-origin policy applied to every response of the relay.

use axum::http::{HeaderMap, HeaderValue, header};
use axum::response::Response;

/// Static description of the cross-origin headers the relay sends.
#[derive(Debug, Clone, Copy)]
pub struct CorsPolicy {
    pub allow_origin: &'static str,
    pub allow_methods: &'static [&'static str],
    pub allow_headers: &'static [&'static str],
    pub allow_credentials: bool,
}

/// Any origin may read the feed. Credentials are not allowed: browsers
/// reject `Access-Control-Allow-Credentials: true` next to a wildcard origin,
/// and the relay has no cookies or auth to share anyway.
pub const CORS_POLICY: CorsPolicy = CorsPolicy {
    allow_origin: "*",
    allow_methods: &["GET", "OPTIONS"],
    allow_headers: &[
        "X-CSRF-Token",
        "X-Requested-With",
        "Accept",
        "Accept-Version",
        "Content-Length",
        "Content-MD5",
        "Content-Type",
        "Date",
        "X-Api-Version",
    ],
    allow_credentials: false,
};

impl CorsPolicy {
    pub fn apply(&self, headers: &mut HeaderMap) {
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static(self.allow_origin),
        );
        if let Ok(methods) = HeaderValue::from_str(&self.allow_methods.join(", ")) {
            headers.insert(header::ACCESS_CONTROL_ALLOW_METHODS, methods);
        }
        if let Ok(allowed) = HeaderValue::from_str(&self.allow_headers.join(", ")) {
            headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, allowed);
        }
        if self.allow_credentials {
            headers.insert(
                header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
                HeaderValue::from_static("true"),
            );
        }
    }
}

/// Response mapper installed with `axum::middleware::map_response`.
pub async fn apply_cors(mut response: Response) -> Response {
    CORS_POLICY.apply(response.headers_mut());
    response
}
