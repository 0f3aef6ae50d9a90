//! Cross-origin headers for mock responses.
//! Origins come from the `allowedDomains` option.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue},
    middleware::Next,
    response::Response,
};

const ALLOW_HEADERS: &str = "Origin, X-Requested-With, Content-Type, Accept";

/// Origins allowed to read mock responses. `*` allows every origin.
#[derive(Debug, Clone)]
pub struct AllowedOrigins(Arc<Vec<String>>);

impl AllowedOrigins {
    pub fn new(domains: Vec<String>) -> Self {
        Self(Arc::new(domains))
    }

    /// Value for `Access-Control-Allow-Origin`, if any.
    pub fn allow_origin(&self, origin: Option<&HeaderValue>) -> Option<HeaderValue> {
        if self.0.iter().any(|d| d == "*") {
            return Some(HeaderValue::from_static("*"));
        }
        let origin = origin?;
        let requested = origin.to_str().ok()?;
        self.0
            .iter()
            .any(|d| d.eq_ignore_ascii_case(requested))
            .then(|| origin.clone())
    }
}

pub async fn cors_middleware(
    State(origins): State<AllowedOrigins>,
    req: Request,
    next: Next,
) -> Response {
    let origin = req.headers().get(header::ORIGIN).cloned();
    let mut res = next.run(req).await;

    let headers = res.headers_mut();
    if let Some(allowed) = origins.allow_origin(origin.as_ref()) {
        if allowed != "*" {
            headers.insert(header::VARY, HeaderValue::from_static("Origin"));
        }
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, allowed);
    }
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOW_HEADERS),
    );
    res
}
