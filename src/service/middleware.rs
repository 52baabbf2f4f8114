//! Service middleware for request metrics.
//!
//! Emits one `request_metric` event per request under the
//! `element_registry::metrics` target, with element ids in the path
//! collapsed so the path label stays low-cardinality.

use axum::{extract::Request, middleware::Next, response::Response};
use regex_lite::Regex;
use std::sync::OnceLock;
use std::time::Instant;
use tracing::info;

/// Metrics middleware that records request counts and latency.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = normalize_path(request.uri().path());

    let response = next.run(request).await;

    info!(
        target: "element_registry::metrics",
        metric_type = "request",
        path = %path,
        method = %method,
        status = response.status().as_u16(),
        latency_ms = start.elapsed().as_millis() as u64,
        "request_metric"
    );

    response
}

/// Replace numeric path segments with `:id`.
pub fn normalize_path(path: &str) -> String {
    static ID_SEGMENT: OnceLock<Option<Regex>> = OnceLock::new();

    match ID_SEGMENT.get_or_init(|| Regex::new(r"/\d+(/|$)").ok()) {
        Some(re) => re.replace_all(path, "/:id$1").to_string(),
        None => path.to_string(),
    }
}
