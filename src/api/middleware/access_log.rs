//! Request logging middleware.
//!
//! Logs every API request with client, method, path, response status and
//! latency. Runs innermost so rate-limited requests are logged by the
//! limiter instead.

use std::time::Instant;

use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;

use super::rate::rate_key;

pub async fn log_access(req: Request<axum::body::Body>, next: Next) -> Response {
    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let client = rate_key(&req);
    let started = Instant::now();

    let response = next.run(req).await;

    let status = response.status().as_u16();
    let elapsed_ms = started.elapsed().as_millis() as u64;
    if response.status().is_server_error() {
        tracing::warn!(%client, %method, %path, status, elapsed_ms, "API request failed");
    } else {
        tracing::info!(%client, %method, %path, status, elapsed_ms, "API request");
    }

    response
}
