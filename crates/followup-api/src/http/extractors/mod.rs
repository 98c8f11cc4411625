//! Request extractors shared across handlers.

pub mod auth;

use std::net::SocketAddr;

use axum::http::HeaderMap;

/// Best-effort client address for rate limiting.
///
/// Behind the usual reverse proxy the socket peer is the proxy, so the
/// first entry of `X-Forwarded-For` wins when present.
pub fn client_ip(headers: &HeaderMap, addr: &SocketAddr) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| addr.ip().to_string())
}
