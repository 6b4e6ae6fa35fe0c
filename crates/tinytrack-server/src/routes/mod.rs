pub mod beacon;
pub mod health;
pub mod pixel;
pub mod stats;

use axum::http::HeaderMap;

use tinytrack_core::event::RequestMeta;

/// Best-effort request metadata. The client IP comes from the first
/// `X-Forwarded-For` entry; both fields may be empty and the core treats
/// that as valid input.
pub(crate) fn request_meta(headers: &HeaderMap) -> RequestMeta {
    let source_ip = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string())
        .unwrap_or_default();

    let user_agent = headers
        .get(axum::http::header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    RequestMeta {
        source_ip,
        user_agent,
    }
}
