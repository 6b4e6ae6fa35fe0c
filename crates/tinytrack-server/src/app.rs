use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{routes, state::AppState};

/// Beacon bodies are rejected at the boundary beyond this size; the core
/// never sees an oversized payload.
pub const BEACON_BODY_LIMIT: usize = 16 * 1024;

/// Construct the axum [`Router`] with all routes and middleware attached.
///
/// Middleware order (outermost first on request):
/// 1. `TraceLayer` — structured request/response logging via `tracing`.
/// 2. `CorsLayer` — the pixel and beacon are embedded on third-party pages;
///    with no configured origins the layer allows any origin, matching the
///    tracker's default posture. Set `TINYTRACK_CORS_ORIGINS` to restrict
///    per deployment.
pub fn build_app(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    Router::new()
        .route("/health", get(routes::health::health))
        .route("/pixel.gif", get(routes::pixel::pixel))
        .route(
            "/event",
            post(routes::beacon::beacon).layer(DefaultBodyLimit::max(BEACON_BODY_LIMIT)),
        )
        .route("/stats", get(routes::stats::stats))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let list: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(list))
        .allow_methods(Any)
        .allow_headers(Any)
}
