use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::Response,
    Json,
};

use tinytrack_core::event::{BeaconBody, IngestPayload};
use tinytrack_core::normalize::normalize;

use crate::{error::AppError, routes::request_meta, state::AppState};

/// `POST /event` — JSON beacon ingestion for richer interaction payloads.
///
/// The body is decoded once into [`BeaconBody`] (16 KB cap enforced by the
/// router's `DefaultBodyLimit` before this handler runs) and normalized into
/// a canonical record. Success is `204 No Content`; the client treats the
/// whole exchange as fire-and-forget.
#[tracing::instrument(skip(state, headers, body))]
pub async fn beacon(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<BeaconBody>,
) -> Result<Response, AppError> {
    let meta = request_meta(&headers);
    let event = normalize(IngestPayload::Beacon(body), &meta);
    state.record_event(event).await?;

    let mut response = Response::new(axum::body::Body::empty());
    *response.status_mut() = StatusCode::NO_CONTENT;
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    Ok(response)
}
