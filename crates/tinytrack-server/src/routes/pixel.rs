use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::Response,
};

use tinytrack_core::event::{IngestPayload, PixelParams};
use tinytrack_core::normalize::normalize;

use crate::{error::AppError, routes::request_meta, state::AppState};

/// 1×1 transparent GIF, returned unconditionally on success. Constant-size
/// body, so concurrent load never amplifies response latency or size.
pub(crate) const TRANSPARENT_GIF: &[u8] = &[
    71, 73, 70, 56, 57, 97, 1, 0, 1, 0, 128, 0, 0, 0, 0, 0, 255, 255, 255, 33, 249, 4, 1, 0, 0, 0,
    0, 44, 0, 0, 0, 0, 1, 0, 1, 0, 0, 2, 2, 68, 1, 0, 59,
];

/// `GET /pixel.gif` — image-tag ingestion for callers that cannot make
/// cross-origin POST requests.
///
/// Query parameters: `u` (url), `r` (referrer), `uid` (visitor token),
/// `event_type`. All optional; normalization is total, so this handler fails
/// only when the store write fails or times out.
#[tracing::instrument(skip(state, headers, params))]
pub async fn pixel(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PixelParams>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let meta = request_meta(&headers);
    let event = normalize(IngestPayload::Pixel(params), &meta);
    state.record_event(event).await?;

    let mut response = Response::new(axum::body::Body::from(TRANSPARENT_GIF));
    *response.status_mut() = StatusCode::OK;
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static("image/gif"));
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-store, must-revalidate"),
    );
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transparent_gif_has_valid_header() {
        assert_eq!(&TRANSPARENT_GIF[0..6], b"GIF89a");
    }

    #[test]
    fn transparent_gif_is_terminated() {
        assert_eq!(TRANSPARENT_GIF.last(), Some(&0x3B));
    }
}
