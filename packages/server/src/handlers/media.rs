use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use common::storage::ImageKey;
use tokio_util::io::ReaderStream;
use tracing::instrument;

use crate::error::AppError;
use crate::state::AppState;

/// Stream a stored cat image. Mounted only in debug mode.
#[instrument(skip(state, headers))]
pub async fn serve_media(
    State(state): State<AppState>,
    Path(path): Path<String>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let key = ImageKey::from_path(&path).map_err(|_| AppError::NotFound("Not found".into()))?;

    let etag_value = format!("\"{}\"", key.to_hex());
    if let Some(if_none_match) = headers.get(header::IF_NONE_MATCH)
        && let Ok(val) = if_none_match.to_str()
        && (val == etag_value || val == "*")
    {
        return Ok(StatusCode::NOT_MODIFIED.into_response());
    }

    let image = state.images.open(&key).await?;
    let body = Body::from_stream(ReaderStream::new(image.reader));

    let content_type = mime_guess::from_ext(key.extension())
        .first_or_octet_stream()
        .to_string();

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, image.size.to_string())
        .header(header::ETAG, &etag_value)
        .header(header::CACHE_CONTROL, "public, max-age=3600")
        .body(body)
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))?;

    Ok(response)
}
