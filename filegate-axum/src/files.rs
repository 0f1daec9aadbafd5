//! Route handlers for `/files` and `/wxfiles`.

use axum::{
    body::{Body, Bytes},
    extract::{Path, Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use filegate_blob::{Download, FileCtx, FileError, StoredFile};
use serde_json::json;
use tracing::{debug, warn};

use crate::{FilegateAxumError, FilegateState};

pub const APPLICATION_ID_HEADER: &str = "x-parse-application-id";
pub const MASTER_KEY_HEADER: &str = "x-parse-master-key";
pub const REQUEST_ID_HEADER: &str = "x-request-id";

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
}

fn file_ctx(app_id: &str, headers: &HeaderMap) -> FileCtx {
    let ctx = FileCtx::new(app_id);
    match header_str(headers, REQUEST_ID_HEADER) {
        Some(id) => ctx.with_request_id(id),
        None => ctx,
    }
}

fn app_ctx(state: &FilegateState, headers: &HeaderMap) -> FileCtx {
    let app_id = header_str(headers, APPLICATION_ID_HEADER)
        .unwrap_or(state.config().default_app_id.as_str());
    file_ctx(app_id, headers)
}

fn stored_response(status: StatusCode, stored: StoredFile) -> Response {
    (status, [(header::LOCATION, stored.url.clone())], Json(stored)).into_response()
}

/// `GET /files/{app_id}/{filename}`
pub async fn get_file(
    State(state): State<FilegateState>,
    Path((app_id, filename)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Response, FilegateAxumError> {
    let ctx = file_ctx(&app_id, &headers);
    let range = header_str(&headers, header::RANGE.as_str());
    debug!(app_id = %ctx.app_id, filename = %filename, range, "download requested");

    match state.files.download(&ctx, &filename, range).await? {
        Download::Full { data, content_type } => Ok((
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, content_type),
                (header::CONTENT_LENGTH, data.len().to_string()),
            ],
            data,
        )
            .into_response()),
        Download::Partial(partial) => Ok((
            StatusCode::PARTIAL_CONTENT,
            [
                (header::CONTENT_RANGE, partial.range.content_range()),
                (header::ACCEPT_RANGES, "bytes".to_string()),
                (header::CONTENT_LENGTH, partial.range.content_length.to_string()),
                (header::CONTENT_TYPE, partial.content_type),
            ],
            Body::from_stream(partial.body),
        )
            .into_response()),
    }
}

/// `POST /files` without a file name
pub async fn missing_file_name() -> FilegateAxumError {
    FileError::invalid_file_name("Filename not provided.").into()
}

/// `POST /files/{filename}`
pub async fn create_file(
    State(state): State<FilegateState>,
    Path(filename): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, FilegateAxumError> {
    let ctx = app_ctx(&state, &headers);
    let content_type = header_str(&headers, header::CONTENT_TYPE.as_str());

    let stored = state
        .files
        .create_file(&ctx, &filename, body, content_type)
        .await?;
    Ok(stored_response(StatusCode::CREATED, stored))
}

/// `POST /wxfiles/{filename}`, the file wrapped in a multipart envelope
pub async fn create_from_envelope(
    State(state): State<FilegateState>,
    Path(filename): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, FilegateAxumError> {
    let ctx = app_ctx(&state, &headers);
    let content_type = header_str(&headers, header::CONTENT_TYPE.as_str());

    let stored = state
        .files
        .create_from_envelope(&ctx, &filename, body, content_type)
        .await?;
    Ok(stored_response(StatusCode::OK, stored))
}

/// `DELETE /files/{filename}`
pub async fn delete_file(
    State(state): State<FilegateState>,
    Path(filename): Path<String>,
    headers: HeaderMap,
) -> Result<StatusCode, FilegateAxumError> {
    let ctx = app_ctx(&state, &headers);
    state.files.delete_file(&ctx, &filename).await?;
    Ok(StatusCode::OK)
}

/// Rejects the request unless it carries the configured master key.
pub async fn require_master_key(
    State(state): State<FilegateState>,
    request: Request,
    next: Next,
) -> Response {
    let authorized = match (
        state.config().master_key.as_deref(),
        header_str(request.headers(), MASTER_KEY_HEADER),
    ) {
        (Some(expected), Some(provided)) => expected == provided,
        _ => false,
    };
    if authorized {
        return next.run(request).await;
    }

    warn!(path = %request.uri().path(), "master key missing or wrong");
    (
        StatusCode::FORBIDDEN,
        Json(json!({ "error": "unauthorized" })),
    )
        .into_response()
}
