use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use filegate_blob::FileError;
use serde_json::json;
use tracing::{error, warn};

#[derive(Debug)]
pub struct FilegateAxumError(pub anyhow::Error);

impl From<anyhow::Error> for FilegateAxumError {
    fn from(e: anyhow::Error) -> Self {
        Self(e)
    }
}

impl From<FileError> for FilegateAxumError {
    fn from(e: FileError) -> Self {
        Self(e.into())
    }
}

impl IntoResponse for FilegateAxumError {
    fn into_response(self) -> Response {
        // Find a FileError even when wrapped by anyhow contexts
        if let Some(err) = self.0.chain().find_map(|e| e.downcast_ref::<FileError>()) {
            return file_error_response(err);
        }

        error!(error = ?self.0, "unhandled error");
        internal_error()
    }
}

fn file_error_response(err: &FileError) -> Response {
    match err {
        FileError::FileNotFound { name } => {
            warn!(name = %name, "file not found");
            (
                StatusCode::NOT_FOUND,
                [(header::CONTENT_TYPE, "text/plain")],
                "File not found.",
            )
                .into_response()
        }
        FileError::RangeNotSatisfiable { total_size } => {
            warn!(total_size, "range not satisfiable");
            (
                StatusCode::RANGE_NOT_SATISFIABLE,
                [(header::CONTENT_RANGE, format!("bytes */{total_size}"))],
            )
                .into_response()
        }
        _ => {
            let code = err.code();
            let status =
                StatusCode::from_u16(code.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            if status.is_server_error() {
                error!(error = ?err, "file operation failed");
                return internal_error();
            }

            warn!(code = code.code(), kind = code.name(), error = %err, "rejected file request");
            (
                status,
                Json(json!({ "code": code.code(), "error": err.to_string() })),
            )
                .into_response()
        }
    }
}

fn internal_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "code": 1, "error": "Internal server error." })),
    )
        .into_response()
}
