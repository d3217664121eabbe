//! Fallback handlers: fixed 404 and generic 500.
//!
//! Handler errors and panics are logged with full detail server-side; the
//! client only ever sees [`INTERNAL_ERROR_MESSAGE`].

use std::any::Any;
use std::io;
use std::path::PathBuf;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

pub const NOT_FOUND_MESSAGE: &str = "404 - Page not found";
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Errors surfaced by request handlers.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("failed to read page document {path}: {source}")]
    Page {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, detail = ?self, "Request handler failed");
        internal_error()
    }
}

/// Terminal handler for requests nothing else matched.
pub async fn not_found() -> Response {
    (StatusCode::NOT_FOUND, NOT_FOUND_MESSAGE).into_response()
}

pub fn internal_error() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE).into_response()
}

/// Response for a panicking handler, used with `CatchPanicLayer::custom`.
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };

    tracing::error!(panic = %detail, "Request handler panicked");
    internal_error()
}
