//! Domain error taxonomy.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The output directory could not be created or the external transcoder
    /// could not be spawned. Fatal to one transcode session, never to the
    /// serving process.
    #[error("failed to launch transcoder: {0}")]
    Launch(std::io::Error),

    /// Missing file, directory request, or a path escaping the live root.
    /// All three are indistinguishable to clients.
    #[error("file not found")]
    NotFound,

    /// Polling, signalling, or reaping a running transcoder failed. The
    /// supervisor reaps the child before surfacing this.
    #[error("transcoder supervision failed: {0}")]
    Supervise(std::io::Error),

    /// I/O failure while a response is in flight (e.g. a segment evicted by
    /// the sliding window mid-read). Aborts the response, nothing more.
    #[error("stream interrupted: {0}")]
    StreamIo(#[from] std::io::Error),
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound => (StatusCode::NOT_FOUND, "File not found").into_response(),
            err => {
                tracing::error!("request failed: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
        }
    }
}
