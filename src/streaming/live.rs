//! Request handler for live playlist and segment files.

use axum::{
    body::Body,
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use futures::Stream;
use tokio::io::AsyncReadExt;

use super::{delivery_for, Delivery, CHUNK_SIZE};
use crate::error::Error;
use crate::server::AppContext;
use crate::store::content_type_for;

/// Serve one file from the segment store.
///
/// The resolved file is re-examined on every request; the playlist and the
/// segments it references churn continuously underneath us. Races with the
/// sliding window surface as 404s or truncated streams, both tolerated.
pub async fn serve_live_file(
    State(ctx): State<AppContext>,
    Path((folder, file_path)): Path<(String, String)>,
) -> Result<Response, Error> {
    let requested = format!("{}/{}", folder, file_path);
    let full_path = ctx.store.resolve(&requested)?;

    let metadata = tokio::fs::metadata(&full_path)
        .await
        .map_err(|_| Error::NotFound)?;
    if metadata.is_dir() {
        return Err(Error::NotFound);
    }

    let content_type = content_type_for(&file_path);

    let body = match delivery_for(metadata.len()) {
        Delivery::Whole => {
            let bytes = tokio::fs::read(&full_path)
                .await
                .map_err(|_| Error::NotFound)?;
            Body::from(bytes)
        }
        Delivery::Chunked => {
            let file = tokio::fs::File::open(&full_path)
                .await
                .map_err(|_| Error::NotFound)?;
            tracing::debug!(path = %requested, size = metadata.len(), "Serving chunked");
            Body::from_stream(chunk_stream(file))
        }
    };

    Ok(([(header::CONTENT_TYPE, content_type)], body).into_response())
}

/// Stream a file as chunks of exactly [`CHUNK_SIZE`] bytes, short final
/// chunk excepted.
///
/// A single `read` may return less than a full buffer, so each chunk is
/// refilled until full or end-of-file before it is yielded. Errors terminate
/// the stream; the transport aborts the in-flight response.
pub fn chunk_stream(
    file: tokio::fs::File,
) -> impl Stream<Item = Result<Bytes, std::io::Error>> {
    futures::stream::try_unfold(file, |mut file| async move {
        let mut buf = vec![0u8; CHUNK_SIZE];
        let mut filled = 0;
        while filled < CHUNK_SIZE {
            let n = file.read(&mut buf[filled..]).await?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        if filled == 0 {
            return Ok(None);
        }
        buf.truncate(filled);
        Ok(Some((Bytes::from(buf), file)))
    })
}
