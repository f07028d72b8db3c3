//! Live HLS file serving.
//!
//! Routes:
//! - `GET /live/{folder}/{file_path}` - playlist or segment bytes from the
//!   segment store
//!
//! Delivery is size-dispatched: small files go out as one whole response,
//! large ones as a progressive sequence of fixed-size chunks. Readers never
//! coordinate with the transcoder writing the store; a file that vanishes
//! mid-read ends the response, not the process.

mod live;

pub use live::{chunk_stream, serve_live_file};

use axum::{routing::get, Router};

use crate::server::AppContext;

/// Files below this size are returned in a single response.
pub const WHOLE_FILE_MAX: u64 = 10 * 1024 * 1024;

/// Read granularity for chunked delivery.
pub const CHUNK_SIZE: usize = 4096;

/// Delivery strategy for one response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Whole,
    Chunked,
}

/// Size-based dispatch between whole-file and chunked delivery.
///
/// A file smaller than one chunk is always served whole, even though the
/// 10 MiB gate already guarantees that today.
pub fn delivery_for(size: u64) -> Delivery {
    if size < WHOLE_FILE_MAX || size < CHUNK_SIZE as u64 {
        Delivery::Whole
    } else {
        Delivery::Chunked
    }
}

/// Create the live content router.
pub fn live_router() -> Router<AppContext> {
    Router::new().route("/:folder/*file_path", get(serve_live_file))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_files_are_whole() {
        assert_eq!(delivery_for(0), Delivery::Whole);
        assert_eq!(delivery_for(812), Delivery::Whole);
        assert_eq!(delivery_for(WHOLE_FILE_MAX - 1), Delivery::Whole);
    }

    #[test]
    fn large_files_are_chunked() {
        assert_eq!(delivery_for(WHOLE_FILE_MAX), Delivery::Chunked);
        assert_eq!(delivery_for(12 * 1024 * 1024), Delivery::Chunked);
    }
}
