//! Shared test harness for HTTP-level tests.
//!
//! Builds the real router over a temp live root and binds Axum on a random
//! port so tests can drive it with a plain HTTP client.

use std::net::SocketAddr;
use std::path::PathBuf;

use tempfile::TempDir;

use livegate::presence::PresenceRegistry;
use livegate::server::{create_router, AppContext};
use livegate::store::SegmentStore;

pub struct TestHarness {
    pub live_root: TempDir,
    pub ctx: AppContext,
}

impl TestHarness {
    pub fn new() -> Self {
        let live_root = tempfile::tempdir().expect("failed to create temp live root");

        let ctx = AppContext {
            store: SegmentStore::new(live_root.path()),
            presence: PresenceRegistry::default(),
        };

        Self { live_root, ctx }
    }

    /// Write a file under the live root, creating parent directories.
    pub fn write_file(&self, rel: &str, data: &[u8]) -> PathBuf {
        let path = self.live_root.path().join(rel);
        std::fs::create_dir_all(path.parent().expect("file has a parent")).unwrap();
        std::fs::write(&path, data).unwrap();
        path
    }

    /// Start an Axum server on a random port and return the harness together
    /// with the bound socket address.
    pub async fn with_server() -> (Self, SocketAddr) {
        let harness = Self::new();
        let app = create_router(harness.ctx.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (harness, addr)
    }
}
