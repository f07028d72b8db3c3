//! Segment store layout and path resolution.
//!
//! A single directory tree holds all generated live content: the configured
//! root, one subdirectory per logical stream (default `hls/`), and inside it
//! the rolling playlist plus `.ts` segment files. The transcoder is the only
//! writer under this root and the file server the only reader; neither side
//! locks, readers simply tolerate files that are missing or still growing.

use std::path::{Component, Path, PathBuf};

use crate::error::Error;

/// Content type for HLS playlists and MPEG-TS segments.
pub const PLAYLIST_CONTENT_TYPE: &str = "application/x-mpegURL";
/// Content type for everything else served from the store.
pub const MEDIA_CONTENT_TYPE: &str = "video/mp4";

/// Filesystem root for generated live content.
#[derive(Debug, Clone)]
pub struct SegmentStore {
    root: PathBuf,
}

impl SegmentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Output directory for one logical stream name.
    pub fn stream_dir(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Resolve a client-supplied relative path against the root.
    ///
    /// Purely lexical: rejects absolute paths and any `..` component so the
    /// result can never escape the root. Existence is the caller's problem;
    /// by the time a response is built the file may be gone again anyway.
    pub fn resolve(&self, requested: &str) -> Result<PathBuf, Error> {
        let mut clean = PathBuf::new();
        for component in Path::new(requested).components() {
            match component {
                Component::Normal(part) => clean.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(Error::NotFound)
                }
            }
        }
        if clean.as_os_str().is_empty() {
            return Err(Error::NotFound);
        }
        Ok(self.root.join(clean))
    }
}

/// Classify content by file extension. Recomputed per request, never cached.
pub fn content_type_for(path: &str) -> &'static str {
    if path.ends_with(".m3u8") || path.ends_with(".ts") {
        PLAYLIST_CONTENT_TYPE
    } else {
        MEDIA_CONTENT_TYPE
    }
}
