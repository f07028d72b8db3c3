//! Transcode session supervision.
//!
//! One [`TranscodeSession`] owns one external transcoder process converting a
//! live RTSP source into a rolling HLS window on disk. The session blocks the
//! thread it runs on for the lifetime of the process (RTSP sources are
//! effectively infinite), so it is always run on a dedicated blocking task.
//! Progress is observable only through the files appearing in the output
//! directory; there is no event channel back from the encoder.
//!
//! A session that dies is not restarted. The symptom is a segment store that
//! stops updating, which the serving path already tolerates.

use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::Error;

/// Default playlist filename generated per stream.
pub const DEFAULT_PLAYLIST: &str = "stream.m3u8";

/// How long a stopped session waits for the child to exit before killing it.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

const POLL_INTERVAL: Duration = Duration::from_millis(500);

// Fixed encode profile. Policy constants of this version, not configurable.
const SCALE_FILTER: &str = "scale=1920:1080";
const VIDEO_CODEC: &str = "libx264";
const FRAME_RATE: &str = "25";
const VIDEO_BITRATE: &str = "1000000";
const VIDEO_CRF: &str = "31";
const AUDIO_CODEC: &str = "aac";
const SEGMENT_SECONDS: &str = "120";
const PLAYLIST_WINDOW: &str = "10";

/// Boundary to the external encoder so alternatives can be substituted
/// without touching the supervision logic.
pub trait Transcoder: Send + Sync {
    /// Spawn the encoder with `out_dir` as its working directory.
    fn start(&self, source: &str, out_dir: &Path, playlist: &str) -> std::io::Result<Child>;
}

/// Invokes `ffmpeg` with the fixed live profile.
pub struct FfmpegTranscoder;

impl FfmpegTranscoder {
    /// Full argument vector for one source/playlist pair.
    pub fn args(source: &str, playlist: &str) -> Vec<String> {
        [
            "-v",
            "verbose",
            "-i",
            source,
            "-vf",
            SCALE_FILTER,
            "-vcodec",
            VIDEO_CODEC,
            "-r",
            FRAME_RATE,
            "-b:v",
            VIDEO_BITRATE,
            "-crf",
            VIDEO_CRF,
            "-acodec",
            AUDIO_CODEC,
            "-sc_threshold",
            "0",
            "-f",
            "hls",
            "-hls_time",
            SEGMENT_SECONDS,
            "-segment_time",
            SEGMENT_SECONDS,
            "-hls_list_size",
            PLAYLIST_WINDOW,
            playlist,
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }
}

impl Transcoder for FfmpegTranscoder {
    fn start(&self, source: &str, out_dir: &Path, playlist: &str) -> std::io::Result<Child> {
        Command::new("ffmpeg")
            .args(Self::args(source, playlist))
            .current_dir(out_dir)
            .stdin(Stdio::null())
            .spawn()
    }
}

/// Record of a finished session.
#[derive(Debug)]
pub struct SessionExit {
    pub status: ExitStatus,
}

/// Supervises one transcoder process bound to one source and output directory.
pub struct TranscodeSession {
    source: String,
    out_dir: PathBuf,
    playlist: String,
    transcoder: Arc<dyn Transcoder>,
    stop_signal: Arc<AtomicBool>,
    grace: Duration,
}

impl TranscodeSession {
    pub fn new(source: String, out_dir: PathBuf, playlist: String) -> Self {
        Self::with_transcoder(source, out_dir, playlist, Arc::new(FfmpegTranscoder))
    }

    pub fn with_transcoder(
        source: String,
        out_dir: PathBuf,
        playlist: String,
        transcoder: Arc<dyn Transcoder>,
    ) -> Self {
        Self {
            source,
            out_dir,
            playlist,
            transcoder,
            stop_signal: Arc::new(AtomicBool::new(false)),
            grace: SHUTDOWN_GRACE,
        }
    }

    /// Override the shutdown grace period.
    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    /// Get a clone of the stop signal for external control.
    pub fn stop_signal(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop_signal)
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    /// Run the external transcoder to completion.
    ///
    /// Blocks the calling thread until the process exits or the stop signal
    /// is raised and the grace period runs out. Spawn failures (uncreatable
    /// output directory, missing binary) surface as [`Error::Launch`].
    pub fn run(&self) -> Result<SessionExit, Error> {
        if self.out_dir.exists() && !self.out_dir.is_dir() {
            return Err(Error::Launch(std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                format!("output path is not a directory: {:?}", self.out_dir),
            )));
        }
        std::fs::create_dir_all(&self.out_dir).map_err(Error::Launch)?;

        tracing::info!(
            source = %self.source,
            out_dir = ?self.out_dir,
            "Starting transcode session"
        );

        let mut child = self
            .transcoder
            .start(&self.source, &self.out_dir, &self.playlist)
            .map_err(Error::Launch)?;

        let mut term_sent_at: Option<Instant> = None;
        loop {
            match child.try_wait() {
                Ok(Some(status)) => {
                    if status.success() {
                        tracing::info!(source = %self.source, "Transcode session finished");
                    } else {
                        tracing::warn!(
                            source = %self.source,
                            %status,
                            "Transcode session exited abnormally"
                        );
                    }
                    return Ok(SessionExit { status });
                }
                Ok(None) => {}
                Err(e) => return Err(self.reap(&mut child, e)),
            }

            if self.stop_signal.load(Ordering::Relaxed) {
                match term_sent_at {
                    None => {
                        tracing::info!(source = %self.source, "Signalling transcoder to exit");
                        request_exit(&child);
                        term_sent_at = Some(Instant::now());
                    }
                    Some(sent) if sent.elapsed() >= self.grace => {
                        tracing::warn!(
                            source = %self.source,
                            "Transcoder did not exit within grace period, killing"
                        );
                        if let Err(e) = child.kill() {
                            return Err(self.reap(&mut child, e));
                        }
                        let status = child.wait().map_err(Error::Supervise)?;
                        return Ok(SessionExit { status });
                    }
                    Some(_) => {}
                }
            }

            std::thread::sleep(POLL_INTERVAL);
        }
    }

    /// Best-effort kill-and-reap before surfacing a supervision failure, so
    /// the error path never leaves a dangling process.
    fn reap(&self, child: &mut Child, cause: std::io::Error) -> Error {
        let _ = child.kill();
        let _ = child.wait();
        tracing::error!(source = %self.source, "Transcode supervision failed: {}", cause);
        Error::Supervise(cause)
    }
}

#[cfg(unix)]
fn request_exit(child: &Child) {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    let _ = kill(Pid::from_raw(child.id() as i32), Signal::SIGTERM);
}

#[cfg(not(unix))]
fn request_exit(_child: &Child) {}

/// Handle to a session running on a blocking task.
pub struct SessionHandle {
    stop: Arc<AtomicBool>,
    handle: tokio::task::JoinHandle<()>,
}

impl SessionHandle {
    /// Raise the stop signal. The session exits within its grace period.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    /// Wait for the supervising task to finish.
    pub async fn join(self) {
        let _ = self.handle.await;
    }
}

/// Spawn a session on a dedicated blocking task so it never stalls the
/// request-serving runtime.
pub fn spawn_session(session: TranscodeSession) -> SessionHandle {
    let stop = session.stop_signal();
    let handle = tokio::task::spawn_blocking(move || match session.run() {
        Ok(exit) => {
            tracing::debug!(status = %exit.status, "Transcode task complete");
        }
        Err(e) => {
            tracing::error!("Transcode session failed: {}", e);
        }
    });
    SessionHandle { stop, handle }
}
