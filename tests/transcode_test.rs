//! Transcode session lifecycle tests.
//!
//! These use shell one-liners in place of ffmpeg via the [`Transcoder`]
//! seam; the real encoder is only exercised by its argument-profile unit
//! tests.

use livegate::error::Error;
use livegate::transcode::{spawn_session, TranscodeSession, Transcoder};
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

struct ShellTranscoder(&'static str);

impl Transcoder for ShellTranscoder {
    fn start(&self, _source: &str, out_dir: &Path, _playlist: &str) -> std::io::Result<Child> {
        Command::new("sh")
            .arg("-c")
            .arg(self.0)
            .current_dir(out_dir)
            .stdin(Stdio::null())
            .spawn()
    }
}

struct MissingBinary;

impl Transcoder for MissingBinary {
    fn start(&self, _source: &str, _out_dir: &Path, _playlist: &str) -> std::io::Result<Child> {
        Command::new("livegate-missing-encoder").spawn()
    }
}

fn session_with(transcoder: Arc<dyn Transcoder>, out_dir: &Path) -> TranscodeSession {
    TranscodeSession::with_transcoder(
        "rtsp://cam.local/ch0".to_string(),
        out_dir.to_path_buf(),
        "stream.m3u8".to_string(),
        transcoder,
    )
}

#[test]
fn uncreatable_output_dir_is_launch_error() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, b"x").unwrap();

    // A file sits where a parent directory is needed.
    let session = session_with(Arc::new(ShellTranscoder("true")), &blocker.join("hls"));
    match session.run() {
        Err(Error::Launch(_)) => {}
        other => panic!("expected LaunchError, got {other:?}"),
    }
}

#[test]
fn non_directory_output_path_is_launch_error() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, b"x").unwrap();

    let session = session_with(Arc::new(ShellTranscoder("true")), &blocker);
    assert!(matches!(session.run(), Err(Error::Launch(_))));
}

#[test]
fn missing_binary_is_launch_error() {
    let dir = tempfile::tempdir().unwrap();
    let out_dir = dir.path().join("hls");

    let session = session_with(Arc::new(MissingBinary), &out_dir);
    assert!(matches!(session.run(), Err(Error::Launch(_))));
    // The directory was still created before the spawn attempt.
    assert!(out_dir.is_dir());
}

#[test]
fn session_runs_to_exit_and_populates_store() {
    let dir = tempfile::tempdir().unwrap();
    let out_dir = dir.path().join("hls");

    let session = session_with(
        Arc::new(ShellTranscoder("printf '#EXTM3U\\n' > stream.m3u8")),
        &out_dir,
    );
    let exit = session.run().unwrap();
    assert!(exit.status.success());
    assert!(out_dir.join("stream.m3u8").is_file());
}

#[test]
fn failing_child_exit_status_is_recorded() {
    let dir = tempfile::tempdir().unwrap();
    let session = session_with(Arc::new(ShellTranscoder("exit 3")), &dir.path().join("hls"));

    let exit = session.run().unwrap();
    assert!(!exit.status.success());
    assert_eq!(exit.status.code(), Some(3));
}

#[test]
fn stop_signal_terminates_long_running_child() {
    let dir = tempfile::tempdir().unwrap();
    let session = session_with(
        Arc::new(ShellTranscoder("exec sleep 30")),
        &dir.path().join("hls"),
    )
    .with_grace(Duration::ZERO);

    session.stop_signal().store(true, Ordering::Relaxed);
    let exit = session.run().unwrap();
    assert!(!exit.status.success());
}

#[tokio::test]
async fn spawned_session_joins_after_stop() {
    let dir = tempfile::tempdir().unwrap();
    let session = session_with(
        Arc::new(ShellTranscoder("exec sleep 30")),
        &dir.path().join("hls"),
    )
    .with_grace(Duration::ZERO);

    let handle = spawn_session(session);
    handle.stop();
    tokio::time::timeout(Duration::from_secs(10), handle.join())
        .await
        .expect("session did not stop within timeout");
}
