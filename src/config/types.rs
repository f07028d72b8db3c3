use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub live: LiveConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    8001
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LiveConfig {
    /// Root directory for generated live content.
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Playlist filename generated per stream.
    #[serde(default = "default_playlist")]
    pub playlist: String,

    /// Optional dotenv file loaded into the process environment at startup.
    #[serde(default)]
    pub env_file: Option<PathBuf>,

    /// RTSP sources, one transcode session each.
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
}

fn default_root() -> PathBuf {
    PathBuf::from("../live")
}
fn default_playlist() -> String {
    crate::transcode::DEFAULT_PLAYLIST.to_string()
}
fn default_stream_name() -> String {
    "hls".to_string()
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            playlist: default_playlist(),
            env_file: None,
            sources: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceConfig {
    /// RTSP origin URL, credentials included. Reachability is the
    /// transcoder's problem, not validated here.
    pub url: String,

    /// Output subdirectory under the live root.
    #[serde(default = "default_stream_name")]
    pub name: String,
}
