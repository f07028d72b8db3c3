//! Livegate - RTSP to HLS live streaming gateway
//!
//! This library crate exposes the core functionality for integration testing.

pub mod config;
pub mod error;
pub mod presence;
pub mod server;
pub mod store;
pub mod streaming;
pub mod transcode;
