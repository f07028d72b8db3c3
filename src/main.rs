mod cli;

use livegate::{config, server, store::SegmentStore, transcode};

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use std::path::Path;

async fn start_gateway(
    host: Option<String>,
    port: Option<u16>,
    config_path: Option<&Path>,
) -> Result<()> {
    let mut config = config::load_config_or_default(config_path)?;

    // Override host/port from CLI if specified
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    config::load_env(&config);

    tracing::info!("Starting Livegate");
    tracing::info!(
        "Server will listen on {}:{}",
        config.server.host,
        config.server.port
    );

    // One transcode session per configured source, each on its own blocking
    // task so a slow or hung launch never stalls request handling.
    let store = SegmentStore::new(config.live.root.clone());
    let mut sessions = Vec::new();
    for source in &config.live.sources {
        let session = transcode::TranscodeSession::new(
            source.url.clone(),
            store.stream_dir(&source.name),
            config.live.playlist.clone(),
        );
        sessions.push(transcode::spawn_session(session));
    }
    if sessions.is_empty() {
        tracing::warn!("No live sources configured; serving existing content only");
    }

    let server_result = server::start_server(config).await;

    // Cleanup
    tracing::info!("Shutting down...");
    for handle in &sessions {
        handle.stop();
    }
    for handle in sessions {
        handle.join().await;
    }

    server_result
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "livegate=trace,tower_http=debug".to_string()
        } else {
            "livegate=debug,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Start { host, port } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(start_gateway(host, port, cli.config.as_deref()))
        }
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
    }
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            println!("  Server: {}:{}", config.server.host, config.server.port);
            println!("  Live root: {:?}", config.live.root);
            println!("  Playlist: {}", config.live.playlist);
            println!("  Sources: {}", config.live.sources.len());
        }
        None => {
            println!("No config file specified, using defaults");
            let config = config::Config::default();
            println!("Default config:");
            println!("  Server: {}:{}", config.server.host, config.server.port);
            println!("  Live root: {:?}", config.live.root);
        }
    }

    Ok(())
}
