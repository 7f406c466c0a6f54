/// Chorus Server - voice-channel playback queue orchestrator
use anyhow::Context;
use chorus_core::{is_url_reference, FreeTextInterpreter, RequestKind, TrackResolver};
use chorus_server::{
    api,
    config::ServerConfig,
    services::{CatalogResolver, RoutingResolver, YtDlpResolver},
    state::AppState,
};
use clap::{Parser, Subcommand};
use std::{net::SocketAddr, path::PathBuf, sync::Arc};
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "chorus-server")]
#[command(about = "Chorus voice-channel playback queue orchestrator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Configuration file path
        #[arg(short, long, env = "CHORUS_CONFIG")]
        config: Option<PathBuf>,
    },
    /// Resolve a reference and print the tracks it yields
    Resolve {
        /// URL or free-text search
        reference: String,
        /// Treat the reference as a video-site playlist
        #[arg(long, conflicts_with = "catalog")]
        playlist: bool,
        /// Treat the reference as a catalog playlist
        #[arg(long)]
        catalog: bool,
        /// Configuration file path
        #[arg(short, long, env = "CHORUS_CONFIG")]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "chorus_server=info,chorus_playback=info,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config } => {
            serve(config).await?;
        }
        Commands::Resolve {
            reference,
            playlist,
            catalog,
            config,
        } => {
            let kind = if catalog {
                RequestKind::CatalogPlaylist
            } else if playlist {
                RequestKind::Playlist
            } else {
                RequestKind::Single
            };
            resolve(config, &reference, kind).await?;
        }
    }

    Ok(())
}

fn load_config(path: Option<PathBuf>) -> anyhow::Result<ServerConfig> {
    let config = ServerConfig::load(path.as_deref())?;
    config.validate()?;
    Ok(config)
}

async fn serve(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    tracing::info!("Starting Chorus Server");
    tracing::info!("Host: {}", config.server.host);
    tracing::info!("Port: {}", config.server.port);
    if config.catalog.credentials().is_none() {
        tracing::warn!("Catalog credentials missing, catalog links will fail to resolve");
    }

    let state = AppState::from_config(&config)?;
    let orchestrator = Arc::clone(&state.orchestrator);
    let app = api::router(state);

    let addr = SocketAddr::from((
        config.server.host.parse::<std::net::IpAddr>()?,
        config.server.port,
    ));

    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    orchestrator.shutdown().await;
    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn resolve(
    config_path: Option<PathBuf>,
    reference: &str,
    kind: RequestKind,
) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    let ytdlp = Arc::new(YtDlpResolver::new(
        config.resolver.ytdlp_path.clone(),
        config.resolver.format.clone(),
    )
    .with_timeout(config.playback.resolve_timeout()));
    let catalog = Arc::new(CatalogResolver::new(
        &config.catalog,
        ytdlp.clone(),
        ytdlp.clone(),
    )?);
    let resolver = RoutingResolver::new(ytdlp.clone(), catalog);

    let url = if is_url_reference(reference) || kind == RequestKind::CatalogPlaylist {
        reference.to_string()
    } else {
        let url = ytdlp.interpret(reference).await?;
        println!("Search \"{reference}\" matched {url}");
        url
    };

    let resolution = resolver.resolve(&url, kind).await?;

    println!("Tracks:");
    for (index, track) in resolution.tracks.iter().enumerate() {
        println!(
            "  {:>3}. {} [{}] <{}>",
            index + 1,
            track.title,
            track.display_duration(),
            track.source_url
        );
    }
    if resolution.skipped > 0 {
        println!("Skipped {} unavailable entries", resolution.skipped);
    }

    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            tracing::info!("Received terminate signal, shutting down");
        },
    }
}
