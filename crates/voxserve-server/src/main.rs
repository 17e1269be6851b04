//! voxserved: HTTP server for the voxserve voice registry.

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use voxserve_server::{build_router, AppState};

#[derive(Debug, Parser)]
#[command(name = "voxserved", version, about = "Voice registry and synthesis server")]
struct Args {
    /// Directory holding voice model artifacts and the alias table
    #[arg(long, env = "VOXSERVE_VOICES_DIR", default_value = "/voices")]
    voices_dir: PathBuf,

    /// Address to listen on
    #[arg(long, env = "VOXSERVE_BIND", default_value = "0.0.0.0:5000")]
    bind: SocketAddr,

    /// Voice used when a synthesis request names none
    #[arg(long, env = "VOXSERVE_DEFAULT_VOICE", default_value = "en_US-lessac-medium")]
    default_voice: String,

    /// Models to load eagerly at startup (repeatable)
    #[arg(long)]
    preload: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tokio::fs::create_dir_all(&args.voices_dir).await?;
    let state = Arc::new(AppState::new(&args.voices_dir, &args.default_voice));

    // Warm the default voice alongside anything explicitly requested
    let warm = state.warmup_models(&args.preload);
    let loaded = state.registry.preload(&warm).await;
    tracing::info!(requested = warm.len(), loaded, "preload finished");

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(args.bind).await?;
    tracing::info!(addr = %args.bind, voices_dir = %args.voices_dir.display(), "listening");
    axum::serve(listener, app).await?;
    Ok(())
}
