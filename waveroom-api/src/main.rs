//! waveroom-api - REST backend for the Waveroom collaborative studio
//!
//! Serves user accounts, projects with tracks and clips, social
//! features, static catalogs, and the audio upload/serve/delete
//! pipeline.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use waveroom_api::{build_router, AppState};
use waveroom_common::auth::load_signing_secret;
use waveroom_common::config::{resolve_data_folder, DataFolder};
use waveroom_common::db::init_database;

#[derive(Debug, Parser)]
#[command(name = "waveroom-api", about = "Waveroom REST backend")]
struct Cli {
    /// Data folder holding the database and uploaded audio
    #[arg(long)]
    root_folder: Option<PathBuf>,

    /// Port to listen on
    #[arg(long, env = "WAVEROOM_PORT", default_value_t = 5740)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Starting Waveroom API v{}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();

    // Resolve data folder (CLI > env > OS default) and create layout
    let folder = DataFolder::new(resolve_data_folder(cli.root_folder));
    folder.ensure_layout()?;
    info!("Data folder: {}", folder.root().display());

    let db_path = folder.database_path();
    let pool = init_database(&db_path).await?;
    info!("Database ready: {}", db_path.display());

    // Load (or generate on first run) the session token signing secret
    let signing_secret = load_signing_secret(&pool).await?;
    info!("Session signing secret loaded");

    let state = AppState::new(pool, folder.uploads_dir(), signing_secret);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", cli.port)).await?;
    info!("waveroom-api listening on http://127.0.0.1:{}", cli.port);
    info!("Health check: http://127.0.0.1:{}/health", cli.port);

    axum::serve(listener, app).await?;

    Ok(())
}
