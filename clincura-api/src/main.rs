//! clincura-api - Gene-disease curation service
//!
//! REST backend for multi-tenant clinical validity curation: scopes and
//! memberships, the gene and workflow pair registries, and the curation
//! records with their scoring, workflow, and optimistic-lock machinery.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use clincura_common::config::{RootFolderInitializer, RootFolderResolver};
use clincura_common::db::init_database;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use clincura_api::{build_router, AppState};

/// Command-line arguments for clincura-api
#[derive(Parser, Debug)]
#[command(name = "clincura-api")]
#[command(about = "Gene-disease curation service for ClinCura")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "5780", env = "CLINCURA_API_PORT")]
    port: u16,

    /// Root folder holding the database (overrides env and config file)
    #[arg(short, long)]
    root_folder: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "clincura_api=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Log build identification immediately, before any database delays
    info!(
        "Starting ClinCura curation service (clincura-api) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let args = Args::parse();

    // CLI argument wins; otherwise env > config file > platform default
    let root_folder = match args.root_folder {
        Some(path) => path,
        None => RootFolderResolver::new("curation-api").resolve(),
    };

    let initializer = RootFolderInitializer::new(root_folder);
    initializer.ensure_directory_exists()?;

    let db_path = initializer.database_path();
    info!("Database path: {}", db_path.display());

    let pool = init_database(&db_path)
        .await
        .context("Failed to initialize database")?;

    let state = AppState::new(pool);
    let app = build_router(state);

    let addr = format!("127.0.0.1:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("clincura-api listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
