//! meterd - Utility meter reading microservice
//!
//! Customers upload a photo of a water or gas meter; the reading is
//! extracted by the Gemini vision API, persisted, and later confirmed or
//! corrected by a human.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use meterd::config::Config;
use meterd::services::GeminiExtractor;
use meterd::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "meterd=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::parse();

    info!(
        "Starting meterd v{} on port {}",
        env!("CARGO_PKG_VERSION"),
        config.port
    );
    info!("Database: {}", config.database.display());

    let db_pool = meterd::db::init_database_pool(&config.database)
        .await
        .context("Failed to initialize database")?;
    info!("Database connection established");

    let extractor = match &config.gemini_base_url {
        Some(base_url) => GeminiExtractor::with_base_url(
            config.gemini_api_key.clone(),
            config.gemini_model.clone(),
            base_url.clone(),
        ),
        None => GeminiExtractor::new(config.gemini_api_key.clone(), config.gemini_model.clone()),
    }
    .context("Failed to build Gemini client")?;
    info!("Extraction client initialized (model: {})", config.gemini_model);

    let staging_dir = config.staging_dir_or_default();
    std::fs::create_dir_all(&staging_dir).context("Failed to create staging directory")?;
    info!("Staging directory: {}", staging_dir.display());

    let state = AppState::new(db_pool, Arc::new(extractor), staging_dir);
    let app = meterd::build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
