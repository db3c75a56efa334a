//! Lending Server - library catalog, borrowers and loans
//!
//! REST API server over the loan ledger.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lending_server::{
    api,
    config::{AppConfig, LedgerBackend},
    repository::{MemoryLedger, Repository, SharedStore},
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load().context("Failed to load configuration")?;

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("lending_server={},tower_http=debug", config.logging.level).into()
    });

    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!("Starting Lending Server v{}", env!("CARGO_PKG_VERSION"));

    let store = build_store(&config).await?;

    let addr = SocketAddr::new(
        config.server.host.parse().context("Invalid host address")?,
        config.server.port,
    );

    let app = api::router(AppState::new(config, store));

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Open the configured ledger store
async fn build_store(config: &AppConfig) -> anyhow::Result<SharedStore> {
    match config.ledger.backend {
        LedgerBackend::Memory => {
            tracing::warn!("Using in-memory ledger; data is lost on restart");
            Ok(Arc::new(MemoryLedger::new()))
        }
        LedgerBackend::Postgres => {
            // Create database connection pool
            let pool = PgPoolOptions::new()
                .max_connections(config.database.max_connections)
                .min_connections(config.database.min_connections)
                .connect(&config.database.url)
                .await
                .context("Failed to connect to database")?;

            tracing::info!("Connected to database");

            // Run migrations
            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .context("Failed to run database migrations")?;

            tracing::info!("Database migrations completed");

            Ok(Arc::new(Repository::new(pool)))
        }
    }
}
