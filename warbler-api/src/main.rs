//! # Warbler API Server
//!
//! Serves the Warbler HTTP API: registration and login, tweets with
//! `@mention` tagging, and personal feeds.
//!
//! ## Usage
//!
//! ```bash
//! JWT_SECRET=$(openssl rand -hex 32) STORAGE_BACKEND=memory SEED_DEMO_DATA=true \
//!     cargo run -p warbler-api
//! ```

use std::sync::Arc;

use anyhow::Context;
use sqlx::PgPool;
use tracing::info;
use warbler_api::{
    app::{build_router, AppState},
    config::{Config, StorageBackend},
    telemetry::init_tracing,
};
use warbler_shared::{
    db::{
        migrations::run_migrations,
        pool::{close_pool, create_pool, DatabaseConfig},
        seed::seed_demo_data,
    },
    store::{memory::MemoryStore, postgres::PgStore, Store},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    init_tracing(config.log_format);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        backend = ?config.storage.backend,
        "Warbler API server starting"
    );

    let (store, pool) = open_store(&config).await?;
    let state = AppState::new(store, config.clone());

    if config.seed_demo_data {
        seed_demo_data(&state.credentials, &state.tweets)
            .await
            .context("Failed to seed demo data")?;
    }

    let app = build_router(state);
    let bind_address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {bind_address}"))?;

    info!(address = %bind_address, "Server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(pool) = pool {
        close_pool(pool).await;
    }
    info!("Server shutdown complete");
    Ok(())
}

/// Builds the configured store; the pool is returned for shutdown
async fn open_store(config: &Config) -> anyhow::Result<(Arc<dyn Store>, Option<PgPool>)> {
    match config.storage.backend {
        StorageBackend::Memory => Ok((Arc::new(MemoryStore::new()), None)),
        StorageBackend::Postgres => {
            let url = config
                .storage
                .database_url
                .clone()
                .context("DATABASE_URL is required for the postgres backend")?;

            let pool = create_pool(DatabaseConfig::new(url, config.storage.max_connections))
                .await
                .context("Failed to connect to the database")?;
            run_migrations(&pool).await.context("Failed to run migrations")?;

            Ok((Arc::new(PgStore::new(pool.clone())), Some(pool)))
        }
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for shutdown signal");
            std::future::pending::<()>().await
        }
    }
}
