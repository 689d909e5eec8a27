//! Server binary.
//!
//! Boots a single database whose credentials come from the environment
//! (`MIRAGE_DATABASE_NAME`, `MIRAGE_SERVER_ACCESS_KEY`,
//! `MIRAGE_SERVER_SECRET_KEY`, `MIRAGE_CLIENT_ACCESS_KEY`,
//! `MIRAGE_CLIENT_SECRET_KEY`), falling back to random keys that are
//! logged on startup.

use tracing_subscriber::EnvFilter;

use mirage_core::{Database, DatabaseConfig};
use mirage_server::{router, AppState, Config};

fn env_or(name: &str, fallback: String) -> String {
    std::env::var(name).unwrap_or(fallback)
}

fn database_from_env(config: &Config) -> Database {
    let defaults = DatabaseConfig::default();
    Database::new(DatabaseConfig {
        name: env_or("MIRAGE_DATABASE_NAME", defaults.name),
        server_access_key: env_or("MIRAGE_SERVER_ACCESS_KEY", defaults.server_access_key),
        server_secret_key: env_or("MIRAGE_SERVER_SECRET_KEY", defaults.server_secret_key),
        client_access_key: env_or("MIRAGE_CLIENT_ACCESS_KEY", defaults.client_access_key),
        client_secret_key: env_or("MIRAGE_CLIENT_SECRET_KEY", defaults.client_secret_key),
        active: true,
        processing_delay: config.processing_delay(),
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mirage_server=info,tower_http=info".into()),
        )
        .init();

    let config = Config::from_env();
    let state = AppState::new(config);
    state.register_database(database_from_env(state.config()));

    let addr = state.config().socket_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "mirage listening");
    axum::serve(listener, router(state)).await?;
    Ok(())
}
