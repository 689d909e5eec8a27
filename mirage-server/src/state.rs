//! Shared application state.
//!
//! One mock instance can serve several databases, distinguished by access
//! key. Each database sits behind its own lock so concurrent requests to
//! the same database serialize their mutations, while requests to
//! different databases proceed independently.

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;

use mirage_core::Database;

use crate::config::Config;

/// A registered database behind its mutation lock.
pub type SharedDatabase = Arc<RwLock<Database>>;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    /// Databases indexed by server access key.
    databases: Arc<DashMap<String, SharedDatabase>>,
    /// Client access key to server access key index, for the query route.
    client_index: Arc<DashMap<String, String>>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
            databases: Arc::new(DashMap::new()),
            client_index: Arc::new(DashMap::new()),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Register a database, making it addressable by both its key pairs.
    pub fn register_database(&self, database: Database) {
        tracing::info!(
            database = %database.name,
            server_access_key = %database.server_access_key,
            "database registered",
        );
        self.client_index.insert(
            database.client_access_key.clone(),
            database.server_access_key.clone(),
        );
        self.databases.insert(
            database.server_access_key.clone(),
            Arc::new(RwLock::new(database)),
        );
    }

    pub fn database_by_server_key(&self, access_key: &str) -> Option<SharedDatabase> {
        self.databases.get(access_key).map(|entry| entry.value().clone())
    }

    pub fn database_by_client_key(&self, access_key: &str) -> Option<SharedDatabase> {
        let server_key = self.client_index.get(access_key)?;
        self.database_by_server_key(server_key.value())
    }
}
