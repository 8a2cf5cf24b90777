//! Shared application state handed to every handler.

use std::sync::Arc;

use caja_db::Database;

use crate::config::ServerConfig;

/// Cheap to clone: the pool inside `Database` is reference-counted.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(db: Database, config: ServerConfig) -> Self {
        AppState {
            db,
            config: Arc::new(config),
        }
    }
}
