use std::sync::Arc;

use crm_core::config::ResponseApiConfig;
use crm_core::store::{ItemStore, RedbStore};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ItemStore>,
    pub table: Arc<str>,
    pub enable_cors: bool,
}

impl AppState {
    pub fn new(store: Arc<dyn ItemStore>, table: &str, enable_cors: bool) -> Self {
        Self {
            store,
            table: Arc::from(table),
            enable_cors,
        }
    }

    /// Open the configured redb store.
    pub fn from_config(config: &ResponseApiConfig) -> crm_core::Result<Self> {
        let store = RedbStore::open(&config.store_path)?;
        Ok(Self::new(
            Arc::new(store),
            &config.table_name,
            config.enable_cors,
        ))
    }
}
