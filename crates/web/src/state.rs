//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::config::WebConfig;
use crate::services::dataset::{Catalog, CatalogCache, DatasetError};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: WebConfig,
    pool: SqlitePool,
    catalogs: CatalogCache,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Web configuration
    /// * `pool` - `SQLite` connection pool
    #[must_use]
    pub fn new(config: WebConfig, pool: SqlitePool) -> Self {
        let catalogs = CatalogCache::new(config.dataset.cache_ttl);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                catalogs,
            }),
        }
    }

    /// Get a reference to the web configuration.
    #[must_use]
    pub fn config(&self) -> &WebConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.inner.pool
    }

    /// Load the configured listening dataset (cached).
    ///
    /// # Errors
    ///
    /// Returns `DatasetError` if the file is missing or malformed.
    pub async fn catalog(&self) -> Result<Arc<Catalog>, DatasetError> {
        self.inner.catalogs.get(&self.inner.config.dataset.path).await
    }
}
