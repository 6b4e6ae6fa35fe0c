use std::sync::Arc;

use tokio::time::timeout;

use tinytrack_core::analytics::Summary;
use tinytrack_core::config::Config;
use tinytrack_core::event::NewEvent;
use tinytrack_duckdb::DuckDbStore;

use crate::error::AppError;

/// Shared application state injected into every axum handler via
/// [`axum::extract::State`].
///
/// The store is explicitly constructed at startup and passed by ownership —
/// no ambient singleton. All fields are cheap to share through the outer Arc.
pub struct AppState {
    /// The DuckDB store. Internally `Arc<tokio::sync::Mutex<Connection>>`,
    /// so appends serialize through the storage layer, not here.
    pub store: Arc<DuckDbStore>,

    /// Parsed configuration, loaded once at startup from environment variables.
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(store: DuckDbStore, config: Config) -> Self {
        Self {
            store: Arc::new(store),
            config: Arc::new(config),
        }
    }

    /// Append one canonical record under the configured write timeout.
    ///
    /// A timed-out or failed write fails this delivery only; nothing is
    /// queued or retried.
    pub async fn record_event(&self, event: NewEvent) -> Result<i64, AppError> {
        timeout(self.config.write_timeout(), self.store.append(&event))
            .await
            .map_err(|_| AppError::StoreTimeout)?
            .map_err(AppError::Internal)
    }

    /// Compute the windowed summary under the configured query timeout.
    /// No partial result: a timeout or store failure fails the whole call.
    pub async fn summary(&self, window_hours: i64) -> Result<Summary, AppError> {
        timeout(self.config.query_timeout(), self.store.summarize(window_hours))
            .await
            .map_err(|_| AppError::StoreTimeout)?
            .map_err(AppError::Internal)
    }
}
