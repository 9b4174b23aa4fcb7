//! Snapshot storage for the funding-rate risk dashboard.
//!
//! This crate provides:
//! - An hourly JSON file store and a `PostgreSQL` repository, both
//!   implementing [`SnapshotStore`]
//! - Market registry caches implementing [`MarketRegistry`]
//! - History loading with timeframe downsampling

pub mod database;
pub mod file_store;
pub mod history;
pub mod market_cache;
pub mod memory_store;
pub mod models;
pub mod repositories;

use anyhow::{Context, Result};
use perp_risk_core::{MarketRegistry, SnapshotStore, StorageBackend, StorageConfig};
use std::sync::Arc;

// Re-export commonly used types
pub use database::connect;
pub use file_store::{FileSnapshotStore, HourlyFile};
pub use history::{load_history, DEFAULT_HOURS_BACK};
pub use market_cache::FileMarketCache;
pub use memory_store::MemorySnapshotStore;
pub use models::{MarketRecord, SnapshotRecord};
pub use repositories::{MarketRepository, Repositories, SnapshotRepository};

/// Snapshot store and market registry for one storage backend.
#[derive(Clone)]
pub struct Storage {
    pub snapshots: Arc<dyn SnapshotStore>,
    pub markets: Arc<dyn MarketRegistry>,
}

impl Storage {
    /// Builds the configured backend. For `PostgreSQL` the schema is created
    /// if missing.
    ///
    /// # Errors
    /// Returns an error if the database is unreachable or `database_url` is unset.
    pub async fn open(config: &StorageConfig) -> Result<Self> {
        match config.backend {
            StorageBackend::File => {
                tracing::info!(data_dir = %config.data_dir, "Using file snapshot store");
                Ok(Self {
                    snapshots: Arc::new(FileSnapshotStore::new(&config.data_dir)),
                    markets: Arc::new(FileMarketCache::new(&config.data_dir)),
                })
            }
            StorageBackend::Postgres => {
                let url = config
                    .database_url
                    .as_deref()
                    .context("storage.database_url is required for the postgres backend")?;
                let pool = connect(url, config.max_connections).await?;
                let repos = Repositories::new(pool);
                repos.ensure_schema().await?;

                tracing::info!("Using PostgreSQL snapshot store");
                Ok(Self {
                    snapshots: Arc::new(repos.snapshots),
                    markets: Arc::new(repos.markets),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_file_backend() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = StorageConfig {
            data_dir: dir.path().to_string_lossy().into_owned(),
            ..Default::default()
        };

        let storage = Storage::open(&config).await.unwrap();
        assert!(storage.snapshots.latest().await.unwrap().is_none());
        assert!(storage.markets.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_postgres_requires_url() {
        let config = StorageConfig {
            backend: StorageBackend::Postgres,
            database_url: None,
            ..Default::default()
        };
        assert!(Storage::open(&config).await.is_err());
    }
}
