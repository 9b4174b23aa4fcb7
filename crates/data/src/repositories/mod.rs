//! PostgreSQL repositories.
//!
//! Each repository provides typed access to one table with time-range
//! queries and idempotent schema creation.

pub mod market_repo;
pub mod snapshot_repo;

pub use market_repo::MarketRepository;
pub use snapshot_repo::SnapshotRepository;

use anyhow::Result;
use sqlx::PgPool;

/// Creates all repositories from a single database pool.
#[derive(Debug, Clone)]
pub struct Repositories {
    pub snapshots: SnapshotRepository,
    pub markets: MarketRepository,
}

impl Repositories {
    /// Creates a new set of repositories from a database pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self {
            snapshots: SnapshotRepository::new(pool.clone()),
            markets: MarketRepository::new(pool),
        }
    }

    /// Creates every table the repositories use.
    ///
    /// # Errors
    /// Returns an error if any schema statement fails.
    pub async fn ensure_schema(&self) -> Result<()> {
        self.snapshots.ensure_schema().await?;
        self.markets.ensure_schema().await?;
        Ok(())
    }
}
