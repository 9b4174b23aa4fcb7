//! Funding-rate snapshot repository.
//!
//! One row per poll in `funding_snapshots`, keyed by the poll timestamp
//! (ms since epoch) with the market map as JSONB.

use anyhow::{Context, Result};
use async_trait::async_trait;
use perp_risk_core::{HistoricalSeries, Snapshot, SnapshotStore};
use sqlx::PgPool;

use crate::models::SnapshotRecord;

/// Repository for snapshot operations.
#[derive(Debug, Clone)]
pub struct SnapshotRepository {
    pool: PgPool,
}

impl SnapshotRepository {
    /// Creates a new repository instance.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the table and its index if they do not exist.
    ///
    /// # Errors
    /// Returns an error if the database operation fails.
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS funding_snapshots (
                timestamp BIGINT PRIMARY KEY,
                data JSONB NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to create funding_snapshots table")?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_funding_snapshots_created_at
                ON funding_snapshots (created_at DESC)
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Inserts a snapshot. A second insert with the same timestamp is ignored.
    ///
    /// # Errors
    /// Returns an error if the database operation fails.
    pub async fn insert(&self, snapshot: &Snapshot) -> Result<()> {
        let record = SnapshotRecord::from_snapshot(snapshot);

        sqlx::query(
            r#"
            INSERT INTO funding_snapshots (timestamp, data, created_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (timestamp) DO NOTHING
            "#,
        )
        .bind(record.timestamp)
        .bind(&record.data)
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets the most recent snapshot.
    ///
    /// # Errors
    /// Returns an error if the database query fails.
    pub async fn get_latest(&self) -> Result<Option<Snapshot>> {
        let record = sqlx::query_as::<_, SnapshotRecord>(
            r#"
            SELECT timestamp, data, created_at
            FROM funding_snapshots
            ORDER BY timestamp DESC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(record.map(SnapshotRecord::into_snapshot))
    }

    /// Queries snapshots with `start_ms <= timestamp <= end_ms`, oldest first.
    ///
    /// # Errors
    /// Returns an error if the database query fails.
    pub async fn query_by_time_range(&self, start_ms: i64, end_ms: i64) -> Result<HistoricalSeries> {
        let records = sqlx::query_as::<_, SnapshotRecord>(
            r#"
            SELECT timestamp, data, created_at
            FROM funding_snapshots
            WHERE timestamp >= $1 AND timestamp <= $2
            ORDER BY timestamp ASC
            "#,
        )
        .bind(start_ms)
        .bind(end_ms)
        .fetch_all(&self.pool)
        .await?;

        Ok(records.into_iter().map(SnapshotRecord::into_snapshot).collect())
    }
}

#[async_trait]
impl SnapshotStore for SnapshotRepository {
    async fn latest(&self) -> Result<Option<Snapshot>> {
        self.get_latest().await
    }

    async fn range(&self, start_ms: i64, end_ms: i64) -> Result<HistoricalSeries> {
        self.query_by_time_range(start_ms, end_ms).await
    }

    async fn insert(&self, snapshot: &Snapshot) -> Result<()> {
        SnapshotRepository::insert(self, snapshot).await
    }
}
