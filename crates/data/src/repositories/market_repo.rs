//! Market registry repository.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use perp_risk_core::{timestamp_to_datetime, MarketInfo, MarketRegistry};
use sqlx::PgPool;

use crate::models::MarketRecord;

/// Repository for the `markets` table.
#[derive(Debug, Clone)]
pub struct MarketRepository {
    pool: PgPool,
}

impl MarketRepository {
    /// Creates a new repository instance.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the table if it does not exist.
    ///
    /// # Errors
    /// Returns an error if the database operation fails.
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS markets (
                denom TEXT PRIMARY KEY,
                display TEXT NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Upserts a batch of markets in one transaction.
    ///
    /// Existing rows keep their `created_at`.
    ///
    /// # Errors
    /// Returns an error if the database transaction fails.
    pub async fn upsert_batch(&self, markets: &[MarketInfo], updated_at: DateTime<Utc>) -> Result<()> {
        if markets.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;

        for market in markets {
            sqlx::query(
                r#"
                INSERT INTO markets (denom, display, updated_at, created_at)
                VALUES ($1, $2, $3, $3)
                ON CONFLICT (denom) DO UPDATE
                    SET display = EXCLUDED.display,
                        updated_at = EXCLUDED.updated_at
                "#,
            )
            .bind(&market.denom)
            .bind(&market.display)
            .bind(updated_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Lists all markets ordered by denom.
    ///
    /// # Errors
    /// Returns an error if the database query fails.
    pub async fn list_all(&self) -> Result<Vec<MarketRecord>> {
        let records = sqlx::query_as::<_, MarketRecord>(
            r#"
            SELECT denom, display, updated_at, created_at
            FROM markets
            ORDER BY denom ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Most recent `updated_at` across all markets.
    ///
    /// # Errors
    /// Returns an error if the database query fails.
    pub async fn last_updated(&self) -> Result<Option<DateTime<Utc>>> {
        let row: (Option<DateTime<Utc>>,) = sqlx::query_as("SELECT MAX(updated_at) FROM markets")
            .fetch_one(&self.pool)
            .await?;

        Ok(row.0)
    }
}

#[async_trait]
impl MarketRegistry for MarketRepository {
    async fn list(&self) -> Result<Vec<MarketInfo>> {
        Ok(self.list_all().await?.into_iter().map(MarketInfo::from).collect())
    }

    async fn last_refreshed(&self) -> Result<Option<i64>> {
        Ok(self.last_updated().await?.map(|t| t.timestamp_millis()))
    }

    async fn upsert(&self, markets: &[MarketInfo], now_ms: i64) -> Result<()> {
        let updated_at = timestamp_to_datetime(now_ms).unwrap_or_else(Utc::now);
        self.upsert_batch(markets, updated_at).await
    }
}
