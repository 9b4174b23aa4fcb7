use anyhow::{Context, Result};
use sqlx::{postgres::PgPoolOptions, PgPool};

/// Opens a connection pool to the configured PostgreSQL database.
///
/// # Errors
/// Returns an error if the database connection cannot be established.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
        .context("Failed to connect to PostgreSQL")
}
