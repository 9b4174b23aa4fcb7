//! Database row for a funding-rate snapshot.
//!
//! The per-market map is stored as one JSONB document so a snapshot is a
//! single row, matching the wire shape `{ timestamp, data }`.

use chrono::{DateTime, Utc};
use perp_risk_core::{timestamp_to_datetime, MarketRate, Snapshot};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use std::collections::BTreeMap;

/// A row of `funding_snapshots`.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SnapshotRecord {
    /// Poll time in ms since epoch (primary key).
    pub timestamp: i64,
    /// Market key to rate.
    pub data: Json<BTreeMap<String, MarketRate>>,
    pub created_at: DateTime<Utc>,
}

impl SnapshotRecord {
    /// Builds a row from a snapshot; `created_at` mirrors the poll time.
    #[must_use]
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        Self {
            timestamp: snapshot.timestamp,
            data: Json(snapshot.markets.clone()),
            created_at: timestamp_to_datetime(snapshot.timestamp).unwrap_or_else(Utc::now),
        }
    }

    #[must_use]
    pub fn into_snapshot(self) -> Snapshot {
        Snapshot {
            timestamp: self.timestamp,
            markets: self.data.0,
        }
    }
}
