//! Data health endpoint for monitoring collection freshness.
//!
//! `/api/data/health` reports how old the newest funding snapshot and the
//! market list are. The collector polls every 15 minutes, so a snapshot older
//! than two missed polls is degraded and older than an hour is unhealthy.

use crate::error::ApiError;
use crate::state::AppState;
use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use perp_risk_core::timestamp_to_datetime;
use serde::Serialize;

const HOUR_MS: i64 = 3_600_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Health of a single data source.
#[derive(Debug, Clone, Serialize)]
pub struct SourceHealth {
    pub source: String,
    /// Time of the most recent record.
    pub last_record: Option<DateTime<Utc>>,
    /// Snapshots in the last hour, or markets listed for the registry.
    pub records: usize,
    pub staleness_seconds: Option<i64>,
    pub status: HealthStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct DataHealthResponse {
    pub status: HealthStatus,
    pub timestamp: DateTime<Utc>,
    pub sources: Vec<SourceHealth>,
}

/// Staleness limits in seconds.
struct HealthThresholds {
    healthy: i64,
    degraded: i64,
}

impl HealthThresholds {
    fn for_source(source: &str) -> Self {
        match source {
            "funding_snapshots" => Self {
                healthy: 30 * 60,
                degraded: 60 * 60,
            },
            // Refreshed hourly at most
            "markets" => Self {
                healthy: 2 * 60 * 60,
                degraded: 6 * 60 * 60,
            },
            _ => Self {
                healthy: 60 * 60,
                degraded: 4 * 60 * 60,
            },
        }
    }
}

fn determine_status(staleness_seconds: Option<i64>, thresholds: &HealthThresholds) -> HealthStatus {
    match staleness_seconds {
        None => HealthStatus::Unhealthy,
        Some(s) if s <= thresholds.healthy => HealthStatus::Healthy,
        Some(s) if s <= thresholds.degraded => HealthStatus::Degraded,
        Some(_) => HealthStatus::Unhealthy,
    }
}

fn source_health(source: &str, last_ms: Option<i64>, records: usize, now_ms: i64) -> SourceHealth {
    let staleness_seconds = last_ms.map(|t| (now_ms - t).max(0) / 1000);
    SourceHealth {
        source: source.to_string(),
        last_record: last_ms.and_then(timestamp_to_datetime),
        records,
        staleness_seconds,
        status: determine_status(staleness_seconds, &HealthThresholds::for_source(source)),
    }
}

/// Snapshots are critical; a stale market list only degrades.
fn overall_status(sources: &[SourceHealth]) -> HealthStatus {
    if sources
        .iter()
        .any(|s| s.status == HealthStatus::Unhealthy && s.source == "funding_snapshots")
    {
        HealthStatus::Unhealthy
    } else if sources.iter().any(|s| s.status != HealthStatus::Healthy) {
        HealthStatus::Degraded
    } else {
        HealthStatus::Healthy
    }
}

/// GET /api/data/health
///
/// # Errors
/// Returns 500 if the store cannot be read.
pub async fn data_health(State(state): State<AppState>) -> Result<Json<DataHealthResponse>, ApiError> {
    let now = Utc::now();
    let now_ms = now.timestamp_millis();

    let latest = state.store.latest().await?;
    let recent = state.store.range(now_ms - HOUR_MS, now_ms).await?;
    let snapshots = source_health(
        "funding_snapshots",
        latest.map(|s| s.timestamp),
        recent.len(),
        now_ms,
    );

    let markets = match (state.markets.last_refreshed().await, state.markets.list().await) {
        (Ok(refreshed), Ok(list)) => source_health("markets", refreshed, list.len(), now_ms),
        (Err(e), _) | (_, Err(e)) => {
            tracing::error!("Failed to read market registry: {:#}", e);
            source_health("markets", None, 0, now_ms)
        }
    };

    let sources = vec![snapshots, markets];
    Ok(Json(DataHealthResponse {
        status: overall_status(&sources),
        timestamp: now,
        sources,
    }))
}
