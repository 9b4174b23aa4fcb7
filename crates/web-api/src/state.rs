use crate::error::ApiError;
use chrono::Utc;
use perp_risk_analytics::Cadence;
use perp_risk_core::{HistoricalSeries, MarketAnalyst, MarketRegistry, Snapshot, SnapshotStore};
use perp_risk_data::{load_history, DEFAULT_HOURS_BACK};
use serde::Deserialize;
use std::sync::Arc;

/// Longest history window a request may ask for (30 days).
pub const MAX_HOURS_BACK: u32 = 720;

/// Shared state passed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn SnapshotStore>,
    pub markets: Arc<dyn MarketRegistry>,
    /// `None` when no LLM API key is configured.
    pub analyst: Option<Arc<dyn MarketAnalyst>>,
}

impl AppState {
    pub fn new(store: Arc<dyn SnapshotStore>, markets: Arc<dyn MarketRegistry>) -> Self {
        Self {
            store,
            markets,
            analyst: None,
        }
    }

    #[must_use]
    pub fn with_analyst(mut self, analyst: Arc<dyn MarketAnalyst>) -> Self {
        self.analyst = Some(analyst);
        self
    }

    /// Latest stored snapshot.
    ///
    /// # Errors
    /// [`ApiError::NotFound`] if nothing has been collected yet.
    pub async fn latest(&self) -> Result<Snapshot, ApiError> {
        self.store
            .latest()
            .await?
            .ok_or_else(|| ApiError::NotFound("no funding snapshot collected yet".to_string()))
    }

    /// History ending now for the requested window.
    ///
    /// # Errors
    /// [`ApiError::BadRequest`] for an unknown timeframe.
    pub async fn history(&self, window: &WindowQuery) -> Result<HistoricalSeries, ApiError> {
        let cadence = window.cadence()?;
        let series = load_history(
            self.store.as_ref(),
            window.hours_back(),
            cadence,
            Utc::now().timestamp_millis(),
        )
        .await?;
        Ok(series)
    }
}

/// `?hours=24&timeframe=1h`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WindowQuery {
    pub hours: Option<u32>,
    pub timeframe: Option<String>,
}

impl WindowQuery {
    #[must_use]
    pub fn hours_back(&self) -> u32 {
        self.hours.unwrap_or(DEFAULT_HOURS_BACK).clamp(1, MAX_HOURS_BACK)
    }

    /// # Errors
    /// [`ApiError::BadRequest`] for an unknown timeframe.
    pub fn cadence(&self) -> Result<Cadence, ApiError> {
        match self.timeframe.as_deref() {
            None | Some("") => Ok(Cadence::default()),
            Some(raw) => raw.parse().map_err(ApiError::BadRequest),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_defaults() {
        let window = WindowQuery::default();
        assert_eq!(window.hours_back(), DEFAULT_HOURS_BACK);
        assert_eq!(window.cadence().unwrap(), Cadence::Raw);
    }

    #[test]
    fn test_window_clamps_hours() {
        let window = WindowQuery {
            hours: Some(100_000),
            timeframe: Some("4h".to_string()),
        };
        assert_eq!(window.hours_back(), MAX_HOURS_BACK);
        assert_eq!(window.cadence().unwrap(), Cadence::FourHourly);
    }

    #[test]
    fn test_window_rejects_unknown_timeframe() {
        let window = WindowQuery {
            hours: None,
            timeframe: Some("1w".to_string()),
        };
        assert!(matches!(window.cadence(), Err(ApiError::BadRequest(_))));
    }
}
