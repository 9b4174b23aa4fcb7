use anyhow::Result;
use perp_risk_analytics::{filter_by_timeframe, Cadence};
use perp_risk_core::{HistoricalSeries, SnapshotStore};

/// Window used when a caller does not ask for one.
pub const DEFAULT_HOURS_BACK: u32 = 24;

const HOUR_MS: i64 = 3_600_000;

/// Snapshots from the last `hours_back` hours up to `now_ms`, downsampled to `cadence`.
///
/// # Errors
/// Returns an error if the store cannot be read.
pub async fn load_history(
    store: &dyn SnapshotStore,
    hours_back: u32,
    cadence: Cadence,
    now_ms: i64,
) -> Result<HistoricalSeries> {
    let start_ms = now_ms - i64::from(hours_back) * HOUR_MS;
    let series = store.range(start_ms, now_ms).await?;

    tracing::debug!(
        hours_back,
        %cadence,
        points = series.len(),
        "Loaded snapshot history"
    );

    Ok(filter_by_timeframe(&series, cadence))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_store::MemorySnapshotStore;
    use perp_risk_core::Snapshot;

    const NOW: i64 = 1_700_006_400_000 + 24 * HOUR_MS;

    fn store() -> MemorySnapshotStore {
        // 15-minute polls over the last 30 hours
        let snapshots = (0..120)
            .map(|i| Snapshot::new(NOW - i * 15 * 60_000))
            .collect();
        MemorySnapshotStore::with_snapshots(snapshots)
    }

    #[tokio::test]
    async fn test_raw_window() {
        let series = load_history(&store(), 2, Cadence::Raw, NOW).await.unwrap();
        // 2 hours inclusive of both ends
        assert_eq!(series.len(), 9);
        assert_eq!(series.last().unwrap().timestamp, NOW);
    }

    #[tokio::test]
    async fn test_hourly_window() {
        let series = load_history(&store(), DEFAULT_HOURS_BACK, Cadence::Hourly, NOW)
            .await
            .unwrap();
        assert_eq!(series.len(), 25);
        assert!(series.iter().all(|s| s.timestamp % HOUR_MS == 0));
    }
}
