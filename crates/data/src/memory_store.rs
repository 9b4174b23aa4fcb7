use anyhow::Result;
use async_trait::async_trait;
use perp_risk_core::{HistoricalSeries, Snapshot, SnapshotStore};
use tokio::sync::RwLock;

/// Snapshot store held in process memory. Used for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    snapshots: RwLock<Vec<Snapshot>>,
}

impl MemorySnapshotStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-filled with `snapshots` (any order).
    #[must_use]
    pub fn with_snapshots(mut snapshots: Vec<Snapshot>) -> Self {
        snapshots.sort_by_key(|s| s.timestamp);
        Self {
            snapshots: RwLock::new(snapshots),
        }
    }

    pub async fn len(&self) -> usize {
        self.snapshots.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.snapshots.read().await.is_empty()
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn latest(&self) -> Result<Option<Snapshot>> {
        Ok(self.snapshots.read().await.last().cloned())
    }

    async fn range(&self, start_ms: i64, end_ms: i64) -> Result<HistoricalSeries> {
        Ok(self
            .snapshots
            .read()
            .await
            .iter()
            .filter(|s| s.timestamp >= start_ms && s.timestamp <= end_ms)
            .cloned()
            .collect())
    }

    async fn insert(&self, snapshot: &Snapshot) -> Result<()> {
        let mut snapshots = self.snapshots.write().await;
        let pos = snapshots.partition_point(|s| s.timestamp <= snapshot.timestamp);
        snapshots.insert(pos, snapshot.clone());
        Ok(())
    }
}
