use crate::analysis::{AnalysisRequest, ChatRequest};
use crate::market::{HistoricalSeries, MarketInfo, Snapshot};
use anyhow::Result;
use async_trait::async_trait;
use futures_util::stream::BoxStream;

/// Incrementally delivered natural-language text.
pub type TextStream = BoxStream<'static, Result<String>>;

/// Persistence for funding-rate snapshots.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Most recent snapshot, if any has been stored.
    async fn latest(&self) -> Result<Option<Snapshot>>;

    /// Snapshots with `start_ms <= timestamp <= end_ms`, ascending.
    async fn range(&self, start_ms: i64, end_ms: i64) -> Result<HistoricalSeries>;

    async fn insert(&self, snapshot: &Snapshot) -> Result<()>;
}

/// Cached list of tradable markets.
#[async_trait]
pub trait MarketRegistry: Send + Sync {
    async fn list(&self) -> Result<Vec<MarketInfo>>;

    /// Time of the last successful refresh in ms since epoch.
    async fn last_refreshed(&self) -> Result<Option<i64>>;

    /// Replaces or adds entries and marks the registry refreshed at `now_ms`.
    async fn upsert(&self, markets: &[MarketInfo], now_ms: i64) -> Result<()>;
}

/// LLM-backed analysis of dashboard data.
#[async_trait]
pub trait MarketAnalyst: Send + Sync {
    async fn analyze(&self, request: AnalysisRequest) -> Result<TextStream>;

    async fn chat(&self, request: ChatRequest) -> Result<TextStream>;
}
