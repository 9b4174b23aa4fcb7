//! Shared collector types: statistics, events and poll outcomes.

use chrono::{DateTime, Utc};

/// Statistics for a running collector.
#[derive(Debug, Clone, Default)]
pub struct CollectorStats {
    /// Poll attempts, including skipped ones
    pub polls: u64,
    /// Snapshots written to the store
    pub snapshots_stored: u64,
    /// Polls skipped because the stored snapshot was still fresh
    pub cache_hits: u64,
    /// Market list refreshes
    pub market_refreshes: u64,
    /// Failed fetches or writes
    pub errors_encountered: u64,
    /// Time of the last stored snapshot
    pub last_snapshot_time: Option<DateTime<Utc>>,
}

impl CollectorStats {
    pub fn record_poll(&mut self) {
        self.polls += 1;
    }

    pub fn record_stored(&mut self, at: Option<DateTime<Utc>>) {
        self.snapshots_stored += 1;
        self.last_snapshot_time = at;
    }

    pub fn record_cache_hit(&mut self) {
        self.cache_hits += 1;
    }

    pub fn record_market_refresh(&mut self) {
        self.market_refreshes += 1;
    }

    pub fn record_error(&mut self) {
        self.errors_encountered += 1;
    }
}

/// Result of one poll cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// Latest stored snapshot is younger than the cache TTL; nothing fetched.
    Cached { age_ms: i64 },
    /// A new snapshot with `markets` entries was stored.
    Stored { timestamp: i64, markets: usize },
    /// Fetch or write failed; the cycle was abandoned.
    Failed { error: String },
}

impl PollOutcome {
    #[must_use]
    pub fn is_stored(&self) -> bool {
        matches!(self, Self::Stored { .. })
    }
}

/// Events emitted by the collector for monitoring.
#[derive(Debug, Clone)]
pub enum CollectorEvent {
    SnapshotStored { timestamp: i64, markets: usize },
    MarketsRefreshed { count: usize },
    Error { source: String, error: String },
}
