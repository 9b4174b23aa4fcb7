//! Funding-rate collector.
//!
//! Each poll reads the perps contract's `markets` query and stores the result
//! as one [`Snapshot`]. Polls are skipped while the newest stored snapshot is
//! younger than the cache TTL, so several schedulers or manual runs share one
//! upstream request per window.

use crate::chain_client::{snapshot_from_states, ChainClient};
use crate::types::{CollectorEvent, CollectorStats, PollOutcome};
use anyhow::Result;
use perp_risk_core::{
    timestamp_to_datetime, ChainConfig, CollectorConfig, MarketRegistry, SnapshotStore,
};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

pub struct FundingCollector {
    client: ChainClient,
    store: Arc<dyn SnapshotStore>,
    registry: Option<Arc<dyn MarketRegistry>>,
    chain: ChainConfig,
    config: CollectorConfig,
    event_tx: Option<mpsc::Sender<CollectorEvent>>,
    stats: Mutex<CollectorStats>,
}

impl FundingCollector {
    /// Creates a collector writing to `store`.
    pub fn new(
        client: ChainClient,
        store: Arc<dyn SnapshotStore>,
        chain: ChainConfig,
        config: CollectorConfig,
    ) -> Self {
        Self {
            client,
            store,
            registry: None,
            chain,
            config,
            event_tx: None,
            stats: Mutex::new(CollectorStats::default()),
        }
    }

    /// Also keeps the market list in `registry` up to date.
    #[must_use]
    pub fn with_registry(mut self, registry: Arc<dyn MarketRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Sets the event channel for monitoring.
    #[must_use]
    pub fn with_event_channel(mut self, tx: mpsc::Sender<CollectorEvent>) -> Self {
        self.event_tx = Some(tx);
        self
    }

    /// Returns a copy of the current statistics.
    pub async fn stats(&self) -> CollectorStats {
        self.stats.lock().await.clone()
    }

    fn cache_ttl_ms(&self) -> i64 {
        i64::try_from(self.config.cache_ttl_secs.saturating_mul(1000)).unwrap_or(i64::MAX)
    }

    fn market_cache_ttl_ms(&self) -> i64 {
        i64::try_from(self.config.market_cache_ttl_secs.saturating_mul(1000)).unwrap_or(i64::MAX)
    }

    /// Runs one poll cycle at `now_ms`.
    ///
    /// Upstream failures are logged and reported as [`PollOutcome::Failed`].
    ///
    /// # Errors
    /// Returns an error only if the store cannot be read to check freshness.
    pub async fn poll_once(&self, now_ms: i64) -> Result<PollOutcome> {
        self.stats.lock().await.record_poll();

        if let Some(latest) = self.store.latest().await? {
            let age_ms = now_ms - latest.timestamp;
            if age_ms < self.cache_ttl_ms() {
                tracing::debug!(age_ms, "Latest snapshot still fresh, skipping poll");
                self.stats.lock().await.record_cache_hit();
                return Ok(PollOutcome::Cached { age_ms });
            }
        }

        self.refresh_markets(now_ms).await;

        let states = match self
            .client
            .fetch_perp_markets(&self.chain.perps_contract, self.chain.market_limit)
            .await
        {
            Ok(states) => states,
            Err(e) => return Ok(self.fail("perps_markets", e.to_string()).await),
        };

        let snapshot = snapshot_from_states(&states, now_ms);
        if let Err(e) = self.store.insert(&snapshot).await {
            return Ok(self.fail("store", format!("{e:#}")).await);
        }

        let markets = snapshot.len();
        tracing::info!(timestamp = now_ms, markets, "Stored funding snapshot");
        self.stats
            .lock()
            .await
            .record_stored(timestamp_to_datetime(now_ms));
        self.emit(CollectorEvent::SnapshotStored {
            timestamp: now_ms,
            markets,
        })
        .await;

        Ok(PollOutcome::Stored {
            timestamp: now_ms,
            markets,
        })
    }

    /// Refreshes the market list when it is older than the market cache TTL.
    /// Failures are logged; the stale list keeps being served.
    async fn refresh_markets(&self, now_ms: i64) {
        let Some(registry) = &self.registry else {
            return;
        };

        match registry.last_refreshed().await {
            Ok(Some(at)) if now_ms - at < self.market_cache_ttl_ms() => return,
            Ok(_) => {}
            Err(e) => tracing::warn!("Failed to read market registry: {:#}", e),
        }

        let markets = match self.client.fetch_market_list(&self.chain.markets_contract).await {
            Ok(markets) => markets,
            Err(e) => {
                self.fail("market_list", e.to_string()).await;
                return;
            }
        };

        if let Err(e) = registry.upsert(&markets, now_ms).await {
            self.fail("market_registry", format!("{e:#}")).await;
            return;
        }

        tracing::info!(count = markets.len(), "Refreshed market list");
        self.stats.lock().await.record_market_refresh();
        self.emit(CollectorEvent::MarketsRefreshed {
            count: markets.len(),
        })
        .await;
    }

    async fn fail(&self, source: &str, error: String) -> PollOutcome {
        tracing::error!(source, "Funding poll failed: {}", error);
        self.stats.lock().await.record_error();
        self.emit(CollectorEvent::Error {
            source: source.to_string(),
            error: error.clone(),
        })
        .await;
        PollOutcome::Failed { error }
    }

    async fn emit(&self, event: CollectorEvent) {
        if let Some(ref tx) = self.event_tx {
            if tx.send(event).await.is_err() {
                tracing::debug!("Collector event receiver dropped");
            }
        }
    }
}
