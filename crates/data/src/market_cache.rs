//! File-backed market registry, `{data_dir}/markets.json`.

use crate::file_store::write_atomic;
use anyhow::{Context, Result};
use async_trait::async_trait;
use perp_risk_core::{MarketInfo, MarketRegistry};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::sync::Mutex;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CachedMarkets {
    updated_at: i64,
    markets: Vec<MarketInfo>,
}

#[derive(Debug)]
pub struct FileMarketCache {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileMarketCache {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            path: data_dir.into().join("markets.json"),
            write_lock: Mutex::new(()),
        }
    }

    async fn read(&self) -> Result<Option<CachedMarkets>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(cached) => Ok(Some(cached)),
                Err(e) => {
                    tracing::warn!(path = %self.path.display(), "Ignoring unreadable market cache: {e}");
                    Ok(None)
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", self.path.display())),
        }
    }
}

#[async_trait]
impl MarketRegistry for FileMarketCache {
    async fn list(&self) -> Result<Vec<MarketInfo>> {
        Ok(self.read().await?.map(|c| c.markets).unwrap_or_default())
    }

    async fn last_refreshed(&self) -> Result<Option<i64>> {
        Ok(self.read().await?.map(|c| c.updated_at))
    }

    async fn upsert(&self, markets: &[MarketInfo], now_ms: i64) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut merged = self.read().await?.map(|c| c.markets).unwrap_or_default();

        for market in markets {
            match merged.iter_mut().find(|m| m.denom == market.denom) {
                Some(existing) => existing.display.clone_from(&market.display),
                None => merged.push(market.clone()),
            }
        }
        merged.sort_by(|a, b| a.denom.cmp(&b.denom));

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let cached = CachedMarkets {
            updated_at: now_ms,
            markets: merged,
        };
        write_atomic(&self.path, serde_json::to_string_pretty(&cached)?.as_bytes()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_empty_cache() {
        let dir = TempDir::new().unwrap();
        let cache = FileMarketCache::new(dir.path());
        assert!(cache.list().await.unwrap().is_empty());
        assert!(cache.last_refreshed().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upsert_merges_by_denom() {
        let dir = TempDir::new().unwrap();
        let cache = FileMarketCache::new(dir.path());

        cache
            .upsert(&[MarketInfo::new("perps/ueth", "ETH"), MarketInfo::new("perps/ubtc", "btc")], 1_000)
            .await
            .unwrap();
        cache.upsert(&[MarketInfo::new("perps/ubtc", "BTC")], 2_000).await.unwrap();

        let markets = cache.list().await.unwrap();
        assert_eq!(
            markets,
            vec![MarketInfo::new("perps/ubtc", "BTC"), MarketInfo::new("perps/ueth", "ETH")]
        );
        assert_eq!(cache.last_refreshed().await.unwrap(), Some(2_000));
    }

    #[tokio::test]
    async fn test_concurrent_upserts_keep_every_market() {
        let dir = TempDir::new().unwrap();
        let cache = std::sync::Arc::new(FileMarketCache::new(dir.path()));

        let handles: Vec<_> = ["perps/ubtc", "perps/ueth", "perps/uinj", "perps/uakt"]
            .into_iter()
            .enumerate()
            .map(|(i, denom)| {
                let cache = cache.clone();
                tokio::spawn(async move {
                    cache
                        .upsert(&[MarketInfo::new(denom, denom.to_uppercase())], i as i64)
                        .await
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(cache.list().await.unwrap().len(), 4);
        assert!(!dir.path().join("markets.json.tmp").exists());
    }
}
