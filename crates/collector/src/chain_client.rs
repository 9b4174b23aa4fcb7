//! CosmWasm smart-query client over the chain's LCD REST gateway.
//!
//! Queries are `GET {lcd}/cosmwasm/wasm/v1/contract/{address}/smart/{msg}`
//! where `msg` is the base64-encoded JSON query. The gateway wraps the
//! contract's answer as `{ "data": <answer> }`.

use crate::error::ChainError;
use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use governor::{Quota, RateLimiter};
use nonzero_ext::nonzero;
use perp_risk_core::{ChainConfig, MarketInfo, MarketRate, Snapshot};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

/// Days per year used to annualize the daily funding rate.
const DAYS_PER_YEAR: f64 = 365.0;

/// State of one perp market as returned by the perps `markets` query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerpMarketState {
    pub denom: String,
    /// Daily funding rate as a decimal string, e.g. `"0.0003"`.
    #[serde(default)]
    pub current_funding_rate: Option<String>,
    /// Long OI, integer string with 6 implied decimals.
    #[serde(default)]
    pub long_oi_value: String,
    #[serde(default)]
    pub short_oi_value: String,
}

impl PerpMarketState {
    /// Annualized funding rate in percent; a missing or bad rate counts as zero.
    #[must_use]
    pub fn annualized_funding_rate(&self) -> f64 {
        let daily = self
            .current_funding_rate
            .as_deref()
            .and_then(|r| r.trim().parse::<f64>().ok())
            .filter(|r| r.is_finite())
            .unwrap_or(0.0);
        daily * DAYS_PER_YEAR * 100.0
    }

    #[must_use]
    pub fn to_market_rate(&self, timestamp_ms: i64) -> MarketRate {
        MarketRate::new(
            self.annualized_funding_rate(),
            self.long_oi_value.clone(),
            self.short_oi_value.clone(),
        )
        .with_timestamp(timestamp_ms)
    }
}

/// Builds a snapshot from one `markets` query result.
#[must_use]
pub fn snapshot_from_states(states: &[PerpMarketState], timestamp_ms: i64) -> Snapshot {
    states.iter().fold(Snapshot::new(timestamp_ms), |snapshot, state| {
        snapshot.with_market(state.denom.clone(), state.to_market_rate(timestamp_ms))
    })
}

#[derive(Debug, Deserialize)]
struct SmartQueryResponse<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct PagedMarkets {
    data: Vec<PerpMarketState>,
}

#[derive(Debug, Deserialize)]
struct RegistryMarket {
    denom: String,
    #[serde(default)]
    display: serde_json::Value,
    #[serde(default)]
    enabled: bool,
}

impl RegistryMarket {
    fn display_name(&self) -> String {
        match &self.display {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Null => self.denom.clone(),
            other => other.to_string(),
        }
    }
}

/// Rate-limited client for contract smart queries.
pub struct ChainClient {
    http: Client,
    lcd_url: String,
    rate_limiter: Arc<
        RateLimiter<
            governor::state::NotKeyed,
            governor::state::InMemoryState,
            governor::clock::DefaultClock,
        >,
    >,
}

impl ChainClient {
    /// Creates a client for `lcd_url`, limited to `requests_per_second`.
    pub fn new(lcd_url: impl Into<String>, requests_per_second: NonZeroU32) -> Self {
        let quota = Quota::per_second(requests_per_second);

        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            http,
            lcd_url: lcd_url.into().trim_end_matches('/').to_string(),
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
        }
    }

    /// Creates a client from chain configuration.
    #[must_use]
    pub fn from_config(config: &ChainConfig) -> Self {
        let rps = NonZeroU32::new(config.requests_per_second).unwrap_or(nonzero!(5u32));
        Self::new(config.lcd_url.clone(), rps)
    }

    /// Sets a custom base URL (useful for testing).
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.lcd_url = url.into().trim_end_matches('/').to_string();
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.lcd_url
    }

    /// Path of a smart query, with the message base64-encoded.
    ///
    /// # Errors
    /// Returns [`ChainError::Encode`] if `msg` cannot be serialized.
    pub fn smart_query_path<Q: Serialize>(contract: &str, msg: &Q) -> Result<String, ChainError> {
        let json = serde_json::to_vec(msg).map_err(|e| ChainError::Encode(e.to_string()))?;
        Ok(format!(
            "/cosmwasm/wasm/v1/contract/{contract}/smart/{}",
            URL_SAFE.encode(json)
        ))
    }

    /// Runs a smart query and decodes the contract's answer.
    ///
    /// # Errors
    /// Returns an error on transport failure, non-success status or an
    /// unexpected body.
    pub async fn query_smart<Q: Serialize, T: DeserializeOwned>(
        &self,
        contract: &str,
        msg: &Q,
    ) -> Result<T, ChainError> {
        self.rate_limiter.until_ready().await;

        let url = format!("{}{}", self.lcd_url, Self::smart_query_path(contract, msg)?);
        tracing::debug!("GET {}", url);

        let response = self
            .http
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(ChainError::query(status.as_u16(), text));
        }

        let body = response.text().await?;
        let parsed: SmartQueryResponse<T> =
            serde_json::from_str(&body).map_err(|e| ChainError::Decode(e.to_string()))?;
        Ok(parsed.data)
    }

    /// Fetches funding rate and open interest of up to `limit` perp markets.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn fetch_perp_markets(
        &self,
        perps_contract: &str,
        limit: u32,
    ) -> Result<Vec<PerpMarketState>, ChainError> {
        let msg = serde_json::json!({ "markets": { "limit": limit } });
        let page: PagedMarkets = self.query_smart(perps_contract, &msg).await?;

        tracing::debug!(markets = page.data.len(), "Fetched perp market states");
        Ok(page.data)
    }

    /// Fetches the enabled markets listed by the registry contract.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn fetch_market_list(&self, registry_contract: &str) -> Result<Vec<MarketInfo>, ChainError> {
        let msg = serde_json::json!({ "markets": {} });
        let markets: Vec<RegistryMarket> = self.query_smart(registry_contract, &msg).await?;

        Ok(markets
            .iter()
            .filter(|m| m.enabled)
            .map(|m| MarketInfo::new(m.denom.clone(), m.display_name()))
            .collect())
    }
}
