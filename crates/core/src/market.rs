//! Funding-rate snapshot data model.
//!
//! A [`Snapshot`] is one poll of the perps contract: the funding rate and
//! long/short open interest of every tracked market at a single instant.
//! Open interest arrives as fixed-point integer strings with 6 implied
//! decimals and is kept verbatim so the arithmetic downstream stays exact.

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Number of implied decimals in open-interest strings (`10^6`).
pub const OI_SCALE: i64 = 1_000_000;

/// Ordered sequence of snapshots, ascending by timestamp.
///
/// Gaps are allowed (a failed poll is simply missing); duplicate
/// timestamps are not expected.
pub type HistoricalSeries = Vec<Snapshot>;

/// One market's state at one poll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketRate {
    /// Annualized funding rate in percent (`12.5` = +12.5%/yr).
    /// Positive means longs pay shorts.
    #[serde(rename = "fundingRate")]
    pub funding_rate: f64,
    /// Long open interest, fixed-point string with 6 implied decimals.
    #[serde(rename = "longOI")]
    pub long_oi: String,
    /// Short open interest, fixed-point string with 6 implied decimals.
    #[serde(rename = "shortOI")]
    pub short_oi: String,
    /// Spot/mark price as a plain decimal string, when the source provides it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    /// Poll time in ms since epoch (mirrors the snapshot timestamp).
    #[serde(default)]
    pub timestamp: i64,
}

impl MarketRate {
    /// Creates a market rate without price or timestamp.
    pub fn new(funding_rate: f64, long_oi: impl Into<String>, short_oi: impl Into<String>) -> Self {
        Self {
            funding_rate,
            long_oi: long_oi.into(),
            short_oi: short_oi.into(),
            price: None,
            timestamp: 0,
        }
    }

    /// Sets the price.
    #[must_use]
    pub fn with_price(mut self, price: impl Into<String>) -> Self {
        self.price = Some(price.into());
        self
    }

    /// Sets the per-entry timestamp.
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Long open interest in USD units (raw value / 1e6).
    #[must_use]
    pub fn long_oi_usd(&self) -> f64 {
        fixed_point_to_usd(&self.long_oi)
    }

    /// Short open interest in USD units (raw value / 1e6).
    #[must_use]
    pub fn short_oi_usd(&self) -> f64 {
        fixed_point_to_usd(&self.short_oi)
    }

    /// Long plus short open interest in USD units.
    #[must_use]
    pub fn total_oi_usd(&self) -> f64 {
        self.long_oi_usd() + self.short_oi_usd()
    }

    /// Parsed price, `0.0` when absent or unparseable.
    #[must_use]
    pub fn price_value(&self) -> f64 {
        self.price
            .as_deref()
            .and_then(|p| p.trim().parse::<f64>().ok())
            .filter(|p| p.is_finite())
            .unwrap_or(0.0)
    }
}

/// Converts a fixed-point OI string (6 implied decimals) to USD units.
///
/// Unparseable input yields `0.0`, which callers treat as "no open interest".
#[must_use]
pub fn fixed_point_to_usd(raw: &str) -> f64 {
    let raw = raw.trim();
    if raw.is_empty() {
        return 0.0;
    }

    if let Ok(value) = Decimal::from_str(raw) {
        return (value / Decimal::from(OI_SCALE)).to_f64().unwrap_or(0.0);
    }

    // Values beyond Decimal's 96-bit mantissa or in exponent form.
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map_or(0.0, |v| v / OI_SCALE as f64)
}

/// One poll result: every tracked market at a single instant.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Snapshot {
    /// Poll time in ms since epoch.
    pub timestamp: i64,
    /// Market identifier (e.g. `"perps/ubtc"`) to its rate.
    #[serde(rename = "data")]
    pub markets: BTreeMap<String, MarketRate>,
}

impl Snapshot {
    /// Creates an empty snapshot at `timestamp`.
    #[must_use]
    pub fn new(timestamp: i64) -> Self {
        Self {
            timestamp,
            markets: BTreeMap::new(),
        }
    }

    /// Adds a market, builder style.
    #[must_use]
    pub fn with_market(mut self, key: impl Into<String>, rate: MarketRate) -> Self {
        self.markets.insert(key.into(), rate);
        self
    }

    /// Looks up a market by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&MarketRate> {
        self.markets.get(key)
    }

    /// Number of markets in the snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.markets.len()
    }

    /// Returns true if the snapshot holds no markets.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.markets.is_empty()
    }

    /// Iterates markets in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &MarketRate)> {
        self.markets.iter()
    }

    /// Snapshot time as a UTC datetime.
    #[must_use]
    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        timestamp_to_datetime(self.timestamp)
    }
}

/// Tradable market as listed by the market registry contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketInfo {
    pub denom: String,
    /// Human-readable symbol, e.g. `"BTC"`.
    pub display: String,
}

impl MarketInfo {
    pub fn new(denom: impl Into<String>, display: impl Into<String>) -> Self {
        Self {
            denom: denom.into(),
            display: display.into(),
        }
    }
}

/// Converts ms-since-epoch to a UTC datetime.
#[must_use]
pub fn timestamp_to_datetime(timestamp_ms: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(timestamp_ms).single()
}

/// Human label for a market key: drops the `perps/` prefix and upper-cases.
///
/// `"perps/ubtc"` becomes `"UBTC"`.
#[must_use]
pub fn market_display_name(key: &str) -> String {
    key.strip_prefix("perps/").unwrap_or(key).to_uppercase()
}
