//! Time-series views of a snapshot history for charting.
//!
//! A market missing from a snapshot plots as zero so every series has one
//! point per snapshot.

use perp_risk_core::{market_display_name, Snapshot};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Markets plotted when the caller does not pick any.
pub const DEFAULT_CHART_MARKETS: [&str; 5] = [
    "perps/ulink",
    "perps/uakt",
    "perps/uinj",
    "perps/ubtc",
    "perps/ueth",
];

/// Market shown on the open-interest chart by default.
pub const DEFAULT_OI_MARKET: &str = "perps/ulink";

const FALLBACK_CHART_MARKETS: usize = 5;

/// Every market key appearing anywhere in `series`, sorted.
#[must_use]
pub fn all_markets(series: &[Snapshot]) -> Vec<String> {
    series
        .iter()
        .flat_map(|s| s.markets.keys().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Preferred markets that exist in `series`, or the first five markets
/// alphabetically when none of them do.
#[must_use]
pub fn default_chart_markets(series: &[Snapshot], preferred: &[&str]) -> Vec<String> {
    let available = all_markets(series);

    let chosen: Vec<String> = preferred
        .iter()
        .filter(|p| available.iter().any(|m| m == *p))
        .map(|p| (*p).to_string())
        .collect();

    if chosen.is_empty() {
        available.into_iter().take(FALLBACK_CHART_MARKETS).collect()
    } else {
        chosen
    }
}

/// One line on a multi-market funding chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundingRateSeries {
    pub market: String,
    pub label: String,
    pub points: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundingRateChart {
    pub timestamps: Vec<i64>,
    pub series: Vec<FundingRateSeries>,
}

#[must_use]
pub fn funding_rate_series(history: &[Snapshot], markets: &[String]) -> FundingRateChart {
    let series = markets
        .iter()
        .map(|market| FundingRateSeries {
            market: market.clone(),
            label: market_display_name(market),
            points: history
                .iter()
                .map(|s| s.get(market).map_or(0.0, |r| r.funding_rate))
                .collect(),
        })
        .collect();

    FundingRateChart {
        timestamps: history.iter().map(|s| s.timestamp).collect(),
        series,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OpenInterestPoint {
    pub timestamp: i64,
    #[serde(rename = "longOI")]
    pub long_oi: f64,
    #[serde(rename = "shortOI")]
    pub short_oi: f64,
}

/// Long/short OI of one market over time, USD units.
#[must_use]
pub fn open_interest_series(history: &[Snapshot], market: &str) -> Vec<OpenInterestPoint> {
    history
        .iter()
        .map(|s| {
            let (long_oi, short_oi) = s
                .get(market)
                .map_or((0.0, 0.0), |r| (r.long_oi_usd(), r.short_oi_usd()));
            OpenInterestPoint {
                timestamp: s.timestamp,
                long_oi,
                short_oi,
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: i64,
    pub price: f64,
}

#[must_use]
pub fn price_series(history: &[Snapshot], market: &str) -> Vec<PricePoint> {
    history
        .iter()
        .map(|s| PricePoint {
            timestamp: s.timestamp,
            price: s.get(market).map_or(0.0, |r| r.price_value()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use perp_risk_core::MarketRate;

    fn history() -> Vec<Snapshot> {
        vec![
            Snapshot::new(1)
                .with_market("perps/ubtc", MarketRate::new(10.0, "2000000", "1000000").with_price("65000"))
                .with_market("perps/uakt", MarketRate::new(-5.0, "1000000", "1000000")),
            Snapshot::new(2)
                .with_market("perps/ubtc", MarketRate::new(12.0, "3000000", "1000000"))
                .with_market("perps/uzzz", MarketRate::new(1.0, "0", "0")),
        ]
    }

    #[test]
    fn test_all_markets_sorted_unique() {
        assert_eq!(
            all_markets(&history()),
            vec!["perps/uakt", "perps/ubtc", "perps/uzzz"]
        );
        assert!(all_markets(&[]).is_empty());
    }

    #[test]
    fn test_default_markets_prefers_known() {
        let markets = default_chart_markets(&history(), &DEFAULT_CHART_MARKETS);
        assert_eq!(markets, vec!["perps/uakt", "perps/ubtc"]);
    }

    #[test]
    fn test_default_markets_fallback() {
        let markets = default_chart_markets(&history(), &["perps/unone"]);
        assert_eq!(markets, all_markets(&history()));
    }

    #[test]
    fn test_funding_series_missing_is_zero() {
        let chart = funding_rate_series(&history(), &["perps/uakt".to_string()]);
        assert_eq!(chart.timestamps, vec![1, 2]);
        assert_eq!(chart.series[0].points, vec![-5.0, 0.0]);
        assert_eq!(chart.series[0].label, "UAKT");
    }

    #[test]
    fn test_open_interest_series() {
        let points = open_interest_series(&history(), "perps/ubtc");
        assert_eq!(points[0].long_oi, 2.0);
        assert_eq!(points[1].long_oi, 3.0);
        assert_eq!(points[1].short_oi, 1.0);

        let missing = open_interest_series(&history(), "perps/unone");
        assert!(missing.iter().all(|p| p.long_oi == 0.0 && p.short_oi == 0.0));
    }

    #[test]
    fn test_price_series() {
        let points = price_series(&history(), "perps/ubtc");
        assert_eq!(points[0].price, 65000.0);
        assert_eq!(points[1].price, 0.0);
    }
}
