//! Markets ranked by funding-rate magnitude.

use perp_risk_core::{market_display_name, Snapshot};
use serde::{Deserialize, Serialize};

/// Rows shown in the dashboard's top-rates table.
pub const TOP_RATES_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedRate {
    /// 1-based.
    pub rank: usize,
    pub market: String,
    pub display_name: String,
    pub funding_rate: f64,
    #[serde(rename = "longOI")]
    pub long_oi: f64,
    #[serde(rename = "shortOI")]
    pub short_oi: f64,
}

/// Markets with open interest, largest `|funding_rate|` first.
#[must_use]
pub fn top_funding_rates(snapshot: &Snapshot, limit: usize) -> Vec<RankedRate> {
    let mut markets: Vec<_> = snapshot
        .iter()
        .filter(|(_, rate)| rate.total_oi_usd() > 0.0)
        .collect();

    markets.sort_by(|(_, a), (_, b)| b.funding_rate.abs().total_cmp(&a.funding_rate.abs()));

    markets
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(i, (market, rate))| RankedRate {
            rank: i + 1,
            market: market.clone(),
            display_name: market_display_name(market),
            funding_rate: rate.funding_rate,
            long_oi: rate.long_oi_usd(),
            short_oi: rate.short_oi_usd(),
        })
        .collect()
}
