//! Short/long squeeze potential per market.

use crate::common::{dominance_ratio, dominant_side, Side};
use perp_risk_core::{MarketRate, Snapshot};
use serde::{Deserialize, Serialize};

/// Entries returned by [`analyze_squeeze_potential`].
pub const SQUEEZE_LIMIT: usize = 10;

/// Funding above which a crowded long book is considered squeezable.
const LONG_SQUEEZE_FUNDING: f64 = 100.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SqueezeEntry {
    pub market: String,
    #[serde(rename = "longOI")]
    pub long_oi: f64,
    #[serde(rename = "shortOI")]
    pub short_oi: f64,
    #[serde(rename = "oiRatio")]
    pub oi_ratio: f64,
    pub dominant_side: Side,
    /// `|long - short| / total`, in percent.
    pub imbalance: f64,
    pub funding_rate: f64,
    pub short_squeeze_score: f64,
    pub long_squeeze_score: f64,
    pub max_score: f64,
    #[serde(rename = "type")]
    pub squeeze_type: Side,
}

/// Scores one market. `None` when it has no open interest.
///
/// The entry is returned even when both scores are zero; filtering is
/// left to [`analyze_squeeze_potential`].
#[must_use]
pub fn squeeze_entry(market: &str, rate: &MarketRate) -> Option<SqueezeEntry> {
    let long_oi = rate.long_oi_usd();
    let short_oi = rate.short_oi_usd();
    let total_oi = long_oi + short_oi;

    if total_oi <= 0.0 {
        return None;
    }

    let side = dominant_side(long_oi, short_oi);
    let imbalance = (long_oi - short_oi).abs() / total_oi;
    let funding_rate = rate.funding_rate;

    // Crowded shorts paying longs.
    let short_squeeze_score = if side == Side::Short && funding_rate > 0.0 {
        imbalance * 100.0 + funding_rate.abs() / 10.0
    } else {
        0.0
    };

    // Crowded longs paying expensive funding.
    let long_squeeze_score = if side == Side::Long && funding_rate > LONG_SQUEEZE_FUNDING {
        imbalance * 50.0 + funding_rate / 20.0
    } else {
        0.0
    };

    let squeeze_type = if short_squeeze_score > long_squeeze_score {
        Side::Short
    } else {
        Side::Long
    };

    Some(SqueezeEntry {
        market: market.to_string(),
        long_oi,
        short_oi,
        oi_ratio: dominance_ratio(long_oi, short_oi, 1.0),
        dominant_side: side,
        imbalance: imbalance * 100.0,
        funding_rate,
        short_squeeze_score,
        long_squeeze_score,
        max_score: short_squeeze_score.max(long_squeeze_score),
        squeeze_type,
    })
}

/// Markets with a non-zero squeeze score, highest first, at most [`SQUEEZE_LIMIT`].
#[must_use]
pub fn analyze_squeeze_potential(snapshot: &Snapshot) -> Vec<SqueezeEntry> {
    let mut entries: Vec<SqueezeEntry> = snapshot
        .iter()
        .filter_map(|(market, rate)| squeeze_entry(market, rate))
        .filter(|entry| entry.max_score > 0.0)
        .collect();

    entries.sort_by(|a, b| b.max_score.total_cmp(&a.max_score));
    entries.truncate(SQUEEZE_LIMIT);
    entries
}
