//! Whole-market risk index.
//!
//! Four factors contribute up to 25 points each:
//!
//! 1. aggregate long/short OI imbalance,
//! 2. share of markets with `|funding| > 100`,
//! 3. share of markets whose dominant/weaker OI ratio exceeds 5,
//! 4. recent funding-rate volatility, capped at 25.
//!
//! A separate per-market score ranks the riskiest individual markets.

use crate::common::{dominance_ratio, percent_of};
use perp_risk_core::{MarketRate, Snapshot};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Snapshots of history considered for volatility.
pub const VOLATILITY_WINDOW: usize = 10;

/// Markets returned in [`RiskDashboardResult::market_risks`].
pub const MARKET_RISK_LIMIT: usize = 5;

/// Per-market risk must exceed this to be listed.
const MARKET_RISK_THRESHOLD: f64 = 30.0;

const EXTREME_FUNDING: f64 = 100.0;
const IMBALANCED_RATIO: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// `>=75` Critical, `>=50` High, `>=25` Medium.
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score >= 75.0 {
            Self::Critical
        } else if score >= 50.0 {
            Self::High
        } else if score >= 25.0 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "Low"),
            Self::Medium => write!(f, "Medium"),
            Self::High => write!(f, "High"),
            Self::Critical => write!(f, "Critical"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketRisk {
    pub market: String,
    pub risk: f64,
    #[serde(rename = "totalOI")]
    pub total_oi: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskDashboardResult {
    /// Composite index, `0..=100`.
    pub overall_risk: f64,
    pub risk_level: RiskLevel,
    #[serde(rename = "totalLongOI")]
    pub total_long_oi: f64,
    #[serde(rename = "totalShortOI")]
    pub total_short_oi: f64,
    pub extreme_funding_count: usize,
    pub imbalanced_markets: usize,
    /// Mean absolute funding change between consecutive snapshots.
    pub volatility_score: f64,
    /// Aggregate OI imbalance in percent.
    pub oi_imbalance: f64,
    #[serde(rename = "longOIPercent")]
    pub long_oi_percent: f64,
    #[serde(rename = "shortOIPercent")]
    pub short_oi_percent: f64,
    pub market_risks: Vec<MarketRisk>,
}

/// Average over the last [`VOLATILITY_WINDOW`] snapshots of the mean
/// absolute per-market funding change between neighbours.
///
/// Only markets present in both snapshots of a pair count. A pair with no
/// shared markets contributes `0`. Fewer than two snapshots yield `0`.
#[must_use]
pub fn funding_volatility(history: &[Snapshot]) -> f64 {
    if history.len() < 2 {
        return 0.0;
    }

    let recent = &history[history.len().saturating_sub(VOLATILITY_WINDOW)..];

    let pair_means: Vec<f64> = recent
        .windows(2)
        .map(|pair| {
            let (prev, curr) = (&pair[0], &pair[1]);
            let changes: Vec<f64> = curr
                .iter()
                .filter_map(|(market, rate)| {
                    prev.get(market)
                        .map(|before| (rate.funding_rate - before.funding_rate).abs())
                })
                .collect();

            if changes.is_empty() {
                0.0
            } else {
                changes.iter().sum::<f64>() / changes.len() as f64
            }
        })
        .collect();

    pair_means.iter().sum::<f64>() / pair_means.len() as f64
}

/// Per-market score from OI ratio, funding extremity and misalignment.
///
/// `None` when the market has no open interest.
#[must_use]
pub fn market_risk(market: &str, rate: &MarketRate) -> Option<MarketRisk> {
    let long_oi = rate.long_oi_usd();
    let short_oi = rate.short_oi_usd();
    let total_oi = long_oi + short_oi;

    if total_oi <= 0.0 {
        return None;
    }

    let ratio = dominance_ratio(long_oi, short_oi, 1.0);
    let funding = rate.funding_rate;
    let extremity = funding.abs();

    let mut risk = 0.0;

    if ratio > 10.0 {
        risk += 40.0;
    } else if ratio > 5.0 {
        risk += 25.0;
    } else if ratio > 3.0 {
        risk += 15.0;
    }

    if extremity > 200.0 {
        risk += 40.0;
    } else if extremity > 100.0 {
        risk += 25.0;
    } else if extremity > 50.0 {
        risk += 15.0;
    }

    // Dominant side is being paid rather than paying.
    let misaligned = (long_oi > short_oi && funding < 0.0) || (short_oi > long_oi && funding > 0.0);
    if misaligned {
        risk += 20.0;
    }

    Some(MarketRisk {
        market: market.to_string(),
        risk: f64::min(risk, 100.0),
        total_oi,
    })
}

/// Computes the risk dashboard for `snapshot`, using `history` for volatility.
///
/// `history` is expected ascending by timestamp and may or may not include
/// `snapshot` itself.
#[must_use]
pub fn analyze_risk_dashboard(snapshot: &Snapshot, history: &[Snapshot]) -> RiskDashboardResult {
    let total_markets = snapshot.len();

    let mut total_long_oi = 0.0;
    let mut total_short_oi = 0.0;
    let mut extreme_funding_count = 0;
    let mut imbalanced_markets = 0;

    for (_, rate) in snapshot.iter() {
        let long_oi = rate.long_oi_usd();
        let short_oi = rate.short_oi_usd();

        total_long_oi += long_oi;
        total_short_oi += short_oi;

        if rate.funding_rate.abs() > EXTREME_FUNDING {
            extreme_funding_count += 1;
        }

        if dominance_ratio(long_oi, short_oi, 1.0) > IMBALANCED_RATIO {
            imbalanced_markets += 1;
        }
    }

    let volatility_score = funding_volatility(history);

    let total_oi = total_long_oi + total_short_oi;
    let oi_imbalance = if total_oi > 0.0 {
        (total_long_oi - total_short_oi).abs() / total_oi
    } else {
        0.0
    };

    let (extreme_fraction, imbalanced_fraction) = if total_markets > 0 {
        let markets = total_markets as f64;
        (
            extreme_funding_count as f64 / markets,
            imbalanced_markets as f64 / markets,
        )
    } else {
        (0.0, 0.0)
    };

    let overall_risk = (oi_imbalance * 25.0
        + extreme_fraction * 25.0
        + imbalanced_fraction * 25.0
        + volatility_score.min(25.0))
    .clamp(0.0, 100.0);

    let mut market_risks: Vec<MarketRisk> = snapshot
        .iter()
        .filter_map(|(market, rate)| market_risk(market, rate))
        .filter(|m| m.risk > MARKET_RISK_THRESHOLD)
        .collect();
    market_risks.sort_by(|a, b| b.risk.total_cmp(&a.risk));
    market_risks.truncate(MARKET_RISK_LIMIT);

    RiskDashboardResult {
        overall_risk,
        risk_level: RiskLevel::from_score(overall_risk),
        total_long_oi,
        total_short_oi,
        extreme_funding_count,
        imbalanced_markets,
        volatility_score,
        oi_imbalance: oi_imbalance * 100.0,
        long_oi_percent: percent_of(total_long_oi, total_oi),
        short_oi_percent: percent_of(total_short_oi, total_oi),
        market_risks,
    }
}
