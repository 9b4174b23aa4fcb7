//! Per-market open-interest concentration risk.

use crate::common::{dominance_ratio, Side};
use perp_risk_core::{MarketRate, Snapshot};
use serde::{Deserialize, Serialize};

/// Entries returned by [`analyze_concentration`].
pub const CONCENTRATION_LIMIT: usize = 15;

/// Weaker-side substitute when it is exactly zero.
const RATIO_ZERO_FLOOR: f64 = 0.001;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConcentrationEntry {
    pub market: String,
    #[serde(rename = "longOI")]
    pub long_oi: f64,
    #[serde(rename = "shortOI")]
    pub short_oi: f64,
    #[serde(rename = "totalOI")]
    pub total_oi: f64,
    pub long_percent: f64,
    pub short_percent: f64,
    /// Share of the dominant side, `50..=100`.
    pub concentration: f64,
    pub dominant_side: Side,
    /// Dominant over weaker OI.
    pub ratio: f64,
    pub funding_rate: f64,
    /// True when the dominant side is the one paying funding.
    pub funding_aligned: bool,
    pub risk_score: f64,
}

fn base_risk_score(concentration: f64) -> f64 {
    if concentration > 90.0 {
        100.0
    } else if concentration > 80.0 {
        80.0
    } else if concentration > 70.0 {
        60.0
    } else if concentration > 60.0 {
        40.0
    } else {
        20.0
    }
}

/// Scores a single market, `None` when it has no open interest.
#[must_use]
pub fn concentration_entry(market: &str, rate: &MarketRate) -> Option<ConcentrationEntry> {
    let long_oi = rate.long_oi_usd();
    let short_oi = rate.short_oi_usd();
    let total_oi = long_oi + short_oi;

    if total_oi <= 0.0 {
        return None;
    }

    let long_percent = long_oi / total_oi * 100.0;
    let short_percent = 100.0 - long_percent;
    let concentration = long_percent.max(short_percent);
    let dominant_side = if long_percent > short_percent {
        Side::Long
    } else {
        Side::Short
    };

    let funding_rate = rate.funding_rate;
    let funding_aligned = match dominant_side {
        Side::Long => funding_rate > 0.0,
        Side::Short => funding_rate < 0.0,
    };

    let mut risk_score = base_risk_score(concentration);
    if !funding_aligned {
        risk_score *= 1.5;
    }

    Some(ConcentrationEntry {
        market: market.to_string(),
        long_oi,
        short_oi,
        total_oi,
        long_percent,
        short_percent,
        concentration,
        dominant_side,
        ratio: dominance_ratio(long_oi, short_oi, RATIO_ZERO_FLOOR),
        funding_rate,
        funding_aligned,
        risk_score: risk_score.min(100.0),
    })
}

/// Most concentrated markets first, at most [`CONCENTRATION_LIMIT`].
///
/// Markets with zero total OI are left out. Equal concentrations keep
/// market key order.
#[must_use]
pub fn analyze_concentration(snapshot: &Snapshot) -> Vec<ConcentrationEntry> {
    let mut entries: Vec<ConcentrationEntry> = snapshot
        .iter()
        .filter_map(|(market, rate)| concentration_entry(market, rate))
        .collect();

    entries.sort_by(|a, b| b.concentration.total_cmp(&a.concentration));
    entries.truncate(CONCENTRATION_LIMIT);
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single(funding: f64, long_oi: &str, short_oi: &str) -> ConcentrationEntry {
        concentration_entry("perps/ubtc", &MarketRate::new(funding, long_oi, short_oi)).unwrap()
    }

    #[test]
    fn test_eighty_percent_long_aligned() {
        let entry = single(120.0, "80000000", "20000000");
        assert_eq!(entry.concentration, 80.0);
        assert_eq!(entry.dominant_side, Side::Long);
        assert_eq!(entry.ratio, 4.0);
        assert!(entry.funding_aligned);
        // 80 is not > 80, so the 60 tier applies
        assert_eq!(entry.risk_score, 60.0);
    }

    #[test]
    fn test_misaligned_multiplier_is_capped() {
        let entry = single(-5.0, "95000000", "5000000");
        assert!(!entry.funding_aligned);
        assert_eq!(entry.risk_score, 100.0);

        let entry = single(-5.0, "65000000", "35000000");
        assert_eq!(entry.risk_score, 60.0);
    }

    #[test]
    fn test_short_dominant() {
        let entry = single(-10.0, "25000000", "75000000");
        assert_eq!(entry.dominant_side, Side::Short);
        assert_eq!(entry.concentration, 75.0);
        assert!(entry.funding_aligned);
        assert_eq!(entry.risk_score, 60.0);
    }

    #[test]
    fn test_even_split_counts_as_short() {
        let entry = single(10.0, "50000000", "50000000");
        assert_eq!(entry.dominant_side, Side::Short);
        assert_eq!(entry.concentration, 50.0);
        assert!(!entry.funding_aligned);
        assert_eq!(entry.risk_score, 30.0);
    }

    #[test]
    fn test_zero_weaker_side_uses_floor() {
        let entry = single(10.0, "2000000", "0");
        assert_eq!(entry.ratio, 2000.0);
        assert_eq!(entry.concentration, 100.0);
    }

    #[test]
    fn test_zero_oi_excluded() {
        assert!(concentration_entry("perps/ubtc", &MarketRate::new(10.0, "0", "0")).is_none());
    }

    #[test]
    fn test_sorted_and_truncated() {
        let mut snapshot = Snapshot::new(0);
        for i in 0..20u32 {
            let long = 50_000_000 + u64::from(i) * 2_000_000;
            let short = 100_000_000 - long;
            snapshot = snapshot.with_market(
                format!("perps/m{i:02}"),
                MarketRate::new(1.0, long.to_string(), short.to_string()),
            );
        }
        snapshot = snapshot.with_market("perps/empty", MarketRate::new(1.0, "0", "0"));

        let entries = analyze_concentration(&snapshot);
        assert_eq!(entries.len(), CONCENTRATION_LIMIT);
        assert_eq!(entries[0].market, "perps/m19");
        assert!(entries
            .windows(2)
            .all(|w| w[0].concentration >= w[1].concentration));
        assert!(entries.iter().all(|e| e.market != "perps/empty"));
    }

    #[test]
    fn test_serialized_field_names() {
        let json = serde_json::to_value(single(1.0, "3000000", "1000000")).unwrap();
        assert_eq!(json["longOI"], 3.0);
        assert_eq!(json["dominantSide"], "long");
        assert!(json.get("riskScore").is_some());
    }
}
