//! OI-weighted market sentiment.

use crate::common::percent_of;
use perp_risk_core::Snapshot;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Funding rate (annualized %) above which a market counts as extreme.
pub const EXTREME_FUNDING_THRESHOLD: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SentimentLabel {
    #[serde(rename = "Extremely Bullish")]
    ExtremelyBullish,
    Bullish,
    #[serde(rename = "Slightly Bullish")]
    SlightlyBullish,
    Neutral,
    #[serde(rename = "Slightly Bearish")]
    SlightlyBearish,
    Bearish,
    #[serde(rename = "Extremely Bearish")]
    ExtremelyBearish,
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::ExtremelyBullish => "Extremely Bullish",
            Self::Bullish => "Bullish",
            Self::SlightlyBullish => "Slightly Bullish",
            Self::Neutral => "Neutral",
            Self::SlightlyBearish => "Slightly Bearish",
            Self::Bearish => "Bearish",
            Self::ExtremelyBearish => "Extremely Bearish",
        };
        write!(f, "{label}")
    }
}

/// Classifies an OI-weighted funding rate. First matching threshold wins.
#[must_use]
pub fn classify_sentiment(weighted: f64) -> SentimentLabel {
    if weighted > 50.0 {
        SentimentLabel::ExtremelyBullish
    } else if weighted > 20.0 {
        SentimentLabel::Bullish
    } else if weighted > 5.0 {
        SentimentLabel::SlightlyBullish
    } else if weighted < -50.0 {
        SentimentLabel::ExtremelyBearish
    } else if weighted < -20.0 {
        SentimentLabel::Bearish
    } else if weighted < -5.0 {
        SentimentLabel::SlightlyBearish
    } else {
        SentimentLabel::Neutral
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentimentResult {
    pub total_markets: usize,
    pub positive_count: usize,
    pub negative_count: usize,
    pub neutral_count: usize,
    pub positive_percent: f64,
    pub negative_percent: f64,
    pub neutral_percent: f64,
    /// Funding rate weighted by each market's total OI.
    pub weighted_sentiment: f64,
    pub label: SentimentLabel,
    pub extreme_positive_count: usize,
    pub extreme_negative_count: usize,
    /// Sum of long + short OI over all markets, USD units.
    #[serde(rename = "totalOI")]
    pub total_oi: f64,
}

/// Aggregates one snapshot into a sentiment reading.
#[must_use]
pub fn analyze_sentiment(snapshot: &Snapshot) -> SentimentResult {
    let total_markets = snapshot.len();

    let mut positive_count = 0;
    let mut negative_count = 0;
    let mut neutral_count = 0;
    let mut extreme_positive_count = 0;
    let mut extreme_negative_count = 0;
    let mut weighted_sum = 0.0;
    let mut total_oi = 0.0;

    for (_, rate) in snapshot.iter() {
        let funding = rate.funding_rate;

        if funding > 0.0 {
            positive_count += 1;
        } else if funding < 0.0 {
            negative_count += 1;
        } else {
            neutral_count += 1;
        }

        if funding > EXTREME_FUNDING_THRESHOLD {
            extreme_positive_count += 1;
        } else if funding < -EXTREME_FUNDING_THRESHOLD {
            extreme_negative_count += 1;
        }

        let market_oi = rate.total_oi_usd();
        weighted_sum += funding * market_oi;
        total_oi += market_oi;
    }

    let weighted_sentiment = if total_oi > 0.0 {
        weighted_sum / total_oi
    } else {
        0.0
    };

    let markets = total_markets as f64;

    SentimentResult {
        total_markets,
        positive_count,
        negative_count,
        neutral_count,
        positive_percent: percent_of(positive_count as f64, markets),
        negative_percent: percent_of(negative_count as f64, markets),
        neutral_percent: percent_of(neutral_count as f64, markets),
        weighted_sentiment,
        label: classify_sentiment(weighted_sentiment),
        extreme_positive_count,
        extreme_negative_count,
        total_oi,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use perp_risk_core::MarketRate;

    #[test]
    fn test_weighted_sentiment() {
        // 100 units at +30, 300 units at -10 -> (3000 - 3000) / 400 = 0
        let snapshot = Snapshot::new(0)
            .with_market("perps/ubtc", MarketRate::new(30.0, "60000000", "40000000"))
            .with_market("perps/ueth", MarketRate::new(-10.0, "150000000", "150000000"));

        let result = analyze_sentiment(&snapshot);
        assert_eq!(result.total_markets, 2);
        assert_eq!(result.positive_count, 1);
        assert_eq!(result.negative_count, 1);
        assert_eq!(result.total_oi, 400.0);
        assert_eq!(result.weighted_sentiment, 0.0);
        assert_eq!(result.label, SentimentLabel::Neutral);
        assert_eq!(result.positive_percent, 50.0);
    }

    #[test]
    fn test_weighting_favors_large_markets() {
        let snapshot = Snapshot::new(0)
            .with_market("perps/ubtc", MarketRate::new(60.0, "900000000", "100000000"))
            .with_market("perps/uakt", MarketRate::new(-200.0, "0", "0"));

        let result = analyze_sentiment(&snapshot);
        assert_eq!(result.weighted_sentiment, 60.0);
        assert_eq!(result.label, SentimentLabel::ExtremelyBullish);
        assert_eq!(result.extreme_negative_count, 1);
        assert_eq!(result.extreme_positive_count, 0);
    }

    #[test]
    fn test_all_zero_funding_is_neutral() {
        let snapshot = Snapshot::new(0)
            .with_market("perps/ubtc", MarketRate::new(0.0, "1000000", "1000000"))
            .with_market("perps/ueth", MarketRate::new(0.0, "5000000", "0"));

        let result = analyze_sentiment(&snapshot);
        assert_eq!(result.neutral_count, 2);
        assert_eq!(result.weighted_sentiment, 0.0);
        assert_eq!(result.label, SentimentLabel::Neutral);
    }

    #[test]
    fn test_empty_snapshot() {
        let result = analyze_sentiment(&Snapshot::new(0));
        assert_eq!(result.total_markets, 0);
        assert_eq!(result.positive_percent, 0.0);
        assert_eq!(result.negative_percent, 0.0);
        assert_eq!(result.neutral_percent, 0.0);
        assert_eq!(result.label, SentimentLabel::Neutral);
    }

    #[test]
    fn test_classify_thresholds() {
        assert_eq!(classify_sentiment(50.1), SentimentLabel::ExtremelyBullish);
        assert_eq!(classify_sentiment(50.0), SentimentLabel::Bullish);
        assert_eq!(classify_sentiment(20.0), SentimentLabel::SlightlyBullish);
        assert_eq!(classify_sentiment(5.0), SentimentLabel::Neutral);
        assert_eq!(classify_sentiment(-5.0), SentimentLabel::Neutral);
        assert_eq!(classify_sentiment(-5.1), SentimentLabel::SlightlyBearish);
        assert_eq!(classify_sentiment(-20.1), SentimentLabel::Bearish);
        assert_eq!(classify_sentiment(-50.1), SentimentLabel::ExtremelyBearish);
    }

    #[test]
    fn test_label_display() {
        assert_eq!(SentimentLabel::SlightlyBearish.to_string(), "Slightly Bearish");
        assert_eq!(
            serde_json::to_string(&SentimentLabel::ExtremelyBullish).unwrap(),
            "\"Extremely Bullish\""
        );
    }
}
