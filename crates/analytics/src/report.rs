use crate::alerts::{detect_alerts, AlertScan};
use crate::concentration::{analyze_concentration, ConcentrationEntry};
use crate::rankings::{top_funding_rates, RankedRate, TOP_RATES_LIMIT};
use crate::risk_dashboard::{analyze_risk_dashboard, RiskDashboardResult};
use crate::sentiment::{analyze_sentiment, SentimentResult};
use crate::squeeze::{analyze_squeeze_potential, SqueezeEntry};
use crate::timeframe::Cadence;
use perp_risk_core::Snapshot;
use serde::{Deserialize, Serialize};

/// Every analyzer's output for one snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardReport {
    pub timestamp: i64,
    pub market_count: usize,
    pub sentiment: SentimentResult,
    pub concentration: Vec<ConcentrationEntry>,
    pub squeeze: Vec<SqueezeEntry>,
    pub risk: RiskDashboardResult,
    pub alerts: AlertScan,
    pub top_rates: Vec<RankedRate>,
}

impl DashboardReport {
    /// Runs all analyzers. `history` is ascending, sampled at `cadence`, and
    /// may end with `current`; entries newer than `current` are ignored.
    #[must_use]
    pub fn build(current: &Snapshot, history: &[Snapshot], cadence: Cadence) -> Self {
        Self {
            timestamp: current.timestamp,
            market_count: current.len(),
            sentiment: analyze_sentiment(current),
            concentration: analyze_concentration(current),
            squeeze: analyze_squeeze_potential(current),
            risk: analyze_risk_dashboard(current, history_through(history, current.timestamp)),
            alerts: alerts_against_history(current, history, cadence),
            top_rates: top_funding_rates(current, TOP_RATES_LIMIT),
        }
    }
}

/// Prefix of an ascending `history` with `timestamp <= until_ms`.
#[must_use]
pub fn history_through(history: &[Snapshot], until_ms: i64) -> &[Snapshot] {
    &history[..history.partition_point(|s| s.timestamp <= until_ms)]
}

/// Compares `current` with the newest `history` entry from an earlier
/// `cadence` bucket.
///
/// History read after `current` may already hold newer polls, and a
/// downsampled history holds the first poll of `current`'s own bucket;
/// neither is used as the baseline.
#[must_use]
pub fn alerts_against_history(current: &Snapshot, history: &[Snapshot], cadence: Cadence) -> AlertScan {
    let current_bucket = cadence.bucket_of(current.timestamp);
    let previous = history
        .iter()
        .filter(|s| cadence.bucket_of(s.timestamp) < current_bucket)
        .max_by_key(|s| s.timestamp);

    match previous {
        Some(previous) => AlertScan::Ready {
            previous_timestamp: previous.timestamp,
            current_timestamp: current.timestamp,
            alerts: detect_alerts(previous, current),
        },
        None => AlertScan::InsufficientData,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeframe::filter_by_timeframe;
    use perp_risk_core::MarketRate;

    const MIN_MS: i64 = 60_000;

    fn snap(timestamp: i64, funding: f64) -> Snapshot {
        Snapshot::new(timestamp).with_market("perps/ubtc", MarketRate::new(funding, "3000000", "1000000"))
    }

    fn previous_timestamp(scan: &AlertScan) -> Option<i64> {
        match scan {
            AlertScan::Ready { previous_timestamp, .. } => Some(*previous_timestamp),
            AlertScan::InsufficientData => None,
        }
    }

    #[test]
    fn test_alerts_when_history_ends_with_current() {
        let history = vec![snap(1, 10.0), snap(2, -15.0)];
        let scan = alerts_against_history(&history[1], &history, Cadence::Raw);
        assert_eq!(scan.alerts().len(), 1);
        assert_eq!(previous_timestamp(&scan), Some(1));
    }

    #[test]
    fn test_alerts_when_history_excludes_current() {
        let history = vec![snap(1, 10.0)];
        let scan = alerts_against_history(&snap(2, -15.0), &history, Cadence::Raw);
        assert_eq!(previous_timestamp(&scan), Some(1));
    }

    #[test]
    fn test_alerts_ignore_polls_newer_than_current() {
        let current = snap(2, -15.0);
        let history = vec![snap(1, 10.0), current.clone(), snap(3, 40.0)];

        let scan = alerts_against_history(&current, &history, Cadence::Raw);
        assert_eq!(previous_timestamp(&scan), Some(1));
        let alert = &scan.alerts()[0];
        assert_eq!(alert.previous_rate, 10.0);
        assert_eq!(alert.current_rate, -15.0);
    }

    #[test]
    fn test_hourly_alerts_skip_current_hour() {
        // 15-minute polls from 11:00 to 12:45
        let raw: Vec<Snapshot> = (0..8)
            .map(|i| snap((660 + i * 15) * MIN_MS, 10.0 + i as f64))
            .collect();
        let current = raw.last().unwrap().clone();
        let hourly = filter_by_timeframe(&raw, Cadence::Hourly);
        assert_eq!(hourly.last().unwrap().timestamp, 720 * MIN_MS);

        let scan = alerts_against_history(&current, &hourly, Cadence::Hourly);
        assert_eq!(previous_timestamp(&scan), Some(660 * MIN_MS));
        assert!(matches!(scan, AlertScan::Ready { current_timestamp, .. } if current_timestamp == 765 * MIN_MS));
    }

    #[test]
    fn test_alerts_insufficient() {
        let current = snap(1, 10.0);
        assert_eq!(alerts_against_history(&current, &[], Cadence::Raw), AlertScan::InsufficientData);
        assert_eq!(
            alerts_against_history(&current, std::slice::from_ref(&current), Cadence::Raw),
            AlertScan::InsufficientData
        );
        assert_eq!(
            alerts_against_history(&current, &[snap(5, 1.0)], Cadence::Raw),
            AlertScan::InsufficientData
        );
    }

    #[test]
    fn test_history_through() {
        let history = vec![snap(1, 1.0), snap(2, 2.0), snap(3, 3.0)];
        assert_eq!(history_through(&history, 2).len(), 2);
        assert!(history_through(&history, 0).is_empty());
        assert_eq!(history_through(&history, 9).len(), 3);
    }

    #[test]
    fn test_build_report() {
        let history = vec![snap(1, 10.0), snap(2, 12.0)];
        let report = DashboardReport::build(&history[1], &history, Cadence::Raw);
        assert_eq!(report.timestamp, 2);
        assert_eq!(report.market_count, 1);
        assert_eq!(report.concentration.len(), 1);
        assert_eq!(report.top_rates[0].market, "perps/ubtc");
        assert_eq!(report.risk.volatility_score, 2.0);
    }

    #[test]
    fn test_build_report_cuts_history_at_current() {
        let current = snap(2, 12.0);
        let history = vec![snap(1, 10.0), current.clone(), snap(3, 50.0)];
        let report = DashboardReport::build(&current, &history, Cadence::Raw);
        assert_eq!(report.risk.volatility_score, 2.0);
        assert_eq!(previous_timestamp(&report.alerts), Some(1));
    }
}
