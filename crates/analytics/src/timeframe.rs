//! Downsampling of a snapshot series to a coarser display cadence.

use perp_risk_core::{HistoricalSeries, Snapshot};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

const HOUR_MS: i64 = 3_600_000;

/// Sampling granularity applied to a historical series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Cadence {
    /// Every stored point (the collector polls every 15 minutes).
    #[default]
    #[serde(rename = "15min", alias = "raw", alias = "15 min")]
    Raw,
    #[serde(rename = "1hour", alias = "1h", alias = "1 hour")]
    Hourly,
    #[serde(rename = "4hour", alias = "4h", alias = "4 hour")]
    FourHourly,
}

impl Cadence {
    /// Bucket width in milliseconds, `None` for [`Cadence::Raw`].
    #[must_use]
    pub fn bucket_ms(self) -> Option<i64> {
        match self {
            Self::Raw => None,
            Self::Hourly => Some(HOUR_MS),
            Self::FourHourly => Some(4 * HOUR_MS),
        }
    }

    /// Bucket a timestamp falls into; for [`Cadence::Raw`] every timestamp
    /// is its own bucket.
    #[must_use]
    pub fn bucket_of(self, timestamp_ms: i64) -> i64 {
        self.bucket_ms()
            .map_or(timestamp_ms, |width| timestamp_ms.div_euclid(width))
    }
}

impl fmt::Display for Cadence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Raw => write!(f, "15min"),
            Self::Hourly => write!(f, "1hour"),
            Self::FourHourly => write!(f, "4hour"),
        }
    }
}

impl FromStr for Cadence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "raw" | "15min" | "15 min" => Ok(Self::Raw),
            "1h" | "1hour" | "1 hour" => Ok(Self::Hourly),
            "4h" | "4hour" | "4 hour" => Ok(Self::FourHourly),
            other => Err(format!("Unknown timeframe: {other}")),
        }
    }
}

/// Keeps the earliest snapshot of every UTC hour (or four-hour block).
///
/// Buckets are `[0-3]`, `[4-7]`, ... `[20-23]` for [`Cadence::FourHourly`].
/// The input does not need to be sorted; the result is ascending by
/// timestamp. [`Cadence::Raw`] returns the input unchanged.
#[must_use]
pub fn filter_by_timeframe(series: &[Snapshot], cadence: Cadence) -> HistoricalSeries {
    let Some(bucket_ms) = cadence.bucket_ms() else {
        return series.to_vec();
    };

    let mut ordered: Vec<&Snapshot> = series.iter().collect();
    ordered.sort_by_key(|s| s.timestamp);

    let mut seen = HashSet::new();
    ordered
        .into_iter()
        .filter(|s| seen.insert(s.timestamp.div_euclid(bucket_ms)))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIN_MS: i64 = 60_000;

    fn series(minutes: &[i64]) -> HistoricalSeries {
        minutes
            .iter()
            .map(|m| Snapshot::new(m * MIN_MS))
            .collect()
    }

    fn timestamps(series: &[Snapshot]) -> Vec<i64> {
        series.iter().map(|s| s.timestamp / MIN_MS).collect()
    }

    #[test]
    fn test_raw_is_identity() {
        let input = series(&[30, 0, 15]);
        assert_eq!(filter_by_timeframe(&input, Cadence::Raw), input);
    }

    #[test]
    fn test_hourly_keeps_first_per_hour() {
        let input = series(&[0, 15, 30, 45, 60, 75, 180]);
        let out = filter_by_timeframe(&input, Cadence::Hourly);
        assert_eq!(timestamps(&out), vec![0, 60, 180]);
    }

    #[test]
    fn test_hourly_scans_in_timestamp_order() {
        let input = series(&[45, 15, 75, 60]);
        let out = filter_by_timeframe(&input, Cadence::Hourly);
        assert_eq!(timestamps(&out), vec![15, 60]);
    }

    #[test]
    fn test_four_hourly_buckets() {
        // 00:00, 03:45, 04:00, 07:59, 08:30, 23:00
        let input = series(&[0, 225, 240, 479, 510, 1380]);
        let out = filter_by_timeframe(&input, Cadence::FourHourly);
        assert_eq!(timestamps(&out), vec![0, 240, 510, 1380]);
    }

    #[test]
    fn test_empty_input() {
        for cadence in [Cadence::Raw, Cadence::Hourly, Cadence::FourHourly] {
            assert!(filter_by_timeframe(&[], cadence).is_empty());
        }
    }

    #[test]
    fn test_cadence_parsing() {
        assert_eq!("raw".parse::<Cadence>().unwrap(), Cadence::Raw);
        assert_eq!("15 min".parse::<Cadence>().unwrap(), Cadence::Raw);
        assert_eq!("1h".parse::<Cadence>().unwrap(), Cadence::Hourly);
        assert_eq!("1 hour".parse::<Cadence>().unwrap(), Cadence::Hourly);
        assert_eq!("4HOUR".parse::<Cadence>().unwrap(), Cadence::FourHourly);
        assert!("daily".parse::<Cadence>().is_err());
    }

    #[test]
    fn test_cadence_serde() {
        assert_eq!(serde_json::to_string(&Cadence::Hourly).unwrap(), "\"1hour\"");
        let parsed: Cadence = serde_json::from_str("\"4h\"").unwrap();
        assert_eq!(parsed, Cadence::FourHourly);
    }

    #[test]
    fn test_bucket_of() {
        assert_eq!(Cadence::Raw.bucket_of(765 * MIN_MS), 765 * MIN_MS);
        assert_eq!(Cadence::Hourly.bucket_of(765 * MIN_MS), Cadence::Hourly.bucket_of(720 * MIN_MS));
        assert_ne!(Cadence::Hourly.bucket_of(765 * MIN_MS), Cadence::Hourly.bucket_of(660 * MIN_MS));
        assert_eq!(Cadence::FourHourly.bucket_of(-MIN_MS), -1);
    }
}
