//! Funding-rate change alerts between two consecutive snapshots.

use perp_risk_core::Snapshot;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    LargeChange,
    SignFlip,
    RapidIncrease,
    RapidDecrease,
    ExtremeLevel,
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::LargeChange => "Large Change",
            Self::SignFlip => "Sign Flip",
            Self::RapidIncrease => "Rapid Increase",
            Self::RapidDecrease => "Rapid Decrease",
            Self::ExtremeLevel => "Extreme Level",
        };
        write!(f, "{label}")
    }
}

/// Ordered so that `High` sorts first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::High => write!(f, "high"),
            Self::Medium => write!(f, "medium"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertTrigger {
    #[serde(rename = "type")]
    pub kind: AlertKind,
    pub severity: Severity,
}

impl AlertTrigger {
    fn new(kind: AlertKind, severity: Severity) -> Self {
        Self { kind, severity }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertEntry {
    pub market: String,
    pub previous_rate: f64,
    pub current_rate: f64,
    pub change: f64,
    /// Change relative to `|previous_rate|`, `0` when the previous rate was zero.
    pub change_percent: f64,
    #[serde(rename = "alerts")]
    pub triggers: Vec<AlertTrigger>,
    pub severity: Severity,
}

impl AlertEntry {
    #[must_use]
    pub fn has(&self, kind: AlertKind) -> bool {
        self.triggers.iter().any(|t| t.kind == kind)
    }
}

/// Outcome of scanning a series for alerts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AlertScan {
    /// Fewer than two snapshots were available.
    InsufficientData,
    #[serde(rename_all = "camelCase")]
    Ready {
        previous_timestamp: i64,
        current_timestamp: i64,
        alerts: Vec<AlertEntry>,
    },
}

impl AlertScan {
    /// Alerts found, empty when there was not enough data.
    #[must_use]
    pub fn alerts(&self) -> &[AlertEntry] {
        match self {
            Self::InsufficientData => &[],
            Self::Ready { alerts, .. } => alerts,
        }
    }
}

fn evaluate(previous: f64, current: f64) -> (f64, f64, Vec<AlertTrigger>) {
    let change = current - previous;
    let change_percent = if previous != 0.0 {
        change / previous.abs() * 100.0
    } else {
        0.0
    };

    let mut triggers = Vec::new();

    if change.abs() > 20.0 {
        let severity = if change.abs() > 50.0 {
            Severity::High
        } else {
            Severity::Medium
        };
        triggers.push(AlertTrigger::new(AlertKind::LargeChange, severity));
    }

    if previous * current < 0.0 && previous != 0.0 {
        triggers.push(AlertTrigger::new(AlertKind::SignFlip, Severity::High));
    }

    if change_percent > 50.0 && change > 5.0 {
        let severity = if change_percent > 100.0 {
            Severity::High
        } else {
            Severity::Medium
        };
        triggers.push(AlertTrigger::new(AlertKind::RapidIncrease, severity));
    }

    if change_percent < -50.0 && change < -5.0 {
        let severity = if change_percent < -75.0 {
            Severity::High
        } else {
            Severity::Medium
        };
        triggers.push(AlertTrigger::new(AlertKind::RapidDecrease, severity));
    }

    if current.abs() > 200.0 && previous.abs() <= 200.0 {
        triggers.push(AlertTrigger::new(AlertKind::ExtremeLevel, Severity::High));
    }

    (change, change_percent, triggers)
}

/// Compares every market present in both snapshots.
///
/// Result is ordered High before Medium, then by `|change|` descending.
#[must_use]
pub fn detect_alerts(previous: &Snapshot, current: &Snapshot) -> Vec<AlertEntry> {
    let mut alerts: Vec<AlertEntry> = current
        .iter()
        .filter_map(|(market, curr)| {
            let prev = previous.get(market)?;
            let (change, change_percent, triggers) = evaluate(prev.funding_rate, curr.funding_rate);

            if triggers.is_empty() {
                return None;
            }

            let severity = if triggers.iter().any(|t| t.severity == Severity::High) {
                Severity::High
            } else {
                Severity::Medium
            };

            Some(AlertEntry {
                market: market.clone(),
                previous_rate: prev.funding_rate,
                current_rate: curr.funding_rate,
                change,
                change_percent,
                triggers,
                severity,
            })
        })
        .collect();

    alerts.sort_by(|a, b| match a.severity.cmp(&b.severity) {
        Ordering::Equal => b.change.abs().total_cmp(&a.change.abs()),
        other => other,
    });
    alerts
}

/// Runs [`detect_alerts`] on the last two snapshots of `series`.
#[must_use]
pub fn scan_series(series: &[Snapshot]) -> AlertScan {
    match series {
        [.., previous, current] => AlertScan::Ready {
            previous_timestamp: previous.timestamp,
            current_timestamp: current.timestamp,
            alerts: detect_alerts(previous, current),
        },
        _ => AlertScan::InsufficientData,
    }
}
