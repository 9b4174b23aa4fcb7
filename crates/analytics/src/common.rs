//! Helpers shared by the analyzers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Side of the book holding the larger open interest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Long,
    Short,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Long => write!(f, "long"),
            Self::Short => write!(f, "short"),
        }
    }
}

/// Long when `long_oi > short_oi`, otherwise short (ties count as short).
#[must_use]
pub fn dominant_side(long_oi: f64, short_oi: f64) -> Side {
    if long_oi > short_oi {
        Side::Long
    } else {
        Side::Short
    }
}

/// Dominant-over-weaker OI ratio.
///
/// A weaker side of exactly zero is replaced by `zero_floor` so the ratio
/// stays finite. Concentration uses `0.001`, the dashboard and squeeze
/// views use `1.0`.
#[must_use]
pub fn dominance_ratio(long_oi: f64, short_oi: f64, zero_floor: f64) -> f64 {
    let or_floor = |v: f64| if v == 0.0 { zero_floor } else { v };

    if long_oi > short_oi {
        long_oi / or_floor(short_oi)
    } else {
        short_oi / or_floor(long_oi)
    }
}

/// `part / whole * 100`, or `0.0` when `whole` is zero.
#[must_use]
pub fn percent_of(part: f64, whole: f64) -> f64 {
    if whole == 0.0 {
        0.0
    } else {
        part / whole * 100.0
    }
}
