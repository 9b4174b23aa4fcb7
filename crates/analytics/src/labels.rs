//! Display labels and number formatting used by the dashboard and CLI.

/// Ratios above this render as infinite.
const RATIO_DISPLAY_CAP: f64 = 1000.0;

#[must_use]
pub fn squeeze_label(score: f64) -> &'static str {
    if score > 80.0 {
        "Extreme"
    } else if score > 60.0 {
        "High"
    } else if score > 40.0 {
        "Moderate"
    } else if score > 20.0 {
        "Low"
    } else {
        "Minimal"
    }
}

/// Label for a concentration `risk_score`.
#[must_use]
pub fn concentration_risk_label(score: f64) -> &'static str {
    if score >= 80.0 {
        "Critical"
    } else if score >= 60.0 {
        "High"
    } else if score >= 40.0 {
        "Medium"
    } else {
        "Low"
    }
}

/// `"∞"` above 1000, otherwise two decimals.
#[must_use]
pub fn format_ratio(ratio: f64) -> String {
    if ratio > RATIO_DISPLAY_CAP {
        "∞".to_string()
    } else {
        format!("{ratio:.2}")
    }
}

/// Compact dollar amount: `$1.50M`, `$12.30K`, `$999.00`.
#[must_use]
pub fn format_oi_usd(value: f64) -> String {
    if value >= 1_000_000.0 {
        format!("${:.2}M", value / 1_000_000.0)
    } else if value >= 1_000.0 {
        format!("${:.2}K", value / 1_000.0)
    } else {
        format!("${value:.2}")
    }
}
