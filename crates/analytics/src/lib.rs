pub mod alerts;
pub mod charts;
pub mod common;
pub mod concentration;
pub mod labels;
pub mod rankings;
pub mod report;
pub mod risk_dashboard;
pub mod sentiment;
pub mod squeeze;
pub mod timeframe;

// Re-export analyzers for convenience
pub use alerts::{detect_alerts, scan_series, AlertEntry, AlertKind, AlertScan, AlertTrigger, Severity};
pub use common::Side;
pub use concentration::{analyze_concentration, concentration_entry, ConcentrationEntry, CONCENTRATION_LIMIT};
pub use risk_dashboard::{
    analyze_risk_dashboard, funding_volatility, market_risk, MarketRisk, RiskDashboardResult,
    RiskLevel, MARKET_RISK_LIMIT, VOLATILITY_WINDOW,
};
pub use sentiment::{analyze_sentiment, classify_sentiment, SentimentLabel, SentimentResult};
pub use squeeze::{analyze_squeeze_potential, squeeze_entry, SqueezeEntry, SQUEEZE_LIMIT};
pub use timeframe::{filter_by_timeframe, Cadence};

// Re-export presentation helpers
pub use charts::{
    all_markets, default_chart_markets, funding_rate_series, open_interest_series, price_series,
    FundingRateChart, FundingRateSeries, OpenInterestPoint, PricePoint, DEFAULT_CHART_MARKETS,
    DEFAULT_OI_MARKET,
};
pub use labels::{concentration_risk_label, format_oi_usd, format_ratio, squeeze_label};
pub use rankings::{top_funding_rates, RankedRate, TOP_RATES_LIMIT};
pub use report::{alerts_against_history, history_through, DashboardReport};
