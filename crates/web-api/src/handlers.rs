use crate::error::ApiError;
use crate::state::{AppState, WindowQuery};
use axum::{
    extract::{Query, State},
    Json,
};
use perp_risk_analytics::{
    alerts_against_history, all_markets, analyze_concentration, analyze_risk_dashboard,
    analyze_sentiment, analyze_squeeze_potential, default_chart_markets, funding_rate_series,
    history_through, open_interest_series, price_series, top_funding_rates, AlertScan, ConcentrationEntry,
    DashboardReport, FundingRateChart, OpenInterestPoint, PricePoint, RankedRate,
    RiskDashboardResult, SentimentResult, SqueezeEntry, DEFAULT_CHART_MARKETS, DEFAULT_OI_MARKET,
    TOP_RATES_LIMIT,
};
use perp_risk_core::{HistoricalSeries, MarketInfo, Snapshot};
use serde::Deserialize;

/// Most rows `/api/analytics/top-rates` returns.
const MAX_TOP_RATES: usize = 100;

/// GET /api/funding-rates/current
///
/// # Errors
/// Returns 404 if no snapshot has been collected.
pub async fn current_funding_rates(
    State(state): State<AppState>,
) -> Result<Json<Snapshot>, ApiError> {
    Ok(Json(state.latest().await?))
}

/// GET /api/funding-rates/history?hours=24&timeframe=1h
///
/// # Errors
/// Returns 400 for an unknown timeframe.
pub async fn funding_rate_history(
    State(state): State<AppState>,
    Query(window): Query<WindowQuery>,
) -> Result<Json<HistoricalSeries>, ApiError> {
    Ok(Json(state.history(&window).await?))
}

/// GET /api/markets
///
/// Falls back to the keys of the latest snapshot when the registry is empty.
///
/// # Errors
/// Returns 500 if the registry or store cannot be read.
pub async fn list_markets(State(state): State<AppState>) -> Result<Json<Vec<MarketInfo>>, ApiError> {
    let markets = state.markets.list().await?;
    if !markets.is_empty() {
        return Ok(Json(markets));
    }

    let fallback = match state.store.latest().await? {
        Some(snapshot) => all_markets(std::slice::from_ref(&snapshot))
            .into_iter()
            .map(|denom| {
                let display = perp_risk_core::market_display_name(&denom);
                MarketInfo::new(denom, display)
            })
            .collect(),
        None => Vec::new(),
    };
    Ok(Json(fallback))
}

/// GET /api/analytics/sentiment
pub async fn sentiment(State(state): State<AppState>) -> Result<Json<SentimentResult>, ApiError> {
    Ok(Json(analyze_sentiment(&state.latest().await?)))
}

/// GET /api/analytics/concentration
pub async fn concentration(
    State(state): State<AppState>,
) -> Result<Json<Vec<ConcentrationEntry>>, ApiError> {
    Ok(Json(analyze_concentration(&state.latest().await?)))
}

/// GET /api/analytics/squeeze
pub async fn squeeze(State(state): State<AppState>) -> Result<Json<Vec<SqueezeEntry>>, ApiError> {
    Ok(Json(analyze_squeeze_potential(&state.latest().await?)))
}

/// GET /api/analytics/risk?hours=&timeframe=
pub async fn risk(
    State(state): State<AppState>,
    Query(window): Query<WindowQuery>,
) -> Result<Json<RiskDashboardResult>, ApiError> {
    let current = state.latest().await?;
    let history = state.history(&window).await?;
    Ok(Json(analyze_risk_dashboard(
        &current,
        history_through(&history, current.timestamp),
    )))
}

/// GET /api/analytics/alerts?hours=&timeframe=
pub async fn alerts(
    State(state): State<AppState>,
    Query(window): Query<WindowQuery>,
) -> Result<Json<AlertScan>, ApiError> {
    let current = state.latest().await?;
    let history = state.history(&window).await?;
    Ok(Json(alerts_against_history(&current, &history, window.cadence()?)))
}

#[derive(Debug, Deserialize)]
pub struct TopRatesQuery {
    pub limit: Option<usize>,
}

/// GET /api/analytics/top-rates?limit=10
pub async fn top_rates(
    State(state): State<AppState>,
    Query(query): Query<TopRatesQuery>,
) -> Result<Json<Vec<RankedRate>>, ApiError> {
    let limit = query.limit.unwrap_or(TOP_RATES_LIMIT).min(MAX_TOP_RATES);
    Ok(Json(top_funding_rates(&state.latest().await?, limit)))
}

/// GET /api/analytics/dashboard?hours=&timeframe=
pub async fn dashboard(
    State(state): State<AppState>,
    Query(window): Query<WindowQuery>,
) -> Result<Json<DashboardReport>, ApiError> {
    let current = state.latest().await?;
    let history = state.history(&window).await?;
    Ok(Json(DashboardReport::build(&current, &history, window.cadence()?)))
}

#[derive(Debug, Default, Deserialize)]
pub struct FundingChartQuery {
    /// Comma-separated market keys.
    pub markets: Option<String>,
}

/// GET /api/charts/funding-rates?markets=perps/ubtc,perps/ueth&hours=&timeframe=
pub async fn funding_rate_chart(
    State(state): State<AppState>,
    Query(window): Query<WindowQuery>,
    Query(query): Query<FundingChartQuery>,
) -> Result<Json<FundingRateChart>, ApiError> {
    let history = state.history(&window).await?;

    let requested: Vec<String> = query
        .markets
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .collect();

    let markets = if requested.is_empty() {
        default_chart_markets(&history, &DEFAULT_CHART_MARKETS)
    } else {
        requested
    };

    Ok(Json(funding_rate_series(&history, &markets)))
}

#[derive(Debug, Default, Deserialize)]
pub struct MarketChartQuery {
    pub market: Option<String>,
}

impl MarketChartQuery {
    fn market(&self) -> &str {
        self.market
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(DEFAULT_OI_MARKET)
    }
}

/// GET /api/charts/open-interest?market=perps/ulink
pub async fn open_interest_chart(
    State(state): State<AppState>,
    Query(window): Query<WindowQuery>,
    Query(query): Query<MarketChartQuery>,
) -> Result<Json<Vec<OpenInterestPoint>>, ApiError> {
    let history = state.history(&window).await?;
    Ok(Json(open_interest_series(&history, query.market())))
}

/// GET /api/charts/price?market=perps/ulink
pub async fn price_chart(
    State(state): State<AppState>,
    Query(window): Query<WindowQuery>,
    Query(query): Query<MarketChartQuery>,
) -> Result<Json<Vec<PricePoint>>, ApiError> {
    let history = state.history(&window).await?;
    Ok(Json(price_series(&history, query.market())))
}
