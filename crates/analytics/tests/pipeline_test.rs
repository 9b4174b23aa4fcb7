use perp_risk_analytics::{
    analyze_concentration, analyze_risk_dashboard, analyze_sentiment, analyze_squeeze_potential,
    detect_alerts, filter_by_timeframe, scan_series, AlertKind, AlertScan, Cadence,
    DashboardReport, SentimentLabel, Severity, Side,
};
use perp_risk_core::{MarketRate, Snapshot};

const QUARTER_HOUR_MS: i64 = 15 * 60 * 1000;

/// A day of 15-minute polls over a handful of markets with drifting rates.
fn day_of_polls() -> Vec<Snapshot> {
    let markets = [
        ("perps/ubtc", 12.0, 900_000_000u64, 300_000_000u64),
        ("perps/ueth", -8.0, 200_000_000, 600_000_000),
        ("perps/uinj", 140.0, 950_000_000, 10_000_000),
        ("perps/uakt", 35.0, 5_000_000, 95_000_000),
        ("perps/ulink", 0.0, 0, 0),
    ];

    (0..96i64)
        .map(|i| {
            let timestamp = 1_700_006_400_000 + i * QUARTER_HOUR_MS;
            markets
                .iter()
                .fold(Snapshot::new(timestamp), |s, (market, rate, long, short)| {
                    let drift = (i % 7) as f64 - 3.0;
                    s.with_market(
                        *market,
                        MarketRate::new(rate + drift, long.to_string(), short.to_string())
                            .with_timestamp(timestamp),
                    )
                })
        })
        .collect()
}

#[test]
fn test_concentration_scenario() {
    let snapshot = Snapshot::new(0)
        .with_market("perps/ubtc", MarketRate::new(120.0, "80000000", "20000000"));

    let entries = analyze_concentration(&snapshot);
    assert_eq!(entries.len(), 1);
    let entry = &entries[0];
    assert_eq!(entry.concentration, 80.0);
    assert_eq!(entry.dominant_side, Side::Long);
    assert_eq!(entry.ratio, 4.0);
    assert!(entry.funding_aligned);
    assert_eq!(entry.risk_score, 60.0);
}

#[test]
fn test_sign_flip_scenario() {
    let previous = Snapshot::new(0).with_market("perps/ueth", MarketRate::new(10.0, "1", "1"));
    let current = Snapshot::new(1).with_market("perps/ueth", MarketRate::new(-15.0, "1", "1"));

    let alerts = detect_alerts(&previous, &current);
    assert_eq!(alerts.len(), 1);
    assert!(alerts[0].has(AlertKind::SignFlip));
    assert!(alerts[0].has(AlertKind::LargeChange));
    assert_eq!(alerts[0].severity, Severity::High);
}

#[test]
fn test_neutral_and_empty_sentiment() {
    let flat = Snapshot::new(0)
        .with_market("perps/ubtc", MarketRate::new(0.0, "5000000", "5000000"))
        .with_market("perps/ueth", MarketRate::new(0.0, "1000000", "0"));
    let result = analyze_sentiment(&flat);
    assert_eq!(result.label, SentimentLabel::Neutral);
    assert_eq!(result.weighted_sentiment, 0.0);

    let empty = analyze_sentiment(&Snapshot::new(0));
    assert_eq!(empty.positive_percent, 0.0);
    assert_eq!(empty.negative_percent, 0.0);
    assert_eq!(empty.neutral_percent, 0.0);
}

#[test]
fn test_volatility_over_three_entries() {
    let history: Vec<Snapshot> = [0.0, 6.0, 2.0]
        .iter()
        .enumerate()
        .map(|(i, rate)| {
            Snapshot::new(i as i64).with_market("perps/ubtc", MarketRate::new(*rate, "1", "1"))
        })
        .collect();

    let result = analyze_risk_dashboard(&history[2], &history);
    // (6 + 4) / 2
    assert_eq!(result.volatility_score, 5.0);
}

#[test]
fn test_filter_bucket_invariant() {
    let series = day_of_polls();

    let hourly = filter_by_timeframe(&series, Cadence::Hourly);
    assert_eq!(hourly.len(), 24);

    let four_hourly = filter_by_timeframe(&series, Cadence::FourHourly);
    assert_eq!(four_hourly.len(), 6);

    for kept in &hourly {
        let bucket = kept.timestamp / 3_600_000;
        let earliest = series
            .iter()
            .filter(|s| s.timestamp / 3_600_000 == bucket)
            .map(|s| s.timestamp)
            .min();
        assert_eq!(Some(kept.timestamp), earliest);
    }

    assert_eq!(filter_by_timeframe(&series, Cadence::Raw).len(), series.len());
}

#[test]
fn test_analyzer_properties_over_series() {
    let series = day_of_polls();

    for (i, snapshot) in series.iter().enumerate() {
        let sentiment = analyze_sentiment(snapshot);
        assert_eq!(
            sentiment.positive_count + sentiment.negative_count + sentiment.neutral_count,
            sentiment.total_markets
        );

        for entry in analyze_concentration(snapshot) {
            assert!((0.0..=100.0).contains(&entry.risk_score));
            assert!((50.0..=100.0).contains(&entry.concentration));
        }

        for entry in analyze_squeeze_potential(snapshot) {
            assert!(entry.max_score > 0.0);
            let expected = match entry.squeeze_type {
                Side::Short => entry.short_squeeze_score,
                Side::Long => entry.long_squeeze_score,
            };
            assert_eq!(expected, entry.max_score);
        }

        let risk = analyze_risk_dashboard(snapshot, &series[..=i]);
        assert!((0.0..=100.0).contains(&risk.overall_risk));
    }
}

#[test]
fn test_analyzers_are_deterministic() {
    let series = day_of_polls();
    let last = series.last().unwrap();

    assert_eq!(analyze_concentration(last), analyze_concentration(last));
    assert_eq!(analyze_squeeze_potential(last), analyze_squeeze_potential(last));
    assert_eq!(scan_series(&series), scan_series(&series));
    assert_eq!(
        DashboardReport::build(last, &series, Cadence::Raw),
        DashboardReport::build(last, &series, Cadence::Raw)
    );
}

#[test]
fn test_zero_oi_market_excluded_everywhere() {
    let series = day_of_polls();
    let report = DashboardReport::build(series.last().unwrap(), &series, Cadence::Raw);

    assert!(report.concentration.iter().all(|e| e.market != "perps/ulink"));
    assert!(report.squeeze.iter().all(|e| e.market != "perps/ulink"));
    assert!(report.top_rates.iter().all(|r| r.market != "perps/ulink"));
    assert_eq!(report.sentiment.total_markets, 5);
    assert!(matches!(report.alerts, AlertScan::Ready { .. }));
}
