//! Terminal rendering of the risk dashboard.

use anyhow::{anyhow, Result};
use chrono::Utc;
use clap::Args;
use colored::{ColoredString, Colorize};
use perp_risk_analytics::{
    concentration_risk_label, format_oi_usd, format_ratio, squeeze_label, AlertScan, Cadence,
    DashboardReport, RiskLevel, Severity,
};
use perp_risk_core::{market_display_name, timestamp_to_datetime, AppConfig};
use perp_risk_data::{load_history, Storage};

/// Rows printed per table.
const TABLE_ROWS: usize = 5;

#[derive(Args, Debug, Clone)]
pub struct ReportArgs {
    /// Hours of history used for volatility and alerts
    #[arg(long, default_value_t = 24)]
    pub hours: u32,

    /// History cadence: 15min, 1h or 4h
    #[arg(long, default_value = "1h")]
    pub timeframe: String,

    /// Print the report as JSON instead of tables
    #[arg(long)]
    pub json: bool,
}

/// Builds the dashboard report for the latest stored snapshot and prints it.
///
/// # Errors
/// Returns an error if the store cannot be read, nothing has been collected
/// yet or the timeframe is unknown.
pub async fn run_report(config: AppConfig, args: ReportArgs) -> Result<()> {
    let cadence: Cadence = args.timeframe.parse().map_err(|e: String| anyhow!(e))?;
    let storage = Storage::open(&config.storage).await?;

    let current = storage
        .snapshots
        .latest()
        .await?
        .ok_or_else(|| anyhow!("No funding snapshot stored yet; run `perp-risk collect --once` first"))?;
    let history = load_history(
        storage.snapshots.as_ref(),
        args.hours,
        cadence,
        Utc::now().timestamp_millis(),
    )
    .await?;

    let report = DashboardReport::build(&current, &history, cadence);
    tracing::debug!(history = history.len(), "Built dashboard report");

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report, args.hours, cadence);
    }
    Ok(())
}

fn color_funding(rate: f64) -> ColoredString {
    let text = format!("{rate:>9.2}%");
    if rate > 50.0 {
        text.red().bold()
    } else if rate > 30.0 {
        text.yellow()
    } else if rate > 5.0 {
        text.cyan()
    } else if rate < -10.0 {
        text.green()
    } else {
        text.normal()
    }
}

fn color_risk_level(level: RiskLevel) -> ColoredString {
    let text = level.to_string();
    match level {
        RiskLevel::Critical => text.white().on_red().bold(),
        RiskLevel::High => text.red().bold(),
        RiskLevel::Medium => text.yellow(),
        RiskLevel::Low => text.green(),
    }
}

fn color_severity(severity: Severity) -> ColoredString {
    match severity {
        Severity::High => "HIGH".red().bold(),
        Severity::Medium => "MED".yellow(),
    }
}

fn print_report(report: &DashboardReport, hours: u32, cadence: Cadence) {
    let as_of = timestamp_to_datetime(report.timestamp)
        .map_or_else(|| report.timestamp.to_string(), |t| t.format("%Y-%m-%d %H:%M UTC").to_string());

    println!();
    println!("{}", "=".repeat(80));
    println!("{}", "PERP FUNDING RISK REPORT".bold());
    println!(
        "Snapshot: {}  Markets: {}  History: {}h @ {}",
        as_of, report.market_count, hours, cadence
    );
    println!("{}", "=".repeat(80));

    let risk = &report.risk;
    println!();
    println!(
        "Overall risk: {:.0}/100 {}",
        risk.overall_risk,
        color_risk_level(risk.risk_level)
    );
    println!(
        "Long OI {} ({:.1}%)  Short OI {} ({:.1}%)  Extreme funding: {}  Imbalanced: {}",
        format_oi_usd(risk.total_long_oi),
        risk.long_oi_percent,
        format_oi_usd(risk.total_short_oi),
        risk.short_oi_percent,
        risk.extreme_funding_count,
        risk.imbalanced_markets
    );

    let sentiment = &report.sentiment;
    println!(
        "Sentiment: {} (OI-weighted funding {:.2}%, {} up / {} down / {} flat)",
        sentiment.label.to_string().bold(),
        sentiment.weighted_sentiment,
        sentiment.positive_count,
        sentiment.negative_count,
        sentiment.neutral_count
    );

    println!();
    println!("{}", "Top funding rates".bold().underline());
    println!("{:>4} {:<12} {:>10} {:>12} {:>12}", "#", "Market", "Funding", "Long OI", "Short OI");
    for rate in &report.top_rates {
        println!(
            "{:>4} {:<12} {} {:>12} {:>12}",
            rate.rank,
            rate.display_name,
            color_funding(rate.funding_rate),
            format_oi_usd(rate.long_oi),
            format_oi_usd(rate.short_oi)
        );
    }

    println!();
    println!("{}", "OI concentration".bold().underline());
    println!("{:<12} {:>6} {:>8} {:>8} {:>10}", "Market", "Side", "Share", "Ratio", "Risk");
    for entry in report.concentration.iter().take(TABLE_ROWS) {
        println!(
            "{:<12} {:>6} {:>7.1}% {:>8} {:>10}",
            market_display_name(&entry.market),
            entry.dominant_side.to_string(),
            entry.concentration,
            format_ratio(entry.ratio),
            concentration_risk_label(entry.risk_score)
        );
    }

    println!();
    println!("{}", "Squeeze potential".bold().underline());
    println!("{:<12} {:>6} {:>8} {:>10}", "Market", "Type", "Score", "Level");
    for entry in report.squeeze.iter().take(TABLE_ROWS) {
        println!(
            "{:<12} {:>6} {:>8.0} {:>10}",
            market_display_name(&entry.market),
            entry.squeeze_type.to_string(),
            entry.max_score,
            squeeze_label(entry.max_score)
        );
    }

    println!();
    println!("{}", "Alerts".bold().underline());
    match &report.alerts {
        AlertScan::InsufficientData => println!("Not enough history to compare snapshots"),
        AlertScan::Ready { alerts, .. } if alerts.is_empty() => println!("No funding alerts"),
        AlertScan::Ready { alerts, .. } => {
            for alert in alerts {
                let kinds: Vec<String> = alert.triggers.iter().map(|t| t.kind.to_string()).collect();
                println!(
                    "{:<5} {:<12} {:>8.2}% -> {:>8.2}%  {}",
                    color_severity(alert.severity),
                    market_display_name(&alert.market),
                    alert.previous_rate,
                    alert.current_rate,
                    kinds.join(", ")
                );
            }
        }
    }
    println!();
}
