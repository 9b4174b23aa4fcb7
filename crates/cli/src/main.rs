use clap::{Parser, Subcommand};
use perp_risk_core::{AppConfig, ConfigLoader};

mod commands;

use commands::{CollectArgs, ReportArgs, ServeArgs};

#[derive(Parser)]
#[command(name = "perp-risk")]
#[command(about = "Funding-rate and open-interest risk dashboard for on-chain perps", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, global = true, default_value = "config/Config.toml")]
    config: String,

    /// Config profile; loads Config.<profile>.toml on top of the base file
    #[arg(short, long, global = true, env = "PERP_RISK_PROFILE")]
    profile: Option<String>,

    /// Optional log file path (logs to file instead of stderr)
    #[arg(long, global = true)]
    log_file: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the web API server
    Serve(ServeArgs),
    /// Poll the perps contract and store funding snapshots
    Collect(CollectArgs),
    /// Print the risk dashboard for the latest snapshot
    Report(ReportArgs),
}

fn init_logging(log_file: Option<&str>) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::sync::Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}

fn load_config(cli: &Cli) -> anyhow::Result<AppConfig> {
    let config = ConfigLoader::load_from(&cli.config, cli.profile.as_deref())?;
    tracing::debug!(path = %cli.config, profile = ?cli.profile, "Loaded configuration");
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_file.as_deref())?;

    let config = load_config(&cli)?;

    match cli.command {
        Commands::Serve(args) => commands::run_serve(config, args).await?,
        Commands::Collect(args) => commands::run_collect(config, args).await?,
        Commands::Report(args) => commands::run_report(config, args).await?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_report_with_globals() {
        let cli = Cli::try_parse_from([
            "perp-risk",
            "report",
            "--hours",
            "48",
            "--timeframe",
            "4h",
            "--config",
            "other.toml",
        ])
        .unwrap();

        assert_eq!(cli.config, "other.toml");
        match cli.command {
            Commands::Report(args) => {
                assert_eq!(args.hours, 48);
                assert_eq!(args.timeframe, "4h");
            }
            _ => panic!("expected report"),
        }
    }

    #[test]
    fn test_parse_collect_once() {
        let cli = Cli::try_parse_from(["perp-risk", "collect", "--once"]).unwrap();
        assert!(matches!(cli.command, Commands::Collect(CollectArgs { once: true })));
    }

    #[test]
    fn test_serve_addr_optional() {
        let cli = Cli::try_parse_from(["perp-risk", "serve"]).unwrap();
        match cli.command {
            Commands::Serve(args) => assert!(args.addr.is_none()),
            _ => panic!("expected serve"),
        }
    }
}
