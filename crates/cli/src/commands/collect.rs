use anyhow::Result;
use clap::Args;
use perp_risk_collector::{ChainClient, CollectorScheduler, FundingCollector, PollOutcome};
use perp_risk_core::AppConfig;
use perp_risk_data::Storage;
use std::sync::Arc;

#[derive(Args, Debug, Clone)]
pub struct CollectArgs {
    /// Poll once and exit instead of running on the cron schedule
    #[arg(long)]
    pub once: bool,
}

/// Runs the funding collector against the configured store.
///
/// # Errors
/// Returns an error if the store cannot be opened, the cron schedule is
/// invalid or a single poll (`--once`) fails.
pub async fn run_collect(config: AppConfig, args: CollectArgs) -> Result<()> {
    let storage = Storage::open(&config.storage).await?;
    let client = ChainClient::from_config(&config.chain);

    tracing::info!(
        lcd = client.base_url(),
        contract = %config.chain.perps_contract,
        "Collecting funding rates"
    );

    let collector = FundingCollector::new(
        client,
        storage.snapshots,
        config.chain.clone(),
        config.collector.clone(),
    )
    .with_registry(storage.markets);

    let scheduler = CollectorScheduler::new(Arc::new(collector), config.collector.cron_schedule);

    if !args.once {
        return scheduler.start().await;
    }

    match scheduler.run_once().await? {
        PollOutcome::Failed { error } => anyhow::bail!("Funding poll failed: {error}"),
        PollOutcome::Cached { age_ms } => {
            println!("Latest snapshot is {}s old; skipped poll", age_ms / 1000);
        }
        PollOutcome::Stored { timestamp, markets } => {
            println!("Stored snapshot {timestamp} with {markets} markets");
        }
    }
    Ok(())
}
