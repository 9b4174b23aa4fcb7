use anyhow::Result;
use clap::Args;
use perp_risk_advisor::{AdvisorError, MistralClient};
use perp_risk_core::AppConfig;
use perp_risk_data::Storage;
use perp_risk_web_api::{ApiServer, AppState};
use std::sync::Arc;

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Server address, overrides server.host/server.port
    #[arg(short, long)]
    pub addr: Option<String>,
}

/// Serves the HTTP API from the configured store.
///
/// # Errors
/// Returns an error if the store cannot be opened or the address cannot be bound.
pub async fn run_serve(config: AppConfig, args: ServeArgs) -> Result<()> {
    let addr = args.addr.unwrap_or_else(|| config.server.addr());
    tracing::info!("Starting web API server on {}", addr);

    let storage = Storage::open(&config.storage).await?;
    let mut state = AppState::new(storage.snapshots, storage.markets);

    match MistralClient::from_config(&config.advisor) {
        Ok(client) => {
            tracing::info!(model = client.model(), "LLM advisor enabled");
            state = state.with_analyst(Arc::new(client));
        }
        Err(AdvisorError::NotConfigured) => {
            tracing::warn!("No MISTRAL_API_KEY configured; /api/chat and /api/analyze-data are disabled");
        }
        Err(e) => return Err(e.into()),
    }

    ApiServer::new(state).serve(&addr).await
}
