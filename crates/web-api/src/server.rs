use crate::state::AppState;
use crate::{advisor, data_health, handlers};
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub struct ApiServer {
    state: AppState,
}

impl ApiServer {
    #[must_use]
    pub const fn new(state: AppState) -> Self {
        Self { state }
    }

    pub fn router(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        Router::new()
            .route("/api/funding-rates/current", get(handlers::current_funding_rates))
            .route("/api/funding-rates/history", get(handlers::funding_rate_history))
            .route("/api/markets", get(handlers::list_markets))
            .route("/api/analytics/sentiment", get(handlers::sentiment))
            .route("/api/analytics/concentration", get(handlers::concentration))
            .route("/api/analytics/squeeze", get(handlers::squeeze))
            .route("/api/analytics/risk", get(handlers::risk))
            .route("/api/analytics/alerts", get(handlers::alerts))
            .route("/api/analytics/top-rates", get(handlers::top_rates))
            .route("/api/analytics/dashboard", get(handlers::dashboard))
            .route("/api/charts/funding-rates", get(handlers::funding_rate_chart))
            .route("/api/charts/open-interest", get(handlers::open_interest_chart))
            .route("/api/charts/price", get(handlers::price_chart))
            .route("/api/analyze-data", post(advisor::analyze_data))
            .route("/api/chat", post(advisor::chat))
            .route("/api/data/health", get(data_health::data_health))
            .layer(cors)
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Starts the web server listening on the specified address.
    ///
    /// # Errors
    /// Returns an error if the server fails to bind to the address or serve requests.
    pub async fn serve(self, addr: &str) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("Web API listening on {}", addr);

        axum::serve(listener, self.router()).await?;

        Ok(())
    }
}
