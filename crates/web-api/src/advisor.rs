//! Streaming LLM endpoints.

use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    body::Body,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use futures_util::StreamExt;
use perp_risk_core::{AnalysisRequest, ChatRequest, MarketAnalyst, TextStream};
use std::sync::Arc;

fn analyst(state: &AppState) -> Result<Arc<dyn MarketAnalyst>, ApiError> {
    state.analyst.clone().ok_or_else(|| {
        ApiError::Unavailable("set advisor.api_key or MISTRAL_API_KEY".to_string())
    })
}

/// Plain-text body fed by `stream`. A failure mid-stream ends the body.
fn text_response(stream: TextStream) -> Response {
    let body = stream.map(|chunk| {
        chunk.map_err(|e| {
            tracing::error!("Advisor stream failed: {:#}", e);
            e
        })
    });

    (
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        Body::from_stream(body),
    )
        .into_response()
}

/// POST /api/analyze-data
///
/// # Errors
/// Returns 503 without an advisor and 500 if the request to it fails.
pub async fn analyze_data(
    State(state): State<AppState>,
    Json(request): Json<AnalysisRequest>,
) -> Result<Response, ApiError> {
    let analyst = analyst(&state)?;
    let stream = analyst
        .analyze(request)
        .await
        .map_err(|e| ApiError::Internal(format!("Error analyzing data: {e:#}")))?;
    Ok(text_response(stream))
}

/// POST /api/chat
///
/// # Errors
/// Returns 503 without an advisor and 500 if the request to it fails.
pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Response, ApiError> {
    let analyst = analyst(&state)?;
    let stream = analyst
        .chat(request)
        .await
        .map_err(|e| ApiError::Internal(format!("Error processing chat message: {e:#}")))?;
    Ok(text_response(stream))
}
