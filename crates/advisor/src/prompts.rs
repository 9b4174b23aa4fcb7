//! Prompt construction for analysis and chat requests.

use perp_risk_core::{AnalysisRequest, ChatMessage, ChatRequest, ChatRole, DataType};

const ANALYST_ROLE: &str = "You are a cryptocurrency derivatives risk analyst specializing in funding rates and open interest analysis.";

/// System prompt for a one-shot analysis of `data_type` data.
#[must_use]
pub fn analysis_system_prompt(data_type: DataType) -> String {
    let focus = match data_type {
        DataType::Concentration => {
            "Analyze OI concentration data and provide insights on market risks, position concentrations, and potential liquidation cascades. Focus on actionable insights for risk management."
        }
        DataType::Funding => {
            "Analyze funding rate data and provide insights on market sentiment, arbitrage opportunities, and delta-neutral strategies."
        }
        DataType::Liquidation => {
            "Analyze liquidation data and provide insights on market stress, potential cascade events, and risk mitigation strategies."
        }
        DataType::General => {
            "Analyze the provided financial data and answer questions about market conditions, risks, and trading opportunities."
        }
    };
    format!("{ANALYST_ROLE} {focus}")
}

/// User prompt carrying the data block and the question.
#[must_use]
pub fn analysis_user_prompt(data: &serde_json::Value, question: &str) -> String {
    let pretty = serde_json::to_string_pretty(data).unwrap_or_else(|_| data.to_string());
    format!("Market Data: {pretty}\n\nUser Question: {question}")
}

#[must_use]
pub fn analysis_messages(request: &AnalysisRequest) -> Vec<ChatMessage> {
    let mut system = analysis_system_prompt(request.data_type);
    if let Some(context) = request.context.as_deref().filter(|c| !c.trim().is_empty()) {
        system.push_str("\nCurrent context: ");
        system.push_str(context);
    }

    vec![
        ChatMessage::system(system),
        ChatMessage::user(analysis_user_prompt(&request.data, &request.question)),
    ]
}

/// True when `data` carries nothing worth attaching to a prompt.
#[must_use]
pub fn is_empty_data(data: &serde_json::Value) -> bool {
    match data {
        serde_json::Value::Null => true,
        serde_json::Value::Object(map) => map.is_empty(),
        serde_json::Value::Array(items) => items.is_empty(),
        serde_json::Value::String(s) => s.is_empty(),
        _ => false,
    }
}

#[must_use]
pub fn chat_system_prompt(context: &str, data: Option<&serde_json::Value>) -> String {
    let mut prompt = format!(
        "You are an AI assistant for the Perp Risk (cryptocurrency derivatives) Dashboard.\n\
         You specialize in:\n\
         - Funding rates analysis and interpretation\n\
         - Cryptocurrency derivatives trading insights\n\
         - Open interest and market concentration analysis\n\
         - Risk management in crypto trading\n\
         - Market sentiment analysis\n\
         - Trading strategies and opportunities\n\n\
         Provide helpful, accurate, and actionable insights. Keep responses concise but informative.\n\
         Current context: {context}"
    );

    if let Some(data) = data.filter(|d| !is_empty_data(d)) {
        let pretty = serde_json::to_string_pretty(data).unwrap_or_else(|_| data.to_string());
        prompt.push_str(&format!(
            "\n\nCurrent Market Data Available:\n{pretty}\n\n\
             Use this data to provide specific, data-driven insights. Reference actual numbers and trends from the current market state."
        ));
    }

    prompt
}

/// System prompt, prior turns (system turns dropped), then the new message.
#[must_use]
pub fn chat_messages(request: &ChatRequest) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(request.messages.len() + 2);
    messages.push(ChatMessage::system(chat_system_prompt(
        &request.context,
        request.data.as_ref(),
    )));
    messages.extend(
        request
            .messages
            .iter()
            .filter(|m| m.role != ChatRole::System)
            .cloned(),
    );
    messages.push(ChatMessage::user(request.message.clone()));
    messages
}
