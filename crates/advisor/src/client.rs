//! Mistral chat-completions client with streamed responses.

use crate::error::AdvisorError;
use crate::prompts::{analysis_messages, chat_messages};
use crate::sse::{SseDecoder, SseEvent};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use futures_util::stream::{self, BoxStream, StreamExt};
use perp_risk_core::{
    AdvisorConfig, AnalysisRequest, ChatMessage, ChatRequest, MarketAnalyst, TextStream,
};
use reqwest::Client;
use serde::Serialize;
use std::collections::VecDeque;
use std::time::Duration;

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
}

pub struct MistralClient {
    http: Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl MistralClient {
    pub fn new(
        api_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            http,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    /// Builds a client from config, resolving the API key from the environment
    /// when the config has none.
    ///
    /// # Errors
    /// Returns [`AdvisorError::NotConfigured`] when no key is available.
    pub fn from_config(config: &AdvisorConfig) -> Result<Self, AdvisorError> {
        let api_key = config
            .resolve_api_key()
            .ok_or(AdvisorError::NotConfigured)?;
        Ok(Self::new(
            config.api_url.clone(),
            api_key,
            config.chat_model.clone(),
        ))
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Starts a streamed completion for `messages`.
    ///
    /// # Errors
    /// Returns an error if the request fails or the API answers with a
    /// non-success status. Errors after streaming has begun are yielded by
    /// the stream.
    pub async fn stream_completion(
        &self,
        messages: &[ChatMessage],
    ) -> Result<TextStream, AdvisorError> {
        let url = format!("{}/chat/completions", self.api_url);
        let body = CompletionRequest {
            model: &self.model,
            messages,
            stream: true,
        };

        tracing::debug!(model = %self.model, messages = messages.len(), "POST {}", url);

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("Accept", "text/event-stream")
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "Chat completion rejected");
            return Err(AdvisorError::api(status.as_u16(), text));
        }

        let bytes = response
            .bytes_stream()
            .map(|chunk| chunk.map(|b| b.to_vec()))
            .boxed();

        Ok(decode_stream(bytes))
    }
}

struct StreamState {
    bytes: BoxStream<'static, reqwest::Result<Vec<u8>>>,
    decoder: SseDecoder,
    pending: VecDeque<String>,
    done: bool,
}

impl StreamState {
    fn absorb(&mut self, events: impl IntoIterator<Item = SseEvent>) {
        for event in events {
            match event {
                SseEvent::Delta(text) => self.pending.push_back(text),
                SseEvent::Done => {
                    self.done = true;
                    break;
                }
            }
        }
    }
}

fn decode_stream(bytes: BoxStream<'static, reqwest::Result<Vec<u8>>>) -> TextStream {
    let state = StreamState {
        bytes,
        decoder: SseDecoder::new(),
        pending: VecDeque::new(),
        done: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(text) = state.pending.pop_front() {
                return Some((Ok(text), state));
            }
            if state.done {
                return None;
            }

            match state.bytes.next().await {
                Some(Ok(chunk)) => {
                    let events = state.decoder.push(&chunk);
                    state.absorb(events);
                }
                Some(Err(e)) => {
                    state.done = true;
                    let err = anyhow!(AdvisorError::Network(e.to_string()));
                    return Some((Err(err), state));
                }
                None => {
                    let last = state.decoder.finish();
                    state.absorb(last);
                    state.done = true;
                }
            }
        }
    })
    .boxed()
}

#[async_trait]
impl MarketAnalyst for MistralClient {
    async fn analyze(&self, request: AnalysisRequest) -> Result<TextStream> {
        tracing::info!(data_type = ?request.data_type, "Starting data analysis");
        Ok(self.stream_completion(&analysis_messages(&request)).await?)
    }

    async fn chat(&self, request: ChatRequest) -> Result<TextStream> {
        tracing::info!(history = request.messages.len(), "Starting chat completion");
        Ok(self.stream_completion(&chat_messages(&request)).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use perp_risk_core::DataType;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sse_body(parts: &[&str]) -> String {
        let mut body = String::new();
        for part in parts {
            body.push_str(&format!(
                "data: {}\n\n",
                serde_json::json!({ "choices": [{ "delta": { "content": part } }] })
            ));
        }
        body.push_str("data: [DONE]\n\n");
        body
    }

    async fn collect(stream: TextStream) -> String {
        stream
            .map(|chunk| chunk.unwrap())
            .collect::<Vec<_>>()
            .await
            .concat()
    }

    #[tokio::test]
    async fn test_chat_streams_text() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(serde_json::json!({
                "model": "mistral-small-latest",
                "stream": true
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(sse_body(&["Longs ", "are ", "crowded."]), "text/event-stream"),
            )
            .mount(&server)
            .await;

        let client = MistralClient::new(server.uri(), "test-key", "mistral-small-latest");
        let request = ChatRequest {
            message: "Where is the risk?".to_string(),
            messages: Vec::new(),
            context: "Perp Risk Dashboard".to_string(),
            data: None,
        };

        let text = collect(client.chat(request).await.unwrap()).await;
        assert_eq!(text, "Longs are crowded.");
    }

    #[tokio::test]
    async fn test_analyze_streams_text() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(serde_json::json!({ "stream": true })))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(sse_body(&["ok"]), "text/event-stream"),
            )
            .mount(&server)
            .await;

        let client = MistralClient::new(server.uri(), "k", "mistral-small-latest");
        let request = AnalysisRequest {
            data: serde_json::json!([{ "market": "perps/ubtc", "riskScore": 80 }]),
            question: "Which market is most concentrated?".to_string(),
            context: None,
            data_type: DataType::Concentration,
        };

        let text = collect(client.analyze(request).await.unwrap()).await;
        assert_eq!(text, "ok");
    }

    #[tokio::test]
    async fn test_api_error_before_stream() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
            .mount(&server)
            .await;

        let client = MistralClient::new(server.uri(), "bad", "mistral-small-latest");
        let err = client
            .stream_completion(&[ChatMessage::user("hi")])
            .await
            .err()
            .unwrap();
        assert!(matches!(err, AdvisorError::Api { status_code: 401, .. }));
    }

    #[tokio::test]
    async fn test_stops_at_done() {
        let server = MockServer::start().await;
        let mut body = sse_body(&["first"]);
        body.push_str(&sse_body(&["after done"]));

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
            .mount(&server)
            .await;

        let client = MistralClient::new(server.uri(), "k", "m");
        let stream = client
            .stream_completion(&[ChatMessage::user("hi")])
            .await
            .unwrap();
        assert_eq!(collect(stream).await, "first");
    }

    #[test]
    fn test_from_config_requires_key() {
        let config = AdvisorConfig {
            api_key: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            MistralClient::from_config(&config),
            Err(AdvisorError::NotConfigured)
        ));

        let config = AdvisorConfig {
            api_key: Some("secret".to_string()),
            ..Default::default()
        };
        let client = MistralClient::from_config(&config).unwrap();
        assert_eq!(client.model(), "mistral-small-latest");
    }
}
