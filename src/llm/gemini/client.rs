//! Gemini client implementation

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use futures::StreamExt;
use reqwest::header::RETRY_AFTER;
use reqwest::Client;
use std::time::Duration;
use uuid::Uuid;

use crate::llm::core::{
    error::LlmError,
    provider::{EventStream, LlmProvider},
    types::{ContentBlock, GenerateRequest},
};

use super::mapper::{create_message_start, from_gemini_response, to_gemini_request};
use super::sse::parse_sse_stream;

/// Gemini model identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeminiModel {
    /// Gemini 2.0 Flash Experimental
    Gemini20FlashExp,
    /// Gemini 2.5 Pro
    Gemini25Pro,
    /// Gemini 1.5 Flash
    Gemini15Flash,
}

impl GeminiModel {
    /// Get the model identifier string
    pub fn as_str(&self) -> &'static str {
        match self {
            GeminiModel::Gemini20FlashExp => "gemini-2.0-flash-exp",
            GeminiModel::Gemini25Pro => "gemini-2.5-pro",
            GeminiModel::Gemini15Flash => "gemini-1.5-flash",
        }
    }
}

/// Client for the generative-language API, authenticated with an API key
pub struct GeminiClient {
    http_client: Client,
    api_key: String,
    /// API root, e.g. `https://generativelanguage.googleapis.com/v1beta`
    base_url: String,
    model: GeminiModel,
}

impl GeminiClient {
    /// Create a client sharing an existing connection pool
    pub fn new(
        http_client: Client,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: GeminiModel,
    ) -> Self {
        Self {
            http_client,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model,
        }
    }

    /// HTTP client with the timeouts used for upstream calls
    pub fn default_http_client() -> Result<Client, LlmError> {
        Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| LlmError::HttpError {
                status: 0,
                body: format!("Failed to create HTTP client: {}", e),
            })
    }

    /// Build the endpoint URL for streaming
    fn build_endpoint_url(&self) -> String {
        format!(
            "{}/models/{}:streamGenerateContent?alt=sse",
            self.base_url,
            self.model.as_str()
        )
    }

    /// Replace remote attachment URLs with inline `data:` URLs
    ///
    /// The API only dereferences its own file URIs, so anything else is
    /// downloaded here.
    async fn inline_attachments(&self, mut request: GenerateRequest) -> Result<GenerateRequest, LlmError> {
        for message in &mut request.messages {
            for block in &mut message.content {
                let ContentBlock::File { media_type, url } = block else {
                    continue;
                };
                if url.starts_with("data:") || url.starts_with(&self.base_url) {
                    continue;
                }

                let response = self.http_client.get(url.as_str()).send().await?;
                let status = response.status();
                if !status.is_success() {
                    return Err(LlmError::InvalidRequest(format!(
                        "Failed to download attachment {} (status {})",
                        url, status
                    )));
                }
                let bytes = response.bytes().await?;
                *url = format!("data:{};base64,{}", media_type, BASE64.encode(&bytes));
            }
        }
        Ok(request)
    }

    /// Make a streaming request to Gemini
    async fn make_streaming_request(&self, request: GenerateRequest) -> Result<EventStream, LlmError> {
        if self.api_key.trim().is_empty() {
            return Err(LlmError::AuthenticationError("API key is empty".to_string()));
        }

        let request = self.inline_attachments(request).await?;
        let gemini_request = to_gemini_request(request);

        let url = self.build_endpoint_url();
        tracing::debug!(model = self.model.as_str(), "calling generative-language API");

        let response = self
            .http_client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&gemini_request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_secs);
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::from_status(status.as_u16(), body, retry_after));
        }

        let byte_stream = response.bytes_stream();
        let sse_stream = parse_sse_stream(Box::pin(byte_stream));

        let message_id = Uuid::new_v4().to_string();
        let mut emitted_start = false;
        let mut current_index = 0;

        let event_stream = sse_stream.map(move |result| match result {
            Ok(gemini_response) => {
                let mut events = Vec::new();

                if !emitted_start {
                    events.push(create_message_start(message_id.clone()));
                    emitted_start = true;
                }

                events.append(&mut from_gemini_response(gemini_response, &mut current_index));
                Ok(events)
            }
            Err(e) => Err(e),
        });

        let flattened = event_stream.flat_map(|result| {
            futures::stream::iter(match result {
                Ok(events) => events.into_iter().map(Ok).collect::<Vec<_>>(),
                Err(e) => vec![Err(e)],
            })
        });

        Ok(Box::pin(flattened))
    }
}

#[async_trait]
impl LlmProvider for GeminiClient {
    async fn stream_generate(&self, request: GenerateRequest) -> Result<EventStream, LlmError> {
        self.make_streaming_request(request).await
    }
}
