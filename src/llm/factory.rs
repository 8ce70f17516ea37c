//! Building providers for a caller's API key

use reqwest::Client;

use crate::llm::catalogue::ChatModelId;
use crate::llm::core::{error::LlmError, provider::LlmProvider};
use crate::llm::gemini::{GeminiClient, GeminiModel};
use crate::llm::middleware::ExtractReasoning;

const REASONING_TAG: &str = "think";

/// Creates language models bound to a user-supplied API key
pub trait ProviderFactory: Send + Sync {
    /// Model answering chat messages
    fn language_model(
        &self,
        api_key: &str,
        model: ChatModelId,
    ) -> Result<Box<dyn LlmProvider>, LlmError>;

    /// Model used to summarise the first message into a chat title
    fn title_model(&self, api_key: &str) -> Result<Box<dyn LlmProvider>, LlmError>;
}

/// Factory for the hosted generative-language API
pub struct GoogleProviderFactory {
    http_client: Client,
    base_url: String,
}

impl GoogleProviderFactory {
    pub fn new(base_url: impl Into<String>) -> Result<Self, LlmError> {
        Ok(Self {
            http_client: GeminiClient::default_http_client()?,
            base_url: base_url.into(),
        })
    }

    fn client(&self, api_key: &str, model: GeminiModel) -> Result<GeminiClient, LlmError> {
        if api_key.trim().is_empty() {
            return Err(LlmError::AuthenticationError("API key is empty".to_string()));
        }
        Ok(GeminiClient::new(
            self.http_client.clone(),
            api_key,
            self.base_url.clone(),
            model,
        ))
    }
}

impl ProviderFactory for GoogleProviderFactory {
    fn language_model(
        &self,
        api_key: &str,
        model: ChatModelId,
    ) -> Result<Box<dyn LlmProvider>, LlmError> {
        let client = Box::new(self.client(api_key, model.upstream())?);
        if model.is_reasoning() {
            return Ok(Box::new(ExtractReasoning::new(client, REASONING_TAG)));
        }
        Ok(client)
    }

    fn title_model(&self, api_key: &str) -> Result<Box<dyn LlmProvider>, LlmError> {
        Ok(Box::new(self.client(api_key, GeminiModel::Gemini20FlashExp)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_key_is_rejected() {
        let factory = GoogleProviderFactory::new("http://127.0.0.1:9").unwrap();
        assert!(matches!(
            factory.language_model("", ChatModelId::Gemini20FlashExp),
            Err(LlmError::AuthenticationError(_))
        ));
        assert!(factory.title_model(" ").is_err());
    }

    #[test]
    fn test_every_model_builds() {
        let factory = GoogleProviderFactory::new("http://127.0.0.1:9").unwrap();
        for id in ChatModelId::ALL {
            assert!(factory.language_model("key", id).is_ok());
        }
    }
}
