use serde_json::Value;

use super::prompts::TITLE_PROMPT;
use crate::llm::{text::generate_text, GenerateRequest, LlmError, LlmProvider, Message};

pub const MAX_TITLE_CHARS: usize = 80;
pub const DEFAULT_TITLE: &str = "New Chat";

fn truncate(text: &str) -> String {
    text.chars().take(MAX_TITLE_CHARS).collect()
}

/// Ask the title model to summarise the first user message
///
/// The prompt is the JSON of the whole UI message, parts included.
pub async fn generate_title(provider: &dyn LlmProvider, message: &Value) -> Result<String, LlmError> {
    let request = GenerateRequest {
        messages: vec![Message::user(message.to_string())],
        tools: None,
        config: Default::default(),
        system: Some(TITLE_PROMPT.to_string()),
    };

    let title = generate_text(provider, request).await?;
    let title = title.trim();
    if title.is_empty() {
        return Err(LlmError::ProviderError {
            code: "empty_title".to_string(),
            message: "Title model returned no text".to_string(),
        });
    }

    Ok(truncate(title))
}

/// Title derived from the message text when the title model is unavailable
pub fn fallback_title<'a>(texts: impl IntoIterator<Item = &'a str>) -> String {
    let joined = texts.into_iter().collect::<Vec<_>>().join(" ");
    let title = truncate(&joined);
    if title.is_empty() {
        DEFAULT_TITLE.to_string()
    } else {
        title
    }
}
