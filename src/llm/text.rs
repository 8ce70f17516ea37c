//! Non-streaming helper on top of [`LlmProvider`]

use futures::StreamExt;

use crate::llm::core::{
    error::LlmError,
    provider::LlmProvider,
    types::{ContentDelta, GenerateRequest, StreamEvent},
};

/// Run a request to completion and return the concatenated answer text
///
/// Reasoning deltas and tool calls are ignored.
pub async fn generate_text(
    provider: &dyn LlmProvider,
    request: GenerateRequest,
) -> Result<String, LlmError> {
    let mut stream = provider.stream_generate(request).await?;
    let mut text = String::new();

    while let Some(event) = stream.next().await {
        match event? {
            StreamEvent::ContentDelta {
                delta: ContentDelta::TextDelta { text: chunk },
                ..
            } => text.push_str(&chunk),
            StreamEvent::Error { error } => return Err(LlmError::StreamError(error)),
            StreamEvent::MessageEnd { .. } => break,
            _ => {}
        }
    }

    Ok(text)
}
