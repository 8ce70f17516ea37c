//! Server-Sent Events (SSE) parser for Gemini responses

use async_stream::stream;
use bytes::Bytes;
use futures::stream::Stream;
use futures::StreamExt;
use std::pin::Pin;

use crate::llm::core::error::LlmError;

use super::types::GenerateContentResponse;

/// Parse a stream of bytes as Gemini SSE events
///
/// Lines are split on raw bytes so multi-byte characters cut across network
/// chunks survive. Only `data:` lines are decoded; a final line without a
/// trailing newline is still processed when the body ends.
pub fn parse_sse_stream(
    byte_stream: Pin<Box<dyn Stream<Item = Result<Bytes, reqwest::Error>> + Send>>,
) -> Pin<Box<dyn Stream<Item = Result<GenerateContentResponse, LlmError>> + Send>> {
    let events = stream! {
        let mut buffer: Vec<u8> = Vec::new();
        let mut byte_stream = byte_stream;

        while let Some(chunk) = byte_stream.next().await {
            let chunk = match chunk {
                Ok(bytes) => bytes,
                Err(e) => {
                    yield Err(LlmError::from(e));
                    return;
                }
            };
            buffer.extend_from_slice(&chunk);

            while let Some(newline_pos) = buffer.iter().position(|b| *b == b'\n') {
                let line: Vec<u8> = buffer.drain(..=newline_pos).collect();
                if let Some(event) = parse_line(&line) {
                    yield event;
                }
            }
        }

        if let Some(event) = parse_line(&buffer) {
            yield event;
        }
    };

    Box::pin(events)
}

fn parse_line(line: &[u8]) -> Option<Result<GenerateContentResponse, LlmError>> {
    let line = match std::str::from_utf8(line) {
        Ok(text) => text.trim(),
        Err(e) => {
            return Some(Err(LlmError::StreamError(format!(
                "Invalid UTF-8 in stream: {}",
                e
            ))))
        }
    };

    // Ignore blank separators and other fields (event:, id:, comments)
    let data = line.strip_prefix("data:")?.trim_start();
    if data.is_empty() {
        return None;
    }

    Some(
        serde_json::from_str::<GenerateContentResponse>(data).map_err(|e| {
            LlmError::SerializationError(format!("Failed to parse SSE data: {}. Data: {}", e, data))
        }),
    )
}
