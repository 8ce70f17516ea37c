//! Mapping between abstraction types and Gemini types

use std::collections::HashMap;
use uuid::Uuid;

use crate::llm::core::{
    config::GenerationConfig,
    types::{
        ContentBlock, ContentBlockStart, ContentDelta, FinishReason, GenerateRequest, Message,
        MessageMetadata, MessageRole, PartialToolUse, StreamEvent, ToolDeclaration, UsageMetadata,
    },
};

use super::types::{
    Blob, Content, FileData, FunctionCall, FunctionDeclaration, FunctionResponse,
    GeminiGenerationConfig, GenerateContentRequest, GenerateContentResponse, Part,
    SystemInstruction, Tool,
};

/// Convert our abstraction request to Gemini's request format
///
/// File blocks must already carry either a `data:` URL or an uploaded file
/// URI; remote URLs are passed through as file references.
pub fn to_gemini_request(request: GenerateRequest) -> GenerateContentRequest {
    // Gemini answers a call by function name, not by call id.
    let call_names: HashMap<String, String> = request
        .messages
        .iter()
        .flat_map(|m| m.content.iter())
        .filter_map(|block| match block {
            ContentBlock::ToolUse { id, name, .. } => Some((id.clone(), name.clone())),
            _ => None,
        })
        .collect();

    let contents = request
        .messages
        .into_iter()
        .map(|message| to_gemini_content(message, &call_names))
        .filter(|content| !content.parts.is_empty())
        .collect();

    let tools = request
        .tools
        .filter(|tools| !tools.is_empty())
        .map(|tools| {
            vec![Tool {
                function_declarations: tools
                    .into_iter()
                    .map(to_gemini_function_declaration)
                    .collect(),
            }]
        });

    GenerateContentRequest {
        contents,
        system_instruction: request.system.map(|s| SystemInstruction {
            parts: vec![Part::Text { text: s }],
        }),
        tools,
        generation_config: (!request.config.is_empty())
            .then(|| to_gemini_generation_config(request.config)),
    }
}

/// Convert a message to Gemini's content format
fn to_gemini_content(message: Message, call_names: &HashMap<String, String>) -> Content {
    let role = match message.role {
        MessageRole::User => "user".to_string(),
        MessageRole::Assistant => "model".to_string(),
        // Tool results are included in user role with FunctionResponse parts
        MessageRole::Tool => "user".to_string(),
    };

    let parts = message
        .content
        .into_iter()
        .map(|block| to_gemini_part(block, call_names))
        .collect();

    Content { role, parts }
}

/// Convert a content block to a Gemini part
fn to_gemini_part(block: ContentBlock, call_names: &HashMap<String, String>) -> Part {
    match block {
        ContentBlock::Text { text } => Part::Text { text },
        ContentBlock::File { media_type, url } => match split_data_url(&url) {
            Some((mime_type, data)) => Part::InlineData {
                inline_data: Blob {
                    mime_type: mime_type.unwrap_or(media_type),
                    data,
                },
            },
            None => Part::FileData {
                file_data: FileData {
                    mime_type: media_type,
                    file_uri: url,
                },
            },
        },
        ContentBlock::ToolUse { id: _, name, input } => Part::FunctionCall {
            function_call: FunctionCall { name, args: input },
        },
        ContentBlock::ToolResult {
            tool_use_id,
            content,
            is_error,
        } => {
            let response = if is_error {
                serde_json::json!({ "error": content })
            } else {
                // Gemini wants an object; wrap anything else
                match serde_json::from_str::<serde_json::Value>(&content) {
                    Ok(value) if value.is_object() => value,
                    Ok(value) => serde_json::json!({ "result": value }),
                    Err(_) => serde_json::json!({ "result": content }),
                }
            };

            let name = call_names
                .get(&tool_use_id)
                .cloned()
                .unwrap_or(tool_use_id);

            Part::FunctionResponse {
                function_response: FunctionResponse { name, response },
            }
        }
    }
}

/// Split a base64 `data:` URL into its media type and payload
pub fn split_data_url(url: &str) -> Option<(Option<String>, String)> {
    let rest = url.strip_prefix("data:")?;
    let (meta, data) = rest.split_once(',')?;
    let meta = meta.strip_suffix(";base64")?;
    let mime_type = (!meta.is_empty()).then(|| meta.to_string());
    Some((mime_type, data.to_string()))
}

/// Convert a tool declaration to Gemini's function declaration
fn to_gemini_function_declaration(tool: ToolDeclaration) -> FunctionDeclaration {
    FunctionDeclaration {
        name: tool.name,
        description: tool.description,
        parameters: tool.input_schema,
    }
}

/// Convert generation config to Gemini's format
fn to_gemini_generation_config(config: GenerationConfig) -> GeminiGenerationConfig {
    GeminiGenerationConfig {
        max_output_tokens: config.max_tokens,
        temperature: config.temperature,
        top_p: config.top_p,
        top_k: config.top_k,
        stop_sequences: config.stop_sequences,
    }
}

/// Convert Gemini response to our abstraction's stream events
///
/// Text arrives as bare deltas; function calls arrive whole and are emitted
/// as a start/delta/end triple under a fresh index.
pub fn from_gemini_response(
    response: GenerateContentResponse,
    current_index: &mut usize,
) -> Vec<StreamEvent> {
    let mut events = Vec::new();

    let Some(candidate) = response.candidates.first() else {
        return events;
    };

    for part in &candidate.content.parts {
        match part {
            Part::Text { text } => {
                if text.is_empty() {
                    continue;
                }
                events.push(StreamEvent::ContentDelta {
                    index: *current_index,
                    delta: ContentDelta::TextDelta { text: text.clone() },
                });
            }
            Part::FunctionCall { function_call } => {
                *current_index += 1;

                events.push(StreamEvent::ContentBlockStart {
                    index: *current_index,
                    block: ContentBlockStart::ToolUse {
                        // Gemini doesn't assign call ids
                        id: Uuid::new_v4().to_string(),
                        name: function_call.name.clone(),
                    },
                });

                events.push(StreamEvent::ContentDelta {
                    index: *current_index,
                    delta: ContentDelta::ToolUseDelta {
                        partial: PartialToolUse {
                            id: None,
                            name: Some(function_call.name.clone()),
                            partial_json: function_call.args.to_string(),
                        },
                    },
                });

                events.push(StreamEvent::ContentBlockEnd {
                    index: *current_index,
                });

                *current_index += 1;
            }
            // Only ever sent by us
            Part::FunctionResponse { .. } | Part::InlineData { .. } | Part::FileData { .. } => {}
        }
    }

    if let Some(finish_reason_str) = &candidate.finish_reason {
        let usage = response
            .usage_metadata
            .as_ref()
            .map(|usage| UsageMetadata {
                input_tokens: usage.prompt_token_count,
                output_tokens: usage.candidates_token_count,
                total_tokens: usage.total_token_count,
            })
            .unwrap_or_else(|| UsageMetadata::new(0, 0));

        events.push(StreamEvent::MessageEnd {
            finish_reason: map_finish_reason(finish_reason_str),
            usage,
        });
    }

    events
}

/// Map Gemini's finish reason to our abstraction
fn map_finish_reason(reason: &str) -> FinishReason {
    match reason {
        "STOP" => FinishReason::Stop,
        "MAX_TOKENS" => FinishReason::MaxTokens,
        "SAFETY" => FinishReason::Safety,
        "RECITATION" => FinishReason::Other("Recitation".to_string()),
        other => FinishReason::Other(other.to_string()),
    }
}

/// Helper to create initial message start event
pub fn create_message_start(message_id: String) -> StreamEvent {
    StreamEvent::MessageStart {
        message: MessageMetadata {
            id: message_id,
            role: MessageRole::Assistant,
            usage: None,
        },
    }
}
