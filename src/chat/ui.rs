//! UI message stream chunks and stored-part conversion
//!
//! Chunks follow the web client's UI message stream protocol: one JSON object
//! per chunk with a kebab-case `type` tag and camelCase fields.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::db::StoredMessage;
use crate::llm::{ContentBlock, Message, MessageRole};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum UiChunk {
    Start {
        message_id: String,
    },
    StartStep,
    TextStart {
        id: String,
    },
    TextDelta {
        id: String,
        delta: String,
    },
    TextEnd {
        id: String,
    },
    ReasoningStart {
        id: String,
    },
    ReasoningDelta {
        id: String,
        delta: String,
    },
    ReasoningEnd {
        id: String,
    },
    ToolInputAvailable {
        tool_call_id: String,
        tool_name: String,
        input: Value,
    },
    ToolOutputAvailable {
        tool_call_id: String,
        output: Value,
    },
    ToolOutputError {
        tool_call_id: String,
        error_text: String,
    },
    FinishStep,
    Finish,
    Error {
        error_text: String,
    },
    /// Whole message handed to a resuming client
    #[serde(rename = "data-appendMessage")]
    DataAppendMessage {
        data: String,
        transient: bool,
    },
}

/// Prefix of the part type of a tool invocation, as in `tool-getWeather`
pub const TOOL_PART_PREFIX: &str = "tool-";

/// Stored message in the shape the web client keeps in memory
pub fn to_ui_message(message: &StoredMessage) -> Value {
    serde_json::json!({
        "id": message.id,
        "role": message.role,
        "parts": message.parts,
        "metadata": { "createdAt": message.created_at },
    })
}

/// Rebuild model context from stored messages
///
/// User parts become text and file blocks. Assistant messages are split at
/// `step-start` parts: each step yields an assistant message with its text
/// and tool calls, followed by one tool message with the recorded results.
/// Reasoning parts are not sent back to the model.
pub fn to_model_messages(messages: &[StoredMessage]) -> Vec<Message> {
    let mut out = Vec::new();

    for message in messages {
        let parts = message.parts.as_array().map(Vec::as_slice).unwrap_or(&[]);
        match message.role.as_str() {
            "user" => {
                let content: Vec<ContentBlock> = parts.iter().filter_map(user_block).collect();
                if !content.is_empty() {
                    out.push(Message {
                        role: MessageRole::User,
                        content,
                    });
                }
            }
            "assistant" => assistant_messages(parts, &mut out),
            _ => {}
        }
    }

    out
}

fn part_type(part: &Value) -> &str {
    part.get("type").and_then(Value::as_str).unwrap_or("")
}

fn str_field<'a>(part: &'a Value, name: &str) -> Option<&'a str> {
    part.get(name).and_then(Value::as_str)
}

fn user_block(part: &Value) -> Option<ContentBlock> {
    match part_type(part) {
        "text" => str_field(part, "text").map(|text| ContentBlock::Text {
            text: text.to_string(),
        }),
        "file" => Some(ContentBlock::File {
            media_type: str_field(part, "mediaType")?.to_string(),
            url: str_field(part, "url")?.to_string(),
        }),
        _ => None,
    }
}

fn assistant_messages(parts: &[Value], out: &mut Vec<Message>) {
    let mut steps: Vec<&[Value]> = Vec::new();
    let mut start = 0;
    for (i, part) in parts.iter().enumerate() {
        if part_type(part) == "step-start" {
            if i > start {
                steps.push(&parts[start..i]);
            }
            start = i + 1;
        }
    }
    if start < parts.len() {
        steps.push(&parts[start..]);
    }

    for step in steps {
        let mut content = Vec::new();
        let mut results = Vec::new();

        for part in step {
            let kind = part_type(part);
            if kind == "text" {
                if let Some(text) = str_field(part, "text").filter(|t| !t.is_empty()) {
                    content.push(ContentBlock::Text {
                        text: text.to_string(),
                    });
                }
                continue;
            }

            let Some(name) = kind.strip_prefix(TOOL_PART_PREFIX) else {
                continue;
            };
            let Some(call_id) = str_field(part, "toolCallId") else {
                continue;
            };
            let result = match str_field(part, "state") {
                Some("output-available") => ContentBlock::ToolResult {
                    tool_use_id: call_id.to_string(),
                    content: part.get("output").cloned().unwrap_or(Value::Null).to_string(),
                    is_error: false,
                },
                Some("output-error") => ContentBlock::ToolResult {
                    tool_use_id: call_id.to_string(),
                    content: str_field(part, "errorText").unwrap_or("").to_string(),
                    is_error: true,
                },
                // Calls without a recorded outcome cannot be replayed
                _ => continue,
            };

            content.push(ContentBlock::ToolUse {
                id: call_id.to_string(),
                name: name.to_string(),
                input: part.get("input").cloned().unwrap_or_else(|| serde_json::json!({})),
            });
            results.push(result);
        }

        if !content.is_empty() {
            out.push(Message {
                role: MessageRole::Assistant,
                content,
            });
        }
        if !results.is_empty() {
            out.push(Message {
                role: MessageRole::Tool,
                content: results,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    fn stored(role: &str, parts: Value) -> StoredMessage {
        StoredMessage::new(Uuid::new_v4(), Uuid::nil(), role, parts)
    }

    #[test]
    fn test_chunk_wire_shape() {
        let chunk = UiChunk::TextDelta {
            id: "t1".to_string(),
            delta: "Hello ".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&chunk).unwrap(),
            json!({"type": "text-delta", "id": "t1", "delta": "Hello "})
        );

        assert_eq!(
            serde_json::to_value(UiChunk::StartStep).unwrap(),
            json!({"type": "start-step"})
        );

        let chunk = UiChunk::ToolInputAvailable {
            tool_call_id: "c1".to_string(),
            tool_name: "getWeather".to_string(),
            input: json!({"latitude": 1.0}),
        };
        let value = serde_json::to_value(&chunk).unwrap();
        assert_eq!(value["type"], "tool-input-available");
        assert_eq!(value["toolCallId"], "c1");
        assert_eq!(value["toolName"], "getWeather");

        let chunk = UiChunk::Error {
            error_text: "boom".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&chunk).unwrap(),
            json!({"type": "error", "errorText": "boom"})
        );
    }

    #[test]
    fn test_append_message_chunk() {
        let chunk = UiChunk::DataAppendMessage {
            data: "{}".to_string(),
            transient: true,
        };
        assert_eq!(
            serde_json::to_value(&chunk).unwrap(),
            json!({"type": "data-appendMessage", "data": "{}", "transient": true})
        );
    }

    #[test]
    fn test_user_parts_to_blocks() {
        let messages = vec![stored(
            "user",
            json!([
                {"type": "text", "text": "What is this?"},
                {"type": "file", "mediaType": "image/png", "name": "a.png", "url": "https://x/a.png"}
            ]),
        )];

        let converted = to_model_messages(&messages);
        assert_eq!(converted.len(), 1);
        assert_eq!(converted[0].role, MessageRole::User);
        assert!(matches!(
            &converted[0].content[1],
            ContentBlock::File { media_type, .. } if media_type == "image/png"
        ));
    }

    #[test]
    fn test_assistant_steps_split_tool_results() {
        let messages = vec![stored(
            "assistant",
            json!([
                {"type": "step-start"},
                {"type": "reasoning", "text": "thinking"},
                {"type": "tool-getWeather", "toolCallId": "c1", "state": "output-available",
                 "input": {"latitude": 1.0, "longitude": 2.0}, "output": {"temperature": 20}},
                {"type": "step-start"},
                {"type": "text", "text": "It is 20 degrees."}
            ]),
        )];

        let converted = to_model_messages(&messages);
        assert_eq!(converted.len(), 3);
        assert_eq!(converted[0].role, MessageRole::Assistant);
        assert!(matches!(
            &converted[0].content[0],
            ContentBlock::ToolUse { name, .. } if name == "getWeather"
        ));
        assert_eq!(converted[1].role, MessageRole::Tool);
        match &converted[1].content[0] {
            ContentBlock::ToolResult { content, is_error, .. } => {
                assert_eq!(content, r#"{"temperature":20}"#);
                assert!(!is_error);
            }
            other => panic!("unexpected block {:?}", other),
        }
        assert_eq!(converted[2].role, MessageRole::Assistant);
    }

    #[test]
    fn test_unknown_roles_and_empty_parts_are_skipped() {
        let messages = vec![
            stored("system", json!([{"type": "text", "text": "x"}])),
            stored("assistant", json!([{"type": "step-start"}])),
            stored("user", json!("not an array")),
        ];
        assert!(to_model_messages(&messages).is_empty());
    }

    #[test]
    fn test_ui_message_shape() {
        let message = stored("assistant", json!([{"type": "text", "text": "hi"}]));
        let ui = to_ui_message(&message);
        assert_eq!(ui["role"], "assistant");
        assert_eq!(ui["parts"][0]["text"], "hi");
        assert!(ui["metadata"]["createdAt"].is_string());
    }
}
