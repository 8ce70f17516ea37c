//! Turns agent events into UI chunks and the persisted assistant message

use std::sync::Arc;

use serde_json::{json, Value};
use tokio::sync::mpsc;
use uuid::Uuid;

use super::resumable::StreamRegistry;
use super::ui::{UiChunk, TOOL_PART_PREFIX};
use crate::llm::{AgentEvent, ContentDelta, StreamEvent};

/// Where emitted chunks go
#[derive(Clone)]
pub struct ChunkSink {
    tx: mpsc::UnboundedSender<UiChunk>,
    replay: Option<(Arc<StreamRegistry>, Uuid)>,
}

impl ChunkSink {
    pub fn new(tx: mpsc::UnboundedSender<UiChunk>) -> Self {
        Self { tx, replay: None }
    }

    /// Also buffer chunks under `stream_id` for resuming clients
    pub fn with_replay(mut self, registry: Arc<StreamRegistry>, stream_id: Uuid) -> Self {
        self.replay = Some((registry, stream_id));
        self
    }

    pub fn send(&self, chunk: UiChunk) {
        if let Some((registry, stream_id)) = &self.replay {
            registry.push(*stream_id, chunk.clone());
        }
        // The client may have gone away; generation carries on regardless
        let _ = self.tx.send(chunk);
    }

    /// Mark the buffered stream as finished
    pub fn close(&self) {
        if let Some((registry, stream_id)) = &self.replay {
            registry.finish(*stream_id);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockKind {
    Text,
    Reasoning,
}

struct OpenBlock {
    kind: BlockKind,
    id: String,
    text: String,
}

/// Writer for a single assistant message
pub struct UiMessageWriter {
    message_id: Uuid,
    sink: ChunkSink,
    parts: Vec<Value>,
    open: Option<OpenBlock>,
}

impl UiMessageWriter {
    pub fn new(message_id: Uuid, sink: ChunkSink) -> Self {
        Self {
            message_id,
            sink,
            parts: Vec::new(),
            open: None,
        }
    }

    pub fn start(&mut self) {
        self.sink.send(UiChunk::Start {
            message_id: self.message_id.to_string(),
        });
    }

    pub fn handle(&mut self, event: AgentEvent) {
        match event {
            AgentEvent::IterationStarted { .. } => {
                self.parts.push(json!({ "type": "step-start" }));
                self.sink.send(UiChunk::StartStep);
            }
            AgentEvent::LlmEvent(StreamEvent::ContentDelta { delta, .. }) => match delta {
                ContentDelta::TextDelta { text } => self.append(BlockKind::Text, text),
                ContentDelta::ReasoningDelta { text } => self.append(BlockKind::Reasoning, text),
                ContentDelta::ToolUseDelta { .. } => {}
            },
            AgentEvent::LlmEvent(StreamEvent::ContentBlockStart {
                block: crate::llm::core::types::ContentBlockStart::Text { text },
                ..
            }) => self.append(BlockKind::Text, text),
            AgentEvent::LlmEvent(_) => {}
            AgentEvent::ToolExecutionStarted {
                tool_use_id,
                name,
                input,
            } => {
                self.close_block();
                self.sink.send(UiChunk::ToolInputAvailable {
                    tool_call_id: tool_use_id.clone(),
                    tool_name: name.clone(),
                    input: input.clone(),
                });
                self.parts.push(json!({
                    "type": format!("{}{}", TOOL_PART_PREFIX, name),
                    "toolCallId": tool_use_id,
                    "state": "input-available",
                    "input": input,
                }));
            }
            AgentEvent::ToolExecutionCompleted {
                tool_use_id,
                result,
                ..
            } => {
                let output = serde_json::from_str(&result).unwrap_or(Value::String(result));
                self.sink.send(UiChunk::ToolOutputAvailable {
                    tool_call_id: tool_use_id.clone(),
                    output: output.clone(),
                });
                if let Some(part) = self.tool_part(&tool_use_id) {
                    part["state"] = json!("output-available");
                    part["output"] = output;
                }
            }
            AgentEvent::ToolExecutionFailed {
                tool_use_id, error, ..
            } => {
                self.sink.send(UiChunk::ToolOutputError {
                    tool_call_id: tool_use_id.clone(),
                    error_text: error.clone(),
                });
                if let Some(part) = self.tool_part(&tool_use_id) {
                    part["state"] = json!("output-error");
                    part["errorText"] = json!(error);
                }
            }
            AgentEvent::IterationFinished { .. } => {
                self.close_block();
                self.sink.send(UiChunk::FinishStep);
            }
            AgentEvent::Completed => {
                self.close_block();
                self.sink.send(UiChunk::Finish);
            }
        }
    }

    /// Report a failure to the client
    pub fn fail(&mut self, error_text: &str) {
        self.close_block();
        self.sink.send(UiChunk::Error {
            error_text: error_text.to_string(),
        });
    }

    /// Whether anything beyond step boundaries was produced
    pub fn has_content(&self) -> bool {
        self.parts.iter().any(|part| part["type"] != "step-start")
    }

    /// Parts of the assistant message, closing any open block
    pub fn finish_parts(&mut self) -> Vec<Value> {
        self.close_block();
        std::mem::take(&mut self.parts)
    }

    fn tool_part(&mut self, tool_call_id: &str) -> Option<&mut Value> {
        self.parts
            .iter_mut()
            .rev()
            .find(|part| part["toolCallId"] == tool_call_id)
    }

    fn append(&mut self, kind: BlockKind, delta: String) {
        if delta.is_empty() {
            return;
        }

        if self.open.as_ref().map(|block| block.kind) != Some(kind) {
            self.close_block();
            let id = Uuid::new_v4().to_string();
            self.sink.send(match kind {
                BlockKind::Text => UiChunk::TextStart { id: id.clone() },
                BlockKind::Reasoning => UiChunk::ReasoningStart { id: id.clone() },
            });
            self.open = Some(OpenBlock {
                kind,
                id,
                text: String::new(),
            });
        }

        if let Some(block) = self.open.as_mut() {
            block.text.push_str(&delta);
            let id = block.id.clone();
            self.sink.send(match kind {
                BlockKind::Text => UiChunk::TextDelta { id, delta },
                BlockKind::Reasoning => UiChunk::ReasoningDelta { id, delta },
            });
        }
    }

    fn close_block(&mut self) {
        let Some(block) = self.open.take() else {
            return;
        };

        let (end, part_type) = match block.kind {
            BlockKind::Text => (UiChunk::TextEnd { id: block.id }, "text"),
            BlockKind::Reasoning => (UiChunk::ReasoningEnd { id: block.id }, "reasoning"),
        };
        self.sink.send(end);
        self.parts.push(json!({ "type": part_type, "text": block.text }));
    }
}
