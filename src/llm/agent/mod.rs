//! Multi-step agent loop
//!
//! The agent:
//! - starts from a prepared conversation history
//! - calls the LLM and forwards every streamed event
//! - executes tool calls and feeds their results back
//! - stops on a tool-free response or after the step limit

mod error;

pub use error::AgentError;

use crate::llm::core::{
    config::GenerationConfig,
    provider::LlmProvider,
    types::{
        ContentBlock, ContentBlockStart, ContentDelta, FinishReason, GenerateRequest, Message,
        MessageRole, StreamEvent, ToolDeclaration, UsageMetadata,
    },
};
use crate::llm::tools::executor::ToolExecutor;
use async_stream::stream;
use futures::stream::Stream;
use futures::StreamExt;
use pin_utils::pin_mut;
use std::pin::Pin;
use std::sync::Arc;

pub const DEFAULT_MAX_ITERATIONS: usize = 5;

pub type AgentStream<'a> = Pin<Box<dyn Stream<Item = Result<AgentEvent, AgentError>> + Send + 'a>>;

/// Events emitted by the agent during execution
#[derive(Debug, Clone)]
pub enum AgentEvent {
    /// Raw LLM streaming event (text deltas, tool calls, etc.)
    LlmEvent(StreamEvent),

    /// Agent is executing a tool call
    ToolExecutionStarted {
        tool_use_id: String,
        name: String,
        input: serde_json::Value,
    },

    /// Tool execution completed successfully
    ToolExecutionCompleted {
        tool_use_id: String,
        name: String,
        result: String,
    },

    /// Tool execution failed with an error
    ToolExecutionFailed {
        tool_use_id: String,
        name: String,
        error: String,
    },

    /// Agent is starting a new iteration (calling LLM again after tool execution)
    IterationStarted { iteration: usize },

    /// One model call and its tool executions are done
    IterationFinished {
        iteration: usize,
        finish_reason: Option<FinishReason>,
        usage: Option<UsageMetadata>,
    },

    /// Agent loop completed
    Completed,
}

/// Helper struct for accumulating partial tool use data
struct PartialToolUseAccumulator {
    id: String,
    name: String,
    input: String,
}

/// Agent that manages conversation history and tool execution
pub struct Agent {
    provider: Box<dyn LlmProvider>,

    tool_executor: Arc<dyn ToolExecutor>,

    /// Tool declarations available to the LLM
    tool_declarations: Vec<ToolDeclaration>,

    /// Conversation history, extended as the loop runs
    messages: Vec<Message>,

    config: GenerationConfig,

    system: Option<String>,

    /// Maximum number of model calls per run (default: 5)
    max_iterations: usize,
}

impl Agent {
    /// Create a new agent with default settings
    pub fn new(
        provider: Box<dyn LlmProvider>,
        tool_executor: Arc<dyn ToolExecutor>,
        tool_declarations: Vec<ToolDeclaration>,
        config: GenerationConfig,
        system: Option<String>,
    ) -> Self {
        Self {
            provider,
            tool_executor,
            tool_declarations,
            messages: Vec::new(),
            config,
            system,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    /// Seed the conversation the next run continues from
    pub fn with_history(mut self, messages: Vec<Message>) -> Self {
        self.messages = messages;
        self
    }

    /// Set the maximum number of iterations (default: 5)
    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    /// Run the loop over the current history
    ///
    /// The returned stream emits `IterationStarted`, the LLM events,
    /// `ToolExecution*` events, `IterationFinished` for every step, and
    /// finally `Completed`. Reaching the step limit also completes.
    pub fn run(&mut self) -> AgentStream<'_> {
        Box::pin(self.create_agent_stream())
    }

    /// Get the full conversation history
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    fn tools(&self) -> Option<Vec<ToolDeclaration>> {
        if self.tool_declarations.is_empty() {
            None
        } else {
            Some(self.tool_declarations.clone())
        }
    }

    fn create_agent_stream(
        &mut self,
    ) -> impl Stream<Item = Result<AgentEvent, AgentError>> + Send + '_ {
        stream! {
            let mut iteration = 0;

            loop {
                iteration += 1;

                if iteration > self.max_iterations {
                    tracing::debug!(max = self.max_iterations, "agent step limit reached");
                    yield Ok(AgentEvent::Completed);
                    return;
                }

                yield Ok(AgentEvent::IterationStarted { iteration });

                let request = GenerateRequest {
                    messages: self.messages.clone(),
                    tools: self.tools(),
                    config: self.config.clone(),
                    system: self.system.clone(),
                };

                let llm_stream = match self.provider.stream_generate(request).await {
                    Ok(s) => s,
                    Err(e) => {
                        yield Err(AgentError::Llm(e));
                        return;
                    }
                };

                let mut text_content = String::new();
                let mut tool_uses = Vec::new();
                let mut current_tool_use: Option<PartialToolUseAccumulator> = None;
                let mut finish_reason = None;
                let mut usage = None;

                pin_mut!(llm_stream);

                while let Some(event_result) = llm_stream.next().await {
                    let event = match event_result {
                        Ok(e) => e,
                        Err(e) => {
                            yield Err(AgentError::Llm(e));
                            return;
                        }
                    };

                    yield Ok(AgentEvent::LlmEvent(event.clone()));

                    match &event {
                        StreamEvent::ContentBlockStart { block, .. } => match block {
                            ContentBlockStart::Text { text } => {
                                text_content.push_str(text);
                            }
                            ContentBlockStart::ToolUse { id, name } => {
                                current_tool_use = Some(PartialToolUseAccumulator {
                                    id: id.clone(),
                                    name: name.clone(),
                                    input: String::new(),
                                });
                            }
                        },
                        StreamEvent::ContentDelta { delta, .. } => match delta {
                            ContentDelta::TextDelta { text } => {
                                text_content.push_str(text);
                            }
                            ContentDelta::ReasoningDelta { .. } => {}
                            ContentDelta::ToolUseDelta { partial } => {
                                if let Some(tool_use) = &mut current_tool_use {
                                    tool_use.input.push_str(&partial.partial_json);
                                }
                            }
                        },
                        StreamEvent::ContentBlockEnd { .. } => {
                            if let Some(tool_use) = current_tool_use.take() {
                                let raw = if tool_use.input.trim().is_empty() {
                                    "{}"
                                } else {
                                    tool_use.input.as_str()
                                };
                                match serde_json::from_str(raw) {
                                    Ok(input) => {
                                        tool_uses.push(ContentBlock::ToolUse {
                                            id: tool_use.id,
                                            name: tool_use.name,
                                            input,
                                        });
                                    }
                                    Err(e) => {
                                        yield Err(AgentError::ToolInputParse(e));
                                        return;
                                    }
                                }
                            }
                        }
                        StreamEvent::MessageEnd { finish_reason: reason, usage: step_usage } => {
                            finish_reason = Some(reason.clone());
                            usage = Some(*step_usage);
                            break;
                        }
                        StreamEvent::Error { error } => {
                            yield Err(AgentError::Llm(
                                crate::llm::core::error::LlmError::StreamError(error.clone()),
                            ));
                            return;
                        }
                        _ => {}
                    }
                }

                let mut assistant_content = Vec::new();
                if !text_content.is_empty() {
                    assistant_content.push(ContentBlock::Text { text: text_content });
                }
                assistant_content.extend(tool_uses.clone());

                self.messages.push(Message {
                    role: MessageRole::Assistant,
                    content: assistant_content,
                });

                if tool_uses.is_empty() {
                    yield Ok(AgentEvent::IterationFinished { iteration, finish_reason, usage });
                    yield Ok(AgentEvent::Completed);
                    return;
                }

                for block in &tool_uses {
                    if let ContentBlock::ToolUse { id, name, input } = block {
                        yield Ok(AgentEvent::ToolExecutionStarted {
                            tool_use_id: id.clone(),
                            name: name.clone(),
                            input: input.clone(),
                        });

                        match self
                            .tool_executor
                            .execute(id.clone(), name.clone(), input.clone())
                            .await
                        {
                            Ok(result) => {
                                yield Ok(AgentEvent::ToolExecutionCompleted {
                                    tool_use_id: id.clone(),
                                    name: name.clone(),
                                    result: result.clone(),
                                });
                                self.messages.push(Message::tool_result(id.clone(), result));
                            }
                            Err(error) => {
                                tracing::warn!(tool = %name, %error, "tool execution failed");
                                yield Ok(AgentEvent::ToolExecutionFailed {
                                    tool_use_id: id.clone(),
                                    name: name.clone(),
                                    error: error.clone(),
                                });
                                self.messages.push(Message::tool_error(id.clone(), error));
                            }
                        }
                    }
                }

                yield Ok(AgentEvent::IterationFinished { iteration, finish_reason, usage });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::core::error::LlmError;
    use crate::llm::core::provider::EventStream;
    use crate::llm::core::types::PartialToolUse;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct MockProvider {
        responses: Vec<Vec<StreamEvent>>,
        call_count: Arc<Mutex<usize>>,
        saw_tools: Arc<Mutex<Vec<bool>>>,
    }

    impl MockProvider {
        fn new(responses: Vec<Vec<StreamEvent>>) -> Self {
            Self {
                responses,
                call_count: Arc::new(Mutex::new(0)),
                saw_tools: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    #[async_trait]
    impl LlmProvider for MockProvider {
        async fn stream_generate(&self, request: GenerateRequest) -> Result<EventStream, LlmError> {
            self.saw_tools.lock().unwrap().push(request.tools.is_some());
            let mut count = self.call_count.lock().unwrap();
            let index = *count;
            *count += 1;

            if index >= self.responses.len() {
                return Err(LlmError::StreamError("No more responses".to_string()));
            }

            let events = self.responses[index].clone();
            Ok(Box::pin(futures::stream::iter(events.into_iter().map(Ok))))
        }
    }

    struct MockExecutor;

    #[async_trait]
    impl ToolExecutor for MockExecutor {
        async fn execute(
            &self,
            _tool_use_id: String,
            name: String,
            _arguments: serde_json::Value,
        ) -> Result<String, String> {
            if name == "broken" {
                return Err("tool exploded".to_string());
            }
            Ok(serde_json::json!({"temperature": 21}).to_string())
        }
    }

    fn text_turn(text: &str) -> Vec<StreamEvent> {
        vec![
            StreamEvent::ContentDelta {
                index: 0,
                delta: ContentDelta::TextDelta {
                    text: text.to_string(),
                },
            },
            StreamEvent::MessageEnd {
                finish_reason: FinishReason::Stop,
                usage: UsageMetadata::new(3, 4),
            },
        ]
    }

    fn tool_turn(name: &str) -> Vec<StreamEvent> {
        vec![
            StreamEvent::ContentBlockStart {
                index: 1,
                block: ContentBlockStart::ToolUse {
                    id: "call-1".to_string(),
                    name: name.to_string(),
                },
            },
            StreamEvent::ContentDelta {
                index: 1,
                delta: ContentDelta::ToolUseDelta {
                    partial: PartialToolUse {
                        id: None,
                        name: Some(name.to_string()),
                        partial_json: r#"{"latitude":1.0,"longitude":2.0}"#.to_string(),
                    },
                },
            },
            StreamEvent::ContentBlockEnd { index: 1 },
            StreamEvent::MessageEnd {
                finish_reason: FinishReason::Stop,
                usage: UsageMetadata::new(1, 1),
            },
        ]
    }

    fn declaration() -> ToolDeclaration {
        ToolDeclaration {
            name: "getWeather".to_string(),
            description: "weather".to_string(),
            input_schema: serde_json::json!({"type": "object"}),
        }
    }

    async fn collect(agent: &mut Agent) -> Vec<Result<AgentEvent, AgentError>> {
        agent.run().collect().await
    }

    #[test]
    fn test_agent_defaults() {
        let agent = Agent::new(
            Box::new(MockProvider::new(vec![])),
            Arc::new(MockExecutor),
            vec![],
            GenerationConfig::default(),
            None,
        );
        assert_eq!(agent.messages().len(), 0);
        assert_eq!(agent.max_iterations, DEFAULT_MAX_ITERATIONS);
    }

    #[tokio::test]
    async fn test_text_only_run_completes() {
        let provider = MockProvider::new(vec![text_turn("Hello")]);
        let saw_tools = provider.saw_tools.clone();
        let mut agent = Agent::new(
            Box::new(provider),
            Arc::new(MockExecutor),
            vec![],
            GenerationConfig::default(),
            None,
        )
        .with_history(vec![Message::user("hi")]);

        let events = collect(&mut agent).await;
        assert!(matches!(events.last(), Some(Ok(AgentEvent::Completed))));
        assert!(events.iter().any(|e| matches!(
            e,
            Ok(AgentEvent::IterationFinished { iteration: 1, finish_reason: Some(FinishReason::Stop), .. })
        )));
        assert_eq!(agent.messages().len(), 2);
        assert_eq!(*saw_tools.lock().unwrap(), vec![false]);
    }

    #[tokio::test]
    async fn test_tool_call_then_answer() {
        let provider = MockProvider::new(vec![tool_turn("getWeather"), text_turn("It is 21")]);
        let mut agent = Agent::new(
            Box::new(provider),
            Arc::new(MockExecutor),
            vec![declaration()],
            GenerationConfig::default(),
            None,
        )
        .with_history(vec![Message::user("weather?")]);

        let events = collect(&mut agent).await;
        let completed = events
            .iter()
            .filter(|e| matches!(e, Ok(AgentEvent::ToolExecutionCompleted { .. })))
            .count();
        assert_eq!(completed, 1);
        let steps = events
            .iter()
            .filter(|e| matches!(e, Ok(AgentEvent::IterationFinished { .. })))
            .count();
        assert_eq!(steps, 2);

        // user, assistant tool call, tool result, assistant answer
        assert_eq!(agent.messages().len(), 4);
        assert_eq!(agent.messages()[2].role, MessageRole::Tool);
    }

    #[tokio::test]
    async fn test_tool_failure_is_fed_back() {
        let provider = MockProvider::new(vec![tool_turn("broken"), text_turn("Sorry")]);
        let mut agent = Agent::new(
            Box::new(provider),
            Arc::new(MockExecutor),
            vec![declaration()],
            GenerationConfig::default(),
            None,
        )
        .with_history(vec![Message::user("weather?")]);

        let events = collect(&mut agent).await;
        assert!(events
            .iter()
            .any(|e| matches!(e, Ok(AgentEvent::ToolExecutionFailed { error, .. }) if error == "tool exploded")));
        match &agent.messages()[2].content[0] {
            ContentBlock::ToolResult { is_error, .. } => assert!(is_error),
            other => panic!("unexpected block {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_step_limit_completes() {
        let provider = MockProvider::new(vec![tool_turn("getWeather"), tool_turn("getWeather")]);
        let mut agent = Agent::new(
            Box::new(provider),
            Arc::new(MockExecutor),
            vec![declaration()],
            GenerationConfig::default(),
            None,
        )
        .with_history(vec![Message::user("loop")])
        .with_max_iterations(2);

        let events = collect(&mut agent).await;
        assert!(events.iter().all(|e| e.is_ok()));
        assert!(matches!(events.last(), Some(Ok(AgentEvent::Completed))));
    }

    #[tokio::test]
    async fn test_provider_error_ends_stream() {
        let mut agent = Agent::new(
            Box::new(MockProvider::new(vec![])),
            Arc::new(MockExecutor),
            vec![],
            GenerationConfig::default(),
            None,
        )
        .with_history(vec![Message::user("hi")]);

        let events: Vec<_> = agent.run().collect().await;
        assert_eq!(events.len(), 2);
        assert!(matches!(events[1], Err(AgentError::Llm(_))));
    }
}
