//! LLM abstraction layer
//!
//! A provider-neutral request and event model, the hosted generative-language
//! backend, stream middleware, tool execution and the multi-step agent loop.

pub mod agent;
pub mod catalogue;
pub mod core;
pub mod factory;
pub mod gemini;
pub mod middleware;
pub mod text;
pub mod tools;

// Re-export commonly used types
pub use core::{
    config::GenerationConfig,
    error::LlmError,
    provider::{EventStream, LlmProvider},
    types::{
        ContentBlock, ContentDelta, FinishReason, GenerateRequest, Message, MessageRole,
        StreamEvent, ToolDeclaration, UsageMetadata,
    },
};

pub use agent::{Agent, AgentError, AgentEvent};
pub use catalogue::{ChatModel, ChatModelId};
pub use factory::{GoogleProviderFactory, ProviderFactory};
pub use tools::{FunctionRegistry, ToolExecutor};
