//! Background generation of an assistant reply
//!
//! Generation runs on its own task. It keeps going when the HTTP client
//! disconnects so the reply is always persisted.

use std::sync::Arc;

use futures::StreamExt;
use serde_json::Value;
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::classify::classify;
use super::writer::{ChunkSink, UiMessageWriter};
use crate::db::{ChatStore, StoredMessage};
use crate::llm::{Agent, FunctionRegistry, GenerationConfig, LlmProvider, Message, ToolExecutor};

/// Everything one reply needs
pub struct GenerationJob {
    pub chat_id: Uuid,
    pub provider: Box<dyn LlmProvider>,
    /// Model context, ending with the new user message
    pub history: Vec<Message>,
    pub system: String,
}

/// Start generating the reply for `job`, emitting chunks into `sink`
///
/// The assistant message is saved once generation ends, including the
/// partial content of a failed run. The sink is closed last.
pub fn spawn_generation(
    store: Arc<dyn ChatStore>,
    tools: Arc<FunctionRegistry>,
    sink: ChunkSink,
    job: GenerationJob,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let message_id = Uuid::new_v4();
        let chat_id = job.chat_id;
        let mut writer = UiMessageWriter::new(message_id, sink.clone());
        writer.start();

        let declarations = tools.declarations();
        let executor: Arc<dyn ToolExecutor> = tools;
        let mut agent = Agent::new(
            job.provider,
            executor,
            declarations,
            GenerationConfig::default(),
            Some(job.system),
        )
        .with_history(job.history);

        let mut events = agent.run();
        while let Some(item) = events.next().await {
            match item {
                Ok(event) => writer.handle(event),
                Err(err) => {
                    let kind = classify(&err);
                    tracing::error!(chat_id = %chat_id, error = %err, kind = ?kind, "generation failed");
                    writer.fail(kind.user_message());
                    break;
                }
            }
        }
        drop(events);

        if writer.has_content() {
            let parts = writer.finish_parts();
            let message = StoredMessage::new(message_id, chat_id, "assistant", Value::Array(parts));
            match store.save_messages(vec![message]).await {
                Ok(()) => tracing::debug!(chat_id = %chat_id, message_id = %message_id, "assistant message saved"),
                Err(e) => tracing::error!(chat_id = %chat_id, error = %e, "failed to save assistant message"),
            }
        }

        sink.close();
    })
}
