//! Chat domain: quotas, prompts, the UI stream and reply generation

pub mod classify;
pub mod entitlements;
pub mod pipeline;
pub mod prompts;
pub mod resumable;
pub mod title;
pub mod ui;
pub mod writer;

pub use entitlements::{entitlements_for, Entitlements};
pub use pipeline::{spawn_generation, GenerationJob};
pub use resumable::StreamRegistry;
pub use ui::UiChunk;
pub use writer::{ChunkSink, UiMessageWriter};
