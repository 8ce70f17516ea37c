//! Provider wrappers that transform another provider's event stream

pub mod reasoning;
pub mod smooth;

pub use reasoning::{ExtractReasoning, ReasoningExtractor, Segment};
pub use smooth::SmoothWords;
