//! Gemini provider implementation
//!
//! Client for Google's generative-language API, implementing the
//! LlmProvider trait.

pub mod client;
pub mod mapper;
pub mod sse;
pub mod types;

pub use client::{GeminiClient, GeminiModel};
