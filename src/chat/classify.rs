//! Mapping generation failures to user-facing text

use crate::llm::{AgentError, LlmError};

pub const RATE_LIMIT_MESSAGE: &str = "I apologize, but I've reached the rate limit for API requests. Please wait a moment and try again, or the request will automatically retry.";
pub const NETWORK_MESSAGE: &str = "I apologize, but I'm having trouble connecting to the AI service right now. This might be due to a network connectivity issue. Please check your internet connection and try again in a few moments.";
pub const RETRIES_MESSAGE: &str =
    "I encountered an issue while processing your request. Please try again in a moment.";
pub const GENERIC_MESSAGE: &str = "Oops, an error occurred! Please try again.";

/// Body of the 503 returned when the upstream is unreachable before streaming
pub const CONNECTIVITY_ERROR: &str =
    "Network connectivity issue. Please check your internet connection and try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    RateLimit,
    Network,
    RetriesExhausted,
    Other,
}

impl FailureKind {
    pub fn user_message(&self) -> &'static str {
        match self {
            FailureKind::RateLimit => RATE_LIMIT_MESSAGE,
            FailureKind::Network => NETWORK_MESSAGE,
            FailureKind::RetriesExhausted => RETRIES_MESSAGE,
            FailureKind::Other => GENERIC_MESSAGE,
        }
    }

    /// Failures answered with 503 when they happen before streaming starts
    pub fn is_connectivity(&self) -> bool {
        matches!(self, FailureKind::Network | FailureKind::RetriesExhausted)
    }
}

/// Classify by error text
pub fn classify_message(message: &str) -> FailureKind {
    if message.contains("Rate limit reached") || message.contains("rate_limit_exceeded") {
        FailureKind::RateLimit
    } else if message.contains("ENOTFOUND") || message.contains("generativelanguage.googleapis.com")
    {
        FailureKind::Network
    } else if message.contains("Failed after 3 attempts") {
        FailureKind::RetriesExhausted
    } else {
        FailureKind::Other
    }
}

pub fn classify_llm(err: &LlmError) -> FailureKind {
    match err {
        LlmError::RateLimitExceeded { .. } => FailureKind::RateLimit,
        LlmError::Network(_) => FailureKind::Network,
        other => classify_message(&other.to_string()),
    }
}

pub fn classify(err: &AgentError) -> FailureKind {
    match err.as_llm() {
        Some(llm) => classify_llm(llm),
        None => classify_message(&err.to_string()),
    }
}
