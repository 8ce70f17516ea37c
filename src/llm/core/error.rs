//! Error types for the LLM layer

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when using LLM providers
#[derive(Debug, Error)]
pub enum LlmError {
    /// Missing or rejected API key
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// The upstream host could not be reached
    #[error("Network error: {0}")]
    Network(String),

    /// HTTP request failures
    #[error("HTTP error (status {status}): {body}")]
    HttpError { status: u16, body: String },

    /// SSE stream parsing failures
    #[error("Stream error: {0}")]
    StreamError(String),

    /// JSON encoding/decoding issues
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Invalid request parameters
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Upstream quota hit (HTTP 429)
    #[error("Rate limit reached (retry after {retry_after:?})")]
    RateLimitExceeded { retry_after: Option<Duration> },

    /// Provider-specific errors
    #[error("Provider error ({code}): {message}")]
    ProviderError { code: String, message: String },
}

impl LlmError {
    /// Map a non-success upstream status to an error
    pub fn from_status(status: u16, body: String, retry_after: Option<Duration>) -> Self {
        match status {
            429 => LlmError::RateLimitExceeded { retry_after },
            401 | 403 => LlmError::AuthenticationError(body),
            _ => LlmError::HttpError { status, body },
        }
    }
}

impl From<serde_json::Error> for LlmError {
    fn from(err: serde_json::Error) -> Self {
        LlmError::SerializationError(err.to_string())
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return LlmError::from_status(status.as_u16(), err.to_string(), None);
        }

        // reqwest includes the target URL in the message, so connect
        // failures name the upstream host.
        if err.is_connect() || err.is_timeout() {
            return LlmError::Network(err.to_string());
        }

        LlmError::HttpError {
            status: 0,
            body: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authentication_error() {
        let err = LlmError::AuthenticationError("API key not valid".to_string());
        assert!(err.to_string().contains("Authentication error"));
        assert!(err.to_string().contains("API key not valid"));
    }

    #[test]
    fn test_http_error() {
        let err = LlmError::HttpError {
            status: 404,
            body: "Not found".to_string(),
        };
        assert!(err.to_string().contains("404"));
        assert!(err.to_string().contains("Not found"));
    }

    #[test]
    fn test_rate_limit_message() {
        let err = LlmError::RateLimitExceeded {
            retry_after: Some(Duration::from_secs(60)),
        };
        assert!(err.to_string().contains("Rate limit reached"));
    }

    #[test]
    fn test_from_status() {
        assert!(matches!(
            LlmError::from_status(429, String::new(), None),
            LlmError::RateLimitExceeded { .. }
        ));
        assert!(matches!(
            LlmError::from_status(403, "denied".to_string(), None),
            LlmError::AuthenticationError(_)
        ));
        assert!(matches!(
            LlmError::from_status(500, "boom".to_string(), None),
            LlmError::HttpError { status: 500, .. }
        ));
    }

    #[test]
    fn test_from_serde_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let llm_err: LlmError = json_err.into();
        assert!(matches!(llm_err, LlmError::SerializationError(_)));
    }
}
