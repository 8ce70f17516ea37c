//! Application error carried by every HTTP handler
//!
//! A `ChatError` is identified by a `type:surface` code. The code picks the
//! HTTP status (from the type) and the user-facing message (from the full
//! code). Errors on the `database` surface are never shown to clients: the
//! cause is logged and the response body is generic.

use serde::Serialize;
use std::fmt;
use warp::http::StatusCode;
use warp::reply::Response;
use warp::Reply;

use crate::db::Error as DbError;

const GENERIC_MESSAGE: &str = "Something went wrong. Please try again later.";

/// What went wrong
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorType {
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    RateLimit,
    Offline,
}

impl ErrorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorType::BadRequest => "bad_request",
            ErrorType::Unauthorized => "unauthorized",
            ErrorType::Forbidden => "forbidden",
            ErrorType::NotFound => "not_found",
            ErrorType::RateLimit => "rate_limit",
            ErrorType::Offline => "offline",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorType::BadRequest => StatusCode::BAD_REQUEST,
            ErrorType::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorType::Forbidden => StatusCode::FORBIDDEN,
            ErrorType::NotFound => StatusCode::NOT_FOUND,
            ErrorType::RateLimit => StatusCode::TOO_MANY_REQUESTS,
            ErrorType::Offline => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

/// Where it went wrong
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    Chat,
    Auth,
    Api,
    Stream,
    Database,
    History,
    Vote,
    Profile,
}

impl Surface {
    pub fn as_str(&self) -> &'static str {
        match self {
            Surface::Chat => "chat",
            Surface::Auth => "auth",
            Surface::Api => "api",
            Surface::Stream => "stream",
            Surface::Database => "database",
            Surface::History => "history",
            Surface::Vote => "vote",
            Surface::Profile => "profile",
        }
    }

    /// Whether errors on this surface may be shown to the caller
    fn is_visible(&self) -> bool {
        !matches!(self, Surface::Database)
    }
}

/// Typed application error with a machine-readable code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatError {
    pub error_type: ErrorType,
    pub surface: Surface,
    pub cause: Option<String>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    code: String,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    cause: Option<&'a str>,
}

impl ChatError {
    pub fn new(error_type: ErrorType, surface: Surface) -> Self {
        Self {
            error_type,
            surface,
            cause: None,
        }
    }

    pub fn with_cause(mut self, cause: impl Into<String>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    pub fn bad_request_api() -> Self {
        Self::new(ErrorType::BadRequest, Surface::Api)
    }

    pub fn code(&self) -> String {
        format!("{}:{}", self.error_type.as_str(), self.surface.as_str())
    }

    pub fn message(&self) -> &'static str {
        message_for_code(&self.code())
    }

    pub fn status_code(&self) -> StatusCode {
        self.error_type.status_code()
    }

    pub fn to_response(&self) -> Response {
        let code = self.code();

        if !self.surface.is_visible() {
            tracing::error!(
                code = %code,
                message = self.message(),
                cause = self.cause.as_deref().unwrap_or(""),
                "request failed"
            );

            let body = ErrorBody {
                code: String::new(),
                message: GENERIC_MESSAGE,
                cause: None,
            };
            return warp::reply::with_status(warp::reply::json(&body), self.status_code())
                .into_response();
        }

        let body = ErrorBody {
            code,
            message: self.message(),
            cause: self.cause.as_deref(),
        };
        warp::reply::with_status(warp::reply::json(&body), self.status_code()).into_response()
    }
}

impl fmt::Display for ChatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code(), self.message())?;
        if let Some(cause) = &self.cause {
            write!(f, " ({})", cause)?;
        }
        Ok(())
    }
}

impl std::error::Error for ChatError {}

impl warp::reject::Reject for ChatError {}

impl Reply for ChatError {
    fn into_response(self) -> Response {
        self.to_response()
    }
}

impl From<DbError> for ChatError {
    fn from(err: DbError) -> Self {
        ChatError::new(ErrorType::BadRequest, Surface::Database).with_cause(err.to_string())
    }
}

/// User-facing message for an error code
pub fn message_for_code(code: &str) -> &'static str {
    if code.contains("database") {
        return "An error occurred while executing a database query.";
    }

    match code {
        "bad_request:api" => {
            "The request couldn't be processed. Please check your input and try again."
        }
        "unauthorized:auth" => "You need to sign in before continuing.",
        "forbidden:auth" => "Your account does not have access to this feature.",
        "rate_limit:chat" => {
            "You have exceeded your maximum number of messages for the day. Please try again later."
        }
        "not_found:chat" => {
            "The requested chat was not found. Please check the chat ID and try again."
        }
        "forbidden:chat" => {
            "This chat belongs to another user. Please check the chat ID and try again."
        }
        "unauthorized:chat" => {
            "You need to sign in to view this chat. Please sign in and try again."
        }
        "offline:chat" => {
            "We're having trouble sending your message. Please check your internet connection and try again."
        }
        _ => GENERIC_MESSAGE,
    }
}

/// A JSON `{"error": ...}` body with the given status
///
/// Used by the endpoints that answer with a bare error string instead of a
/// coded `ChatError`.
pub fn json_error(message: &str, status: StatusCode) -> Response {
    warp::reply::with_status(
        warp::reply::json(&serde_json::json!({ "error": message })),
        status,
    )
    .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = warp::hyper::body::to_bytes(response.into_body())
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_code_format() {
        let err = ChatError::new(ErrorType::RateLimit, Surface::Chat);
        assert_eq!(err.code(), "rate_limit:chat");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(ErrorType::BadRequest.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorType::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ErrorType::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(ErrorType::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorType::RateLimit.status_code(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(ErrorType::Offline.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_messages_by_code() {
        assert_eq!(
            message_for_code("forbidden:chat"),
            "This chat belongs to another user. Please check the chat ID and try again."
        );
        assert_eq!(
            message_for_code("bad_request:database"),
            "An error occurred while executing a database query."
        );
        assert_eq!(message_for_code("not_found:vote"), GENERIC_MESSAGE);
    }

    #[tokio::test]
    async fn test_visible_error_response() {
        let err = ChatError::new(ErrorType::Unauthorized, Surface::Chat);
        let response = err.to_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = body_json(response).await;
        assert_eq!(body["code"], "unauthorized:chat");
        assert_eq!(
            body["message"],
            "You need to sign in to view this chat. Please sign in and try again."
        );
        assert!(body.get("cause").is_none());
    }

    #[tokio::test]
    async fn test_database_error_is_hidden() {
        let err = ChatError::from(DbError::DatabaseError("relation missing".to_string()));
        let response = err.to_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["code"], "");
        assert_eq!(body["message"], GENERIC_MESSAGE);
        assert!(body.get("cause").is_none());
    }

    #[tokio::test]
    async fn test_cause_is_included() {
        let err = ChatError::bad_request_api()
            .with_cause("Only one of starting_after or ending_before can be provided.");
        let body = body_json(err.to_response()).await;
        assert_eq!(
            body["cause"],
            "Only one of starting_after or ending_before can be provided."
        );
    }
}
