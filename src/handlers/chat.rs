// POST /api/chat and DELETE /api/chat handlers

use bytes::Bytes;
use std::collections::HashMap;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use uuid::Uuid;
use warp::http::{HeaderMap, StatusCode};
use warp::reply::Response;
use warp::Reply;

use crate::auth::Session;
use crate::chat::classify::{classify_llm, CONNECTIVITY_ERROR};
use crate::chat::prompts::{system_prompt, RequestHints};
use crate::chat::title::{fallback_title, generate_title};
use crate::chat::ui::to_model_messages;
use crate::chat::{entitlements_for, spawn_generation, ChunkSink, GenerationJob};
use crate::db::{self, Chat, StoredMessage};
use crate::errors::{json_error, ChatError, ErrorType, Surface};
use crate::llm::middleware::SmoothWords;
use crate::llm::LlmError;
use crate::models::{DeleteChatResponse, PostChatRequest};
use crate::sse::ui_stream_reply;
use crate::state::AppState;

pub const MISSING_API_KEY: &str =
    "API key not configured. Please add your Google API key in settings.";

/// Window of the daily message quota
const QUOTA_WINDOW_HOURS: i64 = 24;

/// Why a chat request ended before streaming
#[derive(Debug)]
enum PostChatFailure {
    Chat(ChatError),
    Upstream(LlmError),
}

impl From<ChatError> for PostChatFailure {
    fn from(err: ChatError) -> Self {
        PostChatFailure::Chat(err)
    }
}

impl From<db::Error> for PostChatFailure {
    fn from(err: db::Error) -> Self {
        PostChatFailure::Chat(err.into())
    }
}

impl From<LlmError> for PostChatFailure {
    fn from(err: LlmError) -> Self {
        PostChatFailure::Upstream(err)
    }
}

impl PostChatFailure {
    fn into_response(self) -> Response {
        match self {
            PostChatFailure::Chat(err) => err.to_response(),
            PostChatFailure::Upstream(err) => {
                tracing::error!(error = %err, "chat request failed before streaming");
                if classify_llm(&err).is_connectivity() {
                    json_error(CONNECTIVITY_ERROR, StatusCode::SERVICE_UNAVAILABLE)
                } else {
                    ChatError::bad_request_api().to_response()
                }
            }
        }
    }
}

pub async fn post_chat_handler(
    state: AppState,
    session: Option<Session>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, warp::Rejection> {
    let request = match PostChatRequest::parse(&body) {
        Ok(request) => request,
        Err(reason) => {
            tracing::debug!(reason = %reason, "rejected chat request");
            return Ok(ChatError::bad_request_api().to_response());
        }
    };

    match post_chat(state, session, headers, request).await {
        Ok(response) => Ok(response),
        Err(failure) => Ok(failure.into_response()),
    }
}

async fn post_chat(
    state: AppState,
    session: Option<Session>,
    headers: HeaderMap,
    request: PostChatRequest,
) -> Result<Response, PostChatFailure> {
    let session = session.ok_or_else(|| ChatError::new(ErrorType::Unauthorized, Surface::Chat))?;

    let Some(api_key) = request.api_key().map(str::to_string) else {
        return Ok(json_error(MISSING_API_KEY, StatusCode::BAD_REQUEST));
    };

    let entitlements = entitlements_for(session.user_type);
    let message_count = state
        .store
        .get_message_count_by_user_id(session.user_id, QUOTA_WINDOW_HOURS)
        .await?;
    if message_count > entitlements.max_messages_per_day {
        return Err(ChatError::new(ErrorType::RateLimit, Surface::Chat).into());
    }

    let chat_id = request.id;
    match state.store.get_chat_by_id(chat_id).await? {
        None => {
            let title = chat_title(&state, &api_key, &request).await;
            let chat = Chat::new(
                chat_id,
                session.user_id,
                title,
                request.selected_visibility_type,
            );
            state.store.save_chat(chat).await?;
        }
        Some(chat) if chat.user_id != session.user_id => {
            return Err(ChatError::new(ErrorType::Forbidden, Surface::Chat).into());
        }
        Some(_) => {}
    }

    let mut stored = state.store.get_messages_by_chat_id(chat_id).await?;

    let parts = serde_json::to_value(&request.message.parts)
        .map_err(|e| ChatError::bad_request_api().with_cause(e.to_string()))?;
    let user_message = StoredMessage::new(request.message.id, chat_id, "user", parts);
    state.store.save_messages(vec![user_message.clone()]).await?;
    stored.push(user_message);

    let stream_id = Uuid::new_v4();
    state.store.create_stream_id(stream_id, chat_id).await?;

    let model = state
        .providers
        .language_model(&api_key, request.selected_chat_model)?;
    let provider = Box::new(SmoothWords::new(model, state.smooth_delay));

    let user_text = request.message.texts().collect::<Vec<_>>().join(" ");
    let system = system_prompt(&RequestHints::from_headers(&headers), &user_text);

    let (tx, rx) = mpsc::unbounded_channel();
    let mut sink = ChunkSink::new(tx);
    if let Some(streams) = &state.streams {
        streams.create(stream_id);
        sink = sink.with_replay(streams.clone(), stream_id);
    }

    tracing::info!(
        chat_id = %chat_id,
        stream_id = %stream_id,
        model = request.selected_chat_model.as_str(),
        "streaming chat reply"
    );

    spawn_generation(
        state.store.clone(),
        state.tools.clone(),
        sink,
        GenerationJob {
            chat_id,
            provider,
            history: to_model_messages(&stored),
            system,
        },
    );

    Ok(ui_stream_reply(UnboundedReceiverStream::new(rx)))
}

/// Title for a new chat, falling back to the message text
async fn chat_title(state: &AppState, api_key: &str, request: &PostChatRequest) -> String {
    let generated = match state.providers.title_model(api_key) {
        Ok(model) => match serde_json::to_value(&request.message) {
            Ok(message) => generate_title(model.as_ref(), &message).await,
            Err(e) => Err(LlmError::SerializationError(e.to_string())),
        },
        Err(e) => Err(e),
    };

    match generated {
        Ok(title) => title,
        Err(e) => {
            tracing::warn!(error = %e, "title generation failed, using message text");
            fallback_title(request.message.texts())
        }
    }
}

pub async fn delete_chat_handler(
    state: AppState,
    session: Option<Session>,
    query: HashMap<String, String>,
) -> Result<Response, warp::Rejection> {
    let Some(id) = query.get("id").and_then(|id| Uuid::parse_str(id).ok()) else {
        return Ok(ChatError::bad_request_api().to_response());
    };

    let Some(session) = session else {
        return Ok(ChatError::new(ErrorType::Unauthorized, Surface::Chat).to_response());
    };

    let chat = match state.store.get_chat_by_id(id).await {
        Ok(chat) => chat,
        Err(e) => return Ok(ChatError::from(e).to_response()),
    };

    let Some(chat) = chat else {
        return Ok(deleted(id, "Chat already deleted"));
    };

    if chat.user_id != session.user_id {
        return Ok(ChatError::new(ErrorType::Forbidden, Surface::Chat).to_response());
    }

    match state.store.delete_chat_by_id(id).await {
        Ok(()) => {
            tracing::info!(chat_id = %id, "chat deleted");
            Ok(deleted(id, "Chat deleted successfully"))
        }
        Err(e) => {
            tracing::error!(chat_id = %id, error = %e, "failed to delete chat");
            Ok(json_error(
                "Failed to delete chat",
                StatusCode::INTERNAL_SERVER_ERROR,
            ))
        }
    }
}

fn deleted(id: Uuid, message: &'static str) -> Response {
    warp::reply::json(&DeleteChatResponse { id, message }).into_response()
}
