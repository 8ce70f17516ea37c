// GET /api/chat/{id}/stream handler

use chrono::{Duration, Utc};
use futures::stream;
use uuid::Uuid;
use warp::http::StatusCode;
use warp::reply::Response;
use warp::Reply;

use crate::auth::Session;
use crate::chat::ui::to_ui_message;
use crate::chat::UiChunk;
use crate::db::Visibility;
use crate::errors::{ChatError, ErrorType, Surface};
use crate::sse::ui_stream_reply;
use crate::state::AppState;

/// How long a finished reply is still handed to a reconnecting client
const RECENT_REPLY_SECONDS: i64 = 15;

pub async fn resume_stream_handler(
    chat_id: Uuid,
    state: AppState,
    session: Option<Session>,
) -> Result<Response, warp::Rejection> {
    match resume_stream(chat_id, state, session).await {
        Ok(response) => Ok(response),
        Err(err) => Ok(err.to_response()),
    }
}

async fn resume_stream(
    chat_id: Uuid,
    state: AppState,
    session: Option<Session>,
) -> Result<Response, ChatError> {
    let Some(streams) = state.streams.clone() else {
        return Ok(warp::reply::with_status(warp::reply(), StatusCode::NO_CONTENT).into_response());
    };

    let session = session.ok_or_else(|| ChatError::new(ErrorType::Unauthorized, Surface::Chat))?;

    let chat = state
        .store
        .get_chat_by_id(chat_id)
        .await?
        .ok_or_else(|| ChatError::new(ErrorType::NotFound, Surface::Chat))?;

    if chat.visibility == Visibility::Private && chat.user_id != session.user_id {
        return Err(ChatError::new(ErrorType::Forbidden, Surface::Chat));
    }

    let stream_ids = state.store.get_stream_ids_by_chat_id(chat_id).await?;
    let recent = stream_ids
        .last()
        .copied()
        .ok_or_else(|| ChatError::new(ErrorType::NotFound, Surface::Stream))?;

    if let Some(live) = streams.resume(recent) {
        tracing::info!(chat_id = %chat_id, stream_id = %recent, "resuming live stream");
        return Ok(ui_stream_reply(live));
    }

    // The stream already ended; hand over the reply if it just finished
    let messages = state.store.get_messages_by_chat_id(chat_id).await?;
    let chunk = messages
        .last()
        .filter(|message| message.role == "assistant")
        .filter(|message| Utc::now() - message.created_at <= Duration::seconds(RECENT_REPLY_SECONDS))
        .map(|message| UiChunk::DataAppendMessage {
            data: to_ui_message(message).to_string(),
            transient: true,
        });

    Ok(ui_stream_reply(stream::iter(chunk)))
}
