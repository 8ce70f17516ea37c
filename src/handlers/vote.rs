// GET /api/vote and PATCH /api/vote handlers

use bytes::Bytes;
use std::collections::HashMap;
use uuid::Uuid;
use warp::reply::Response;
use warp::Reply;

use crate::auth::Session;
use crate::errors::{ChatError, ErrorType, Surface};
use crate::models::{VoteRequest, VoteType};
use crate::state::AppState;

/// Load the chat and check the caller owns it
async fn owned_chat(state: &AppState, chat_id: Uuid, session: &Session) -> Result<(), ChatError> {
    let chat = state
        .store
        .get_chat_by_id(chat_id)
        .await?
        .ok_or_else(|| ChatError::new(ErrorType::NotFound, Surface::Chat))?;

    if chat.user_id != session.user_id {
        return Err(ChatError::new(ErrorType::Forbidden, Surface::Vote));
    }
    Ok(())
}

pub async fn get_votes_handler(
    state: AppState,
    session: Option<Session>,
    query: HashMap<String, String>,
) -> Result<Response, warp::Rejection> {
    let result = async {
        let chat_id = query
            .get("chatId")
            .and_then(|id| Uuid::parse_str(id).ok())
            .ok_or_else(|| ChatError::bad_request_api().with_cause("Parameter chatId is required."))?;
        let session = session.ok_or_else(|| ChatError::new(ErrorType::Unauthorized, Surface::Vote))?;

        owned_chat(&state, chat_id, &session).await?;
        let votes = state.store.get_votes_by_chat_id(chat_id).await?;
        Ok::<_, ChatError>(warp::reply::json(&votes).into_response())
    }
    .await;

    Ok(result.unwrap_or_else(|err| err.to_response()))
}

pub async fn patch_vote_handler(
    state: AppState,
    session: Option<Session>,
    body: Bytes,
) -> Result<Response, warp::Rejection> {
    let result = async {
        let required = || {
            ChatError::bad_request_api()
                .with_cause("Parameters chatId, messageId, and type are required.")
        };

        let request: VoteRequest = serde_json::from_slice(&body).map_err(|_| required())?;
        let (Some(chat_id), Some(message_id), Some(vote_type)) =
            (request.chat_id, request.message_id, request.vote_type)
        else {
            return Err(required());
        };

        let session = session.ok_or_else(|| ChatError::new(ErrorType::Unauthorized, Surface::Vote))?;

        owned_chat(&state, chat_id, &session).await?;
        state
            .store
            .vote_message(chat_id, message_id, vote_type == VoteType::Up)
            .await?;

        tracing::debug!(chat_id = %chat_id, message_id = %message_id, "message voted");
        Ok::<_, ChatError>(
            warp::reply::with_status("Message voted", warp::http::StatusCode::OK).into_response(),
        )
    }
    .await;

    Ok(result.unwrap_or_else(|err| err.to_response()))
}
