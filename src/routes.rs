// Route definitions

use std::collections::HashMap;
use uuid::Uuid;
use warp::Filter;

use crate::auth::with_session;
use crate::handlers;
use crate::state::{with_state, AppState};

pub fn configure_routes(
    state: AppState,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let session = with_session(state.sessions.clone());

    // POST /api/chat
    let post_chat = warp::path!("api" / "chat")
        .and(warp::post())
        .and(with_state(state.clone()))
        .and(session.clone())
        .and(warp::header::headers_cloned())
        .and(warp::body::bytes())
        .and_then(handlers::post_chat_handler);

    // DELETE /api/chat?id=
    let delete_chat = warp::path!("api" / "chat")
        .and(warp::delete())
        .and(with_state(state.clone()))
        .and(session.clone())
        .and(warp::query::<HashMap<String, String>>())
        .and_then(handlers::delete_chat_handler);

    // GET /api/chat/{chatId}/stream
    let resume_stream = warp::path!("api" / "chat" / Uuid / "stream")
        .and(warp::get())
        .and(with_state(state.clone()))
        .and(session.clone())
        .and_then(handlers::resume_stream_handler);

    // GET /api/profile
    let get_profile = warp::path!("api" / "profile")
        .and(warp::get())
        .and(with_state(state.clone()))
        .and(session.clone())
        .and_then(handlers::get_profile_handler);

    // PUT /api/profile
    let put_profile = warp::path!("api" / "profile")
        .and(warp::put())
        .and(with_state(state.clone()))
        .and(session.clone())
        .and(warp::body::bytes())
        .and_then(handlers::put_profile_handler);

    // GET /api/history
    let history = warp::path!("api" / "history")
        .and(warp::get())
        .and(with_state(state.clone()))
        .and(session.clone())
        .and(warp::query::<HashMap<String, String>>())
        .and_then(handlers::history_handler);

    // GET /api/vote?chatId=
    let get_votes = warp::path!("api" / "vote")
        .and(warp::get())
        .and(with_state(state.clone()))
        .and(session.clone())
        .and(warp::query::<HashMap<String, String>>())
        .and_then(handlers::get_votes_handler);

    // PATCH /api/vote
    let patch_vote = warp::path!("api" / "vote")
        .and(warp::patch())
        .and(with_state(state.clone()))
        .and(session.clone())
        .and(warp::body::bytes())
        .and_then(handlers::patch_vote_handler);

    // POST /api/auth/guest
    let guest = warp::path!("api" / "auth" / "guest")
        .and(warp::post())
        .and(with_state(state))
        .and_then(handlers::guest_handler);

    // GET /api/models
    let models = warp::path!("api" / "models")
        .and(warp::get())
        .and(session)
        .and_then(handlers::models_handler);

    post_chat
        .or(delete_chat)
        .or(resume_stream)
        .or(get_profile)
        .or(put_profile)
        .or(history)
        .or(get_votes)
        .or(patch_vote)
        .or(guest)
        .or(models)
        .with(warp::trace::request())
}
