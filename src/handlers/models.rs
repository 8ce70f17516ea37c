// GET /api/models handler

use warp::reply::Response;
use warp::Reply;

use crate::auth::{Session, UserType};
use crate::chat::entitlements_for;
use crate::llm::catalogue::{chat_models, ChatModel};

/// Catalogue entries the caller may pick; anonymous callers see the guest set
pub fn available_models(session: Option<&Session>) -> Vec<ChatModel> {
    let user_type = session.map_or(UserType::Guest, |s| s.user_type);
    let entitlements = entitlements_for(user_type);
    chat_models()
        .into_iter()
        .filter(|model| entitlements.allows(model.id))
        .collect()
}

pub async fn models_handler(session: Option<Session>) -> Result<Response, warp::Rejection> {
    Ok(warp::reply::json(&available_models(session.as_ref())).into_response())
}
