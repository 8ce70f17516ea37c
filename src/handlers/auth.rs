// POST /api/auth/guest handler

use warp::reply::Response;
use warp::Reply;

use crate::auth::{UserType, GUEST_SESSION_DAYS};
use crate::errors::{ChatError, ErrorType, Surface};
use crate::models::GuestSessionResponse;
use crate::state::AppState;

pub async fn guest_handler(state: AppState) -> Result<Response, warp::Rejection> {
    let user = match state.store.create_guest_user().await {
        Ok(user) => user,
        Err(e) => return Ok(ChatError::from(e).to_response()),
    };

    let token = match state.sessions.issue(
        user.id,
        UserType::Guest,
        chrono::Duration::days(GUEST_SESSION_DAYS),
    ) {
        Ok(token) => token,
        Err(e) => {
            tracing::error!(error = %e, "failed to sign guest session");
            return Ok(ChatError::new(ErrorType::BadRequest, Surface::Auth).to_response());
        }
    };

    tracing::info!(user_id = %user.id, "guest session created");
    Ok(warp::reply::json(&GuestSessionResponse {
        user_id: user.id,
        user_type: UserType::Guest,
        token,
    })
    .into_response())
}
