// GET /api/profile and PUT /api/profile handlers

use bytes::Bytes;
use warp::http::StatusCode;
use warp::reply::Response;
use warp::Reply;

use crate::auth::Session;
use crate::db::ProfileUpdate;
use crate::errors::json_error;
use crate::models::DefaultProfile;
use crate::state::AppState;

fn unauthorized() -> Response {
    json_error("Unauthorized", StatusCode::UNAUTHORIZED)
}

pub async fn get_profile_handler(
    state: AppState,
    session: Option<Session>,
) -> Result<Response, warp::Rejection> {
    let Some(session) = session else {
        return Ok(unauthorized());
    };

    match state.store.get_profile(session.user_id).await {
        Ok(Some(profile)) => Ok(warp::reply::json(&profile).into_response()),
        Ok(None) => Ok(warp::reply::json(&DefaultProfile::default()).into_response()),
        Err(e) => {
            tracing::error!(user_id = %session.user_id, error = %e, "failed to fetch profile");
            Ok(json_error(
                "Failed to fetch profile",
                StatusCode::INTERNAL_SERVER_ERROR,
            ))
        }
    }
}

pub async fn put_profile_handler(
    state: AppState,
    session: Option<Session>,
    body: Bytes,
) -> Result<Response, warp::Rejection> {
    let Some(session) = session else {
        return Ok(unauthorized());
    };

    let failed = || json_error("Failed to update profile", StatusCode::INTERNAL_SERVER_ERROR);

    let update: ProfileUpdate = match serde_json::from_slice(&body) {
        Ok(update) => update,
        Err(e) => {
            tracing::warn!(error = %e, "invalid profile body");
            return Ok(failed());
        }
    };

    match state.store.upsert_profile(session.user_id, update).await {
        Ok(profile) => {
            tracing::info!(user_id = %session.user_id, "profile saved");
            Ok(warp::reply::json(&profile).into_response())
        }
        Err(e) => {
            tracing::error!(user_id = %session.user_id, error = %e, "failed to update profile");
            Ok(failed())
        }
    }
}
