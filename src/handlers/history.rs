// GET /api/history handler

use std::collections::HashMap;
use uuid::Uuid;
use warp::reply::Response;
use warp::Reply;

use crate::auth::Session;
use crate::db::PageCursor;
use crate::errors::{ChatError, ErrorType, Surface};
use crate::state::AppState;

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

fn parse_uuid(query: &HashMap<String, String>, name: &str) -> Result<Option<Uuid>, ChatError> {
    match query.get(name).filter(|value| !value.is_empty()) {
        None => Ok(None),
        Some(value) => Uuid::parse_str(value)
            .map(Some)
            .map_err(|_| ChatError::bad_request_api().with_cause(format!("Invalid {}", name))),
    }
}

/// Resolve the page size and cursor of a history query
///
/// Page sizes above `MAX_PAGE_SIZE` are clamped to it.
pub fn parse_history_query(query: &HashMap<String, String>) -> Result<(i64, PageCursor), ChatError> {
    let limit = match query.get("limit").filter(|value| !value.is_empty()) {
        None => DEFAULT_PAGE_SIZE,
        Some(value) => value
            .parse::<i64>()
            .ok()
            .filter(|limit| *limit > 0)
            .ok_or_else(|| ChatError::bad_request_api().with_cause("Invalid limit"))?
            .min(MAX_PAGE_SIZE),
    };

    let cursor = match (
        parse_uuid(query, "starting_after")?,
        parse_uuid(query, "ending_before")?,
    ) {
        (Some(_), Some(_)) => {
            return Err(ChatError::bad_request_api()
                .with_cause("Only one of starting_after or ending_before can be provided."))
        }
        (Some(id), None) => PageCursor::StartingAfter(id),
        (None, Some(id)) => PageCursor::EndingBefore(id),
        (None, None) => PageCursor::Latest,
    };

    Ok((limit, cursor))
}

pub async fn history_handler(
    state: AppState,
    session: Option<Session>,
    query: HashMap<String, String>,
) -> Result<Response, warp::Rejection> {
    let (limit, cursor) = match parse_history_query(&query) {
        Ok(parsed) => parsed,
        Err(err) => return Ok(err.to_response()),
    };

    let Some(session) = session else {
        return Ok(ChatError::new(ErrorType::Unauthorized, Surface::Chat).to_response());
    };

    match state
        .store
        .get_chats_by_user_id(session.user_id, limit, cursor)
        .await
    {
        Ok(page) => Ok(warp::reply::json(&page).into_response()),
        Err(e) => Ok(ChatError::from(e).to_response()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let (limit, cursor) = parse_history_query(&query(&[])).unwrap();
        assert_eq!(limit, DEFAULT_PAGE_SIZE);
        assert_eq!(cursor, PageCursor::Latest);
    }

    #[test]
    fn test_cursors() {
        let id = Uuid::new_v4();
        let (_, cursor) =
            parse_history_query(&query(&[("ending_before", &id.to_string())])).unwrap();
        assert_eq!(cursor, PageCursor::EndingBefore(id));

        let err = parse_history_query(&query(&[
            ("starting_after", &id.to_string()),
            ("ending_before", &id.to_string()),
        ]))
        .unwrap_err();
        assert_eq!(err.code(), "bad_request:api");
    }

    #[test]
    fn test_invalid_values() {
        assert!(parse_history_query(&query(&[("limit", "zero")])).is_err());
        assert!(parse_history_query(&query(&[("limit", "-1")])).is_err());
        assert!(parse_history_query(&query(&[("starting_after", "nope")])).is_err());
        assert!(parse_history_query(&query(&[("limit", "9223372036854775808")])).is_err());
    }

    #[test]
    fn test_oversized_limit_is_clamped() {
        let (limit, _) =
            parse_history_query(&query(&[("limit", &i64::MAX.to_string())])).unwrap();
        assert_eq!(limit, MAX_PAGE_SIZE);

        let (limit, _) = parse_history_query(&query(&[("limit", "100")])).unwrap();
        assert_eq!(limit, 100);
        let (limit, _) = parse_history_query(&query(&[("limit", "101")])).unwrap();
        assert_eq!(limit, MAX_PAGE_SIZE);
    }
}
