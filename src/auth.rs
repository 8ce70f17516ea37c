//! Session tokens
//!
//! A session is a signed JWT sent as `Authorization: Bearer <token>`. A
//! missing, malformed or expired token simply means "no session"; each
//! handler decides how to answer an anonymous caller.

use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;
use warp::Filter;

/// Lifetime of a freshly issued guest session
pub const GUEST_SESSION_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    Guest,
    Regular,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    #[serde(rename = "type")]
    pub user_type: UserType,
    pub exp: usize,
}

/// The authenticated caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    pub user_id: Uuid,
    pub user_type: UserType,
}

/// Signing and verification keys derived from the server secret
#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl SessionKeys {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Issue a token for `user_id` valid for `ttl`
    pub fn issue(
        &self,
        user_id: Uuid,
        user_type: UserType,
        ttl: chrono::Duration,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let exp = (Utc::now() + ttl).timestamp().max(0) as usize;
        let claims = Claims {
            sub: user_id,
            user_type,
            exp,
        };
        encode(&Header::default(), &claims, &self.encoding)
    }

    pub fn verify(&self, token: &str) -> Option<Session> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default()).ok()?;
        Some(Session {
            user_id: data.claims.sub,
            user_type: data.claims.user_type,
        })
    }

    /// Resolve an `Authorization` header value to a session
    pub fn session_from_header(&self, header: Option<&str>) -> Option<Session> {
        let token = header?.strip_prefix("Bearer ")?.trim();
        if token.is_empty() {
            return None;
        }
        self.verify(token)
    }
}

/// Extract the optional session of the caller
pub fn with_session(
    keys: Arc<SessionKeys>,
) -> impl Filter<Extract = (Option<Session>,), Error = warp::Rejection> + Clone {
    warp::header::optional::<String>("authorization")
        .map(move |header: Option<String>| keys.session_from_header(header.as_deref()))
}
