use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_postgres::Row;
use uuid::Uuid;

use crate::db::error::{Error, Result};

/// Who can read a chat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Private,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Visibility {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "public" => Ok(Visibility::Public),
            "private" => Ok(Visibility::Private),
            other => Err(Error::ValidationError(format!(
                "Unknown visibility: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
}

/// A conversation thread owned by a user
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub title: String,
    pub user_id: Uuid,
    pub visibility: Visibility,
}

impl Chat {
    pub fn new(id: Uuid, user_id: Uuid, title: impl Into<String>, visibility: Visibility) -> Self {
        Self {
            id,
            created_at: Utc::now(),
            title: title.into(),
            user_id,
            visibility,
        }
    }

    pub(crate) fn from_row(row: &Row) -> Result<Self> {
        let visibility: String = row.get("visibility");
        Ok(Self {
            id: row.get("id"),
            created_at: row.get("createdAt"),
            title: row.get("title"),
            user_id: row.get("userId"),
            visibility: visibility.parse()?,
        })
    }
}

/// A stored chat message
///
/// `parts` holds the UI message parts exactly as they were streamed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredMessage {
    pub id: Uuid,
    pub chat_id: Uuid,
    pub role: String,
    pub parts: Value,
    pub attachments: Value,
    pub created_at: DateTime<Utc>,
}

impl StoredMessage {
    pub fn new(id: Uuid, chat_id: Uuid, role: impl Into<String>, parts: Value) -> Self {
        Self {
            id,
            chat_id,
            role: role.into(),
            parts,
            attachments: Value::Array(Vec::new()),
            created_at: Utc::now(),
        }
    }

    pub(crate) fn from_row(row: &Row) -> Self {
        Self {
            id: row.get("id"),
            chat_id: row.get("chatId"),
            role: row.get("role"),
            parts: row.get("parts"),
            attachments: row.get("attachments"),
            created_at: row.get("createdAt"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    pub chat_id: Uuid,
    pub message_id: Uuid,
    pub is_upvoted: bool,
}

impl Vote {
    pub(crate) fn from_row(row: &Row) -> Self {
        Self {
            chat_id: row.get("chatId"),
            message_id: row.get("messageId"),
            is_upvoted: row.get("isUpvoted"),
        }
    }
}

/// Personalisation settings of a user
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: Option<String>,
    pub occupation: Option<String>,
    pub traits: Value,
    pub additional_info: Option<String>,
    pub disable_external_link_warning: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    pub(crate) fn from_row(row: &Row) -> Self {
        Self {
            id: row.get("id"),
            user_id: row.get("userId"),
            name: row.get("name"),
            occupation: row.get("occupation"),
            traits: row.get("traits"),
            additional_info: row.get("additionalInfo"),
            disable_external_link_warning: row.get("disableExternalLinkWarning"),
            created_at: row.get("createdAt"),
            updated_at: row.get("updatedAt"),
        }
    }
}

/// Submitted profile settings; absent fields are stored as null
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub occupation: Option<String>,
    #[serde(default)]
    pub traits: Option<Value>,
    #[serde(default)]
    pub additional_info: Option<String>,
    #[serde(default)]
    pub disable_external_link_warning: Option<bool>,
}

impl ProfileUpdate {
    /// Traits to store, `[]` when none were sent
    pub fn traits_or_default(&self) -> Value {
        match &self.traits {
            Some(Value::Null) | None => Value::Array(Vec::new()),
            Some(traits) => traits.clone(),
        }
    }
}

/// One page of a user's chat history
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatPage {
    pub chats: Vec<Chat>,
    pub has_more: bool,
}

/// Cursor for paging through chat history
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageCursor {
    /// Newest chats first
    Latest,
    /// Chats created after the given chat
    StartingAfter(Uuid),
    /// Chats created before the given chat
    EndingBefore(Uuid),
}
