// Request and response bodies of the HTTP API

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::Visibility;
use crate::llm::ChatModelId;

pub const MAX_TEXT_CHARS: usize = 2000;
pub const MAX_FILE_NAME_CHARS: usize = 100;

// Message roles a client may submit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncomingRole {
    User,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageMediaType {
    #[serde(rename = "image/jpeg")]
    Jpeg,
    #[serde(rename = "image/png")]
    Png,
}

// Parts of a submitted user message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RequestPart {
    Text {
        text: String,
    },
    File {
        #[serde(rename = "mediaType")]
        media_type: ImageMediaType,
        name: String,
        url: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomingMessage {
    pub id: Uuid,
    pub role: IncomingRole,
    pub parts: Vec<RequestPart>,
}

impl IncomingMessage {
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().filter_map(|part| match part {
            RequestPart::Text { text } => Some(text.as_str()),
            RequestPart::File { .. } => None,
        })
    }
}

// POST /api/chat body
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostChatRequest {
    pub id: Uuid,
    pub message: IncomingMessage,
    pub selected_chat_model: ChatModelId,
    pub selected_visibility_type: Visibility,
    #[serde(default)]
    pub api_key: Option<String>,
}

impl PostChatRequest {
    /// Parse and validate a raw request body
    pub fn parse(body: &[u8]) -> Result<Self, String> {
        let request: PostChatRequest =
            serde_json::from_slice(body).map_err(|e| format!("Invalid request body: {}", e))?;
        request.validate()?;
        Ok(request)
    }

    /// Check the constraints serde cannot express
    pub fn validate(&self) -> Result<(), String> {
        for part in &self.message.parts {
            match part {
                RequestPart::Text { text } => {
                    let len = text.chars().count();
                    if len == 0 || len > MAX_TEXT_CHARS {
                        return Err(format!(
                            "Text parts must be 1 to {} characters",
                            MAX_TEXT_CHARS
                        ));
                    }
                }
                RequestPart::File { name, url, .. } => {
                    let len = name.chars().count();
                    if len == 0 || len > MAX_FILE_NAME_CHARS {
                        return Err(format!(
                            "File names must be 1 to {} characters",
                            MAX_FILE_NAME_CHARS
                        ));
                    }
                    reqwest::Url::parse(url).map_err(|e| format!("Invalid file url: {}", e))?;
                }
            }
        }
        Ok(())
    }

    /// The API key, if one was sent and is not empty
    ///
    /// A whitespace-only key is rejected later by the provider client.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|key| !key.is_empty())
    }
}

// DELETE /api/chat response
#[derive(Debug, Clone, Serialize)]
pub struct DeleteChatResponse {
    pub id: Uuid,
    pub message: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteType {
    Up,
    Down,
}

// PATCH /api/vote body
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    pub chat_id: Option<Uuid>,
    pub message_id: Option<Uuid>,
    #[serde(rename = "type")]
    pub vote_type: Option<VoteType>,
}

// POST /api/auth/guest response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestSessionResponse {
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub user_type: crate::auth::UserType,
    pub token: String,
}

// Profile returned before the user saved any settings
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DefaultProfile {
    pub name: &'static str,
    pub occupation: &'static str,
    pub traits: [String; 0],
    pub additional_info: &'static str,
    pub disable_external_link_warning: bool,
}

impl Default for DefaultProfile {
    fn default() -> Self {
        Self {
            name: "",
            occupation: "",
            traits: [],
            additional_info: "",
            disable_external_link_warning: false,
        }
    }
}
