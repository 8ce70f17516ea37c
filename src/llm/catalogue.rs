//! Chat model catalogue
//!
//! Ids selectable by clients, the upstream model each one runs on, and the
//! descriptions shown in the model picker.

use serde::{Deserialize, Serialize};

use crate::llm::gemini::GeminiModel;

/// Model id a client may select for a chat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChatModelId {
    #[serde(rename = "gemini-2.0-flash-exp")]
    Gemini20FlashExp,
    #[serde(rename = "gemini-2.5-pro")]
    Gemini25Pro,
    #[serde(rename = "gemini-1.5-flash")]
    Gemini15Flash,
    #[serde(rename = "gemini-2.0-flash-reasoning")]
    Gemini20FlashReasoning,
    /// Legacy alias of `gemini-2.0-flash-exp`
    #[serde(rename = "chat-model")]
    ChatModel,
    /// Legacy alias of `gemini-2.0-flash-reasoning`
    #[serde(rename = "chat-model-reasoning")]
    ChatModelReasoning,
}

impl ChatModelId {
    pub const ALL: [ChatModelId; 6] = [
        ChatModelId::Gemini20FlashExp,
        ChatModelId::Gemini25Pro,
        ChatModelId::Gemini15Flash,
        ChatModelId::Gemini20FlashReasoning,
        ChatModelId::ChatModel,
        ChatModelId::ChatModelReasoning,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChatModelId::Gemini20FlashExp => "gemini-2.0-flash-exp",
            ChatModelId::Gemini25Pro => "gemini-2.5-pro",
            ChatModelId::Gemini15Flash => "gemini-1.5-flash",
            ChatModelId::Gemini20FlashReasoning => "gemini-2.0-flash-reasoning",
            ChatModelId::ChatModel => "chat-model",
            ChatModelId::ChatModelReasoning => "chat-model-reasoning",
        }
    }

    /// Upstream model serving this id
    pub fn upstream(&self) -> GeminiModel {
        match self {
            ChatModelId::Gemini25Pro => GeminiModel::Gemini25Pro,
            ChatModelId::Gemini15Flash => GeminiModel::Gemini15Flash,
            ChatModelId::Gemini20FlashExp
            | ChatModelId::Gemini20FlashReasoning
            | ChatModelId::ChatModel
            | ChatModelId::ChatModelReasoning => GeminiModel::Gemini20FlashExp,
        }
    }

    /// Whether `<think>` sections of the output are split into reasoning
    pub fn is_reasoning(&self) -> bool {
        matches!(
            self,
            ChatModelId::Gemini20FlashReasoning | ChatModelId::ChatModelReasoning
        )
    }
}

/// Catalogue entry describing a selectable model
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatModel {
    pub id: ChatModelId,
    pub name: &'static str,
    pub description: &'static str,
    pub context_length: u32,
    pub provider: &'static str,
}

/// Models listed in the picker, legacy aliases excluded
pub fn chat_models() -> Vec<ChatModel> {
    vec![
        ChatModel {
            id: ChatModelId::Gemini20FlashExp,
            name: "Gemini 2.0 Flash Experimental",
            description: "Latest experimental model with advanced capabilities",
            context_length: 1_000_000,
            provider: "Google",
        },
        ChatModel {
            id: ChatModelId::Gemini25Pro,
            name: "Gemini 2.5 Pro",
            description: "Premium model with enhanced reasoning and performance",
            context_length: 2_000_000,
            provider: "Google",
        },
        ChatModel {
            id: ChatModelId::Gemini15Flash,
            name: "Gemini 1.5 Flash",
            description: "Fast and efficient model for quick responses",
            context_length: 1_000_000,
            provider: "Google",
        },
        ChatModel {
            id: ChatModelId::Gemini20FlashReasoning,
            name: "Gemini 2.0 Flash Reasoning",
            description: "Specialized model for complex reasoning tasks",
            context_length: 1_000_000,
            provider: "Google",
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_round_trip_through_serde() {
        for id in ChatModelId::ALL {
            let json = serde_json::to_string(&id).unwrap();
            assert_eq!(json, format!("\"{}\"", id.as_str()));
        }
    }

    #[test]
    fn test_unknown_id_is_rejected() {
        assert!(serde_json::from_str::<ChatModelId>("\"title-model\"").is_err());
        assert!(serde_json::from_str::<ChatModelId>("\"gpt-4\"").is_err());
    }

    #[test]
    fn test_legacy_and_reasoning_ids_share_upstream() {
        assert_eq!(ChatModelId::ChatModel.upstream(), GeminiModel::Gemini20FlashExp);
        assert_eq!(
            ChatModelId::ChatModelReasoning.upstream(),
            GeminiModel::Gemini20FlashExp
        );
        assert_eq!(
            ChatModelId::Gemini20FlashReasoning.upstream(),
            GeminiModel::Gemini20FlashExp
        );
        assert_eq!(ChatModelId::Gemini25Pro.upstream(), GeminiModel::Gemini25Pro);
    }

    #[test]
    fn test_reasoning_flag() {
        assert!(ChatModelId::Gemini20FlashReasoning.is_reasoning());
        assert!(ChatModelId::ChatModelReasoning.is_reasoning());
        assert!(!ChatModelId::Gemini20FlashExp.is_reasoning());
    }

    #[test]
    fn test_catalogue_serialization() {
        let json = serde_json::to_value(chat_models()).unwrap();
        assert_eq!(json[0]["id"], "gemini-2.0-flash-exp");
        assert_eq!(json[1]["contextLength"], 2_000_000);
        assert_eq!(json.as_array().unwrap().len(), 4);
    }
}
