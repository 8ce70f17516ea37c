use crate::auth::UserType;
use crate::llm::ChatModelId;

/// Per-user-type quota and model access
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entitlements {
    pub max_messages_per_day: i64,
    pub available_chat_model_ids: &'static [ChatModelId],
}

const GUEST: Entitlements = Entitlements {
    max_messages_per_day: 20,
    available_chat_model_ids: &[
        ChatModelId::Gemini20FlashExp,
        ChatModelId::Gemini15Flash,
        ChatModelId::ChatModel,
        ChatModelId::ChatModelReasoning,
    ],
};

const REGULAR: Entitlements = Entitlements {
    max_messages_per_day: 100,
    available_chat_model_ids: &ChatModelId::ALL,
};

pub fn entitlements_for(user_type: UserType) -> &'static Entitlements {
    match user_type {
        UserType::Guest => &GUEST,
        UserType::Regular => &REGULAR,
    }
}

impl Entitlements {
    pub fn allows(&self, model: ChatModelId) -> bool {
        self.available_chat_model_ids.contains(&model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guest_quota_and_models() {
        let guest = entitlements_for(UserType::Guest);
        assert_eq!(guest.max_messages_per_day, 20);
        assert!(guest.allows(ChatModelId::Gemini20FlashExp));
        assert!(guest.allows(ChatModelId::ChatModelReasoning));
        assert!(!guest.allows(ChatModelId::Gemini25Pro));
        assert!(!guest.allows(ChatModelId::Gemini20FlashReasoning));
    }

    #[test]
    fn test_regular_has_everything() {
        let regular = entitlements_for(UserType::Regular);
        assert_eq!(regular.max_messages_per_day, 100);
        for id in ChatModelId::ALL {
            assert!(regular.allows(id));
        }
    }
}
