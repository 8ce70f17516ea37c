use async_trait::async_trait;
use uuid::Uuid;

use crate::db::{
    error::Result,
    types::{Chat, ChatPage, PageCursor, ProfileUpdate, StoredMessage, User, UserProfile, Vote},
};

/// Persistence used by the HTTP handlers
///
/// `PgChatStore` is the production implementation; handler tests plug in an
/// in-memory one.
#[async_trait]
pub trait ChatStore: Send + Sync {
    async fn create_guest_user(&self) -> Result<User>;

    async fn get_chat_by_id(&self, id: Uuid) -> Result<Option<Chat>>;

    async fn save_chat(&self, chat: Chat) -> Result<()>;

    /// Remove a chat and everything that references it
    async fn delete_chat_by_id(&self, id: Uuid) -> Result<()>;

    async fn get_chats_by_user_id(
        &self,
        user_id: Uuid,
        limit: i64,
        cursor: PageCursor,
    ) -> Result<ChatPage>;

    async fn get_messages_by_chat_id(&self, chat_id: Uuid) -> Result<Vec<StoredMessage>>;

    /// Store all messages or none
    async fn save_messages(&self, messages: Vec<StoredMessage>) -> Result<()>;

    /// User-role messages across the user's chats within the last `hours`
    async fn get_message_count_by_user_id(&self, user_id: Uuid, hours: i64) -> Result<i64>;

    async fn create_stream_id(&self, stream_id: Uuid, chat_id: Uuid) -> Result<()>;

    async fn get_stream_ids_by_chat_id(&self, chat_id: Uuid) -> Result<Vec<Uuid>>;

    async fn get_votes_by_chat_id(&self, chat_id: Uuid) -> Result<Vec<Vote>>;

    async fn vote_message(&self, chat_id: Uuid, message_id: Uuid, is_upvoted: bool) -> Result<()>;

    async fn get_profile(&self, user_id: Uuid) -> Result<Option<UserProfile>>;

    async fn upsert_profile(&self, user_id: Uuid, update: ProfileUpdate) -> Result<UserProfile>;
}
