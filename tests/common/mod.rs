#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chatline::auth::{SessionKeys, UserType};
use chatline::db::{
    self, Chat, ChatPage, ChatStore, PageCursor, ProfileUpdate, StoredMessage, User, UserProfile,
    Vote,
};
use chatline::llm::{
    ChatModelId, ContentDelta, EventStream, FinishReason, GenerateRequest, LlmError, LlmProvider,
    ProviderFactory, StreamEvent, UsageMetadata,
};
use chatline::state::AppState;
use chrono::Utc;
use testcontainers::{core::WaitFor, GenericImage, RunnableImage};
use uuid::Uuid;

pub const TEST_SECRET: &str = "test-secret";

/// Postgres image used by the store tests
pub const POSTGRES_IMAGE: &str = "postgres";
pub const POSTGRES_TAG: &str = "16-alpine";
pub const POSTGRES_PORT: u16 = 5432;
pub const POSTGRES_USER: &str = "postgres";
pub const POSTGRES_PASSWORD: &str = "chat_password";
pub const POSTGRES_DB: &str = "postgres";

pub fn create_postgres_container() -> RunnableImage<GenericImage> {
    let image = GenericImage::new(POSTGRES_IMAGE, POSTGRES_TAG)
        .with_env_var("POSTGRES_PASSWORD", POSTGRES_PASSWORD)
        .with_wait_for(WaitFor::message_on_stderr(
            "database system is ready to accept connections",
        ));

    RunnableImage::from(image).with_tag(POSTGRES_TAG)
}

pub fn build_connection_string(host: &str, port: u16) -> String {
    format!(
        "postgresql://{}:{}@{}:{}/{}",
        POSTGRES_USER, POSTGRES_PASSWORD, host, port, POSTGRES_DB
    )
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    chats: Vec<Chat>,
    messages: Vec<StoredMessage>,
    votes: Vec<Vote>,
    streams: Vec<(Uuid, Uuid)>,
    profiles: HashMap<Uuid, UserProfile>,
}

/// `ChatStore` kept in memory for handler tests
#[derive(Default)]
pub struct MemoryChatStore {
    tables: Mutex<Tables>,
    /// Make every write fail
    pub fail_writes: bool,
}

impl MemoryChatStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_writes() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }

    fn check_write(&self) -> db::Result<()> {
        if self.fail_writes {
            return Err(db::Error::DatabaseError("write refused".to_string()));
        }
        Ok(())
    }

    pub fn chats(&self) -> Vec<Chat> {
        self.tables.lock().unwrap().chats.clone()
    }

    pub fn messages(&self) -> Vec<StoredMessage> {
        self.tables.lock().unwrap().messages.clone()
    }

    pub fn stream_count(&self) -> usize {
        self.tables.lock().unwrap().streams.len()
    }

    /// Seed a chat without going through the API
    pub fn insert_chat(&self, chat: Chat) {
        self.tables.lock().unwrap().chats.push(chat);
    }

    pub fn insert_message(&self, message: StoredMessage) {
        self.tables.lock().unwrap().messages.push(message);
    }
}

#[async_trait]
impl ChatStore for MemoryChatStore {
    async fn create_guest_user(&self) -> db::Result<User> {
        self.check_write()?;
        let user = User {
            id: Uuid::new_v4(),
            email: format!("guest-{}", Utc::now().timestamp_millis()),
        };
        self.tables.lock().unwrap().users.push(user.clone());
        Ok(user)
    }

    async fn get_chat_by_id(&self, id: Uuid) -> db::Result<Option<Chat>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.chats.iter().find(|chat| chat.id == id).cloned())
    }

    async fn save_chat(&self, chat: Chat) -> db::Result<()> {
        self.check_write()?;
        self.tables.lock().unwrap().chats.push(chat);
        Ok(())
    }

    async fn delete_chat_by_id(&self, id: Uuid) -> db::Result<()> {
        self.check_write()?;
        let mut tables = self.tables.lock().unwrap();
        tables.votes.retain(|vote| vote.chat_id != id);
        tables.messages.retain(|message| message.chat_id != id);
        tables.streams.retain(|(_, chat_id)| *chat_id != id);
        tables.chats.retain(|chat| chat.id != id);
        Ok(())
    }

    async fn get_chats_by_user_id(
        &self,
        user_id: Uuid,
        limit: i64,
        cursor: PageCursor,
    ) -> db::Result<ChatPage> {
        let tables = self.tables.lock().unwrap();
        let mut chats: Vec<Chat> = tables
            .chats
            .iter()
            .filter(|chat| chat.user_id == user_id)
            .cloned()
            .collect();
        chats.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let created_at = |id: Uuid| {
            tables
                .chats
                .iter()
                .find(|chat| chat.id == id)
                .map(|chat| chat.created_at)
                .ok_or_else(|| db::Error::NotFoundError(format!("Chat with id {} not found", id)))
        };

        match cursor {
            PageCursor::Latest => {}
            PageCursor::StartingAfter(id) => {
                let after = created_at(id)?;
                chats.retain(|chat| chat.created_at > after);
            }
            PageCursor::EndingBefore(id) => {
                let before = created_at(id)?;
                chats.retain(|chat| chat.created_at < before);
            }
        }

        let has_more = chats.len() as i64 > limit;
        chats.truncate(limit as usize);
        Ok(ChatPage { chats, has_more })
    }

    async fn get_messages_by_chat_id(&self, chat_id: Uuid) -> db::Result<Vec<StoredMessage>> {
        let tables = self.tables.lock().unwrap();
        let mut messages: Vec<StoredMessage> = tables
            .messages
            .iter()
            .filter(|message| message.chat_id == chat_id)
            .cloned()
            .collect();
        messages.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(messages)
    }

    async fn save_messages(&self, messages: Vec<StoredMessage>) -> db::Result<()> {
        self.check_write()?;
        self.tables.lock().unwrap().messages.extend(messages);
        Ok(())
    }

    async fn get_message_count_by_user_id(&self, user_id: Uuid, hours: i64) -> db::Result<i64> {
        let tables = self.tables.lock().unwrap();
        let since = Utc::now() - chrono::Duration::hours(hours);
        let owned: Vec<Uuid> = tables
            .chats
            .iter()
            .filter(|chat| chat.user_id == user_id)
            .map(|chat| chat.id)
            .collect();
        let count = tables
            .messages
            .iter()
            .filter(|m| m.role == "user" && m.created_at >= since && owned.contains(&m.chat_id))
            .count();
        Ok(count as i64)
    }

    async fn create_stream_id(&self, stream_id: Uuid, chat_id: Uuid) -> db::Result<()> {
        self.check_write()?;
        self.tables.lock().unwrap().streams.push((stream_id, chat_id));
        Ok(())
    }

    async fn get_stream_ids_by_chat_id(&self, chat_id: Uuid) -> db::Result<Vec<Uuid>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .streams
            .iter()
            .filter(|(_, id)| *id == chat_id)
            .map(|(stream_id, _)| *stream_id)
            .collect())
    }

    async fn get_votes_by_chat_id(&self, chat_id: Uuid) -> db::Result<Vec<Vote>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .votes
            .iter()
            .filter(|vote| vote.chat_id == chat_id)
            .cloned()
            .collect())
    }

    async fn vote_message(
        &self,
        chat_id: Uuid,
        message_id: Uuid,
        is_upvoted: bool,
    ) -> db::Result<()> {
        self.check_write()?;
        let mut tables = self.tables.lock().unwrap();
        match tables
            .votes
            .iter_mut()
            .find(|vote| vote.message_id == message_id)
        {
            Some(vote) => vote.is_upvoted = is_upvoted,
            None => tables.votes.push(Vote {
                chat_id,
                message_id,
                is_upvoted,
            }),
        }
        Ok(())
    }

    async fn get_profile(&self, user_id: Uuid) -> db::Result<Option<UserProfile>> {
        Ok(self.tables.lock().unwrap().profiles.get(&user_id).cloned())
    }

    async fn upsert_profile(&self, user_id: Uuid, update: ProfileUpdate) -> db::Result<UserProfile> {
        self.check_write()?;
        let mut tables = self.tables.lock().unwrap();
        let now = Utc::now();
        let created_at = tables
            .profiles
            .get(&user_id)
            .map(|profile| profile.created_at)
            .unwrap_or(now);
        let profile = UserProfile {
            id: Uuid::new_v4(),
            user_id,
            name: update.name.clone(),
            occupation: update.occupation.clone(),
            traits: update.traits_or_default(),
            additional_info: update.additional_info.clone(),
            disable_external_link_warning: update.disable_external_link_warning.unwrap_or(false),
            created_at,
            updated_at: now,
        };
        tables.profiles.insert(user_id, profile.clone());
        Ok(profile)
    }
}

// ---------------------------------------------------------------------------
// Scripted model
// ---------------------------------------------------------------------------

/// One model call's worth of events
pub type Step = Vec<Result<StreamEvent, LlmError>>;

pub fn text_step(chunks: &[&str]) -> Step {
    let mut events: Step = chunks
        .iter()
        .map(|chunk| {
            Ok(StreamEvent::ContentDelta {
                index: 0,
                delta: ContentDelta::TextDelta {
                    text: chunk.to_string(),
                },
            })
        })
        .collect();
    events.push(Ok(StreamEvent::MessageEnd {
        finish_reason: FinishReason::Stop,
        usage: UsageMetadata::new(10, 5),
    }));
    events
}

pub fn tool_step(call_id: &str, name: &str, input: serde_json::Value) -> Step {
    use chatline::llm::core::types::{ContentBlockStart, PartialToolUse};

    vec![
        Ok(StreamEvent::ContentBlockStart {
            index: 1,
            block: ContentBlockStart::ToolUse {
                id: call_id.to_string(),
                name: name.to_string(),
            },
        }),
        Ok(StreamEvent::ContentDelta {
            index: 1,
            delta: ContentDelta::ToolUseDelta {
                partial: PartialToolUse {
                    id: Some(call_id.to_string()),
                    name: Some(name.to_string()),
                    partial_json: input.to_string(),
                },
            },
        }),
        Ok(StreamEvent::ContentBlockEnd { index: 1 }),
        Ok(StreamEvent::MessageEnd {
            finish_reason: FinishReason::ToolUse,
            usage: UsageMetadata::new(10, 5),
        }),
    ]
}

type StepFn = dyn Fn(usize) -> Step + Send + Sync;

/// Provider replaying steps; call `n` gets step `n`, the last step repeats
pub struct ScriptedProvider {
    steps: Arc<StepFn>,
    calls: Arc<Mutex<Vec<GenerateRequest>>>,
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    async fn stream_generate(&self, request: GenerateRequest) -> Result<EventStream, LlmError> {
        let call = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(request);
            calls.len() - 1
        };
        Ok(Box::pin(futures::stream::iter((self.steps)(call))))
    }
}

/// Factory handing out scripted chat and title models
pub struct ScriptedFactory {
    chat_steps: Arc<StepFn>,
    title: Option<String>,
    pub chat_requests: Arc<Mutex<Vec<GenerateRequest>>>,
    pub models: Arc<Mutex<Vec<ChatModelId>>>,
}

impl ScriptedFactory {
    /// Chat model answering every call with `chunks`
    pub fn replying(chunks: &'static [&'static str]) -> Self {
        Self::with_steps(move |_| text_step(chunks))
    }

    pub fn with_steps<F>(steps: F) -> Self
    where
        F: Fn(usize) -> Step + Send + Sync + 'static,
    {
        Self {
            chat_steps: Arc::new(steps),
            title: Some("Scripted title".to_string()),
            chat_requests: Arc::new(Mutex::new(Vec::new())),
            models: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Make the title model fail
    pub fn without_title(mut self) -> Self {
        self.title = None;
        self
    }

    pub fn chat_calls(&self) -> Vec<GenerateRequest> {
        self.chat_requests.lock().unwrap().clone()
    }
}

impl ProviderFactory for ScriptedFactory {
    fn language_model(
        &self,
        _api_key: &str,
        model: ChatModelId,
    ) -> Result<Box<dyn LlmProvider>, LlmError> {
        self.models.lock().unwrap().push(model);
        Ok(Box::new(ScriptedProvider {
            steps: self.chat_steps.clone(),
            calls: self.chat_requests.clone(),
        }))
    }

    fn title_model(&self, _api_key: &str) -> Result<Box<dyn LlmProvider>, LlmError> {
        let steps: Arc<StepFn> = match self.title.clone() {
            Some(title) => Arc::new(move |_: usize| {
                let title = title.clone();
                vec![
                    Ok(StreamEvent::ContentDelta {
                        index: 0,
                        delta: ContentDelta::TextDelta { text: title },
                    }),
                    Ok(StreamEvent::MessageEnd {
                        finish_reason: FinishReason::Stop,
                        usage: UsageMetadata::new(1, 1),
                    }),
                ]
            }),
            None => Arc::new(|_: usize| {
                vec![Err(LlmError::Network(
                    "getaddrinfo ENOTFOUND generativelanguage.googleapis.com".to_string(),
                ))]
            }),
        };
        Ok(Box::new(ScriptedProvider {
            steps,
            calls: Arc::new(Mutex::new(Vec::new())),
        }))
    }
}

// ---------------------------------------------------------------------------
// App wiring
// ---------------------------------------------------------------------------

pub struct TestApp {
    pub state: AppState,
    pub store: Arc<MemoryChatStore>,
    pub factory: Arc<ScriptedFactory>,
}

impl TestApp {
    pub fn new(store: MemoryChatStore, factory: ScriptedFactory) -> Self {
        let store = Arc::new(store);
        let factory = Arc::new(factory);
        let state = AppState::new(
            store.clone(),
            factory.clone(),
            SessionKeys::new(TEST_SECRET),
        );
        Self {
            state,
            store,
            factory,
        }
    }

    pub fn default_app() -> Self {
        Self::new(
            MemoryChatStore::new(),
            ScriptedFactory::replying(&["Hello ", "there!"]),
        )
    }
}

pub fn token(user_id: Uuid, user_type: UserType) -> String {
    SessionKeys::new(TEST_SECRET)
        .issue(user_id, user_type, chrono::Duration::hours(1))
        .unwrap()
}

pub fn bearer(user_id: Uuid, user_type: UserType) -> String {
    format!("Bearer {}", token(user_id, user_type))
}

/// A valid `POST /api/chat` body
pub fn chat_body(chat_id: Uuid, text: &str) -> serde_json::Value {
    serde_json::json!({
        "id": chat_id,
        "message": {
            "id": Uuid::new_v4(),
            "role": "user",
            "parts": [{"type": "text", "text": text}]
        },
        "selectedChatModel": "gemini-2.0-flash-exp",
        "selectedVisibilityType": "private",
        "apiKey": "test-key"
    })
}

pub fn body_json(body: &[u8]) -> serde_json::Value {
    serde_json::from_slice(body).unwrap()
}
