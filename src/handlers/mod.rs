// Handlers module

pub mod auth;
pub mod chat;
pub mod history;
pub mod models;
pub mod profile;
pub mod stream;
pub mod vote;

pub use auth::guest_handler;
pub use chat::{delete_chat_handler, post_chat_handler};
pub use history::history_handler;
pub use models::models_handler;
pub use profile::{get_profile_handler, put_profile_handler};
pub use stream::resume_stream_handler;
pub use vote::{get_votes_handler, patch_vote_handler};
