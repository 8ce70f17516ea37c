//! Chat persistence on PostgreSQL
//!
//! Tables mirror the web client's schema: `User`, `Chat`, `Message_v2`,
//! `Vote_v2`, `Stream` and `UserProfile`. Handlers talk to the [`ChatStore`]
//! trait; [`PgChatStore`] implements it over a `deadpool-postgres` pool.

pub mod client;
pub mod connection;
pub mod error;
pub mod migrations;
pub mod queries;
pub mod store;
pub mod types;

pub use client::PgChatStore;
pub use connection::DbConfig;
pub use error::{Error, Result};
pub use store::ChatStore;
pub use types::{
    Chat, ChatPage, PageCursor, ProfileUpdate, StoredMessage, User, UserProfile, Visibility, Vote,
};
