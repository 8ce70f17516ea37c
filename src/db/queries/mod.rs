//! SQL for each table, as free functions over the connection pool

pub mod chat;
pub mod message;
pub mod profile;
pub mod stream;
pub mod user;
pub mod vote;
