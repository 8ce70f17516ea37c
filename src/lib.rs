// HTTP server modules
pub mod handlers;
pub mod models;
pub mod routes;
pub mod sse;
pub mod state;

// Sessions, configuration and errors
pub mod auth;
pub mod config;
pub mod errors;

// Chat domain
pub mod chat;

// Persistence
pub mod db;

// LLM abstraction layer
pub mod llm;
