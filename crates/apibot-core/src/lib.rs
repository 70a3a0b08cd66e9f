//! Apibot core: shared types, chat context, configuration, and utilities.
//!
//! - [`types`]: OpenAI-format messages, tool calls, and tool definitions
//! - [`chat`]: per-session ordered conversation history
//! - [`config`]: `~/.apibot/config.json` schema, loader, env overrides
//! - [`utils`]: data paths and small string helpers

pub mod chat;
pub mod config;
pub mod types;
pub mod utils;

pub use chat::{ChatContext, Role, Turn};
