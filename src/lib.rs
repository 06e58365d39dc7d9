#![deny(missing_docs)]
//! Persona relay bot library.
//!
//! Relays private Telegram messages to a chat-completion API, tracks a
//! per-user message count and sends scheduled media attachments.

/// Telegram handlers, transport and runtime.
pub mod bot;
/// Configuration management.
pub mod config;
/// LLM providers.
pub mod llm;
/// Media file lookup.
pub mod media;
/// Persona prompts and reply generation.
pub mod persona;
/// Per-user message counter storage.
pub mod storage;
/// Utility functions.
pub mod utils;
