//! LLM providers
//!
//! Defines the provider interface used by reply generation and the
//! OpenAI-compatible implementation behind it.

mod common;
mod openai_compat;
/// Implementations of specific LLM providers
pub mod providers;

use thiserror::Error;

/// Errors that can occur during LLM operations
#[derive(Debug, Error)]
pub enum LlmError {
    /// Error returned by the provider's API
    #[error("API error: {0}")]
    ApiError(String),
    /// Any other unexpected error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

/// Interface for all LLM providers
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate a single-turn chat completion: one system prompt, one user message
    async fn chat_completion(
        &self,
        system_prompt: &str,
        user_message: &str,
        model_id: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, LlmError>;
}
