//! OpenAI-compatible provider utilities
//!
//! Shared request path for providers using the async-openai client.

use super::common::{build_openai_messages, extract_openai_response};
use super::LlmError;
use async_openai::{config::OpenAIConfig, types::chat::CreateChatCompletionRequestArgs, Client};

/// Perform a single chat completion using an OpenAI-compatible API
pub async fn chat_completion(
    client: &Client<OpenAIConfig>,
    system_prompt: &str,
    user_message: &str,
    model_id: &str,
    max_tokens: u32,
    temperature: f32,
) -> Result<String, LlmError> {
    let messages = build_openai_messages(system_prompt, user_message)?;

    let request = CreateChatCompletionRequestArgs::default()
        .model(model_id)
        .messages(messages)
        .max_tokens(max_tokens)
        .temperature(temperature)
        .build()
        .map_err(|e| LlmError::Unknown(e.to_string()))?;

    let response = client
        .chat()
        .create(request)
        .await
        .map_err(|e| LlmError::ApiError(e.to_string()))?;

    extract_openai_response(&response)
}
