use super::openai_compat;
use super::{LlmError, LlmProvider};
use async_openai::{config::OpenAIConfig, Client};
use async_trait::async_trait;
use tracing::debug;

/// LLM provider implementation for OpenAI and compatible endpoints
pub struct OpenAiProvider {
    client: Client<OpenAIConfig>,
}

impl OpenAiProvider {
    /// Create a new provider instance talking to `api_base`
    ///
    /// # Examples
    ///
    /// ```
    /// use persona_relay::llm::providers::OpenAiProvider;
    ///
    /// let provider = OpenAiProvider::new("sk-test".to_string(), "https://api.openai.com/v1");
    /// ```
    #[must_use]
    pub fn new(api_key: String, api_base: &str) -> Self {
        let config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(api_base);
        Self {
            client: Client::with_config(config),
        }
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    async fn chat_completion(
        &self,
        system_prompt: &str,
        user_message: &str,
        model_id: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, LlmError> {
        debug!(model = %model_id, max_tokens, temperature, "Requesting chat completion");
        openai_compat::chat_completion(
            &self.client,
            system_prompt,
            user_message,
            model_id,
            max_tokens,
            temperature,
        )
        .await
    }
}
