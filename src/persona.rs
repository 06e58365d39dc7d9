//! Persona prompts and reply generation
//!
//! Two system prompts exist: the base persona and the escalated one used once
//! a user has sent enough messages. Generation never fails; any provider error
//! is replaced by a templated echo of the user's message.

use std::sync::Arc;

use tracing::{error, info};

use crate::config::{Settings, CHAT_MAX_TOKENS, CHAT_TEMPERATURE, ESCALATION_THRESHOLD};
use crate::llm::{LlmError, LlmProvider};
use crate::utils::truncate_str;

/// Default base persona
pub const BASE_PROMPT: &str = "Tu incarnes Irina, une jeune femme originaire de Bordeaux. \
    Irina est chaleureuse, espiègle et un peu mystérieuse. \
    Elle écrit avec des phrases courtes, directes et sans utiliser d'emojis. \
    Elle prend le contrôle de la conversation : quand on lui demande 'ça va ?', \
    elle ne retourne pas la question.";

/// Extra instructions appended to the base persona once escalated
pub const ESCALATION_SUFFIX: &str = "Si on te demande où te retrouver ailleurs, \
    tu réponds que tu n'es pas très active ici et que tout est indiqué dans ta bio.";

/// Default photo caption
pub const PHOTO_CAPTION: &str = "Une petite surprise pour toi...";
/// Default audio caption
pub const AUDIO_CAPTION: &str = "Je viens de te faire un code promo 80% : CLA80 Bisousss";

/// Which system prompt a reply is generated with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Persona {
    /// Default tone
    Base,
    /// Tone used from the escalation threshold on
    Escalated,
}

impl Persona {
    /// Persona for a post-increment message count
    ///
    /// # Examples
    ///
    /// ```
    /// use persona_relay::persona::Persona;
    /// assert_eq!(Persona::for_count(7), Persona::Base);
    /// assert_eq!(Persona::for_count(8), Persona::Escalated);
    /// ```
    #[must_use]
    pub const fn for_count(count: u64) -> Self {
        Self::from_escalated(is_escalated(count))
    }

    /// Persona for an escalation flag
    #[must_use]
    pub const fn from_escalated(escalated: bool) -> Self {
        if escalated {
            Self::Escalated
        } else {
            Self::Base
        }
    }
}

/// Returns true once `count` reaches the escalation threshold
#[must_use]
pub const fn is_escalated(count: u64) -> bool {
    count >= ESCALATION_THRESHOLD
}

/// Reply sent when the completion API cannot produce one
///
/// # Examples
///
/// ```
/// use persona_relay::persona::fallback_reply;
/// assert_eq!(
///     fallback_reply("salut"),
///     "Bonjour ! Merci pour votre message : \"salut\""
/// );
/// ```
#[must_use]
pub fn fallback_reply(text: &str) -> String {
    format!("Bonjour ! Merci pour votre message : \"{text}\"")
}

/// The two system prompt texts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonaPrompts {
    /// Base persona prompt
    pub base: String,
    /// Escalated persona prompt
    pub escalated: String,
}

impl Default for PersonaPrompts {
    fn default() -> Self {
        Self {
            base: BASE_PROMPT.to_string(),
            escalated: format!("{BASE_PROMPT} {ESCALATION_SUFFIX}"),
        }
    }
}

impl PersonaPrompts {
    /// Built-in prompts with the overrides present in `settings`
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        let defaults = Self::default();
        Self {
            base: settings.base_prompt.clone().unwrap_or(defaults.base),
            escalated: settings
                .escalated_prompt
                .clone()
                .unwrap_or(defaults.escalated),
        }
    }

    /// Prompt text for `persona`
    #[must_use]
    pub fn prompt(&self, persona: Persona) -> &str {
        match persona {
            Persona::Base => &self.base,
            Persona::Escalated => &self.escalated,
        }
    }
}

/// Produces persona replies through an LLM provider
pub struct ReplyGenerator {
    provider: Arc<dyn LlmProvider>,
    model_id: String,
    prompts: PersonaPrompts,
}

impl ReplyGenerator {
    /// Create a generator using `model_id` on `provider`
    #[must_use]
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        model_id: impl Into<String>,
        prompts: PersonaPrompts,
    ) -> Self {
        Self {
            provider,
            model_id: model_id.into(),
            prompts,
        }
    }

    /// Model used for completions
    #[must_use]
    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    /// Request one completion, surfacing provider errors
    ///
    /// # Errors
    ///
    /// Returns the provider's `LlmError` unchanged.
    pub async fn try_generate(&self, text: &str, escalated: bool) -> Result<String, LlmError> {
        let persona = Persona::from_escalated(escalated);
        self.provider
            .chat_completion(
                self.prompts.prompt(persona),
                text,
                &self.model_id,
                CHAT_MAX_TOKENS,
                CHAT_TEMPERATURE,
            )
            .await
            .map(|reply| reply.trim().to_string())
    }

    /// Generate a reply, falling back to the templated echo on any error
    pub async fn generate(&self, text: &str, escalated: bool) -> String {
        match self.try_generate(text, escalated).await {
            Ok(reply) => {
                info!(
                    escalated,
                    "Generated reply: '{}'",
                    truncate_str(&reply, 100)
                );
                reply
            }
            Err(e) => {
                error!(
                    model = %self.model_id,
                    error = %e,
                    "Completion failed, using fallback reply"
                );
                fallback_reply(text)
            }
        }
    }
}
