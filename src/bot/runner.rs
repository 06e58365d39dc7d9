use crate::bot::delay::DelayPolicy;
use crate::bot::handler::{ConversationHandler, MediaSchedule, Sender};
use crate::bot::transport::TelegramTransport;
use crate::config::Settings;
use crate::llm::providers::OpenAiProvider;
use crate::media::MediaLocator;
use crate::persona::{PersonaPrompts, ReplyGenerator};
use crate::storage::CounterStore;
use std::sync::Arc;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use tracing::{debug, error, info, warn};

/// Run the Telegram long-polling runtime until Ctrl-C.
pub async fn run_bot(settings: Arc<Settings>) {
    let handler = Arc::new(init_conversation_handler(&settings).await);

    let bot = Bot::new(settings.telegram_token.clone());

    info!("Bot is running...");

    Dispatcher::builder(bot, setup_handler())
        .dependencies(dptree::deps![handler])
        .default_handler(|upd| async move {
            debug!(update_id = ?upd.id, "Ignoring update that is not a private text message");
        })
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

/// Build the conversation handler and its collaborators from settings.
pub async fn init_conversation_handler(settings: &Settings) -> ConversationHandler {
    let store = Arc::new(CounterStore::open(settings.counts_path()).await);
    info!(path = %store.path().display(), "Counter store initialized.");

    let provider = Arc::new(OpenAiProvider::new(
        settings.openai_api_key.clone(),
        &settings.openai_api_base,
    ));
    let replies = ReplyGenerator::new(
        provider,
        settings.chat_model_id.clone(),
        PersonaPrompts::from_settings(settings),
    );
    info!(model = %replies.model_id(), "LLM Client initialized.");

    let delay = DelayPolicy::from_settings(settings);
    info!(
        "Reply delay: {}s to {}s",
        delay.min_secs(),
        delay.max_secs()
    );

    ConversationHandler::new(
        store,
        replies,
        MediaLocator::new(&settings.data_dir),
        MediaSchedule::from_settings(settings),
        delay,
    )
}

/// Returns true for messages this bot answers: text sent in a private chat.
#[must_use]
pub fn is_private_text(msg: &Message) -> bool {
    msg.chat.is_private() && msg.text().is_some()
}

fn sender_of(msg: &Message) -> Option<Sender> {
    msg.from.as_ref().map(|user| Sender {
        id: user.id.0,
        username: user.username.clone(),
    })
}

fn setup_handler() -> UpdateHandler<teloxide::RequestError> {
    Update::filter_message()
        .filter(|msg: Message| is_private_text(&msg))
        .endpoint(handle_private_text)
}

async fn handle_private_text(
    bot: Bot,
    msg: Message,
    handler: Arc<ConversationHandler>,
) -> Result<(), teloxide::RequestError> {
    let Some(sender) = sender_of(&msg) else {
        warn!(chat_id = ?msg.chat.id, "Private message without sender, ignoring");
        return respond(());
    };
    let text = msg.text().unwrap_or_default();
    let transport = TelegramTransport::new(bot, msg.chat.id);

    if let Err(e) = handler.handle(&transport, &sender, text).await {
        error!("Private message handler error: {:#}", e);
    }
    respond(())
}
