//! Outbound messaging seam.
//!
//! The conversation workflow only needs to send text, photos and audio back
//! to the chat a message came from; [`TelegramTransport`] does this through
//! teloxide.

use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{ChatId, InputFile};

use crate::config::TELEGRAM_MESSAGE_LIMIT;
use crate::utils::split_long_message;

/// Sends replies back to one chat.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send a plain text message, split into several if it is too long
    async fn send_text(&self, text: &str) -> Result<()>;
    /// Send a local image file with a caption
    async fn send_photo(&self, path: &Path, caption: &str) -> Result<()>;
    /// Send a local audio file with a caption
    async fn send_audio(&self, path: &Path, caption: &str) -> Result<()>;
}

/// Telegram transport bound to a single chat.
pub struct TelegramTransport {
    bot: Bot,
    chat_id: ChatId,
}

impl TelegramTransport {
    /// Create a transport replying to `chat_id`.
    pub const fn new(bot: Bot, chat_id: ChatId) -> Self {
        Self { bot, chat_id }
    }
}

#[async_trait]
impl ChatTransport for TelegramTransport {
    async fn send_text(&self, text: &str) -> Result<()> {
        for part in split_long_message(text, TELEGRAM_MESSAGE_LIMIT) {
            self.bot.send_message(self.chat_id, part).await?;
        }
        Ok(())
    }

    async fn send_photo(&self, path: &Path, caption: &str) -> Result<()> {
        self.bot
            .send_photo(self.chat_id, InputFile::file(path.to_path_buf()))
            .caption(caption)
            .await?;
        Ok(())
    }

    async fn send_audio(&self, path: &Path, caption: &str) -> Result<()> {
        self.bot
            .send_audio(self.chat_id, InputFile::file(path.to_path_buf()))
            .caption(caption)
            .await?;
        Ok(())
    }
}
