//! Per-message conversation workflow.
//!
//! Each private text message goes through the same steps: identify the
//! sender, compute the next count, wait, reply, maybe send an attachment,
//! then persist the count.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use super::delay::DelayPolicy;
use super::transport::ChatTransport;
use crate::config::{
    Settings, AUDIO_BASENAME, AUDIO_TRIGGER_COUNT, PHOTO_BASENAME, PHOTO_TRIGGER_COUNT,
};
use crate::media::MediaLocator;
use crate::persona::{self, is_escalated, ReplyGenerator};
use crate::storage::CounterStore;
use crate::utils::truncate_str;

/// Stable key of a sender: the username when set, else the numeric id.
///
/// # Examples
///
/// ```
/// use persona_relay::bot::handler::derive_key;
/// assert_eq!(derive_key(Some("alice"), 42), "alice");
/// assert_eq!(derive_key(None, 42), "42");
/// assert_eq!(derive_key(Some(""), 42), "42");
/// ```
#[must_use]
pub fn derive_key(username: Option<&str>, user_id: u64) -> String {
    match username {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => user_id.to_string(),
    }
}

/// Author of an incoming message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sender {
    /// Numeric platform id
    pub id: u64,
    /// Platform handle, if the user has one
    pub username: Option<String>,
}

impl Sender {
    /// Counter key of this sender
    #[must_use]
    pub fn key(&self) -> String {
        derive_key(self.username.as_deref(), self.id)
    }
}

/// Kind of scheduled attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    /// Sent as a photo
    Photo,
    /// Sent as an audio file
    Audio,
}

/// A file to look up by basename and the caption it is sent with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// Basename resolved by the media locator
    pub basename: String,
    /// Caption sent along with the file
    pub caption: String,
}

/// The two scheduled attachments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaSchedule {
    /// Sent when a user's count reaches the photo trigger
    pub photo: Attachment,
    /// Sent when a user's count reaches the audio trigger
    pub audio: Attachment,
}

impl Default for MediaSchedule {
    fn default() -> Self {
        Self {
            photo: Attachment {
                basename: PHOTO_BASENAME.to_string(),
                caption: persona::PHOTO_CAPTION.to_string(),
            },
            audio: Attachment {
                basename: AUDIO_BASENAME.to_string(),
                caption: persona::AUDIO_CAPTION.to_string(),
            },
        }
    }
}

impl MediaSchedule {
    /// Default schedule with the captions overridden in `settings`
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        let mut schedule = Self::default();
        if let Some(caption) = &settings.photo_caption {
            schedule.photo.caption.clone_from(caption);
        }
        if let Some(caption) = &settings.audio_caption {
            schedule.audio.caption.clone_from(caption);
        }
        schedule
    }
}

/// What happened while handling one message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageOutcome {
    /// Counter key of the sender
    pub key: String,
    /// Count after this message
    pub count: u64,
    /// Whether the escalated persona was used
    pub escalated: bool,
    /// Delay waited before replying
    pub delay: Duration,
    /// Text sent back to the user
    pub reply: String,
    /// Whether the photo was delivered
    pub photo_sent: bool,
    /// Whether the audio file was delivered
    pub audio_sent: bool,
    /// Whether the counter file was written
    pub saved: bool,
}

/// Orchestrates counters, reply generation and media for incoming messages.
pub struct ConversationHandler {
    store: Arc<CounterStore>,
    replies: ReplyGenerator,
    media: MediaLocator,
    schedule: MediaSchedule,
    delay: DelayPolicy,
}

impl ConversationHandler {
    /// Assemble a handler from its collaborators.
    #[must_use]
    pub fn new(
        store: Arc<CounterStore>,
        replies: ReplyGenerator,
        media: MediaLocator,
        schedule: MediaSchedule,
        delay: DelayPolicy,
    ) -> Self {
        Self {
            store,
            replies,
            media,
            schedule,
            delay,
        }
    }

    /// Counter store backing this handler
    #[must_use]
    pub fn store(&self) -> &Arc<CounterStore> {
        &self.store
    }

    /// Handle one private text message.
    ///
    /// Completion, media and save failures are logged and absorbed.
    ///
    /// # Errors
    ///
    /// Returns an error only if the text reply cannot be delivered; in that
    /// case no attachment is sent and the count is not persisted.
    pub async fn handle(
        &self,
        transport: &dyn ChatTransport,
        sender: &Sender,
        text: &str,
    ) -> Result<MessageOutcome> {
        let key = sender.key();
        info!(user = %key, "Received message: '{}'", truncate_str(text, 100));

        let count = self.store.next_count(&key).await;
        let escalated = is_escalated(count);

        info!(
            user = %key,
            count,
            min_secs = self.delay.min_secs(),
            max_secs = self.delay.max_secs(),
            "Waiting before replying"
        );
        let delay = self.delay.wait().await;

        let reply = self.replies.generate(text, escalated).await;
        transport
            .send_text(&reply)
            .await
            .with_context(|| format!("failed to send reply to {key}"))?;
        info!(user = %key, count, escalated, delay_secs = delay.as_secs(), "Reply sent");

        let mut photo_sent = false;
        let mut audio_sent = false;
        if count == PHOTO_TRIGGER_COUNT {
            photo_sent = self
                .send_attachment(transport, &key, MediaKind::Photo, &self.schedule.photo)
                .await;
        }
        if count == AUDIO_TRIGGER_COUNT {
            audio_sent = self
                .send_attachment(transport, &key, MediaKind::Audio, &self.schedule.audio)
                .await;
        }

        let saved = match self.store.commit(&key, count).await {
            Ok(()) => true,
            Err(e) => {
                error!(
                    user = %key,
                    path = %self.store.path().display(),
                    error = %e,
                    "Failed to save counters"
                );
                false
            }
        };

        Ok(MessageOutcome {
            key,
            count,
            escalated,
            delay,
            reply,
            photo_sent,
            audio_sent,
            saved,
        })
    }

    async fn send_attachment(
        &self,
        transport: &dyn ChatTransport,
        key: &str,
        kind: MediaKind,
        attachment: &Attachment,
    ) -> bool {
        let path = match self.media.find(&attachment.basename).await {
            Ok(Some(path)) => path,
            Ok(None) => {
                warn!(
                    user = %key,
                    basename = %attachment.basename,
                    dir = %self.media.dir().display(),
                    "Media file not found, skipping {kind:?}"
                );
                return false;
            }
            Err(e) => {
                error!(user = %key, error = %e, "Media lookup failed, skipping {kind:?}");
                return false;
            }
        };
        info!(user = %key, path = %path.display(), "Resolved {kind:?} file");

        let sent = match kind {
            MediaKind::Photo => transport.send_photo(&path, &attachment.caption).await,
            MediaKind::Audio => transport.send_audio(&path, &attachment.caption).await,
        };

        match sent {
            Ok(()) => {
                info!(user = %key, "{kind:?} sent");
                true
            }
            Err(e) => {
                error!(user = %key, error = %e, "Failed to send {kind:?}");
                false
            }
        }
    }
}
