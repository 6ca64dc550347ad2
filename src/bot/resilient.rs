//! Resilient messaging utilities with automatic retry for Telegram API operations.
//!
//! All review views go through these wrappers so that transient network
//! failures are retried and harmless edit errors don't surface as failures.
//!
//! # Usage
//!
//! ```ignore
//! use pending_review_bot::bot::resilient::{edit_view, send_view};
//!
//! let msg = send_view(&bot, chat_id, &rendered).await?;
//! let edited = edit_view(&bot, chat_id, msg.id, &rendered).await;
//! ```

use crate::bot::views::Rendered;
use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::{ChatId, Message, MessageId, ParseMode, ReplyMarkup};
use teloxide::{ApiError, RequestError};
use tracing::{debug, warn};

/// Result of an in-place edit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    /// The message now shows the new content
    Edited,
    /// Telegram reported the content as identical
    Unchanged,
    /// The message no longer exists (deleted by the user, too old)
    Missing,
    /// Any other failure, already logged
    Failed,
}

/// Send a view as a new HTML message with automatic retry.
///
/// # Errors
///
/// Returns an error after all retries are exhausted.
pub async fn send_view(bot: &Bot, chat_id: ChatId, view: &Rendered) -> Result<Message> {
    crate::utils::retry_telegram_operation(|| async {
        let mut req = bot
            .send_message(chat_id, view.text.clone())
            .parse_mode(ParseMode::Html);
        if let Some(markup) = view.markup.clone() {
            req = req.reply_markup(markup);
        }
        req.await.map_err(anyhow::Error::from)
    })
    .await
}

/// Send plain text with an optional reply keyboard, with automatic retry.
///
/// # Errors
///
/// Returns an error after all retries are exhausted.
pub async fn send_text_resilient(
    bot: &Bot,
    chat_id: ChatId,
    text: impl Into<String>,
    markup: Option<ReplyMarkup>,
) -> Result<Message> {
    let text = text.into();
    crate::utils::retry_telegram_operation(|| async {
        let mut req = bot.send_message(chat_id, text.clone());
        if let Some(markup) = markup.clone() {
            req = req.reply_markup(markup);
        }
        req.await.map_err(anyhow::Error::from)
    })
    .await
}

/// Edit a message in place to show `view`.
///
/// "message is not modified" and "message to edit not found" are expected
/// during normal use and only logged at debug level.
pub async fn edit_view(
    bot: &Bot,
    chat_id: ChatId,
    msg_id: MessageId,
    view: &Rendered,
) -> EditOutcome {
    let result = crate::utils::retry_telegram_operation(|| async {
        let mut req = bot
            .edit_message_text(chat_id, msg_id, view.text.clone())
            .parse_mode(ParseMode::Html);
        if let Some(markup) = view.markup.clone() {
            req = req.reply_markup(markup);
        }
        req.await.map_err(anyhow::Error::from)
    })
    .await;

    match result {
        Ok(_) => EditOutcome::Edited,
        Err(e) => match e.downcast_ref::<RequestError>() {
            Some(RequestError::Api(ApiError::MessageNotModified)) => {
                debug!("Message {} not modified", msg_id.0);
                EditOutcome::Unchanged
            }
            Some(RequestError::Api(ApiError::MessageToEditNotFound)) => {
                debug!("Message {} to edit not found", msg_id.0);
                EditOutcome::Missing
            }
            _ => {
                warn!("Failed to edit message {}: {e}", msg_id.0);
                EditOutcome::Failed
            }
        },
    }
}

/// Delete a message, ignoring failures.
pub async fn delete_quietly(bot: &Bot, chat_id: ChatId, msg_id: MessageId) {
    if let Err(e) = bot.delete_message(chat_id, msg_id).await {
        debug!("Could not delete message {}: {e}", msg_id.0);
    }
}
