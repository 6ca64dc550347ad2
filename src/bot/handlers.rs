use crate::bot::resilient::{
    delete_quietly, edit_view, send_text_resilient, send_view, EditOutcome,
};
use crate::bot::views::{
    main_keyboard, render_feedback, render_view, CHECK_PENDING_ALIAS, CHECK_PENDING_BUTTON,
    CLOSE_KEYBOARD_BUTTON, KEYBOARD_CLOSED, USE_MENU, WELCOME,
};
use crate::review::{CallbackAction, MessageRef, Outcome, Reviewer, Session, View};
use anyhow::{anyhow, Result};
use std::sync::Arc;
use teloxide::{
    dispatching::dialogue::InMemStorage,
    prelude::*,
    types::{KeyboardRemove, MessageId},
    utils::command::BotCommands,
};
use tracing::{debug, info, warn};

/// Per-chat review session stored by the dispatcher
pub type SessionDialogue = Dialogue<Session, InMemStorage<Session>>;

/// Supported commands for the bot
#[derive(BotCommands, Clone)]
#[command(rename_rule = "snake_case", description = "Supported commands:")]
pub enum Command {
    /// Show the welcome message and main keyboard
    #[command(description = "Start the bot.")]
    Start,
    /// Show the first page of pending registrations
    #[command(description = "Check pending approvals.")]
    CheckPending,
}

/// Safe extraction of user ID from a message.
/// Returns 0 if the user information is missing.
#[must_use]
pub fn get_user_id_safe(msg: &Message) -> i64 {
    msg.from.as_ref().map_or(0, |u| u.id.0.cast_signed())
}

/// Display name for logs
#[must_use]
pub fn get_user_name(msg: &Message) -> String {
    msg.from
        .as_ref()
        .map(|u| {
            u.username
                .clone()
                .unwrap_or_else(|| u.first_name.clone())
        })
        .unwrap_or_else(|| "Unknown".to_string())
}

fn message_ref(chat_id: ChatId, msg_id: MessageId) -> MessageRef {
    MessageRef {
        chat_id: chat_id.0,
        message_id: msg_id.0,
    }
}

async fn save(dialogue: &SessionDialogue, session: Session) -> Result<()> {
    dialogue
        .update(session)
        .await
        .map_err(|e| anyhow!(e.to_string()))
}

/// Start handler
///
/// # Errors
///
/// Returns an error if the welcome message cannot be sent.
pub async fn start(bot: Bot, msg: Message) -> Result<()> {
    info!(
        "User {} ({}) initiated /start command.",
        get_user_id_safe(&msg),
        get_user_name(&msg)
    );
    send_text_resilient(&bot, msg.chat.id, WELCOME, Some(main_keyboard().into())).await?;
    Ok(())
}

/// Sends page 0 of the pending list as a fresh message.
///
/// The previously displayed list/detail message of this chat is deleted so
/// only one live view exists per session.
///
/// # Errors
///
/// Returns an error if the list cannot be sent or the session not saved.
pub async fn check_pending(
    bot: Bot,
    msg: Message,
    reviewer: Arc<Reviewer>,
    dialogue: SessionDialogue,
    mut session: Session,
) -> Result<()> {
    let view = reviewer.open_list(&mut session, 0).await;

    if let Some(old) = session.view.take() {
        delete_quietly(&bot, ChatId(old.chat_id), MessageId(old.message_id)).await;
    }

    let sent = if view == View::Empty {
        send_text_resilient(
            &bot,
            msg.chat.id,
            render_view(&view).text,
            Some(main_keyboard().into()),
        )
        .await?
    } else {
        send_view(&bot, msg.chat.id, &render_view(&view)).await?
    };
    session.view = Some(message_ref(sent.chat.id, sent.id));

    save(&dialogue, session).await
}

/// Handles free text: reply-keyboard buttons, follow-up values, anything else.
///
/// # Errors
///
/// Returns an error if a reply cannot be sent or the session not saved.
pub async fn handle_text(
    bot: Bot,
    msg: Message,
    reviewer: Arc<Reviewer>,
    dialogue: SessionDialogue,
    mut session: Session,
) -> Result<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };

    match text {
        CHECK_PENDING_BUTTON | CHECK_PENDING_ALIAS => {
            return check_pending(bot, msg, reviewer, dialogue, session).await;
        }
        CLOSE_KEYBOARD_BUTTON => {
            send_text_resilient(
                &bot,
                msg.chat.id,
                KEYBOARD_CLOSED,
                Some(KeyboardRemove::new().into()),
            )
            .await?;
            return Ok(());
        }
        _ => {}
    }

    match reviewer.handle_text(&mut session, text).await {
        Outcome::Reply { feedback, refresh } => {
            send_text_resilient(&bot, msg.chat.id, render_feedback(&feedback), None).await?;
            if let Some(view) = refresh {
                show_in_session(&bot, msg.chat.id, &mut session, &view).await?;
            }
        }
        Outcome::Show(view) => show_in_session(&bot, msg.chat.id, &mut session, &view).await?,
        Outcome::Unhandled => {
            send_text_resilient(&bot, msg.chat.id, USE_MENU, Some(main_keyboard().into()))
                .await?;
        }
        Outcome::Close => {}
    }

    save(&dialogue, session).await
}

/// Text that is neither absent nor a command; unknown `/commands` are
/// never taken as a follow-up value.
#[must_use]
pub fn is_plain_text(msg: Message) -> bool {
    msg.text().is_some_and(|text| !text.starts_with('/'))
}

/// Answers anything the review flow has no use for: media, stickers,
/// unknown commands.
///
/// # Errors
///
/// Returns an error if the reply cannot be sent.
pub async fn handle_other(bot: Bot, msg: Message) -> Result<()> {
    debug!("Unhandled message {} from user {}", msg.id.0, get_user_id_safe(&msg));
    send_text_resilient(&bot, msg.chat.id, USE_MENU, Some(main_keyboard().into())).await?;
    Ok(())
}

/// Renders `view` into the remembered message, or sends a new one when
/// there is none (or it was deleted meanwhile).
async fn show_in_session(
    bot: &Bot,
    chat_id: ChatId,
    session: &mut Session,
    view: &View,
) -> Result<()> {
    let rendered = render_view(view);

    if let Some(current) = session.view {
        let outcome = edit_view(
            bot,
            ChatId(current.chat_id),
            MessageId(current.message_id),
            &rendered,
        )
        .await;
        if outcome != EditOutcome::Missing {
            return Ok(());
        }
    }

    let sent = send_view(bot, chat_id, &rendered).await?;
    session.view = Some(message_ref(sent.chat.id, sent.id));
    Ok(())
}

/// Handles inline-button presses by editing the pressed message in place.
///
/// # Errors
///
/// Returns an error if the session cannot be saved.
pub async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    reviewer: Arc<Reviewer>,
    dialogue: SessionDialogue,
    mut session: Session,
) -> Result<()> {
    // Stops the client's loading spinner, whatever the payload
    let _ = bot.answer_callback_query(q.id.clone()).await;

    let Some(data) = q.data.as_deref() else {
        return Ok(());
    };

    let Some(message) = q.message.as_ref() else {
        warn!("Callback {data} without an accessible message");
        return Ok(());
    };
    let chat_id = message.chat().id;
    let msg_id = message.id();

    let action = match data.parse::<CallbackAction>() {
        Ok(action) => action,
        Err(e) => {
            warn!("Ignoring callback from user {}: {e}", q.from.id.0);
            return Ok(());
        }
    };

    match reviewer.handle_callback(&mut session, action).await {
        Outcome::Show(view) => {
            edit_view(&bot, chat_id, msg_id, &render_view(&view)).await;
            session.view = Some(message_ref(chat_id, msg_id));
        }
        Outcome::Close => delete_quietly(&bot, chat_id, msg_id).await,
        Outcome::Reply { .. } | Outcome::Unhandled => {}
    }

    save(&dialogue, session).await
}
