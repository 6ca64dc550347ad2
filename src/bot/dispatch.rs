//! Update routing.
//!
//! Allowed users get the review flow; everyone else gets a throttled
//! "not authorized" notice. Every endpoint logs its own errors and always
//! answers `respond(())`, so one failing update never stops the dispatcher.

use crate::bot::handlers::{self, get_user_id_safe, get_user_name, Command, SessionDialogue};
use crate::bot::views::{NOT_AUTHORIZED, NOT_AUTHORIZED_ALERT};
use crate::bot::UnauthorizedCache;
use crate::config::Settings;
use crate::review::{Reviewer, Session};
use std::sync::Arc;
use teloxide::dispatching::dialogue::InMemStorage;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::types::CallbackQuery;
use tracing::{error, info};

/// Builds the update handler tree.
///
/// Expects `Arc<Settings>`, `Arc<Reviewer>`, `Arc<InMemStorage<Session>>` and
/// `Arc<UnauthorizedCache>` among the dispatcher dependencies.
#[must_use]
pub fn schema() -> UpdateHandler<teloxide::RequestError> {
    dptree::entry()
        .branch(
            Update::filter_callback_query()
                .filter(|q: CallbackQuery, settings: Arc<Settings>| {
                    settings.is_allowed(q.from.id.0.cast_signed())
                })
                .enter_dialogue::<CallbackQuery, InMemStorage<Session>, Session>()
                .endpoint(handle_callback),
        )
        .branch(Update::filter_callback_query().endpoint(handle_unauthorized_callback))
        .branch(
            Update::filter_message().branch(
                dptree::filter(|msg: Message, settings: Arc<Settings>| {
                    settings.is_allowed(get_user_id_safe(&msg))
                })
                .enter_dialogue::<Message, InMemStorage<Session>, Session>()
                .branch(
                    dptree::entry()
                        .filter_command::<Command>()
                        .endpoint(handle_command),
                )
                .branch(dptree::filter(handlers::is_plain_text).endpoint(handle_text))
                // Media, stickers, unknown commands
                .branch(dptree::endpoint(handle_other)),
            ),
        )
        .branch(
            // Everyone who did not pass the allow-list above
            Update::filter_message().endpoint(handle_unauthorized),
        )
}

async fn handle_unauthorized(
    bot: Bot,
    msg: Message,
    cache: Arc<UnauthorizedCache>,
) -> Result<(), teloxide::RequestError> {
    let user_id = get_user_id_safe(&msg);
    let user_name = get_user_name(&msg);

    if cache.should_send(user_id, &user_name).await {
        info!("🚫 Unauthorized access from user {user_id} ({user_name}). Sending notice.");

        if let Err(e) = bot.send_message(msg.chat.id, NOT_AUTHORIZED).await {
            error!("Failed to send not-authorized notice to {user_id}: {e}");
        } else {
            cache.mark_sent(user_id).await;
        }
    }

    respond(())
}

async fn handle_unauthorized_callback(
    bot: Bot,
    q: CallbackQuery,
) -> Result<(), teloxide::RequestError> {
    info!("🚫 Unauthorized callback from user {}", q.from.id.0);
    if let Err(e) = bot
        .answer_callback_query(q.id.clone())
        .text(NOT_AUTHORIZED_ALERT)
        .show_alert(true)
        .await
    {
        error!("Failed to answer unauthorized callback: {e}");
    }
    respond(())
}

async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    reviewer: Arc<Reviewer>,
    dialogue: SessionDialogue,
    session: Session,
) -> Result<(), teloxide::RequestError> {
    let res = match cmd {
        Command::Start => handlers::start(bot, msg).await,
        Command::CheckPending => {
            handlers::check_pending(bot, msg, reviewer, dialogue, session).await
        }
    };
    if let Err(e) = res {
        error!("Command error: {}", e);
    }
    respond(())
}

async fn handle_text(
    bot: Bot,
    msg: Message,
    reviewer: Arc<Reviewer>,
    dialogue: SessionDialogue,
    session: Session,
) -> Result<(), teloxide::RequestError> {
    if let Err(e) = handlers::handle_text(bot, msg, reviewer, dialogue, session).await {
        error!("Text handler error: {}", e);
    }
    respond(())
}

async fn handle_other(bot: Bot, msg: Message) -> Result<(), teloxide::RequestError> {
    if let Err(e) = handlers::handle_other(bot, msg).await {
        error!("Fallback handler error: {}", e);
    }
    respond(())
}

async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    reviewer: Arc<Reviewer>,
    dialogue: SessionDialogue,
    session: Session,
) -> Result<(), teloxide::RequestError> {
    if let Err(e) = handlers::handle_callback(bot, q, reviewer, dialogue, session).await {
        error!("Callback handler error: {}", e);
    }
    respond(())
}
