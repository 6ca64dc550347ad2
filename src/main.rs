use dotenvy::dotenv;
use pending_review_bot::backend::ApiClient;
use pending_review_bot::bot::handlers::Command;
use pending_review_bot::bot::{dispatch, UnauthorizedCache};
use pending_review_bot::config::{
    get_unauthorized_cache_max_size, get_unauthorized_cache_ttl, get_unauthorized_cooldown,
    Settings,
};
use pending_review_bot::logging::{init_logging, RedactionPatterns};
use pending_review_bot::review::{Reviewer, Session};
use std::sync::Arc;
use teloxide::dispatching::dialogue::InMemStorage;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    // Redaction patterns must exist before the first log line
    let patterns = Arc::new(RedactionPatterns::new().map_err(|e| {
        eprintln!("Failed to compile regex patterns: {e}");
        e
    })?);
    init_logging(patterns);

    info!("Starting pending review bot...");

    let settings = init_settings();
    let reviewer = init_reviewer(&settings);
    let bot = Bot::new(settings.telegram_token.clone());
    let sessions = InMemStorage::<Session>::new();
    let unauthorized_cache = init_unauthorized_cache();

    if let Err(e) = bot.set_my_commands(Command::bot_commands()).await {
        warn!("⚠️ set_my_commands failed: {e}");
    }

    info!("🤖 Bot running...");

    Dispatcher::builder(bot, dispatch::schema())
        .dependencies(dptree::deps![
            settings,
            reviewer,
            sessions,
            unauthorized_cache
        ])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}

fn init_settings() -> Arc<Settings> {
    match Settings::new() {
        Ok(s) => {
            info!(
                "Configuration loaded ({} allowed users, {} items per page).",
                s.allowed_users().len(),
                s.items_per_page
            );
            Arc::new(s)
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    }
}

fn init_reviewer(settings: &Settings) -> Arc<Reviewer> {
    let client = ApiClient::new(settings.api_base_url.clone(), settings.bot_token.clone());
    info!("Backend client initialized for {}.", settings.api_base_url);
    Arc::new(Reviewer::new(Arc::new(client), settings.items_per_page))
}

fn init_unauthorized_cache() -> Arc<UnauthorizedCache> {
    let cooldown = get_unauthorized_cooldown();
    let ttl = get_unauthorized_cache_ttl();
    let max_size = get_unauthorized_cache_max_size();

    info!(
        "Initializing UnauthorizedCache (cooldown: {}s, ttl: {}s, max_size: {})",
        cooldown, ttl, max_size
    );

    Arc::new(UnauthorizedCache::new(cooldown, ttl, max_size))
}
