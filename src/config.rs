//! Configuration and settings management
//!
//! Loads settings from config files and environment variables and defines
//! the bot's tuning constants.

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Application settings loaded from environment variables
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Telegram Bot API token
    pub telegram_token: String,

    /// Base URL of the approval backend, e.g. `https://example.org/api/`
    pub api_base_url: String,

    /// Shared secret sent to the backend in the `X-BOT-TOKEN` header
    #[serde(default)]
    pub bot_token: String,

    /// Comma-separated list of Telegram user IDs allowed to review
    #[serde(rename = "allowed_users", alias = "allowed_user_ids")]
    pub allowed_users_str: Option<String>,

    /// Number of records shown on one list page
    #[serde(default = "default_items_per_page")]
    pub items_per_page: usize,
}

const fn default_items_per_page() -> usize {
    ITEMS_PER_PAGE
}

impl Settings {
    /// Create new settings by loading from environment and files
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use pending_review_bot::config::Settings;
    ///
    /// let settings = Settings::new().expect("Failed to load configuration");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if loading fails or a required key is missing.
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{run_mode}")).required(false))
            // Local overrides, not checked into git
            .add_source(File::with_name("config/local").required(false))
            // Eg.. `APP__ITEMS_PER_PAGE=5 ./target/app` would set `items_per_page`
            .add_source(Environment::with_prefix("APP").separator("__"))
            // Plain UPPER_SNAKE_CASE variables; empty values count as unset
            .add_source(Environment::default().ignore_empty(true))
            .build()?;

        let mut settings: Self = s.try_deserialize()?;
        settings.items_per_page = settings.items_per_page.max(1);

        Ok(settings)
    }

    /// Returns a set of Telegram IDs that are allowed to use the bot
    #[must_use]
    pub fn allowed_users(&self) -> HashSet<i64> {
        self.allowed_users_str
            .as_ref()
            .map(|s| {
                s.split(|c: char| c == ',' || c == ';' || c.is_whitespace())
                    .filter(|token| !token.is_empty())
                    .filter_map(|id| id.parse::<i64>().ok())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Whether the given Telegram user may use the bot
    #[must_use]
    pub fn is_allowed(&self, user_id: i64) -> bool {
        self.allowed_users().contains(&user_id)
    }
}

/// Default number of records per list page.
pub const ITEMS_PER_PAGE: usize = 8;

// Telegram API retry configuration
/// Maximum retries for a Telegram API call
pub const TELEGRAM_API_MAX_RETRIES: usize = 3;
/// Initial backoff between retries in milliseconds
pub const TELEGRAM_API_INITIAL_BACKOFF_MS: u64 = 500;
/// Upper bound for the backoff in milliseconds
pub const TELEGRAM_API_MAX_BACKOFF_MS: u64 = 4000;

/// Cooldown period (seconds) between "not authorized" messages for same user.
/// Default: 20 minutes.
pub const UNAUTHORIZED_COOLDOWN_SECS: u64 = 1200;
/// Time-to-live (seconds) for cache entries.
/// Default: 2 hours.
pub const UNAUTHORIZED_CACHE_TTL_SECS: u64 = 7200;
/// Maximum cache capacity (number of entries).
pub const UNAUTHORIZED_CACHE_MAX_SIZE: u64 = 10_000;

/// Get unauthorized cooldown from env or default.
///
/// Environment variable: `UNAUTHORIZED_COOLDOWN_SECS`.
#[must_use]
pub fn get_unauthorized_cooldown() -> u64 {
    env_u64("UNAUTHORIZED_COOLDOWN_SECS", UNAUTHORIZED_COOLDOWN_SECS)
}

/// Get unauthorized cache TTL from env or default.
///
/// Environment variable: `UNAUTHORIZED_CACHE_TTL_SECS`.
#[must_use]
pub fn get_unauthorized_cache_ttl() -> u64 {
    env_u64("UNAUTHORIZED_CACHE_TTL_SECS", UNAUTHORIZED_CACHE_TTL_SECS)
}

/// Get unauthorized cache max size from env or default.
///
/// Environment variable: `UNAUTHORIZED_CACHE_MAX_SIZE`.
#[must_use]
pub fn get_unauthorized_cache_max_size() -> u64 {
    env_u64("UNAUTHORIZED_CACHE_MAX_SIZE", UNAUTHORIZED_CACHE_MAX_SIZE)
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}
