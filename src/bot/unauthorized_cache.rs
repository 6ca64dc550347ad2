//! Throttling for "not authorized" replies.
//!
//! Strangers who keep poking the bot get one notice per cooldown period;
//! later attempts in the window are silently dropped and only counted.

use moka::future::Cache;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Remembers which users were recently told they are not authorized.
///
/// Entries expire after the cooldown, so the next attempt after that gets a
/// fresh notice. The TTL only bounds memory for users who never come back.
#[derive(Clone)]
pub struct UnauthorizedCache {
    /// user_id -> () for users inside their cooldown
    notified: Cache<i64, ()>,
    silenced: Arc<AtomicU64>,
}

impl UnauthorizedCache {
    /// Creates a cache with the given cooldown, TTL and capacity.
    ///
    /// # Examples
    ///
    /// ```
    /// use pending_review_bot::bot::UnauthorizedCache;
    ///
    /// let cache = UnauthorizedCache::new(1200, 7200, 10_000);
    /// assert_eq!(cache.silenced_count(), 0);
    /// ```
    #[must_use]
    pub fn new(cooldown_secs: u64, ttl_secs: u64, max_capacity: u64) -> Self {
        let notified = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(Duration::from_secs(cooldown_secs.min(ttl_secs)))
            .build();

        Self {
            notified,
            silenced: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Returns `true` if the user should receive a notice now.
    ///
    /// Silenced attempts are counted; every 100th one is logged.
    pub async fn should_send(&self, user_id: i64, user_name: &str) -> bool {
        if self.notified.get(&user_id).await.is_none() {
            return true;
        }

        let count = self.silenced.fetch_add(1, Ordering::Relaxed) + 1;
        if count.is_multiple_of(100) {
            debug!("🚫 Silenced {count} unauthorized attempts (recent: user {user_id} - {user_name})");
        }
        false
    }

    /// Starts the cooldown for `user_id` after a notice was delivered.
    pub async fn mark_sent(&self, user_id: i64) {
        self.notified.insert(user_id, ()).await;
    }

    /// Total attempts that were silenced
    #[must_use]
    pub fn silenced_count(&self) -> u64 {
        self.silenced.load(Ordering::Relaxed)
    }
}
