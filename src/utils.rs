//! Utility functions for text handling and Telegram API retries.

use anyhow::Result;
use std::time::Duration;
use teloxide::RequestError;
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::RetryIf;
use tracing::warn;

/// Safely truncates a string to a maximum character length (not bytes).
///
/// This is UTF-8 safe and will not panic on multi-byte characters.
///
/// # Examples
///
/// ```
/// use pending_review_bot::utils::truncate_str;
/// let s = "Привет, мир!";
/// assert_eq!(truncate_str(s, 6), "Привет");
/// ```
pub fn truncate_str(s: impl AsRef<str>, max_chars: usize) -> String {
    let s = s.as_ref();
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    s.char_indices()
        .nth(max_chars)
        .map_or_else(|| s.to_string(), |(pos, _)| s[..pos].to_string())
}

/// Whether a failed Telegram call is worth repeating.
///
/// Only transport-level failures and flood control qualify; API answers such
/// as "message is not modified" would fail the same way again.
#[must_use]
pub fn is_transient(error: &anyhow::Error) -> bool {
    matches!(
        error.downcast_ref::<RequestError>(),
        Some(RequestError::Network(_) | RequestError::Io(_) | RequestError::RetryAfter(_))
    )
}

/// Retry a Telegram API operation with exponential backoff.
///
/// The retry strategy uses exponential backoff with jitter:
/// - Initial delay: 500ms
/// - Max delay: 4s
/// - Max retries: 3 (configurable via constants in `config.rs`)
///
/// Errors that are not [`is_transient`] are returned immediately.
///
/// # Errors
///
/// Returns the last error if all attempts fail.
///
/// # Examples
///
/// ```no_run
/// use pending_review_bot::utils::retry_telegram_operation;
/// use anyhow::Result;
///
/// async fn send() -> Result<()> {
///     Ok(())
/// }
///
/// # async fn example() -> Result<()> {
/// retry_telegram_operation(|| async { send().await }).await?;
/// # Ok(())
/// # }
/// ```
pub async fn retry_telegram_operation<F, Fut, T>(operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    use crate::config::{
        TELEGRAM_API_INITIAL_BACKOFF_MS, TELEGRAM_API_MAX_BACKOFF_MS, TELEGRAM_API_MAX_RETRIES,
    };

    let retry_strategy = ExponentialBackoff::from_millis(TELEGRAM_API_INITIAL_BACKOFF_MS)
        .max_delay(Duration::from_millis(TELEGRAM_API_MAX_BACKOFF_MS))
        .map(jitter)
        .take(TELEGRAM_API_MAX_RETRIES);

    RetryIf::start(retry_strategy, operation, is_transient)
        .await
        .map_err(|e| {
            if is_transient(&e) {
                warn!(
                    "Telegram API operation failed after {} retries: {}",
                    TELEGRAM_API_MAX_RETRIES, e
                );
            }
            e
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_truncate_str_unicode() {
        let s = "Привет, мир!";
        assert_eq!(truncate_str(s, 6), "Привет");
        assert_eq!(truncate_str(s, 50), "Привет, мир!");
    }

    #[test]
    fn test_plain_errors_are_not_transient() {
        assert!(!is_transient(&anyhow::anyhow!("boom")));
    }

    #[tokio::test]
    async fn test_permanent_error_is_not_retried() {
        let calls = AtomicUsize::new(0);
        let result: Result<()> = retry_telegram_operation(|| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(anyhow::anyhow!("Bad Request: message is not modified")) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_flood_control_is_retried() -> Result<()> {
        use teloxide::types::Seconds;

        let calls = AtomicUsize::new(0);
        let value = retry_telegram_operation(|| {
            let attempt = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt == 0 {
                    Err(RequestError::RetryAfter(Seconds::from_seconds(0)).into())
                } else {
                    Ok(attempt)
                }
            }
        })
        .await?;

        assert_eq!(value, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_success_passes_value_through() -> Result<()> {
        let value = retry_telegram_operation(|| async { Ok(7) }).await?;
        assert_eq!(value, 7);
        Ok(())
    }
}
