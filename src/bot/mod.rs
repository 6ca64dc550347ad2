/// Update routing and the allow-list split
pub mod dispatch;
/// Command, callback and text handlers
pub mod handlers;
/// Telegram API wrappers with retry
pub mod resilient;
/// Flood protection for "not authorized" replies
pub mod unauthorized_cache;
/// Keyboards and message texts
pub mod views;

pub use unauthorized_cache::UnauthorizedCache;
