#![deny(missing_docs)]
//! Administrative Telegram bot for reviewing pending organisation and
//! specialist registrations.

/// HTTP client and data model for the approval backend.
pub mod backend;
/// Telegram front end: dispatch, keyboards and message rendering.
pub mod bot;
/// Configuration and settings management.
pub mod config;
/// Logging setup with secret redaction.
pub mod logging;
/// Fixed-size paging over pending records.
pub mod pagination;
/// Per-chat review state machine.
pub mod review;
/// Small shared helpers.
pub mod utils;
