//! Review UI components
//!
//! Contains keyboards, text messages, and formatters for the review flow.

use crate::backend::{PendingItem, ReviewTarget};
use crate::pagination::ListPage;
use crate::review::{CallbackAction, Feedback, RecordAction, View};
use crate::utils::truncate_str;
use html_escape::encode_text;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup};

// ─────────────────────────────────────────────────────────────────────────────
// Reply keyboard
// ─────────────────────────────────────────────────────────────────────────────

/// Reply-keyboard button opening the pending list
pub const CHECK_PENDING_BUTTON: &str = "🔍 Check Pending";
/// Older label for the same button, still accepted
pub const CHECK_PENDING_ALIAS: &str = "📋 Check Pending";
/// Reply-keyboard button hiding the keyboard
pub const CLOSE_KEYBOARD_BUTTON: &str = "❌ Close Keyboard";

/// Longest button label before truncation
const MAX_LABEL_CHARS: usize = 48;

/// Persistent main menu
#[must_use]
pub fn main_keyboard() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![vec![
        KeyboardButton::new(CHECK_PENDING_BUTTON),
        KeyboardButton::new(CLOSE_KEYBOARD_BUTTON),
    ]])
    .resize_keyboard()
}

/// Reply to `/start`
pub const WELCOME: &str = "👋 Welcome! Use the keyboard or the bot menu (≡) to run actions.";
/// Reply to unrecognised text
pub const USE_MENU: &str = "Use the menu below.";
/// Reply to the close-keyboard button
pub const KEYBOARD_CLOSED: &str = "Keyboard closed.";
/// Message for users outside the allow-list
pub const NOT_AUTHORIZED: &str = "🚫 You are not authorized to use this bot.";
/// Callback alert for users outside the allow-list
pub const NOT_AUTHORIZED_ALERT: &str = "🚫 You are not authorized";

// ─────────────────────────────────────────────────────────────────────────────
// Views
// ─────────────────────────────────────────────────────────────────────────────

/// HTML text plus optional inline keyboard, ready to send or edit in
#[derive(Debug, Clone)]
pub struct Rendered {
    /// Message text (HTML parse mode)
    pub text: String,
    /// Inline keyboard; `None` removes any existing one on edit
    pub markup: Option<InlineKeyboardMarkup>,
}

/// Renders a review view.
#[must_use]
pub fn render_view(view: &View) -> Rendered {
    match view {
        View::List(page) => Rendered {
            text: format!("📋 Pending Registrations (Page {})", page.page + 1),
            markup: Some(list_keyboard(page)),
        },
        View::Empty => Rendered {
            text: "✅ No pending organisations or specialists.".to_string(),
            markup: None,
        },
        View::Detail { item, page } => Rendered {
            text: detail_text(item),
            markup: Some(detail_keyboard(item.target(), *page)),
        },
        View::Prompt { .. } => Rendered {
            text: "✏️ Send the new max children count:".to_string(),
            markup: None,
        },
        View::NotFound { page } => Rendered {
            text: "⚠️ Item not found.".to_string(),
            markup: Some(back_keyboard(*page)),
        },
        View::UpdateFailed {
            target,
            status,
            page,
        } => Rendered {
            text: update_failed(*target, *status),
            markup: Some(back_keyboard(*page)),
        },
    }
}

/// Renders the answer to a free-text message.
#[must_use]
pub fn render_feedback(feedback: &Feedback) -> String {
    match feedback {
        Feedback::InvalidNumber => "⚠️ Please enter a valid integer.".to_string(),
        Feedback::UpdateFailed { target, status } => update_failed(*target, *status),
        Feedback::MaxChildrenUpdated { target, value } => {
            format!("✏️ Max children updated to {value} for {target}.")
        }
    }
}

fn update_failed(target: ReviewTarget, status: Option<u16>) -> String {
    match status {
        Some(code) => format!("⚠️ Failed to update {target}. (HTTP {code})"),
        None => format!("⚠️ Failed to update {target}. (network error)"),
    }
}

fn or_dash(value: Option<&str>) -> &str {
    match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => "-",
    }
}

fn confirmed(flag: bool) -> &'static str {
    if flag {
        "confirmed"
    } else {
        "unconfirmed"
    }
}

/// Button label for a list entry
#[must_use]
pub fn item_label(item: &PendingItem) -> String {
    let label = match item {
        PendingItem::Organisation(o) => format!(
            "🏢 {} ({})",
            or_dash(o.org_name.as_deref()),
            or_dash(o.city.as_deref())
        ),
        PendingItem::Specialist(s) => format!(
            "👤 {} {} ({})",
            or_dash(s.first_name.as_deref()),
            or_dash(s.last_name.as_deref()),
            or_dash(s.city.as_deref())
        ),
    };
    truncate_str(label, MAX_LABEL_CHARS)
}

fn detail_text(item: &PendingItem) -> String {
    match item {
        PendingItem::Organisation(o) => format!(
            "🏢 <b>Organisation #{}</b>\n\
             <b>Name:</b> {}\n\
             <b>Email:</b> {} ({})\n\
             <b>Address:</b> {}\n\
             <b>City:</b> {}\n\
             <b>Status:</b> {}",
            o.id,
            encode_text(or_dash(o.org_name.as_deref())),
            encode_text(or_dash(o.email.as_deref())),
            confirmed(o.is_email_confirmed),
            encode_text(or_dash(o.address.as_deref())),
            encode_text(or_dash(o.city.as_deref())),
            encode_text(or_dash(o.status.as_deref())),
        ),
        PendingItem::Specialist(s) => format!(
            "👤 <b>Specialist #{}</b>\n\
             <b>Name:</b> {} {}\n\
             <b>Email:</b> {} ({})\n\
             <b>City:</b> {}\n\
             <b>Status:</b> {}",
            s.id,
            encode_text(or_dash(s.first_name.as_deref())),
            encode_text(or_dash(s.last_name.as_deref())),
            encode_text(or_dash(s.email.as_deref())),
            confirmed(s.is_email_confirmed),
            encode_text(or_dash(s.city.as_deref())),
            encode_text(or_dash(s.status.as_deref())),
        ),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Inline keyboards
// ─────────────────────────────────────────────────────────────────────────────

fn button(label: impl Into<String>, action: CallbackAction) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(label, action.to_string())
}

/// One row per record, then Prev/Next, then Close
#[must_use]
pub fn list_keyboard(page: &ListPage<PendingItem>) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = page
        .items
        .iter()
        .map(|item| {
            vec![button(
                item_label(item),
                CallbackAction::record(RecordAction::View, item.target(), page.page),
            )]
        })
        .collect();

    let mut nav = Vec::new();
    if page.has_prev() {
        nav.push(button(
            "◀️ Prev",
            CallbackAction::OpenPending {
                page: page.page - 1,
            },
        ));
    }
    if page.has_next {
        nav.push(button(
            "Next ▶️",
            CallbackAction::OpenPending {
                page: page.page + 1,
            },
        ));
    }
    if !nav.is_empty() {
        rows.push(nav);
    }
    rows.push(vec![button("❌ Close", CallbackAction::CloseList)]);
    InlineKeyboardMarkup::new(rows)
}

/// Approve/Reject, Verify/Set max, Back
#[must_use]
pub fn detail_keyboard(target: ReviewTarget, page: usize) -> InlineKeyboardMarkup {
    let act = |action| CallbackAction::record(action, target, page);
    InlineKeyboardMarkup::new(vec![
        vec![
            button("✅ Approve", act(RecordAction::Approve)),
            button("❌ Reject", act(RecordAction::Reject)),
        ],
        vec![
            button("📧 Verify Email", act(RecordAction::Verify)),
            button("✏️ Set Max Children", act(RecordAction::SetMax)),
        ],
        vec![button("⬅️ Back", CallbackAction::OpenPending { page })],
    ])
}

fn back_keyboard(page: usize) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![button(
        "⬅️ Back",
        CallbackAction::OpenPending { page },
    )]])
}
