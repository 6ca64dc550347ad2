//! UI components: keyboards, message texts, and view renderers.

/// Review flow views
pub mod review;

pub use review::{
    detail_keyboard, item_label, list_keyboard, main_keyboard, render_feedback, render_view,
    Rendered, CHECK_PENDING_ALIAS, CHECK_PENDING_BUTTON, CLOSE_KEYBOARD_BUTTON, KEYBOARD_CLOSED,
    NOT_AUTHORIZED, NOT_AUTHORIZED_ALERT, USE_MENU, WELCOME,
};
