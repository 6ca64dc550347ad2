//! Inline-button callback payloads.
//!
//! Payloads are underscore-delimited: `open_pending_{page}`, `close_list`
//! and `{action}_{kind}_{id}_{page}` (e.g. `approve_org_17_0`). Telegram
//! caps callback data at 64 bytes, which these stay well under.

use crate::backend::{EntityKind, ReviewTarget};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const OPEN_PENDING_PREFIX: &str = "open_pending_";
const CLOSE_LIST: &str = "close_list";

/// Why a callback payload could not be understood
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CallbackParseError {
    /// Unknown action word or wrong number of segments
    #[error("unrecognised callback payload: {0}")]
    Unrecognised(String),
    /// Entity tag other than `org`/`spec`
    #[error("unknown entity kind: {0}")]
    UnknownKind(String),
    /// Id or page segment is not a number
    #[error("invalid number in callback payload: {0}")]
    InvalidNumber(String),
}

/// Per-record button
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordAction {
    /// Open the detail view
    View,
    /// Set status to verified
    Approve,
    /// Set status to rejected
    Reject,
    /// Mark the email as confirmed
    Verify,
    /// Ask for a new max children count
    SetMax,
}

impl RecordAction {
    const fn as_str(self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::Verify => "verify",
            Self::SetMax => "setmax",
        }
    }

    fn parse(word: &str) -> Option<Self> {
        match word {
            "view" => Some(Self::View),
            "approve" => Some(Self::Approve),
            "reject" => Some(Self::Reject),
            "verify" => Some(Self::Verify),
            "setmax" => Some(Self::SetMax),
            _ => None,
        }
    }
}

/// Decoded inline-button press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackAction {
    /// Show list page `page` (paging and "Back")
    OpenPending {
        /// Zero-based page index
        page: usize,
    },
    /// Act on one record, remembering the list page to return to
    Record {
        /// What to do
        action: RecordAction,
        /// Which record
        target: ReviewTarget,
        /// List page the record was opened from
        page: usize,
    },
    /// Delete the displayed message
    CloseList,
}

impl CallbackAction {
    /// Shorthand for [`CallbackAction::Record`]
    #[must_use]
    pub const fn record(action: RecordAction, target: ReviewTarget, page: usize) -> Self {
        Self::Record {
            action,
            target,
            page,
        }
    }
}

impl fmt::Display for CallbackAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OpenPending { page } => write!(f, "{OPEN_PENDING_PREFIX}{page}"),
            Self::Record {
                action,
                target,
                page,
            } => write!(
                f,
                "{}_{}_{}_{page}",
                action.as_str(),
                target.kind,
                target.id
            ),
            Self::CloseList => f.write_str(CLOSE_LIST),
        }
    }
}

fn parse_number<T: FromStr>(segment: &str) -> Result<T, CallbackParseError> {
    segment
        .parse()
        .map_err(|_| CallbackParseError::InvalidNumber(segment.to_string()))
}

impl FromStr for CallbackAction {
    type Err = CallbackParseError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        if data == CLOSE_LIST {
            return Ok(Self::CloseList);
        }
        if let Some(page) = data.strip_prefix(OPEN_PENDING_PREFIX) {
            return Ok(Self::OpenPending {
                page: parse_number(page)?,
            });
        }

        let parts: Vec<&str> = data.split('_').collect();
        let [action, kind, id, page] = parts.as_slice() else {
            return Err(CallbackParseError::Unrecognised(data.to_string()));
        };
        let action = RecordAction::parse(action)
            .ok_or_else(|| CallbackParseError::Unrecognised(data.to_string()))?;
        let kind = kind
            .parse::<EntityKind>()
            .map_err(CallbackParseError::UnknownKind)?;

        Ok(Self::Record {
            action,
            target: ReviewTarget {
                kind,
                id: parse_number(id)?,
            },
            page: parse_number(page)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_record_actions() {
        assert_eq!(
            "approve_org_17_0".parse::<CallbackAction>(),
            Ok(CallbackAction::record(
                RecordAction::Approve,
                ReviewTarget {
                    kind: EntityKind::Org,
                    id: 17
                },
                0
            ))
        );
        assert_eq!(
            "setmax_spec_42_1".parse::<CallbackAction>(),
            Ok(CallbackAction::record(
                RecordAction::SetMax,
                ReviewTarget {
                    kind: EntityKind::Spec,
                    id: 42
                },
                1
            ))
        );
    }

    #[test]
    fn test_parse_navigation() {
        assert_eq!(
            "open_pending_3".parse::<CallbackAction>(),
            Ok(CallbackAction::OpenPending { page: 3 })
        );
        assert_eq!("close_list".parse::<CallbackAction>(), Ok(CallbackAction::CloseList));
    }

    #[test]
    fn test_format_matches_wire_contract() {
        let action = CallbackAction::record(
            RecordAction::View,
            ReviewTarget {
                kind: EntityKind::Spec,
                id: 9,
            },
            2,
        );
        assert_eq!(action.to_string(), "view_spec_9_2");
        assert_eq!(
            CallbackAction::OpenPending { page: 0 }.to_string(),
            "open_pending_0"
        );
    }

    #[test]
    fn test_rejects_malformed_payloads() {
        assert_eq!(
            "open_pending_x".parse::<CallbackAction>(),
            Err(CallbackParseError::InvalidNumber("x".to_string()))
        );
        assert_eq!(
            "approve_user_1_0".parse::<CallbackAction>(),
            Err(CallbackParseError::UnknownKind("user".to_string()))
        );
        assert!(matches!(
            "delete_org_1_0".parse::<CallbackAction>(),
            Err(CallbackParseError::Unrecognised(_))
        ));
        assert!(matches!(
            "approve_org_1".parse::<CallbackAction>(),
            Err(CallbackParseError::Unrecognised(_))
        ));
        assert!(matches!(
            "approve_org_-1x_0".parse::<CallbackAction>(),
            Err(CallbackParseError::InvalidNumber(_))
        ));
    }
}
