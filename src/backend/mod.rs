//! Approval backend: record types, update payloads and the client seam.
//!
//! The review logic only talks to [`ReviewBackend`]; [`ApiClient`] is the
//! HTTP implementation used in production.

mod client;

pub use client::ApiClient;

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur while talking to the backend
#[derive(Debug, Error)]
pub enum BackendError {
    /// The request never produced a response
    #[error("Network error: {0}")]
    Network(String),
    /// The backend answered with something other than 200
    #[error("HTTP {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Raw response body, for logs
        body: String,
    },
    /// The response body was not the expected JSON
    #[error("JSON error: {0}")]
    Json(String),
}

impl BackendError {
    /// HTTP status code, if the backend answered at all
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Network(_) | Self::Json(_) => None,
        }
    }
}

/// Kind of record under review
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// Organisation registration
    Org,
    /// Specialist registration
    Spec,
}

impl EntityKind {
    /// Tag used in callback payloads and user-facing messages
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Org => "org",
            Self::Spec => "spec",
        }
    }

    /// Endpoint listing pending records of this kind
    #[must_use]
    pub const fn pending_endpoint(self) -> &'static str {
        match self {
            Self::Org => "bot/orgs/pending/",
            Self::Spec => "bot/specs/pending/",
        }
    }

    /// Endpoint updating the record `id` of this kind
    #[must_use]
    pub fn update_endpoint(self, id: i64) -> String {
        match self {
            Self::Org => format!("bot/orgs/{id}/update/"),
            Self::Spec => format!("bot/specs/{id}/update/"),
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "org" => Ok(Self::Org),
            "spec" => Ok(Self::Spec),
            other => Err(other.to_string()),
        }
    }
}

/// Reads `null` like a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Pending organisation as returned by `bot/orgs/pending/`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Organisation {
    /// Backend primary key
    pub id: i64,
    /// Display name
    pub org_name: Option<String>,
    /// Contact email
    pub email: Option<String>,
    /// Whether the email was confirmed; `null` reads as unconfirmed
    #[serde(deserialize_with = "null_as_default")]
    pub is_email_confirmed: bool,
    /// Postal address
    pub address: Option<String>,
    /// City
    pub city: Option<String>,
    /// Review status, e.g. `pending`
    pub status: Option<String>,
    /// Capacity limit, if the backend exposes it
    pub max_children_allowed: Option<i64>,
}

/// Pending specialist as returned by `bot/specs/pending/`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Specialist {
    /// Backend primary key
    pub id: i64,
    /// Given name
    pub first_name: Option<String>,
    /// Family name
    pub last_name: Option<String>,
    /// Contact email
    pub email: Option<String>,
    /// Whether the email was confirmed; `null` reads as unconfirmed
    #[serde(deserialize_with = "null_as_default")]
    pub is_email_confirmed: bool,
    /// City
    pub city: Option<String>,
    /// Review status, e.g. `pending`
    pub status: Option<String>,
    /// Capacity limit, if the backend exposes it
    pub max_children_allowed: Option<i64>,
}

/// A record awaiting administrative approval
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingItem {
    /// Organisation registration
    Organisation(Organisation),
    /// Specialist registration
    Specialist(Specialist),
}

impl PendingItem {
    /// Backend primary key
    #[must_use]
    pub const fn id(&self) -> i64 {
        match self {
            Self::Organisation(o) => o.id,
            Self::Specialist(s) => s.id,
        }
    }

    /// Kind tag of the record
    #[must_use]
    pub const fn kind(&self) -> EntityKind {
        match self {
            Self::Organisation(_) => EntityKind::Org,
            Self::Specialist(_) => EntityKind::Spec,
        }
    }

    /// Review target addressing this record
    #[must_use]
    pub const fn target(&self) -> ReviewTarget {
        ReviewTarget {
            kind: self.kind(),
            id: self.id(),
        }
    }

    /// Current review status
    #[must_use]
    pub fn status(&self) -> Option<&str> {
        match self {
            Self::Organisation(o) => o.status.as_deref(),
            Self::Specialist(s) => s.status.as_deref(),
        }
    }
}

/// Record addressed by an action: kind plus backend id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReviewTarget {
    /// Kind of record
    pub kind: EntityKind,
    /// Backend primary key
    pub id: i64,
}

impl fmt::Display for ReviewTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} #{}", self.kind, self.id)
    }
}

/// Review decision written to `status`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    /// Registration approved
    Verified,
    /// Registration rejected
    Rejected,
}

/// Partial update body; only the fields that are set get serialized
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordUpdate {
    /// New review status
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ReviewStatus>,
    /// Mark the email as confirmed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_email_confirmed: Option<bool>,
    /// New capacity limit
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_children_allowed: Option<i64>,
}

impl RecordUpdate {
    /// `{"status": "verified"}`
    #[must_use]
    pub fn approve() -> Self {
        Self {
            status: Some(ReviewStatus::Verified),
            ..Self::default()
        }
    }

    /// `{"status": "rejected"}`
    #[must_use]
    pub fn reject() -> Self {
        Self {
            status: Some(ReviewStatus::Rejected),
            ..Self::default()
        }
    }

    /// `{"is_email_confirmed": true}`
    #[must_use]
    pub fn confirm_email() -> Self {
        Self {
            is_email_confirmed: Some(true),
            ..Self::default()
        }
    }

    /// `{"max_children_allowed": n}`
    #[must_use]
    pub fn max_children(n: i64) -> Self {
        Self {
            max_children_allowed: Some(n),
            ..Self::default()
        }
    }
}

/// Interface to the approval backend
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ReviewBackend: Send + Sync {
    /// Lists pending records of one kind.
    ///
    /// Failures are logged by the implementation and reported as an empty
    /// list; the bot treats "no data" and "backend down" alike here.
    async fn fetch_pending(&self, kind: EntityKind) -> Vec<PendingItem>;

    /// Applies `update` to the record `target`.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Status` for any non-200 answer and
    /// `BackendError::Network` when no answer arrived.
    async fn update_record(
        &self,
        target: ReviewTarget,
        update: &RecordUpdate,
    ) -> Result<(), BackendError>;
}

/// Fetches both kinds and concatenates them, organisations first.
pub async fn combined_pending(backend: &dyn ReviewBackend) -> Vec<PendingItem> {
    let mut items = backend.fetch_pending(EntityKind::Org).await;
    items.extend(backend.fetch_pending(EntityKind::Spec).await);
    items
}
