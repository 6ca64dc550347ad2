//! Per-chat review state machine.
//!
//! [`Reviewer`] turns callback presses and free-text messages into backend
//! calls plus a description of what the chat should show next. It knows
//! nothing about Telegram; the `bot` module renders [`View`]s and
//! [`Feedback`] into messages and keyboards.

mod action;

pub use action::{CallbackAction, CallbackParseError, RecordAction};

use crate::backend::{self, PendingItem, RecordUpdate, ReviewBackend, ReviewTarget};
use crate::pagination::ListPage;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// Where the session currently is
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReviewState {
    /// Nothing displayed yet, or the last message was closed
    #[default]
    Idle,
    /// Browsing list page `page`
    ListView {
        /// Zero-based page index
        page: usize,
    },
    /// Looking at one record opened from list page `page`
    DetailView {
        /// Record on screen
        target: ReviewTarget,
        /// Page to return to
        page: usize,
    },
    /// Waiting for the next text message to carry a new max children count
    AwaitingInput {
        /// Record to update
        target: ReviewTarget,
        /// Page to return to
        page: usize,
    },
}

/// Identity of a sent message that later renders edit in place
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRef {
    /// Telegram chat id
    pub chat_id: i64,
    /// Telegram message id within the chat
    pub message_id: i32,
}

/// Everything remembered about one chat
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// List/detail message currently on screen
    pub view: Option<MessageRef>,
    /// Review state
    pub state: ReviewState,
}

impl Session {
    /// Pending follow-up request, if any
    #[must_use]
    pub const fn awaiting(&self) -> Option<(ReviewTarget, usize)> {
        match self.state {
            ReviewState::AwaitingInput { target, page } => Some((target, page)),
            _ => None,
        }
    }
}

/// Content for the list/detail message
#[derive(Debug, Clone, PartialEq)]
pub enum View {
    /// A page of the pending list
    List(ListPage<PendingItem>),
    /// Nothing is pending at all
    Empty,
    /// One record with its action buttons
    Detail {
        /// The record
        item: PendingItem,
        /// Page to return to
        page: usize,
    },
    /// Ask for the new max children count
    Prompt {
        /// Record being edited
        target: ReviewTarget,
    },
    /// The record vanished from the pending list
    NotFound {
        /// Page to return to
        page: usize,
    },
    /// The backend refused or never answered an update
    UpdateFailed {
        /// Record that failed
        target: ReviewTarget,
        /// HTTP status, `None` on network failure
        status: Option<u16>,
        /// Page to return to
        page: usize,
    },
}

/// Answer to a free-text message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feedback {
    /// The text was not an integer
    InvalidNumber,
    /// The backend rejected the new value
    UpdateFailed {
        /// Record that failed
        target: ReviewTarget,
        /// HTTP status, `None` on network failure
        status: Option<u16>,
    },
    /// The new value was stored
    MaxChildrenUpdated {
        /// Record updated
        target: ReviewTarget,
        /// Stored value
        value: i64,
    },
}

/// What the front end has to do after an event
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Replace the displayed message with this view
    Show(View),
    /// Delete the displayed message
    Close,
    /// Reply to the text message, then re-render the remembered message
    Reply {
        /// Reply content
        feedback: Feedback,
        /// View for the remembered list message
        refresh: Option<View>,
    },
    /// The text was not meant for the review flow
    Unhandled,
}

/// Drives review sessions against a backend
#[derive(Clone)]
pub struct Reviewer {
    backend: Arc<dyn ReviewBackend>,
    per_page: usize,
}

impl Reviewer {
    /// Creates a reviewer showing `per_page` records per page.
    #[must_use]
    pub fn new(backend: Arc<dyn ReviewBackend>, per_page: usize) -> Self {
        Self {
            backend,
            per_page: per_page.max(1),
        }
    }

    /// Fetches everything pending and cuts out `page`.
    pub async fn render_list(&self, page: usize) -> View {
        let combined = backend::combined_pending(self.backend.as_ref()).await;
        if combined.is_empty() {
            return View::Empty;
        }
        View::List(ListPage::cut(&combined, page, self.per_page))
    }

    /// Moves the session to list page `page`, dropping any pending follow-up.
    pub async fn open_list(&self, session: &mut Session, page: usize) -> View {
        session.state = ReviewState::ListView { page };
        self.render_list(page).await
    }

    /// Handles an inline-button press.
    pub async fn handle_callback(&self, session: &mut Session, action: CallbackAction) -> Outcome {
        match action {
            CallbackAction::OpenPending { page } => {
                Outcome::Show(self.open_list(session, page).await)
            }
            CallbackAction::CloseList => {
                *session = Session::default();
                Outcome::Close
            }
            CallbackAction::Record {
                action,
                target,
                page,
            } => self.handle_record(session, action, target, page).await,
        }
    }

    async fn handle_record(
        &self,
        session: &mut Session,
        action: RecordAction,
        target: ReviewTarget,
        page: usize,
    ) -> Outcome {
        let update = match action {
            RecordAction::View => {
                return Outcome::Show(self.open_detail(session, target, page).await);
            }
            RecordAction::SetMax => {
                session.state = ReviewState::AwaitingInput { target, page };
                return Outcome::Show(View::Prompt { target });
            }
            RecordAction::Approve => RecordUpdate::approve(),
            RecordAction::Reject => RecordUpdate::reject(),
            RecordAction::Verify => RecordUpdate::confirm_email(),
        };

        match self.backend.update_record(target, &update).await {
            Ok(()) => {
                info!("Applied {action:?} to {target}");
                Outcome::Show(self.open_list(session, page).await)
            }
            Err(e) => Outcome::Show(View::UpdateFailed {
                target,
                status: e.status(),
                page,
            }),
        }
    }

    async fn open_detail(&self, session: &mut Session, target: ReviewTarget, page: usize) -> View {
        let item = self
            .backend
            .fetch_pending(target.kind)
            .await
            .into_iter()
            .find(|item| item.id() == target.id);

        match item {
            Some(item) => {
                session.state = ReviewState::DetailView { target, page };
                View::Detail { item, page }
            }
            None => {
                debug!("{target} is no longer pending");
                View::NotFound { page }
            }
        }
    }

    /// Handles a free-text message.
    ///
    /// Returns [`Outcome::Unhandled`] unless the session awaits a value.
    pub async fn handle_text(&self, session: &mut Session, text: &str) -> Outcome {
        let Some((target, page)) = session.awaiting() else {
            return Outcome::Unhandled;
        };

        let Ok(value) = text.trim().parse::<i64>() else {
            return Outcome::Reply {
                feedback: Feedback::InvalidNumber,
                refresh: None,
            };
        };

        match self
            .backend
            .update_record(target, &RecordUpdate::max_children(value))
            .await
        {
            Ok(()) => {
                info!("Max children for {target} set to {value}");
                let refresh = self.open_list(session, page).await;
                Outcome::Reply {
                    feedback: Feedback::MaxChildrenUpdated { target, value },
                    refresh: Some(refresh),
                }
            }
            Err(e) => Outcome::Reply {
                feedback: Feedback::UpdateFailed {
                    target,
                    status: e.status(),
                },
                refresh: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendError, EntityKind, MockReviewBackend, Organisation, Specialist};
    use mockall::predicate::eq;

    fn spec(id: i64) -> PendingItem {
        PendingItem::Specialist(Specialist {
            id,
            first_name: Some(format!("Spec{id}")),
            ..Specialist::default()
        })
    }

    fn org(id: i64) -> PendingItem {
        PendingItem::Organisation(Organisation {
            id,
            org_name: Some(format!("Org{id}")),
            ..Organisation::default()
        })
    }

    const SPEC_42: ReviewTarget = ReviewTarget {
        kind: EntityKind::Spec,
        id: 42,
    };

    const ORG_17: ReviewTarget = ReviewTarget {
        kind: EntityKind::Org,
        id: 17,
    };

    fn with_pending(mock: &mut MockReviewBackend, orgs: usize, specs: usize) {
        mock.expect_fetch_pending().returning(move |kind| match kind {
            EntityKind::Org => (1..=orgs as i64).map(org).collect(),
            EntityKind::Spec => (1..=specs as i64).map(|i| spec(i + 100)).collect(),
        });
    }

    fn reviewer(mock: MockReviewBackend) -> Reviewer {
        Reviewer::new(Arc::new(mock), 8)
    }

    #[tokio::test]
    async fn test_paging_callback_shows_requested_page() {
        let mut mock = MockReviewBackend::new();
        with_pending(&mut mock, 6, 4);
        let reviewer = reviewer(mock);
        let mut session = Session::default();

        let outcome = reviewer
            .handle_callback(&mut session, CallbackAction::OpenPending { page: 1 })
            .await;

        let Outcome::Show(View::List(page)) = outcome else {
            panic!("expected list view, got {outcome:?}");
        };
        assert_eq!(page.items.len(), 2);
        assert!(!page.has_next);
        assert_eq!(session.state, ReviewState::ListView { page: 1 });
    }

    #[tokio::test]
    async fn test_empty_backend_renders_empty_view() {
        let mut mock = MockReviewBackend::new();
        with_pending(&mut mock, 0, 0);

        let view = reviewer(mock).render_list(0).await;
        assert_eq!(view, View::Empty);
    }

    #[tokio::test]
    async fn test_view_opens_detail() {
        let mut mock = MockReviewBackend::new();
        mock.expect_fetch_pending()
            .with(eq(EntityKind::Spec))
            .times(1)
            .returning(|_| vec![spec(41), spec(42)]);
        let reviewer = reviewer(mock);
        let mut session = Session::default();

        let outcome = reviewer
            .handle_callback(
                &mut session,
                CallbackAction::record(RecordAction::View, SPEC_42, 3),
            )
            .await;

        assert_eq!(
            outcome,
            Outcome::Show(View::Detail {
                item: spec(42),
                page: 3
            })
        );
        assert_eq!(
            session.state,
            ReviewState::DetailView {
                target: SPEC_42,
                page: 3
            }
        );
    }

    #[tokio::test]
    async fn test_view_of_vanished_record_keeps_state() {
        let mut mock = MockReviewBackend::new();
        mock.expect_fetch_pending().returning(|_| Vec::new());
        let reviewer = reviewer(mock);
        let mut session = Session {
            view: None,
            state: ReviewState::ListView { page: 2 },
        };

        let outcome = reviewer
            .handle_callback(
                &mut session,
                CallbackAction::record(RecordAction::View, ORG_17, 2),
            )
            .await;

        assert_eq!(outcome, Outcome::Show(View::NotFound { page: 2 }));
        assert_eq!(session.state, ReviewState::ListView { page: 2 });
    }

    #[tokio::test]
    async fn test_approve_success_returns_to_list() {
        let mut mock = MockReviewBackend::new();
        mock.expect_update_record()
            .withf(|target, update| *target == ORG_17 && *update == RecordUpdate::approve())
            .times(1)
            .returning(|_, _| Ok(()));
        with_pending(&mut mock, 3, 0);
        let reviewer = reviewer(mock);
        let mut session = Session {
            view: None,
            state: ReviewState::DetailView {
                target: ORG_17,
                page: 0,
            },
        };

        let outcome = reviewer
            .handle_callback(
                &mut session,
                CallbackAction::record(RecordAction::Approve, ORG_17, 0),
            )
            .await;

        assert!(matches!(outcome, Outcome::Show(View::List(_))));
        assert_eq!(session.state, ReviewState::ListView { page: 0 });
    }

    #[tokio::test]
    async fn test_reject_failure_reports_status_and_stays() {
        let mut mock = MockReviewBackend::new();
        mock.expect_update_record()
            .withf(|_, update| *update == RecordUpdate::reject())
            .returning(|_, _| {
                Err(BackendError::Status {
                    status: 500,
                    body: "boom".to_string(),
                })
            });
        mock.expect_fetch_pending().never();
        let reviewer = reviewer(mock);
        let before = ReviewState::DetailView {
            target: ORG_17,
            page: 1,
        };
        let mut session = Session {
            view: None,
            state: before,
        };

        let outcome = reviewer
            .handle_callback(
                &mut session,
                CallbackAction::record(RecordAction::Reject, ORG_17, 1),
            )
            .await;

        assert_eq!(
            outcome,
            Outcome::Show(View::UpdateFailed {
                target: ORG_17,
                status: Some(500),
                page: 1
            })
        );
        assert_eq!(session.state, before);
    }

    #[tokio::test]
    async fn test_verify_sends_email_confirmation() {
        let mut mock = MockReviewBackend::new();
        mock.expect_update_record()
            .withf(|_, update| *update == RecordUpdate::confirm_email())
            .times(1)
            .returning(|_, _| Err(BackendError::Network("refused".to_string())));
        let reviewer = reviewer(mock);
        let mut session = Session::default();

        let outcome = reviewer
            .handle_callback(
                &mut session,
                CallbackAction::record(RecordAction::Verify, SPEC_42, 0),
            )
            .await;

        assert_eq!(
            outcome,
            Outcome::Show(View::UpdateFailed {
                target: SPEC_42,
                status: None,
                page: 0
            })
        );
    }

    #[tokio::test]
    async fn test_setmax_then_number_updates_and_rerenders_page() {
        let mut mock = MockReviewBackend::new();
        mock.expect_update_record()
            .with(eq(SPEC_42), eq(RecordUpdate::max_children(5)))
            .times(1)
            .returning(|_, _| Ok(()));
        with_pending(&mut mock, 8, 4);
        let reviewer = reviewer(mock);
        let mut session = Session::default();

        let prompt = reviewer
            .handle_callback(
                &mut session,
                CallbackAction::record(RecordAction::SetMax, SPEC_42, 1),
            )
            .await;
        assert_eq!(prompt, Outcome::Show(View::Prompt { target: SPEC_42 }));
        assert_eq!(session.awaiting(), Some((SPEC_42, 1)));

        let outcome = reviewer.handle_text(&mut session, " 5 ").await;
        let Outcome::Reply {
            feedback,
            refresh: Some(View::List(page)),
        } = outcome
        else {
            panic!("expected reply with list refresh, got {outcome:?}");
        };
        assert_eq!(
            feedback,
            Feedback::MaxChildrenUpdated {
                target: SPEC_42,
                value: 5
            }
        );
        assert_eq!(page.page, 1);
        assert_eq!(page.items.len(), 4);
        assert_eq!(session.awaiting(), None);
        assert_eq!(session.state, ReviewState::ListView { page: 1 });
    }

    #[tokio::test]
    async fn test_non_integer_never_reaches_backend() {
        let mut mock = MockReviewBackend::new();
        mock.expect_update_record().never();
        mock.expect_fetch_pending().never();
        let reviewer = reviewer(mock);
        let mut session = Session {
            view: None,
            state: ReviewState::AwaitingInput {
                target: SPEC_42,
                page: 0,
            },
        };

        for text in ["five", "", "5.5", "12abc"] {
            let outcome = reviewer.handle_text(&mut session, text).await;
            assert_eq!(
                outcome,
                Outcome::Reply {
                    feedback: Feedback::InvalidNumber,
                    refresh: None
                }
            );
            assert_eq!(session.awaiting(), Some((SPEC_42, 0)));
        }
    }

    #[tokio::test]
    async fn test_failed_max_update_keeps_waiting() {
        let mut mock = MockReviewBackend::new();
        mock.expect_update_record().returning(|_, _| {
            Err(BackendError::Status {
                status: 400,
                body: String::new(),
            })
        });
        let reviewer = reviewer(mock);
        let mut session = Session {
            view: None,
            state: ReviewState::AwaitingInput {
                target: ORG_17,
                page: 2,
            },
        };

        let outcome = reviewer.handle_text(&mut session, "3").await;
        assert_eq!(
            outcome,
            Outcome::Reply {
                feedback: Feedback::UpdateFailed {
                    target: ORG_17,
                    status: Some(400)
                },
                refresh: None
            }
        );
        assert_eq!(session.awaiting(), Some((ORG_17, 2)));
    }

    #[tokio::test]
    async fn test_second_setmax_replaces_first() {
        let mut mock = MockReviewBackend::new();
        mock.expect_update_record()
            .with(eq(ORG_17), eq(RecordUpdate::max_children(7)))
            .times(1)
            .returning(|_, _| Ok(()));
        with_pending(&mut mock, 1, 0);
        let reviewer = reviewer(mock);
        let mut session = Session::default();

        reviewer
            .handle_callback(
                &mut session,
                CallbackAction::record(RecordAction::SetMax, SPEC_42, 0),
            )
            .await;
        reviewer
            .handle_callback(
                &mut session,
                CallbackAction::record(RecordAction::SetMax, ORG_17, 0),
            )
            .await;
        assert_eq!(session.awaiting(), Some((ORG_17, 0)));

        reviewer.handle_text(&mut session, "7").await;
        assert_eq!(session.awaiting(), None);
    }

    #[tokio::test]
    async fn test_paging_cancels_pending_followup() {
        let mut mock = MockReviewBackend::new();
        mock.expect_update_record().never();
        with_pending(&mut mock, 2, 0);
        let reviewer = reviewer(mock);
        let mut session = Session {
            view: None,
            state: ReviewState::AwaitingInput {
                target: SPEC_42,
                page: 0,
            },
        };

        reviewer
            .handle_callback(&mut session, CallbackAction::OpenPending { page: 0 })
            .await;
        assert_eq!(
            reviewer.handle_text(&mut session, "5").await,
            Outcome::Unhandled
        );
    }

    #[tokio::test]
    async fn test_close_forgets_message_but_not_session_use() {
        let mock = MockReviewBackend::new();
        let reviewer = reviewer(mock);
        let mut session = Session {
            view: Some(MessageRef {
                chat_id: 1,
                message_id: 10,
            }),
            state: ReviewState::ListView { page: 0 },
        };

        let outcome = reviewer
            .handle_callback(&mut session, CallbackAction::CloseList)
            .await;

        assert_eq!(outcome, Outcome::Close);
        assert_eq!(session, Session::default());
    }

    #[tokio::test]
    async fn test_text_without_followup_is_unhandled() {
        let mut mock = MockReviewBackend::new();
        mock.expect_update_record().never();
        let reviewer = reviewer(mock);
        let mut session = Session::default();

        assert_eq!(
            reviewer.handle_text(&mut session, "42").await,
            Outcome::Unhandled
        );
    }
}
