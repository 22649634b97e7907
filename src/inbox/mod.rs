//! Feedback views for the admin inbox.

use serde::Serialize;

use crate::models::Feedback;

/// The two disjoint views over feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FeedbackView {
    Inbox,
    Archived,
}

impl FeedbackView {
    pub fn from_archived_flag(include_archived: bool) -> Self {
        if include_archived {
            FeedbackView::Archived
        } else {
            FeedbackView::Inbox
        }
    }

    fn wants_archived(self) -> bool {
        self == FeedbackView::Archived
    }
}

/// One view of feedback plus the inbox badge count.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InboxPage {
    pub view: FeedbackView,
    pub feedbacks: Vec<Feedback>,
    pub unread_count: usize,
}

impl InboxPage {
    pub fn build(all: &[Feedback], view: FeedbackView) -> Self {
        Self {
            view,
            feedbacks: visible_feedbacks(all, view.wants_archived()),
            unread_count: unread_count(all),
        }
    }
}

/// Records whose archived flag equals `include_archived`, input order kept.
pub fn visible_feedbacks(feedbacks: &[Feedback], include_archived: bool) -> Vec<Feedback> {
    feedbacks
        .iter()
        .filter(|f| f.is_archived == include_archived)
        .cloned()
        .collect()
}

/// Unread feedback still in the inbox.
pub fn unread_count(feedbacks: &[Feedback]) -> usize {
    feedbacks
        .iter()
        .filter(|f| !f.is_read && !f.is_archived)
        .count()
}
