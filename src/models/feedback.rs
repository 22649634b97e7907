//! Feedback model matching the frontend Feedback interface.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A comment left by a signed-in visitor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub id: String,
    pub user_email: String,
    pub user_name: String,
    /// Free text; not a reference to a stored video.
    pub video_title: String,
    pub comment: String,
    #[serde(default)]
    pub is_read: bool,
    #[serde(default)]
    pub is_archived: bool,
    pub created_at: DateTime<Utc>,
}

/// Request body for submitting feedback. The author comes from the session.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFeedbackRequest {
    pub video_title: String,
    pub comment: String,
}
