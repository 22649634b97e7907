//! Feedback API endpoints.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use super::{success, ApiResult};
use crate::auth::{AdminOnly, Viewer};
use crate::errors::AppError;
use crate::inbox::{FeedbackView, InboxPage};
use crate::models::{CreateFeedbackRequest, Feedback};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct FeedbackListQuery {
    /// Show the archive instead of the inbox.
    #[serde(default)]
    pub archived: bool,
}

/// POST /api/feedbacks - Submit feedback as a signed-in visitor.
pub async fn create_feedback(
    State(state): State<AppState>,
    viewer: Viewer,
    Json(request): Json<CreateFeedbackRequest>,
) -> ApiResult<Feedback> {
    let (email, name) = match viewer {
        Viewer::User { email, name } => (email, name),
        Viewer::Admin(_) => {
            return Err(AppError::Forbidden(
                "Admins cannot submit feedback".to_string(),
            ))
        }
        Viewer::Anonymous => {
            return Err(AppError::Unauthorized(
                "Sign in to submit feedback".to_string(),
            ))
        }
    };

    if request.video_title.trim().is_empty() || request.comment.trim().is_empty() {
        return Err(AppError::Validation(
            "Please fill in all fields".to_string(),
        ));
    }

    let feedback = state.repo.create_feedback(&email, &name, &request).await?;
    tracing::info!("Feedback {} submitted", feedback.id);
    success(feedback)
}

/// GET /api/feedbacks - Inbox or archive, with the unread count.
pub async fn list_feedbacks(
    State(state): State<AppState>,
    _admin: AdminOnly,
    Query(params): Query<FeedbackListQuery>,
) -> ApiResult<InboxPage> {
    let all = state.repo.list_feedbacks().await?;
    success(InboxPage::build(
        &all,
        FeedbackView::from_archived_flag(params.archived),
    ))
}

/// PUT /api/feedbacks/:id/read - Mark feedback as read.
pub async fn mark_feedback_read(
    State(state): State<AppState>,
    _admin: AdminOnly,
    Path(id): Path<String>,
) -> ApiResult<Feedback> {
    success(state.repo.mark_feedback_read(&id).await?)
}

/// PUT /api/feedbacks/:id/archive - Move feedback to the archive.
pub async fn archive_feedback(
    State(state): State<AppState>,
    _admin: AdminOnly,
    Path(id): Path<String>,
) -> ApiResult<Feedback> {
    success(state.repo.set_feedback_archived(&id, true).await?)
}

/// PUT /api/feedbacks/:id/unarchive - Return feedback to the inbox.
pub async fn unarchive_feedback(
    State(state): State<AppState>,
    _admin: AdminOnly,
    Path(id): Path<String>,
) -> ApiResult<Feedback> {
    success(state.repo.set_feedback_archived(&id, false).await?)
}
