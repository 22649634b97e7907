//! Video validators that react to committed writes.
//!
//! Each event is turned into a [`TriggerAction`] by a pure policy, then the
//! action is applied to the store in the background. A newly created video with
//! a bad link is deleted; an update that breaks the link is reverted. Until the
//! action lands the invalid document is visible, and failed corrections are
//! only logged.

use std::sync::Arc;

use tokio::sync::{mpsc, Semaphore};

use crate::db::Repository;
use crate::models::Video;
use crate::youtube::is_valid_youtube_url;

/// A committed write to the videos collection.
#[derive(Debug, Clone)]
pub enum VideoEvent {
    Created { video: Video },
    Updated { before: Video, after: Video },
}

impl VideoEvent {
    pub fn video_id(&self) -> &str {
        match self {
            VideoEvent::Created { video } => &video.id,
            VideoEvent::Updated { after, .. } => &after.id,
        }
    }
}

/// What the validator wants done with the document.
#[derive(Debug, Clone, PartialEq)]
pub enum TriggerAction {
    Keep,
    Delete,
    RevertTo(Video),
}

/// Policy for freshly created videos.
pub fn on_create(video: &Video) -> TriggerAction {
    if is_valid_youtube_url(&video.youtube_url) {
        TriggerAction::Keep
    } else {
        TriggerAction::Delete
    }
}

/// Policy for updated videos. Only a changed link is checked.
pub fn on_update(before: &Video, after: &Video) -> TriggerAction {
    if before.youtube_url == after.youtube_url || is_valid_youtube_url(&after.youtube_url) {
        TriggerAction::Keep
    } else {
        TriggerAction::RevertTo(before.clone())
    }
}

pub fn evaluate(event: &VideoEvent) -> TriggerAction {
    match event {
        VideoEvent::Created { video } => on_create(video),
        VideoEvent::Updated { before, after } => on_update(before, after),
    }
}

/// Evaluate an event and apply the resulting action. Returns the action taken.
pub async fn handle_event(repo: &Repository, event: VideoEvent) -> TriggerAction {
    let video_id = event.video_id().to_string();
    tracing::debug!("Validating video {}", video_id);

    let action = evaluate(&event);
    match &action {
        TriggerAction::Keep => {
            tracing::debug!("Video {} validated successfully", video_id);
        }
        TriggerAction::Delete => {
            tracing::warn!("Invalid YouTube URL on new video {}, deleting", video_id);
            match repo.delete_video(&video_id).await {
                Ok(()) => tracing::info!("Deleted invalid video {}", video_id),
                Err(e) => tracing::error!("Error deleting invalid video {}: {}", video_id, e),
            }
        }
        TriggerAction::RevertTo(previous) => {
            tracing::warn!("Invalid YouTube URL on updated video {}, reverting", video_id);
            match repo.restore_video(previous).await {
                Ok(()) => tracing::info!("Reverted invalid update for video {}", video_id),
                Err(e) => tracing::error!("Error reverting invalid video {}: {}", video_id, e),
            }
        }
    }

    action
}

/// Handle to the background validator.
#[derive(Clone)]
pub struct TriggerRunner {
    sender: mpsc::UnboundedSender<VideoEvent>,
}

impl TriggerRunner {
    /// Start the validator loop. At most `max_instances` events are handled at once.
    pub fn spawn(repo: Arc<Repository>, max_instances: usize) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let permits = Arc::new(Semaphore::new(max_instances.max(1)));
        tokio::spawn(run(repo, receiver, permits));
        Self { sender }
    }

    /// Queue an event. Never blocks the caller.
    pub fn dispatch(&self, event: VideoEvent) {
        if let Err(e) = self.sender.send(event) {
            tracing::error!(
                "Validator stopped, dropping event for video {}",
                e.0.video_id()
            );
        }
    }
}

async fn run(
    repo: Arc<Repository>,
    mut receiver: mpsc::UnboundedReceiver<VideoEvent>,
    permits: Arc<Semaphore>,
) {
    while let Some(event) = receiver.recv().await {
        let permit = match permits.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => break,
        };
        let repo = repo.clone();
        tokio::spawn(async move {
            handle_event(&repo, event).await;
            drop(permit);
        });
    }
    tracing::debug!("Validator loop finished");
}
