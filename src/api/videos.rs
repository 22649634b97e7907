//! Video API endpoints.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{de, Deserialize, Deserializer};

use super::{success, ApiResult};
use crate::auth::{AdminOnly, Viewer};
use crate::errors::AppError;
use crate::models::{
    CreateVideoRequest, MainTag, UpdateVideoRequest, VideoView, VisibilityRequest,
};
use crate::ranking::{available_sub_tags, rank_videos, SortBy, VideoFilter};
use crate::triggers::VideoEvent;
use crate::youtube::is_valid_youtube_url;
use crate::AppState;

/// Listing query parameters, mirroring the search box and filter bar.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoListQuery {
    #[serde(default)]
    pub q: String,
    #[serde(default, deserialize_with = "deserialize_main_tag")]
    pub main_tag: Option<MainTag>,
    #[serde(default, deserialize_with = "non_empty")]
    pub sub_tag: Option<String>,
    #[serde(default, deserialize_with = "deserialize_rating")]
    pub rating: Option<i32>,
    #[serde(default)]
    pub sort_by: SortBy,
}

impl VideoListQuery {
    fn filter(&self) -> VideoFilter {
        VideoFilter {
            main_tag: self.main_tag,
            sub_tag: self.sub_tag.clone(),
            rating: self.rating,
            sort_by: self.sort_by,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubTagQuery {
    #[serde(default, deserialize_with = "deserialize_main_tag")]
    pub main_tag: Option<MainTag>,
}

/// A cleared filter arrives as an empty string and means "any".
fn non_empty<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Deserialize::deserialize(deserializer)?;
    Ok(raw.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()))
}

fn deserialize_main_tag<'de, D>(deserializer: D) -> Result<Option<MainTag>, D::Error>
where
    D: Deserializer<'de>,
{
    non_empty(deserializer)?
        .map(|s| {
            MainTag::from_str(&s)
                .ok_or_else(|| de::Error::custom(format!("unknown main tag {:?}", s)))
        })
        .transpose()
}

fn deserialize_rating<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    non_empty(deserializer)?
        .map(|s| s.parse::<i32>().map_err(de::Error::custom))
        .transpose()
}

/// GET /api/videos - Ranked videos for the caller.
pub async fn list_videos(
    State(state): State<AppState>,
    viewer: Viewer,
    Query(params): Query<VideoListQuery>,
) -> ApiResult<Vec<VideoView>> {
    let admin = viewer.admin_token();
    let videos = state.repo.list_videos(admin.is_some()).await?;

    let ranked = rank_videos(&videos, &params.q, &params.filter(), admin);
    success(ranked.into_iter().map(VideoView::from).collect())
}

/// GET /api/videos/sub-tags - Sub-tags in use among the caller's videos.
pub async fn list_sub_tags(
    State(state): State<AppState>,
    viewer: Viewer,
    Query(params): Query<SubTagQuery>,
) -> ApiResult<Vec<String>> {
    let videos = state.repo.list_videos(viewer.is_admin()).await?;
    success(available_sub_tags(&videos, params.main_tag))
}

/// GET /api/videos/:id - Get a single video.
pub async fn get_video(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<String>,
) -> ApiResult<VideoView> {
    match state.repo.get_video(&id).await? {
        Some(video) if video.is_public || viewer.is_admin() => success(VideoView::from(video)),
        _ => Err(AppError::NotFound(format!("Video {} not found", id))),
    }
}

/// POST /api/videos - Create a new video.
pub async fn create_video(
    State(state): State<AppState>,
    _admin: AdminOnly,
    Json(request): Json<CreateVideoRequest>,
) -> ApiResult<VideoView> {
    validate_title(&request.title)?;
    validate_youtube_url(&request.youtube_url)?;
    validate_rating(request.rating)?;

    let video = state.repo.create_video(&request).await?;
    tracing::info!("Video {} created", video.id);

    state.triggers.dispatch(VideoEvent::Created {
        video: video.clone(),
    });

    success(VideoView::from(video))
}

/// PUT /api/videos/:id - Update a video.
pub async fn update_video(
    State(state): State<AppState>,
    _admin: AdminOnly,
    Path(id): Path<String>,
    Json(request): Json<UpdateVideoRequest>,
) -> ApiResult<VideoView> {
    if let Some(title) = &request.title {
        validate_title(title)?;
    }
    if let Some(url) = &request.youtube_url {
        validate_youtube_url(url)?;
    }
    if let Some(rating) = request.rating {
        validate_rating(rating)?;
    }

    let (before, after) = state.repo.update_video(&id, &request).await?;
    tracing::info!("Video {} updated", id);

    state.triggers.dispatch(VideoEvent::Updated {
        before,
        after: after.clone(),
    });

    success(VideoView::from(after))
}

/// PUT /api/videos/:id/visibility - Show or hide a video.
pub async fn set_video_visibility(
    State(state): State<AppState>,
    _admin: AdminOnly,
    Path(id): Path<String>,
    Json(request): Json<VisibilityRequest>,
) -> ApiResult<VideoView> {
    let (before, after) = state
        .repo
        .set_video_visibility(&id, request.is_public)
        .await?;
    tracing::info!("Video {} is_public={}", id, request.is_public);

    state.triggers.dispatch(VideoEvent::Updated {
        before,
        after: after.clone(),
    });

    success(VideoView::from(after))
}

fn validate_title(title: &str) -> Result<(), AppError> {
    if title.trim().is_empty() {
        return Err(AppError::Validation("Title is required".to_string()));
    }
    Ok(())
}

fn validate_youtube_url(url: &str) -> Result<(), AppError> {
    if !is_valid_youtube_url(url.trim()) {
        return Err(AppError::Validation(
            "Please enter a valid YouTube URL".to_string(),
        ));
    }
    Ok(())
}

fn validate_rating(rating: i32) -> Result<(), AppError> {
    if !(1..=5).contains(&rating) {
        return Err(AppError::Validation(
            "Rating must be between 1 and 5".to_string(),
        ));
    }
    Ok(())
}
