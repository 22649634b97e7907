//! Database repository for document operations.
//!
//! Uses prepared statements; every write touches a single document.

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use sqlx::{Row, SqlitePool};

use crate::errors::AppError;
use crate::models::{
    normalize_sub_tags, CreateFeedbackRequest, CreateVideoRequest, Feedback, Location, MainTag,
    RibbonColor, UpdateVideoRequest, Video,
};

const VIDEO_COLUMNS: &str = "id, youtube_url, title, main_tag, sub_tags, rating, is_sponsored, \
     ribbon_color, is_pinned, is_public, location, created_at";

const FEEDBACK_COLUMNS: &str =
    "id, user_email, user_name, video_title, comment, is_read, is_archived, created_at";

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ==================== VIDEO OPERATIONS ====================

    /// List videos, newest first. Hidden videos are included only on request.
    pub async fn list_videos(&self, include_hidden: bool) -> Result<Vec<Video>, AppError> {
        let sql = if include_hidden {
            format!("SELECT {} FROM videos ORDER BY created_at DESC", VIDEO_COLUMNS)
        } else {
            format!(
                "SELECT {} FROM videos WHERE is_public = 1 ORDER BY created_at DESC",
                VIDEO_COLUMNS
            )
        };

        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        Ok(rows.iter().filter_map(video_from_row).collect())
    }

    /// Get a video by ID.
    pub async fn get_video(&self, id: &str) -> Result<Option<Video>, AppError> {
        let sql = format!("SELECT {} FROM videos WHERE id = ?", VIDEO_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().and_then(video_from_row))
    }

    /// Create a new video. The store assigns the id and creation time.
    pub async fn create_video(&self, request: &CreateVideoRequest) -> Result<Video, AppError> {
        let video = Video {
            id: uuid::Uuid::new_v4().to_string(),
            youtube_url: request.youtube_url.trim().to_string(),
            title: request.title.trim().to_string(),
            main_tag: request.main_tag,
            sub_tags: normalize_sub_tags(&request.sub_tags),
            rating: request.rating,
            is_sponsored: request.is_sponsored,
            ribbon_color: request.ribbon_color,
            is_pinned: request.is_pinned,
            is_public: request.is_public,
            location: request.location.clone(),
            created_at: store_now(),
        };

        sqlx::query(
            "INSERT INTO videos (id, youtube_url, title, main_tag, sub_tags, rating, is_sponsored, ribbon_color, is_pinned, is_public, location, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        )
        .bind(&video.id)
        .bind(&video.youtube_url)
        .bind(&video.title)
        .bind(video.main_tag.as_str())
        .bind(to_json_array(&video.sub_tags)?)
        .bind(video.rating)
        .bind(video.is_sponsored as i32)
        .bind(video.ribbon_color.map(|r| r.as_str()))
        .bind(video.is_pinned as i32)
        .bind(video.is_public as i32)
        .bind(location_json(&video.location)?)
        .bind(format_timestamp(&video.created_at))
        .execute(&self.pool)
        .await?;

        tracing::debug!("Created video {}", video.id);
        Ok(video)
    }

    /// Merge `request` into a video. Returns the document before and after.
    pub async fn update_video(
        &self,
        id: &str,
        request: &UpdateVideoRequest,
    ) -> Result<(Video, Video), AppError> {
        let before = self
            .get_video(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Video {} not found", id)))?;

        let after = request.apply_to(&before);
        self.write_video(&after).await?;

        Ok((before, after))
    }

    /// Show or hide a video. Returns the document before and after.
    pub async fn set_video_visibility(
        &self,
        id: &str,
        is_public: bool,
    ) -> Result<(Video, Video), AppError> {
        let before = self
            .get_video(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Video {} not found", id)))?;

        let result = sqlx::query("UPDATE videos SET is_public = ? WHERE id = ?")
            .bind(is_public as i32)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Video {} not found", id)));
        }

        let after = Video {
            is_public,
            ..before.clone()
        };
        Ok((before, after))
    }

    /// Overwrite a stored video with the field values of `video`.
    ///
    /// `id` and `createdAt` are never rewritten.
    pub async fn restore_video(&self, video: &Video) -> Result<(), AppError> {
        self.write_video(video).await
    }

    /// Delete a video.
    pub async fn delete_video(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM videos WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Video {} not found", id)));
        }

        Ok(())
    }

    async fn write_video(&self, video: &Video) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE videos SET youtube_url = ?, title = ?, main_tag = ?, sub_tags = ?, rating = ?, is_sponsored = ?, ribbon_color = ?, is_pinned = ?, is_public = ?, location = ? WHERE id = ?"
        )
        .bind(&video.youtube_url)
        .bind(&video.title)
        .bind(video.main_tag.as_str())
        .bind(to_json_array(&video.sub_tags)?)
        .bind(video.rating)
        .bind(video.is_sponsored as i32)
        .bind(video.ribbon_color.map(|r| r.as_str()))
        .bind(video.is_pinned as i32)
        .bind(video.is_public as i32)
        .bind(location_json(&video.location)?)
        .bind(&video.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Video {} not found", video.id)));
        }

        Ok(())
    }

    // ==================== FEEDBACK OPERATIONS ====================

    /// List all feedback, newest first.
    pub async fn list_feedbacks(&self) -> Result<Vec<Feedback>, AppError> {
        let sql = format!(
            "SELECT {} FROM feedbacks ORDER BY created_at DESC",
            FEEDBACK_COLUMNS
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        Ok(rows.iter().map(feedback_from_row).collect())
    }

    /// Get a feedback by ID.
    pub async fn get_feedback(&self, id: &str) -> Result<Option<Feedback>, AppError> {
        let sql = format!("SELECT {} FROM feedbacks WHERE id = ?", FEEDBACK_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(feedback_from_row))
    }

    /// Store feedback from a signed-in user. Starts unread and in the inbox.
    pub async fn create_feedback(
        &self,
        user_email: &str,
        user_name: &str,
        request: &CreateFeedbackRequest,
    ) -> Result<Feedback, AppError> {
        let feedback = Feedback {
            id: uuid::Uuid::new_v4().to_string(),
            user_email: user_email.to_string(),
            user_name: user_name.to_string(),
            video_title: request.video_title.trim().to_string(),
            comment: request.comment.trim().to_string(),
            is_read: false,
            is_archived: false,
            created_at: store_now(),
        };

        sqlx::query(
            "INSERT INTO feedbacks (id, user_email, user_name, video_title, comment, is_read, is_archived, created_at) VALUES (?, ?, ?, ?, ?, 0, 0, ?)"
        )
        .bind(&feedback.id)
        .bind(&feedback.user_email)
        .bind(&feedback.user_name)
        .bind(&feedback.video_title)
        .bind(&feedback.comment)
        .bind(format_timestamp(&feedback.created_at))
        .execute(&self.pool)
        .await?;

        Ok(feedback)
    }

    /// Mark feedback as read. There is no way back to unread.
    pub async fn mark_feedback_read(&self, id: &str) -> Result<Feedback, AppError> {
        let result = sqlx::query("UPDATE feedbacks SET is_read = 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        self.reload_feedback(id, result.rows_affected()).await
    }

    /// Move feedback between the inbox and the archive.
    pub async fn set_feedback_archived(
        &self,
        id: &str,
        is_archived: bool,
    ) -> Result<Feedback, AppError> {
        let result = sqlx::query("UPDATE feedbacks SET is_archived = ? WHERE id = ?")
            .bind(is_archived as i32)
            .bind(id)
            .execute(&self.pool)
            .await?;

        self.reload_feedback(id, result.rows_affected()).await
    }

    async fn reload_feedback(&self, id: &str, rows_affected: u64) -> Result<Feedback, AppError> {
        let not_found = || AppError::NotFound(format!("Feedback {} not found", id));
        if rows_affected == 0 {
            return Err(not_found());
        }
        self.get_feedback(id).await?.ok_or_else(not_found)
    }
}

// Helper functions for row conversion

/// `None` for rows with an unknown main tag.
fn video_from_row(row: &sqlx::sqlite::SqliteRow) -> Option<Video> {
    let id: String = row.get("id");
    let main_tag_str: String = row.get("main_tag");
    let Some(main_tag) = MainTag::from_str(&main_tag_str) else {
        tracing::warn!("Skipping video {} with unknown main tag {:?}", id, main_tag_str);
        return None;
    };
    let sub_tags_str: String = row.get("sub_tags");
    let ribbon_str: Option<String> = row.get("ribbon_color");
    let location_str: Option<String> = row.get("location");
    let is_sponsored: i32 = row.get("is_sponsored");
    let is_pinned: i32 = row.get("is_pinned");
    let is_public: i32 = row.get("is_public");
    let created_at: String = row.get("created_at");

    Some(Video {
        youtube_url: row.get("youtube_url"),
        title: row.get("title"),
        main_tag,
        sub_tags: parse_json_array(&sub_tags_str),
        rating: row.get("rating"),
        is_sponsored: is_sponsored != 0,
        ribbon_color: ribbon_str.and_then(|s| RibbonColor::from_str(&s)),
        is_pinned: is_pinned != 0,
        is_public: is_public != 0,
        location: location_str.and_then(|s| serde_json::from_str::<Location>(&s).ok()),
        created_at: parse_timestamp(&id, &created_at),
        id,
    })
}

fn feedback_from_row(row: &sqlx::sqlite::SqliteRow) -> Feedback {
    let id: String = row.get("id");
    let is_read: i32 = row.get("is_read");
    let is_archived: i32 = row.get("is_archived");
    let created_at: String = row.get("created_at");

    Feedback {
        user_email: row.get("user_email"),
        user_name: row.get("user_name"),
        video_title: row.get("video_title"),
        comment: row.get("comment"),
        is_read: is_read != 0,
        is_archived: is_archived != 0,
        created_at: parse_timestamp(&id, &created_at),
        id,
    }
}

/// Current time at the precision the store keeps.
fn store_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Fixed-width UTC timestamps so text ordering matches time ordering.
fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Unreadable timestamps sort as the oldest possible value instead of failing.
fn parse_timestamp(id: &str, raw: &str) -> DateTime<Utc> {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(ts) => ts.with_timezone(&Utc),
        Err(e) => {
            tracing::warn!("Document {} has unreadable timestamp {:?}: {}", id, raw, e);
            DateTime::<Utc>::MIN_UTC
        }
    }
}

fn to_json_array(values: &[String]) -> Result<String, AppError> {
    Ok(serde_json::to_string(values)?)
}

fn location_json(location: &Option<Location>) -> Result<Option<String>, AppError> {
    location
        .as_ref()
        .map(|l| serde_json::to_string(l).map_err(AppError::from))
        .transpose()
}

fn parse_json_array(s: &str) -> Vec<String> {
    serde_json::from_str(s).unwrap_or_default()
}
