//! Video model matching the frontend Video interface.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::youtube;

/// Audience a video is aimed at.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum MainTag {
    Tourist,
    Resident,
}

impl MainTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            MainTag::Tourist => "Tourist",
            MainTag::Resident => "Resident",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Tourist" => Some(MainTag::Tourist),
            "Resident" => Some(MainTag::Resident),
            _ => None,
        }
    }
}

/// Sponsorship ribbon. Only meaningful on sponsored videos.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RibbonColor {
    Gold,
    Silver,
    Bronze,
}

impl RibbonColor {
    pub fn as_str(&self) -> &'static str {
        match self {
            RibbonColor::Gold => "gold",
            RibbonColor::Silver => "silver",
            RibbonColor::Bronze => "bronze",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "gold" => Some(RibbonColor::Gold),
            "silver" => Some(RibbonColor::Silver),
            "bronze" => Some(RibbonColor::Bronze),
            _ => None,
        }
    }

    /// Sort rank, lower sorts first.
    pub fn tier(&self) -> u8 {
        match self {
            RibbonColor::Gold => 1,
            RibbonColor::Silver => 2,
            RibbonColor::Bronze => 3,
        }
    }
}

/// Rank of an optional ribbon; a missing ribbon sorts after bronze.
pub fn ribbon_tier(ribbon: Option<RibbonColor>) -> u8 {
    ribbon.map(|r| r.tier()).unwrap_or(4)
}

/// Place picked through the maps autocomplete.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub name: String,
    pub address: String,
    pub lat: f64,
    pub lng: f64,
}

/// A listed video.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: String,
    pub youtube_url: String,
    pub title: String,
    pub main_tag: MainTag,
    #[serde(default)]
    pub sub_tags: Vec<String>,
    pub rating: i32,
    #[serde(default)]
    pub is_sponsored: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ribbon_color: Option<RibbonColor>,
    #[serde(default)]
    pub is_pinned: bool,
    #[serde(default = "default_public")]
    pub is_public: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    pub created_at: DateTime<Utc>,
}

fn default_public() -> bool {
    true
}

/// Video plus the links the client renders, derived from `youtubeUrl`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoView {
    #[serde(flatten)]
    pub video: Video,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub youtube_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embed_url: Option<String>,
}

impl From<Video> for VideoView {
    fn from(video: Video) -> Self {
        let youtube_id = youtube::youtube_id(&video.youtube_url).map(str::to_string);
        Self {
            thumbnail_url: youtube_id.as_deref().map(youtube::thumbnail_url),
            embed_url: youtube_id.as_deref().map(youtube::embed_url),
            youtube_id,
            video,
        }
    }
}

/// Request body for creating a new video.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateVideoRequest {
    pub youtube_url: String,
    pub title: String,
    pub main_tag: MainTag,
    #[serde(default)]
    pub sub_tags: Vec<String>,
    pub rating: i32,
    #[serde(default)]
    pub is_sponsored: bool,
    #[serde(default)]
    pub ribbon_color: Option<RibbonColor>,
    #[serde(default)]
    pub is_pinned: bool,
    #[serde(default = "default_public")]
    pub is_public: bool,
    #[serde(default)]
    pub location: Option<Location>,
}

/// Request body for updating an existing video. Absent fields are kept.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateVideoRequest {
    #[serde(default)]
    pub youtube_url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub main_tag: Option<MainTag>,
    #[serde(default)]
    pub sub_tags: Option<Vec<String>>,
    #[serde(default)]
    pub rating: Option<i32>,
    #[serde(default)]
    pub is_sponsored: Option<bool>,
    /// `null` removes the ribbon.
    #[serde(default, deserialize_with = "deserialize_nullable")]
    pub ribbon_color: Option<Option<RibbonColor>>,
    #[serde(default)]
    pub is_pinned: Option<bool>,
    #[serde(default)]
    pub is_public: Option<bool>,
    /// `null` removes the location.
    #[serde(default, deserialize_with = "deserialize_nullable")]
    pub location: Option<Option<Location>>,
}

/// Deserializes a field where an explicit `null` differs from a missing one.
/// A missing field stays `None` through `#[serde(default)]`; `null` becomes
/// `Some(None)`.
fn deserialize_nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl UpdateVideoRequest {
    /// The video as it looks once this update is merged in.
    pub fn apply_to(&self, video: &Video) -> Video {
        Video {
            id: video.id.clone(),
            youtube_url: self
                .youtube_url
                .as_deref()
                .map(|u| u.trim().to_string())
                .unwrap_or_else(|| video.youtube_url.clone()),
            title: self
                .title
                .as_deref()
                .map(|t| t.trim().to_string())
                .unwrap_or_else(|| video.title.clone()),
            main_tag: self.main_tag.unwrap_or(video.main_tag),
            sub_tags: self
                .sub_tags
                .as_deref()
                .map(normalize_sub_tags)
                .unwrap_or_else(|| video.sub_tags.clone()),
            rating: self.rating.unwrap_or(video.rating),
            is_sponsored: self.is_sponsored.unwrap_or(video.is_sponsored),
            ribbon_color: self.ribbon_color.unwrap_or(video.ribbon_color),
            is_pinned: self.is_pinned.unwrap_or(video.is_pinned),
            is_public: self.is_public.unwrap_or(video.is_public),
            location: self
                .location
                .clone()
                .unwrap_or_else(|| video.location.clone()),
            created_at: video.created_at,
        }
    }
}

/// Request body for toggling public visibility.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibilityRequest {
    pub is_public: bool,
}

/// Trim sub-tags and drop blanks and duplicates, keeping first-seen order.
pub fn normalize_sub_tags(tags: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if !tag.is_empty() && !out.iter().any(|t| t == tag) {
            out.push(tag.to_string());
        }
    }
    out
}
