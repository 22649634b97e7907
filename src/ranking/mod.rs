//! Video ranking.
//!
//! Turns a snapshot of videos into what a viewer should see: hidden videos
//! removed for non-admins, text and facet filters applied, then ordered with
//! pinned first, sponsored next (by ribbon tier, then rating), and everything
//! else by the requested sort. Pure and cheap enough to run on every keystroke.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::auth::AdminToken;
use crate::models::{ribbon_tier, MainTag, Video};

/// User-selected order for non-sponsored videos.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SortBy {
    #[default]
    Newest,
    Oldest,
    HighestRated,
    LowestRated,
}

/// Facet selection from the filter bar.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VideoFilter {
    pub main_tag: Option<MainTag>,
    pub sub_tag: Option<String>,
    /// Minimum rating, inclusive.
    pub rating: Option<i32>,
    pub sort_by: SortBy,
}

/// Filter and order `videos` for display.
///
/// Passing an [`AdminToken`] keeps non-public videos in the result.
pub fn rank_videos(
    videos: &[Video],
    search_query: &str,
    filter: &VideoFilter,
    admin: Option<AdminToken>,
) -> Vec<Video> {
    let query = search_query.to_lowercase();

    let mut ranked: Vec<Video> = videos
        .iter()
        .filter(|v| admin.is_some() || v.is_public)
        .filter(|v| query.is_empty() || matches_query(v, &query))
        .filter(|v| matches_facets(v, filter))
        .cloned()
        .collect();

    // Stable, so equal videos keep the store's order.
    ranked.sort_by(|a, b| compare(a, b, filter.sort_by));
    ranked
}

/// Distinct sub-tags present in `videos`, first-seen order, optionally for one main tag.
pub fn available_sub_tags(videos: &[Video], main_tag: Option<MainTag>) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for video in videos
        .iter()
        .filter(|v| main_tag.map_or(true, |t| v.main_tag == t))
    {
        for tag in &video.sub_tags {
            if !tags.contains(tag) {
                tags.push(tag.clone());
            }
        }
    }
    tags
}

fn matches_query(video: &Video, lowered_query: &str) -> bool {
    video.title.to_lowercase().contains(lowered_query)
        || video
            .sub_tags
            .iter()
            .any(|t| t.to_lowercase().contains(lowered_query))
}

fn matches_facets(video: &Video, filter: &VideoFilter) -> bool {
    if let Some(main_tag) = filter.main_tag {
        if video.main_tag != main_tag {
            return false;
        }
    }
    if let Some(sub_tag) = &filter.sub_tag {
        if !video.sub_tags.contains(sub_tag) {
            return false;
        }
    }
    if let Some(min_rating) = filter.rating {
        if video.rating < min_rating {
            return false;
        }
    }
    true
}

fn compare(a: &Video, b: &Video, sort_by: SortBy) -> Ordering {
    b.is_pinned
        .cmp(&a.is_pinned)
        .then_with(|| b.is_sponsored.cmp(&a.is_sponsored))
        .then_with(|| {
            if a.is_sponsored {
                ribbon_tier(a.ribbon_color)
                    .cmp(&ribbon_tier(b.ribbon_color))
                    .then_with(|| b.rating.cmp(&a.rating))
            } else {
                compare_by(a, b, sort_by)
            }
        })
}

fn compare_by(a: &Video, b: &Video, sort_by: SortBy) -> Ordering {
    match sort_by {
        SortBy::Newest => b.created_at.cmp(&a.created_at),
        SortBy::Oldest => a.created_at.cmp(&b.created_at),
        SortBy::HighestRated => b.rating.cmp(&a.rating),
        SortBy::LowestRated => a.rating.cmp(&b.rating),
    }
}
