//! YouTube URL handling.
//!
//! The same pattern backs the synchronous API checks and the asynchronous
//! video validators, so both sides always agree on what a valid link is.

use once_cell::sync::Lazy;
use regex::Regex;

/// Pattern a video's `youtubeUrl` must match. Capture group 1 is the video id.
pub const YOUTUBE_URL_PATTERN: &str =
    r"(?:youtu\.be/|youtube\.com/(?:embed/|v/|watch\?v=|watch\?.+&v=))([^&?]+)";

static YOUTUBE_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(YOUTUBE_URL_PATTERN).expect("YouTube URL pattern compiles"));

/// Returns true if the URL points at a YouTube video.
pub fn is_valid_youtube_url(url: &str) -> bool {
    YOUTUBE_URL.is_match(url)
}

/// Extract the video id, if any.
pub fn youtube_id(url: &str) -> Option<&str> {
    YOUTUBE_URL
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

pub fn thumbnail_url(video_id: &str) -> String {
    format!("https://img.youtube.com/vi/{}/hqdefault.jpg", video_id)
}

pub fn embed_url(video_id: &str) -> String {
    format!("https://www.youtube.com/embed/{}?autoplay=1", video_id)
}
