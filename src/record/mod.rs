
use serde::{Deserialize, Serialize};

use crate::youtube::RawVideo;

pub const WATCH_URL_BASE: &str = "https://www.youtube.com/watch?v=";

/// Flat, normalized view of one video as returned to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoRecord {
    #[serde(skip)]
    pub video_id: String,
    #[serde(rename = "Video URL")]
    pub url: String,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "Channel Title")]
    pub channel: String,
    #[serde(rename = "Keyword Tags")]
    pub tags: Vec<String>,
    #[serde(rename = "Category ID")]
    pub category: Option<String>,
    #[serde(rename = "Published At")]
    pub published: String,
    /// ISO-8601 duration as delivered, e.g. `PT4M13S`
    #[serde(rename = "Duration")]
    pub duration: String,
    #[serde(rename = "View Count")]
    pub views: u64,
    #[serde(rename = "Like Count")]
    pub likes: u64,
    #[serde(rename = "Comment Count")]
    pub comments: u64,
}

impl VideoRecord {
    /// Text fed to the embedding model: title, one space, description
    #[inline]
    pub fn embedding_text(&self) -> String {
        format!("{} {}", self.title, self.description)
    }
}

#[inline]
pub fn video_url(video_id: &str) -> String {
    format!("{}{}", WATCH_URL_BASE, video_id)
}

/// Map a details payload onto a [`VideoRecord`]
#[inline]
pub fn normalize(video_id: &str, raw: &RawVideo) -> VideoRecord {
    let snippet = &raw.snippet;
    let statistics = &raw.statistics;

    VideoRecord {
        video_id: video_id.to_string(),
        url: video_url(video_id),
        title: snippet.title.clone(),
        description: snippet.description.clone(),
        channel: snippet.channel_title.clone(),
        tags: snippet.tags.clone(),
        category: snippet.category_id.clone(),
        published: snippet.published_at.clone(),
        duration: raw.content_details.duration.clone(),
        views: statistics.view_count,
        likes: statistics.like_count,
        comments: statistics.comment_count,
    }
}
