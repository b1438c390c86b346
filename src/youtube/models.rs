// Wire types for the YouTube Data API v3 `search.list` and `videos.list` responses
// Documentation: https://developers.google.com/youtube/v3/docs/videos

use serde::{Deserialize, Deserializer};

#[derive(Debug, Deserialize)]
pub struct SearchListResponse {
    #[serde(default)]
    pub items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
pub struct SearchItem {
    pub id: SearchItemId,
}

/// Resource id of a search result; exactly one of the id fields is set, matching `kind`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchItemId {
    pub kind: String,
    pub video_id: Option<String>,
    pub channel_id: Option<String>,
    pub playlist_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VideoListResponse {
    #[serde(default)]
    pub items: Vec<RawVideo>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawVideo {
    pub snippet: Snippet,
    pub content_details: ContentDetails,
    #[serde(default)]
    pub statistics: Statistics,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snippet {
    pub title: String,
    pub description: String,
    pub channel_title: String,
    pub published_at: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub category_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ContentDetails {
    pub duration: String,
}

/// Counters are absent when the uploader disabled them
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    #[serde(default, deserialize_with = "deserialize_count")]
    pub view_count: u64,
    #[serde(default, deserialize_with = "deserialize_count")]
    pub like_count: u64,
    #[serde(default, deserialize_with = "deserialize_count")]
    pub comment_count: u64,
}

/// Error envelope returned with non-2xx statuses
#[derive(Debug, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    pub code: u16,
    pub message: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Count {
    Number(u64),
    Text(String),
}

// The API encodes counters as decimal strings
fn deserialize_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Count>::deserialize(deserializer)? {
        None => Ok(0),
        Some(Count::Number(n)) => Ok(n),
        Some(Count::Text(s)) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}
