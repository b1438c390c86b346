#[cfg(test)]
mod tests;

pub mod models;

use anyhow::{Context, anyhow};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::Result;
use crate::config::{ApiKey, ConfigError, YoutubeConfig};
use crate::http::{build_agent, read_response, run_blocking};
pub use models::RawVideo;
use models::{ApiErrorResponse, SearchItem, SearchItemId, SearchListResponse, VideoListResponse};

/// `id.kind` of a search result that refers to a video
pub const VIDEO_KIND: &str = "youtube#video";

const SEARCH_PARTS: &str = "id,snippet";
const VIDEO_PARTS: &str = "snippet,contentDetails,statistics";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub video_id: String,
    pub kind: String,
}

impl SearchHit {
    #[inline]
    pub fn is_video(&self) -> bool {
        self.kind == VIDEO_KIND
    }
}

/// Outcome of a details call that did not fail
#[derive(Debug, Clone, PartialEq)]
pub enum DetailsLookup {
    Found(RawVideo),
    /// Deleted or made private between the search and the details call
    Missing,
}

/// Search and metadata provider
#[async_trait]
pub trait VideoSource: Send + Sync {
    /// One search call for up to `max_results` items
    async fn search(&self, keyword: &str, max_results: u32) -> Result<Vec<SearchHit>>;

    /// One details call for a single video
    async fn video_details(&self, video_id: &str) -> Result<DetailsLookup>;
}

#[derive(Debug, Clone)]
pub struct YoutubeClient {
    base_url: Url,
    api_key: ApiKey,
    agent: ureq::Agent,
}

impl YoutubeClient {
    #[inline]
    pub fn new(
        config: &YoutubeConfig,
        api_key: ApiKey,
    ) -> std::result::Result<Self, ConfigError> {
        Ok(Self {
            base_url: config.api_base_url()?,
            api_key,
            agent: build_agent(config.timeout()?),
        })
    }

    fn search_url(&self, keyword: &str, max_results: u32) -> anyhow::Result<Url> {
        let mut url = self
            .base_url
            .join("search")
            .context("Failed to build search URL")?;
        url.query_pairs_mut()
            .append_pair("part", SEARCH_PARTS)
            .append_pair("q", keyword)
            .append_pair("type", "video")
            .append_pair("maxResults", &max_results.to_string())
            .append_pair("key", self.api_key.as_str());
        Ok(url)
    }

    fn videos_url(&self, video_id: &str) -> anyhow::Result<Url> {
        let mut url = self
            .base_url
            .join("videos")
            .context("Failed to build videos URL")?;
        url.query_pairs_mut()
            .append_pair("part", VIDEO_PARTS)
            .append_pair("id", video_id)
            .append_pair("key", self.api_key.as_str());
        Ok(url)
    }

    /// Blocking search call. Hits of every kind are returned in API order.
    #[inline]
    pub fn search_videos(&self, keyword: &str, max_results: u32) -> anyhow::Result<Vec<SearchHit>> {
        debug!(
            "Searching YouTube for {:?} (max {} results)",
            keyword, max_results
        );

        let url = self.search_url(keyword, max_results)?;
        let response: SearchListResponse = self.get_json("search", &url)?;

        let hits = response
            .items
            .into_iter()
            .map(search_hit)
            .filter_map(|hit| hit.transpose())
            .collect::<anyhow::Result<Vec<_>>>()?;

        debug!("Search returned {} items", hits.len());
        Ok(hits)
    }

    /// Blocking details call for one video
    #[inline]
    pub fn lookup_video(&self, video_id: &str) -> anyhow::Result<DetailsLookup> {
        debug!("Fetching details for video {}", video_id);

        let url = self.videos_url(video_id)?;
        let response: VideoListResponse = self.get_json("videos", &url)?;

        Ok(response
            .items
            .into_iter()
            .next()
            .map_or(DetailsLookup::Missing, DetailsLookup::Found))
    }

    // The URL carries the API key, so only the endpoint name goes into messages
    fn get_json<T: DeserializeOwned>(&self, endpoint: &str, url: &Url) -> anyhow::Result<T> {
        let response = read_response(self.agent.get(url.as_str()).call(), endpoint)?;

        if !response.is_success() {
            return Err(match serde_json::from_str::<ApiErrorResponse>(&response.body) {
                Ok(api_error) => anyhow!(
                    "YouTube API error {}: {}",
                    api_error.error.code,
                    api_error.error.message
                ),
                Err(_) => anyhow!(
                    "YouTube API {} request failed with HTTP {}",
                    endpoint,
                    response.status
                ),
            });
        }

        serde_json::from_str(&response.body)
            .with_context(|| format!("Failed to parse {} response", endpoint))
    }
}

/// Video items must name their video; other kinds are kept only to be
/// filtered later and are dropped here when they carry no id
fn search_hit(item: SearchItem) -> anyhow::Result<Option<SearchHit>> {
    let SearchItemId {
        kind,
        video_id,
        channel_id,
        playlist_id,
    } = item.id;

    if kind == VIDEO_KIND {
        return match video_id {
            Some(video_id) => Ok(Some(SearchHit { video_id, kind })),
            None => Err(anyhow!("Search result of kind {} has no videoId", kind)),
        };
    }

    Ok(video_id
        .or(channel_id)
        .or(playlist_id)
        .map(|video_id| SearchHit { video_id, kind }))
}

#[async_trait]
impl VideoSource for YoutubeClient {
    async fn search(&self, keyword: &str, max_results: u32) -> Result<Vec<SearchHit>> {
        let client = self.clone();
        let keyword = keyword.to_string();
        run_blocking(move || client.search_videos(&keyword, max_results)).await
    }

    async fn video_details(&self, video_id: &str) -> Result<DetailsLookup> {
        let client = self.clone();
        let video_id = video_id.to_string();
        run_blocking(move || client.lookup_video(&video_id)).await
    }
}
