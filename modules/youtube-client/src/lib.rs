pub mod error;
pub mod types;

pub use error::{Result, YouTubeError};
pub use types::{
    ChannelResource, ChannelStatistics, ListResponse, PlaylistItem, SearchKind, SearchOrder,
    SearchRequest, SearchResult, Thumbnail, Thumbnails, VideoResource,
};

use serde::de::DeserializeOwned;

const BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

/// Largest `maxResults` any list endpoint accepts.
pub const MAX_PAGE_SIZE: u32 = 50;

const CHANNEL_PARTS: &str = "snippet,contentDetails,statistics,brandingSettings";
const VIDEO_PARTS: &str = "snippet,contentDetails,statistics";

pub(crate) fn clamp_page_size(requested: u32) -> u32 {
    requested.clamp(1, MAX_PAGE_SIZE)
}

/// How to address a channel in `channels.list`.
#[derive(Debug, Clone, Copy)]
pub enum ChannelLookup<'a> {
    Ids(&'a [String]),
    /// Handle including the leading `@`.
    Handle(&'a str),
    Username(&'a str),
}

pub struct YouTubeClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl YouTubeClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: BASE_URL.to_string(),
        }
    }

    /// Build a client from an optional key; a missing or blank key is
    /// `YouTubeError::MissingApiKey`.
    pub fn from_key(api_key: Option<String>) -> Result<Self> {
        match api_key {
            Some(key) if !key.trim().is_empty() => Ok(Self::new(key)),
            _ => Err(YouTubeError::MissingApiKey),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<ListResponse<T>> {
        let url = format!("{}/{}", self.base_url, endpoint);
        tracing::debug!(endpoint, params = query.len(), "YouTube API request");

        let resp = self
            .client
            .get(&url)
            .query(query)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let err = YouTubeError::Api {
                status: status.as_u16(),
                message: body,
            };
            if err.is_quota_exceeded() {
                tracing::warn!(endpoint, "YouTube API quota exceeded");
            }
            return Err(err);
        }

        let body = resp.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// `channels.list` with full parts. An unknown channel yields an empty vec.
    pub async fn channels(&self, lookup: ChannelLookup<'_>) -> Result<Vec<ChannelResource>> {
        let mut query = vec![("part", CHANNEL_PARTS.to_string())];
        match lookup {
            ChannelLookup::Ids(ids) => {
                if ids.is_empty() {
                    return Ok(Vec::new());
                }
                query.push(("id", ids.join(",")));
                query.push(("maxResults", clamp_page_size(ids.len() as u32).to_string()));
            }
            ChannelLookup::Handle(handle) => query.push(("forHandle", handle.to_string())),
            ChannelLookup::Username(name) => query.push(("forUsername", name.to_string())),
        }

        let resp: ListResponse<ChannelResource> = self.get("channels", &query).await?;
        Ok(resp.items)
    }

    /// Most recent entries of a playlist (an uploads playlist is newest-first).
    pub async fn playlist_items(&self, playlist_id: &str, limit: u32) -> Result<Vec<PlaylistItem>> {
        let query = [
            ("part", "contentDetails".to_string()),
            ("playlistId", playlist_id.to_string()),
            ("maxResults", clamp_page_size(limit).to_string()),
        ];
        let resp: ListResponse<PlaylistItem> = self.get("playlistItems", &query).await?;
        Ok(resp.items)
    }

    /// `videos.list` for up to 50 ids, with snippet, duration and statistics.
    pub async fn videos(&self, ids: &[String]) -> Result<Vec<VideoResource>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids = &ids[..ids.len().min(MAX_PAGE_SIZE as usize)];
        let query = [
            ("part", VIDEO_PARTS.to_string()),
            ("id", ids.join(",")),
            ("maxResults", clamp_page_size(ids.len() as u32).to_string()),
        ];
        let resp: ListResponse<VideoResource> = self.get("videos", &query).await?;
        Ok(resp.items)
    }

    /// `search.list`. Costs 100 quota units per call.
    pub async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchResult>> {
        let resp: ListResponse<SearchResult> = self.get("search", &request.to_query()).await?;
        tracing::debug!(
            query = request.query.as_deref().unwrap_or(""),
            results = resp.items.len(),
            "YouTube search complete"
        );
        Ok(resp.items)
    }
}
