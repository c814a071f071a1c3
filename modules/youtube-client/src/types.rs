use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// --- Envelope ---

/// Wrapper for every `*.list` response. Only `items` matters to us.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    pub next_page_token: Option<String>,
}

// --- Thumbnails ---

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Thumbnail {
    pub url: String,
}

/// The API keys thumbnails by size name; any of them may be absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Thumbnails {
    pub default: Option<Thumbnail>,
    pub medium: Option<Thumbnail>,
    pub high: Option<Thumbnail>,
}

// --- channels.list ---

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelResource {
    pub id: String,
    pub snippet: Option<ChannelSnippet>,
    pub statistics: Option<ChannelStatistics>,
    pub content_details: Option<ChannelContentDetails>,
    pub branding_settings: Option<BrandingSettings>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelSnippet {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub custom_url: Option<String>,
    #[serde(default)]
    pub thumbnails: Thumbnails,
}

/// Counts arrive as decimal strings (`"12345"`), and `subscriberCount` is
/// omitted entirely when the channel hides it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelStatistics {
    pub subscriber_count: Option<String>,
    pub video_count: Option<String>,
    pub view_count: Option<String>,
    #[serde(default)]
    pub hidden_subscriber_count: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelContentDetails {
    pub related_playlists: Option<RelatedPlaylists>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RelatedPlaylists {
    pub uploads: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BrandingSettings {
    pub image: Option<BrandingImage>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrandingImage {
    pub banner_external_url: Option<String>,
}

impl ChannelResource {
    /// Uploads playlist id, if the response carried `contentDetails`.
    pub fn uploads_playlist_id(&self) -> Option<&str> {
        self.content_details
            .as_ref()?
            .related_playlists
            .as_ref()?
            .uploads
            .as_deref()
    }
}

// --- playlistItems.list ---

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistItem {
    pub content_details: Option<PlaylistItemContentDetails>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistItemContentDetails {
    pub video_id: String,
    pub video_published_at: Option<DateTime<Utc>>,
}

// --- videos.list ---

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoResource {
    pub id: String,
    pub snippet: Option<VideoSnippet>,
    pub content_details: Option<VideoContentDetails>,
    pub statistics: Option<VideoStatistics>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSnippet {
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub channel_id: String,
    #[serde(default)]
    pub channel_title: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub thumbnails: Thumbnails,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VideoContentDetails {
    /// ISO-8601 duration, e.g. `PT12M3S`.
    pub duration: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoStatistics {
    pub view_count: Option<String>,
    pub like_count: Option<String>,
    pub comment_count: Option<String>,
}

// --- search.list ---

#[derive(Debug, Clone, Deserialize)]
pub struct SearchResult {
    pub id: SearchResultId,
    pub snippet: Option<SearchSnippet>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResultId {
    pub kind: String,
    pub video_id: Option<String>,
    pub channel_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchSnippet {
    #[serde(default)]
    pub channel_id: String,
    #[serde(default)]
    pub channel_title: String,
    #[serde(default)]
    pub title: String,
}

/// Which resource type a search should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchKind {
    Video,
    Channel,
}

impl SearchKind {
    fn as_str(self) -> &'static str {
        match self {
            SearchKind::Video => "video",
            SearchKind::Channel => "channel",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOrder {
    Relevance,
    Date,
    ViewCount,
}

impl SearchOrder {
    fn as_str(self) -> &'static str {
        match self {
            SearchOrder::Relevance => "relevance",
            SearchOrder::Date => "date",
            SearchOrder::ViewCount => "viewCount",
        }
    }
}

/// Parameters for `search.list`. Build with [`SearchRequest::keyword`] or
/// [`SearchRequest::channel`] and refine with the setters.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub query: Option<String>,
    pub channel_id: Option<String>,
    pub kind: SearchKind,
    pub order: Option<SearchOrder>,
    pub published_after: Option<DateTime<Utc>>,
    pub max_results: u32,
}

impl SearchRequest {
    pub fn keyword(query: impl Into<String>, kind: SearchKind) -> Self {
        Self {
            query: Some(query.into()),
            channel_id: None,
            kind,
            order: None,
            published_after: None,
            max_results: 10,
        }
    }

    pub fn channel(channel_id: impl Into<String>) -> Self {
        Self {
            query: None,
            channel_id: Some(channel_id.into()),
            kind: SearchKind::Video,
            order: None,
            published_after: None,
            max_results: 10,
        }
    }

    pub fn order(mut self, order: SearchOrder) -> Self {
        self.order = Some(order);
        self
    }

    pub fn published_after(mut self, after: Option<DateTime<Utc>>) -> Self {
        self.published_after = after;
        self
    }

    pub fn max_results(mut self, max_results: u32) -> Self {
        self.max_results = max_results;
        self
    }

    pub(crate) fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("part", "snippet".to_string()),
            ("type", self.kind.as_str().to_string()),
            ("maxResults", crate::clamp_page_size(self.max_results).to_string()),
        ];
        if let Some(q) = &self.query {
            query.push(("q", q.clone()));
        }
        if let Some(channel_id) = &self.channel_id {
            query.push(("channelId", channel_id.clone()));
        }
        if let Some(order) = self.order {
            query.push(("order", order.as_str().to_string()));
        }
        if let Some(after) = self.published_after {
            query.push((
                "publishedAfter",
                after.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            ));
        }
        query
    }
}
