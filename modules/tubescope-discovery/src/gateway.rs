//! YouTube Data API adapter for [`ChannelGateway`].
//!
//! Wire types stay inside this module: optional sections and decimal-string
//! counts are flattened into `ChannelSummary` / `VideoSummary` here, with
//! empty-string and zero defaults, so nothing "maybe missing" leaks further.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use tubescope_common::{
    parse_count, ChannelIdentifier, ChannelSummary, SearchHit, Thumbnails, VideoSummary,
};
use youtube_client::types::SearchResult;
use youtube_client::{
    ChannelLookup, ChannelResource, SearchKind, SearchOrder, SearchRequest, VideoResource,
    YouTubeClient,
};

use crate::traits::{ChannelGateway, MAX_BATCH_IDS};

// ---------------------------------------------------------------------------
// Wire → domain
// ---------------------------------------------------------------------------

fn thumbnails(wire: &youtube_client::Thumbnails) -> Thumbnails {
    let url = |t: &Option<youtube_client::Thumbnail>| {
        t.as_ref().map(|t| t.url.clone()).unwrap_or_default()
    };
    Thumbnails {
        small: url(&wire.default),
        medium: url(&wire.medium),
        large: url(&wire.high),
    }
}

pub fn channel_summary(resource: &ChannelResource) -> ChannelSummary {
    let snippet = resource.snippet.as_ref();
    let stats = resource.statistics.as_ref();

    ChannelSummary {
        id: resource.id.clone(),
        title: snippet.map(|s| s.title.clone()).unwrap_or_default(),
        description: snippet.map(|s| s.description.clone()).unwrap_or_default(),
        custom_url: snippet
            .and_then(|s| s.custom_url.clone())
            .unwrap_or_default(),
        thumbnails: snippet.map(|s| thumbnails(&s.thumbnails)).unwrap_or_default(),
        subscriber_count: parse_count(stats.and_then(|s| s.subscriber_count.as_deref())),
        video_count: parse_count(stats.and_then(|s| s.video_count.as_deref())),
        view_count: parse_count(stats.and_then(|s| s.view_count.as_deref())),
        uploads_playlist_id: resource
            .uploads_playlist_id()
            .unwrap_or_default()
            .to_string(),
        banner_url: resource
            .branding_settings
            .as_ref()
            .and_then(|b| b.image.as_ref())
            .and_then(|i| i.banner_external_url.clone())
            .unwrap_or_default(),
    }
}

pub fn video_summary(resource: &VideoResource) -> VideoSummary {
    let snippet = resource.snippet.as_ref();
    let stats = resource.statistics.as_ref();

    VideoSummary {
        id: resource.id.clone(),
        title: snippet.map(|s| s.title.clone()).unwrap_or_default(),
        description: snippet.map(|s| s.description.clone()).unwrap_or_default(),
        published_at: snippet.and_then(|s| s.published_at),
        channel_id: snippet.map(|s| s.channel_id.clone()).unwrap_or_default(),
        channel_title: snippet.map(|s| s.channel_title.clone()).unwrap_or_default(),
        thumbnails: snippet.map(|s| thumbnails(&s.thumbnails)).unwrap_or_default(),
        duration: resource
            .content_details
            .as_ref()
            .and_then(|c| c.duration.clone())
            .unwrap_or_default(),
        view_count: parse_count(stats.and_then(|s| s.view_count.as_deref())),
        like_count: parse_count(stats.and_then(|s| s.like_count.as_deref())),
        comment_count: parse_count(stats.and_then(|s| s.comment_count.as_deref())),
        tags: snippet.and_then(|s| s.tags.clone()).unwrap_or_default(),
    }
}

fn search_hit(result: &SearchResult) -> Option<SearchHit> {
    let snippet = result.snippet.as_ref()?;
    if snippet.channel_id.is_empty() {
        return None;
    }
    Some(SearchHit {
        channel_id: snippet.channel_id.clone(),
        channel_title: snippet.channel_title.clone(),
    })
}

// ---------------------------------------------------------------------------
// Adapter
// ---------------------------------------------------------------------------

/// `videos.list` keeps no particular order; restore the order of `ids`.
async fn videos_in_order(client: &YouTubeClient, ids: &[String]) -> Result<Vec<VideoSummary>> {
    let resources = client.videos(ids).await?;
    let mut videos: Vec<VideoSummary> = Vec::with_capacity(ids.len());
    for id in ids {
        if let Some(resource) = resources.iter().find(|r| &r.id == id) {
            videos.push(video_summary(resource));
        }
    }
    Ok(videos)
}

#[async_trait]
impl ChannelGateway for YouTubeClient {
    async fn get_channel(&self, identifier: &ChannelIdentifier) -> Result<Option<ChannelSummary>> {
        let resources = match identifier {
            ChannelIdentifier::Id(id) => {
                self.channels(ChannelLookup::Ids(std::slice::from_ref(id)))
                    .await?
            }
            ChannelIdentifier::Handle(handle) => {
                self.channels(ChannelLookup::Handle(handle)).await?
            }
            ChannelIdentifier::Username(name) => {
                self.channels(ChannelLookup::Username(name)).await?
            }
        };

        if resources.is_empty() {
            debug!(identifier = %identifier, "No channel found for identifier");
        }
        Ok(resources.first().map(channel_summary))
    }

    async fn get_channels_batch(&self, ids: &[String]) -> Result<Vec<ChannelSummary>> {
        let ids = if ids.len() > MAX_BATCH_IDS {
            warn!(
                requested = ids.len(),
                limit = MAX_BATCH_IDS,
                "Batched channel lookup over limit, extra ids dropped"
            );
            &ids[..MAX_BATCH_IDS]
        } else {
            ids
        };

        let resources = self.channels(ChannelLookup::Ids(ids)).await?;
        Ok(resources.iter().map(channel_summary).collect())
    }

    async fn get_recent_videos(&self, channel_id: &str, limit: u32) -> Result<Vec<VideoSummary>> {
        let channel = self
            .channels(ChannelLookup::Ids(&[channel_id.to_string()]))
            .await?;
        let Some(uploads) = channel.first().and_then(|c| c.uploads_playlist_id()) else {
            debug!(channel_id, "Channel has no uploads playlist");
            return Ok(Vec::new());
        };

        let items = self.playlist_items(uploads, limit).await?;
        let ids: Vec<String> = items
            .into_iter()
            .filter_map(|item| item.content_details.map(|c| c.video_id))
            .collect();

        videos_in_order(self, &ids).await
    }

    async fn get_top_videos(
        &self,
        channel_id: &str,
        limit: u32,
        published_after: Option<DateTime<Utc>>,
    ) -> Result<Vec<VideoSummary>> {
        let request = SearchRequest::channel(channel_id)
            .order(SearchOrder::ViewCount)
            .published_after(published_after)
            .max_results(limit);

        let ids: Vec<String> = self
            .search(&request)
            .await?
            .into_iter()
            .filter_map(|r| r.id.video_id)
            .collect();

        videos_in_order(self, &ids).await
    }

    async fn search_videos_by_keyword(&self, keyword: &str, limit: u32) -> Result<Vec<SearchHit>> {
        let request = SearchRequest::keyword(keyword, SearchKind::Video).max_results(limit);
        let results = self.search(&request).await?;
        Ok(results.iter().filter_map(search_hit).collect())
    }

    async fn find_channel_by_name(&self, name: &str) -> Result<Option<ChannelSummary>> {
        let request = SearchRequest::keyword(name, SearchKind::Channel).max_results(1);
        let Some(channel_id) = self
            .search(&request)
            .await?
            .into_iter()
            .find_map(|r| r.id.channel_id)
        else {
            return Ok(None);
        };

        // search.list carries no statistics; fetch the full resource.
        let resources = self.channels(ChannelLookup::Ids(&[channel_id])).await?;
        Ok(resources.first().map(channel_summary))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use youtube_client::ListResponse;

    fn channel_json() -> &'static str {
        r#"{
            "id": "UCabcdefghijklmnopqrstuv",
            "snippet": {
                "title": "Woodshop Weekly",
                "description": "Builds and jigs",
                "customUrl": "@woodshopweekly",
                "thumbnails": {
                    "default": {"url": "https://img/s.jpg"},
                    "high": {"url": "https://img/l.jpg"}
                }
            },
            "statistics": {"subscriberCount": "48200", "videoCount": "311", "viewCount": "not-a-number"},
            "contentDetails": {"relatedPlaylists": {"uploads": "UUabcdefghijklmnopqrstuv"}},
            "brandingSettings": {"image": {"bannerExternalUrl": "https://img/banner.jpg"}}
        }"#
    }

    #[test]
    fn channel_summary_flattens_wire_shape() {
        let resource: ChannelResource = serde_json::from_str(channel_json()).unwrap();
        let summary = channel_summary(&resource);
        assert_eq!(summary.id, "UCabcdefghijklmnopqrstuv");
        assert_eq!(summary.title, "Woodshop Weekly");
        assert_eq!(summary.custom_url, "@woodshopweekly");
        assert_eq!(summary.subscriber_count, 48_200);
        assert_eq!(summary.video_count, 311);
        assert_eq!(summary.view_count, 0);
        assert_eq!(summary.thumbnails.small, "https://img/s.jpg");
        assert_eq!(summary.thumbnails.medium, "");
        assert_eq!(summary.thumbnails.large, "https://img/l.jpg");
        assert_eq!(summary.uploads_playlist_id, "UUabcdefghijklmnopqrstuv");
        assert_eq!(summary.banner_url, "https://img/banner.jpg");
    }

    #[test]
    fn hidden_subscriber_count_is_zero() {
        let resource: ChannelResource = serde_json::from_str(
            r#"{"id":"UC1","statistics":{"hiddenSubscriberCount":true,"videoCount":"3"}}"#,
        )
        .unwrap();
        let summary = channel_summary(&resource);
        assert_eq!(summary.subscriber_count, 0);
        assert_eq!(summary.video_count, 3);
        assert_eq!(summary.title, "");
    }

    #[test]
    fn video_summary_defaults_missing_fields() {
        let resource: VideoResource = serde_json::from_str(
            r#"{
                "id": "vid1",
                "snippet": {
                    "publishedAt": "2024-05-01T12:00:00Z",
                    "channelId": "UC1",
                    "channelTitle": "Chan",
                    "title": "Building a workbench",
                    "tags": ["woodworking", "workbench"]
                },
                "contentDetails": {"duration": "PT14M2S"},
                "statistics": {"viewCount": "1200", "likeCount": "80"}
            }"#,
        )
        .unwrap();
        let video = video_summary(&resource);
        assert_eq!(video.title, "Building a workbench");
        assert_eq!(video.description, "");
        assert!(video.published_at.is_some());
        assert_eq!(video.duration, "PT14M2S");
        assert_eq!(video.view_count, 1200);
        assert_eq!(video.like_count, 80);
        assert_eq!(video.comment_count, 0);
        assert_eq!(video.tags, vec!["woodworking", "workbench"]);
    }

    #[test]
    fn search_hits_skip_results_without_channel() {
        let resp: ListResponse<SearchResult> = serde_json::from_str(
            r#"{"items":[
                {"id":{"kind":"youtube#video","videoId":"v1"},"snippet":{"channelId":"UC1","channelTitle":"One"}},
                {"id":{"kind":"youtube#video","videoId":"v2"}},
                {"id":{"kind":"youtube#video","videoId":"v3"},"snippet":{"channelId":"","channelTitle":"?"}}
            ]}"#,
        )
        .unwrap();
        let hits: Vec<SearchHit> = resp.items.iter().filter_map(search_hit).collect();
        assert_eq!(
            hits,
            vec![SearchHit {
                channel_id: "UC1".into(),
                channel_title: "One".into()
            }]
        );
    }
}
