// Trait abstraction for the video platform.
//
// ChannelGateway is the only way the discovery pipelines touch channel and
// video metadata. The YouTube client implements it in `gateway.rs`; tests use
// `testing::MockGateway`. Every method may fail (network, quota): pipelines
// log the error and carry on with an empty result.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use tubescope_common::{ChannelIdentifier, ChannelSummary, SearchHit, VideoSummary};

/// Most ids a single batched channel lookup accepts.
pub const MAX_BATCH_IDS: usize = 20;

#[async_trait]
pub trait ChannelGateway: Send + Sync {
    /// Look up one channel by id, handle or username. `Ok(None)` when no
    /// channel matches.
    async fn get_channel(&self, identifier: &ChannelIdentifier) -> Result<Option<ChannelSummary>>;

    /// Fetch up to [`MAX_BATCH_IDS`] channels in one request. Unknown ids are
    /// simply absent from the result.
    async fn get_channels_batch(&self, ids: &[String]) -> Result<Vec<ChannelSummary>>;

    /// Newest uploads of a channel, newest first.
    async fn get_recent_videos(&self, channel_id: &str, limit: u32) -> Result<Vec<VideoSummary>>;

    /// Most viewed uploads, optionally only those published after a cutoff.
    async fn get_top_videos(
        &self,
        channel_id: &str,
        limit: u32,
        published_after: Option<DateTime<Utc>>,
    ) -> Result<Vec<VideoSummary>>;

    /// Full-text video search; one hit per matching video.
    async fn search_videos_by_keyword(&self, keyword: &str, limit: u32) -> Result<Vec<SearchHit>>;

    /// Best channel match for a free-text name.
    async fn find_channel_by_name(&self, name: &str) -> Result<Option<ChannelSummary>>;
}
