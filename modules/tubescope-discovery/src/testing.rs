// Test mocks for the discovery pipelines.
//
// Two mocks matching the two trait boundaries:
// - MockGateway (ChannelGateway): HashMap-backed channels, videos and searches
// - MockAnalyzer (TextAnalyzer): canned answers or failure, records prompts
//
// Plus helpers for building ChannelSummary, VideoSummary and SearchHit values.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use ai_client::TextAnalyzer;
use tubescope_common::{ChannelIdentifier, ChannelSummary, SearchHit, VideoSummary};

use crate::traits::{ChannelGateway, MAX_BATCH_IDS};

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

pub fn channel(id: &str, title: &str, subscriber_count: u64) -> ChannelSummary {
    ChannelSummary {
        id: id.to_string(),
        title: title.to_string(),
        subscriber_count,
        ..Default::default()
    }
}

pub fn video(id: &str, title: &str, tags: &[&str]) -> VideoSummary {
    VideoSummary {
        id: id.to_string(),
        title: title.to_string(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        ..Default::default()
    }
}

pub fn hit(channel_id: &str, channel_title: &str) -> SearchHit {
    SearchHit {
        channel_id: channel_id.to_string(),
        channel_title: channel_title.to_string(),
    }
}

// ---------------------------------------------------------------------------
// MockGateway
// ---------------------------------------------------------------------------

/// In-memory gateway. Unregistered lookups answer with nothing (like an API
/// with no matching rows); registered failures and `.failing()` answer `Err`.
/// Builder pattern: `.on_channel()`, `.on_alias()`, `.on_recent_videos()`,
/// `.on_top_videos()`, `.on_search()`, `.on_name()`.
#[derive(Default)]
pub struct MockGateway {
    channels: HashMap<String, ChannelSummary>,
    aliases: HashMap<String, String>,
    recent_videos: HashMap<String, Vec<VideoSummary>>,
    top_videos: HashMap<String, Vec<VideoSummary>>,
    searches: HashMap<String, Vec<SearchHit>>,
    names: HashMap<String, String>,
    failing_searches: HashSet<String>,
    failing_names: HashSet<String>,
    fail_all: bool,
    calls: Mutex<HashMap<&'static str, usize>>,
    batches: Mutex<Vec<Vec<String>>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_channel(mut self, channel: ChannelSummary) -> Self {
        self.channels.insert(channel.id.clone(), channel);
        self
    }

    /// Handle or username that resolves to a registered channel id.
    pub fn on_alias(mut self, alias: &str, channel_id: &str) -> Self {
        self.aliases.insert(alias.to_string(), channel_id.to_string());
        self
    }

    pub fn on_recent_videos(mut self, channel_id: &str, videos: Vec<VideoSummary>) -> Self {
        self.recent_videos.insert(channel_id.to_string(), videos);
        self
    }

    pub fn on_top_videos(mut self, channel_id: &str, videos: Vec<VideoSummary>) -> Self {
        self.top_videos.insert(channel_id.to_string(), videos);
        self
    }

    pub fn on_search(mut self, keyword: &str, hits: Vec<SearchHit>) -> Self {
        self.searches.insert(keyword.to_string(), hits);
        self
    }

    /// Free-text name that resolves to a registered channel id.
    pub fn on_name(mut self, name: &str, channel_id: &str) -> Self {
        self.names.insert(name.to_string(), channel_id.to_string());
        self
    }

    pub fn fail_search(mut self, keyword: &str) -> Self {
        self.failing_searches.insert(keyword.to_string());
        self
    }

    pub fn fail_name(mut self, name: &str) -> Self {
        self.failing_names.insert(name.to_string());
        self
    }

    /// Every call fails, as during an outage or quota exhaustion.
    pub fn failing(mut self) -> Self {
        self.fail_all = true;
        self
    }

    /// Number of calls made to one trait method.
    pub fn calls(&self, method: &str) -> usize {
        self.calls.lock().unwrap().get(method).copied().unwrap_or(0)
    }

    /// Id lists passed to `get_channels_batch`, in call order.
    pub fn batches(&self) -> Vec<Vec<String>> {
        self.batches.lock().unwrap().clone()
    }

    fn record(&self, method: &'static str) -> Result<()> {
        *self.calls.lock().unwrap().entry(method).or_insert(0) += 1;
        if self.fail_all {
            bail!("MockGateway: {method} failed (quota exceeded)");
        }
        Ok(())
    }
}

#[async_trait]
impl ChannelGateway for MockGateway {
    async fn get_channel(&self, identifier: &ChannelIdentifier) -> Result<Option<ChannelSummary>> {
        self.record("get_channel")?;
        let id = match identifier {
            ChannelIdentifier::Id(id) => Some(id),
            ChannelIdentifier::Handle(alias) | ChannelIdentifier::Username(alias) => {
                self.aliases.get(alias)
            }
        };
        Ok(id.and_then(|id| self.channels.get(id)).cloned())
    }

    async fn get_channels_batch(&self, ids: &[String]) -> Result<Vec<ChannelSummary>> {
        self.record("get_channels_batch")?;
        let ids = &ids[..ids.len().min(MAX_BATCH_IDS)];
        self.batches.lock().unwrap().push(ids.to_vec());
        Ok(ids.iter().filter_map(|id| self.channels.get(id)).cloned().collect())
    }

    async fn get_recent_videos(&self, channel_id: &str, limit: u32) -> Result<Vec<VideoSummary>> {
        self.record("get_recent_videos")?;
        let videos = self.recent_videos.get(channel_id).cloned().unwrap_or_default();
        Ok(videos.into_iter().take(limit as usize).collect())
    }

    async fn get_top_videos(
        &self,
        channel_id: &str,
        limit: u32,
        _published_after: Option<DateTime<Utc>>,
    ) -> Result<Vec<VideoSummary>> {
        self.record("get_top_videos")?;
        let videos = self.top_videos.get(channel_id).cloned().unwrap_or_default();
        Ok(videos.into_iter().take(limit as usize).collect())
    }

    async fn search_videos_by_keyword(&self, keyword: &str, limit: u32) -> Result<Vec<SearchHit>> {
        self.record("search_videos_by_keyword")?;
        if self.failing_searches.contains(keyword) {
            bail!("MockGateway: search failed for {keyword}");
        }
        let hits = self.searches.get(keyword).cloned().unwrap_or_default();
        Ok(hits.into_iter().take(limit as usize).collect())
    }

    async fn find_channel_by_name(&self, name: &str) -> Result<Option<ChannelSummary>> {
        self.record("find_channel_by_name")?;
        if self.failing_names.contains(name) {
            bail!("MockGateway: lookup failed for {name}");
        }
        Ok(self
            .names
            .get(name)
            .and_then(|id| self.channels.get(id))
            .cloned())
    }
}

// ---------------------------------------------------------------------------
// MockAnalyzer
// ---------------------------------------------------------------------------

/// Canned analysis endpoint. Answers are consumed in order; the last one
/// repeats. Every prompt is recorded.
pub struct MockAnalyzer {
    answers: Mutex<VecDeque<std::result::Result<String, String>>>,
    prompts: Mutex<Vec<String>>,
}

impl MockAnalyzer {
    pub fn answering(answer: &str) -> Self {
        Self::sequence(vec![Ok(answer.to_string())])
    }

    pub fn failing(message: &str) -> Self {
        Self::sequence(vec![Err(message.to_string())])
    }

    pub fn sequence(answers: Vec<std::result::Result<String, String>>) -> Self {
        Self {
            answers: Mutex::new(answers.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextAnalyzer for MockAnalyzer {
    async fn analyze(&self, _system: &str, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let mut answers = self.answers.lock().unwrap();
        let answer = if answers.len() > 1 {
            answers.pop_front()
        } else {
            answers.front().cloned()
        };
        match answer {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => bail!("MockAnalyzer: {message}"),
            None => bail!("MockAnalyzer: no answer registered"),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}
