//! Keyword-search pipeline: fold repeated search hits into a ranked,
//! subscriber-filtered list of related channels.

use std::collections::HashMap;

use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{debug, info, warn};

use ai_client::TextAnalyzer;
use tubescope_common::config::{
    DEFAULT_MAX_SUBSCRIBERS, DEFAULT_MIN_SUBSCRIBERS, DEFAULT_SEARCH_CONCURRENCY,
};
use tubescope_common::{
    sort_by_score_desc, ChannelSummary, Config, DiscoveryError, MatchScore, RankedCandidate,
    SearchHit,
};

use crate::keywords::KeywordExtractor;
use crate::report::{DiscoveryReport, NoCandidatesReason};
use crate::traits::{ChannelGateway, MAX_BATCH_IDS};

/// Keywords actually searched per run.
pub const MAX_SEARCH_KEYWORDS: usize = 5;

/// Tallied channels kept for the metadata lookup.
pub const MAX_CANDIDATES: usize = MAX_BATCH_IDS;

/// Search results requested per keyword.
pub const RESULTS_PER_KEYWORD: u32 = 10;

/// Seed videos the keywords are drawn from.
pub const SEED_TOP_VIDEOS: u32 = 10;

/// Inclusive subscriber-count range a candidate must fall in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SubscriberBand {
    pub min: u64,
    pub max: u64,
}

impl Default for SubscriberBand {
    fn default() -> Self {
        Self {
            min: DEFAULT_MIN_SUBSCRIBERS,
            max: DEFAULT_MAX_SUBSCRIBERS,
        }
    }
}

impl SubscriberBand {
    pub fn new(min: u64, max: u64) -> Self {
        Self { min, max }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.min_subscribers, config.max_subscribers)
    }

    pub fn contains(&self, subscriber_count: u64) -> bool {
        subscriber_count >= self.min && subscriber_count <= self.max
    }
}

// ---------------------------------------------------------------------------
// Tally
// ---------------------------------------------------------------------------

struct TallyEntry {
    channel_id: String,
    count: u32,
    /// Latest title seen in search results.
    title: String,
}

/// Per-run hit counter. Entries keep first-seen order so that equal counts
/// rank in discovery order.
#[derive(Default)]
struct Tally {
    entries: Vec<TallyEntry>,
    index: HashMap<String, usize>,
}

impl Tally {
    fn record(&mut self, hit: SearchHit) {
        match self.index.get(&hit.channel_id) {
            Some(&i) => {
                let entry = &mut self.entries[i];
                entry.count += 1;
                entry.title = hit.channel_title;
            }
            None => {
                self.index.insert(hit.channel_id.clone(), self.entries.len());
                self.entries.push(TallyEntry {
                    channel_id: hit.channel_id,
                    count: 1,
                    title: hit.channel_title,
                });
            }
        }
    }

    fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Highest counts first, ties in first-seen order.
    fn top(mut self, n: usize) -> Vec<TallyEntry> {
        self.entries.sort_by(|a, b| b.count.cmp(&a.count));
        self.entries.truncate(n);
        self.entries
    }
}

// ---------------------------------------------------------------------------
// Aggregator
// ---------------------------------------------------------------------------

pub struct CandidateAggregator<'a> {
    gateway: &'a dyn ChannelGateway,
    band: SubscriberBand,
    concurrency: usize,
}

impl<'a> CandidateAggregator<'a> {
    pub fn new(gateway: &'a dyn ChannelGateway) -> Self {
        Self {
            gateway,
            band: SubscriberBand::default(),
            concurrency: DEFAULT_SEARCH_CONCURRENCY,
        }
    }

    pub fn with_band(mut self, band: SubscriberBand) -> Self {
        self.band = band;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Search each keyword (at most [`MAX_SEARCH_KEYWORDS`]), count how often
    /// every other channel shows up, and rank the most frequent ones that fall
    /// inside the subscriber band. The seed never appears in the output.
    pub async fn aggregate(&self, seed_channel_id: &str, keywords: &[String]) -> DiscoveryReport {
        if keywords.is_empty() {
            info!(seed = seed_channel_id, "No keywords to search");
            return DiscoveryReport::no_candidates(NoCandidatesReason::NoKeywords);
        }
        let keywords = &keywords[..keywords.len().min(MAX_SEARCH_KEYWORDS)];

        // buffered (not buffer_unordered): tally order must not depend on
        // which search answers first.
        let results: Vec<_> = stream::iter(keywords.iter().map(|keyword| async move {
            (
                keyword,
                self.gateway
                    .search_videos_by_keyword(keyword, RESULTS_PER_KEYWORD)
                    .await,
            )
        }))
        .buffered(self.concurrency)
        .collect()
        .await;

        let mut tally = Tally::default();
        let mut failures = 0usize;
        let mut last_error = None;
        for (keyword, result) in results {
            match result {
                Ok(hits) => {
                    debug!(keyword = keyword.as_str(), hits = hits.len(), "Keyword search complete");
                    for hit in hits {
                        if hit.channel_id != seed_channel_id {
                            tally.record(hit);
                        }
                    }
                }
                Err(e) => {
                    warn!(keyword = keyword.as_str(), error = %e, "Keyword search failed");
                    failures += 1;
                    last_error = Some(e);
                }
            }
        }

        if tally.is_empty() {
            // Every search failed: that is an outage, not an empty niche.
            if failures == keywords.len() {
                if let Some(e) = last_error {
                    return DiscoveryReport::unavailable(&DiscoveryError::upstream(e));
                }
            }
            info!(seed = seed_channel_id, "Keyword searches surfaced no other channel");
            return DiscoveryReport::no_candidates(NoCandidatesReason::NoSearchHits);
        }

        let top = tally.top(MAX_CANDIDATES);
        let ids: Vec<String> = top.iter().map(|e| e.channel_id.clone()).collect();

        let summaries = match self.gateway.get_channels_batch(&ids).await {
            Ok(s) => s,
            Err(e) => {
                warn!(candidates = ids.len(), error = %e, "Candidate metadata lookup failed");
                return DiscoveryReport::unavailable(&DiscoveryError::upstream(e));
            }
        };
        let mut by_id: HashMap<String, ChannelSummary> =
            summaries.into_iter().map(|s| (s.id.clone(), s)).collect();

        let mut candidates: Vec<RankedCandidate> = Vec::with_capacity(top.len());
        for entry in top {
            if entry.channel_id == seed_channel_id {
                continue;
            }
            let Some(mut channel) = by_id.remove(&entry.channel_id) else {
                debug!(channel_id = entry.channel_id.as_str(), "No metadata for candidate, dropped");
                continue;
            };
            if !self.band.contains(channel.subscriber_count) {
                debug!(
                    channel_id = channel.id.as_str(),
                    subscribers = channel.subscriber_count,
                    "Candidate outside subscriber band"
                );
                continue;
            }
            if channel.title.is_empty() {
                channel.title = entry.title;
            }
            candidates.push(RankedCandidate::new(channel, MatchScore::Occurrences(entry.count)));
        }

        if candidates.is_empty() {
            info!(seed = seed_channel_id, "All candidates filtered out");
            return DiscoveryReport::no_candidates(NoCandidatesReason::FilteredOut);
        }

        sort_by_score_desc(&mut candidates);
        info!(seed = seed_channel_id, found = candidates.len(), "Keyword discovery complete");
        DiscoveryReport::found(candidates)
    }
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

/// Seed channel → top videos → keywords → aggregated candidates.
pub struct KeywordDiscovery<'a> {
    gateway: &'a dyn ChannelGateway,
    extractor: KeywordExtractor<'a>,
    aggregator: CandidateAggregator<'a>,
}

impl<'a> KeywordDiscovery<'a> {
    pub fn new(gateway: &'a dyn ChannelGateway, summarizer: Option<&'a dyn TextAnalyzer>) -> Self {
        Self {
            gateway,
            extractor: KeywordExtractor::new(summarizer),
            aggregator: CandidateAggregator::new(gateway),
        }
    }

    pub fn with_band(mut self, band: SubscriberBand) -> Self {
        self.aggregator = self.aggregator.with_band(band);
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.aggregator = self.aggregator.with_concurrency(concurrency);
        self
    }

    /// Search keywords for a seed channel, drawn from its most viewed videos.
    /// An empty list means the seed has no videos or nothing to extract.
    pub async fn keywords(&self, seed_channel_id: &str) -> Result<Vec<String>, DiscoveryError> {
        let videos = self
            .gateway
            .get_top_videos(seed_channel_id, SEED_TOP_VIDEOS, None)
            .await
            .map_err(DiscoveryError::upstream)?;
        Ok(self.extractor.extract(&videos).await)
    }

    pub async fn discover(&self, seed_channel_id: &str) -> DiscoveryReport {
        let videos = match self
            .gateway
            .get_top_videos(seed_channel_id, SEED_TOP_VIDEOS, None)
            .await
        {
            Ok(v) => v,
            Err(e) => {
                warn!(seed = seed_channel_id, error = %e, "Failed to fetch seed videos");
                return DiscoveryReport::unavailable(&DiscoveryError::upstream(e));
            }
        };
        if videos.is_empty() {
            info!(seed = seed_channel_id, "Seed channel has no videos");
            return DiscoveryReport::no_candidates(NoCandidatesReason::NoSeedVideos);
        }

        let keywords = self.extractor.extract(&videos).await;
        info!(seed = seed_channel_id, keywords = ?keywords, "Extracted search keywords");
        self.aggregator.aggregate(seed_channel_id, &keywords).await
    }

    pub fn band(&self) -> SubscriberBand {
        self.aggregator.band
    }
}
