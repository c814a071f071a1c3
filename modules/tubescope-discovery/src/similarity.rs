//! Model-driven pipeline: ask an analysis endpoint for similar channels as a
//! delimited table, decode it, and optionally resolve each suggested name to
//! a real channel.

use std::collections::HashSet;

use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{debug, info, warn};

use ai_client::TextAnalyzer;
use tubescope_common::config::DEFAULT_SEARCH_CONCURRENCY;
use tubescope_common::{
    channel_url, sort_by_score_desc, ChannelIdentifier, ChannelSummary, DiscoveryError,
    MatchScore, RankedCandidate, VideoSummary,
};

use crate::decoder::{decode_table, ParsedRecord};
use crate::report::{DiscoveryReport, DiscoveryStatus, NoCandidatesReason};
use crate::traits::ChannelGateway;

/// Recent upload titles included in the seed profile.
pub const MAX_SEED_TITLES: u32 = 20;

/// Shown when no analysis endpoint can be reached.
pub const DEMONSTRATION_TABLE: &str = "\
Rank,Channel Name,Niche/Category,Similarity Score (0-10),Notes on similarity and differences
1,Gaming Enthusiast,Gaming & Let's Plays,8.5,\"Strong match in gaming niche with similar focus on strategy games and RPGs. Creates similar tutorial and walkthrough content.\"
2,Tech Reviews Pro,Tech Reviews,7.2,\"Similar presentation style and production value. Covers overlapping tech topics but with more focus on hardware reviews.\"
3,Creative Tutorials,Design & Creative Skills,6.8,\"Similar tutorial format and teaching style. Different niche but comparable audience demographics and engagement patterns.\"
4,Digital Marketing Mastery,Digital Marketing,5.9,\"Complementary content that appeals to similar business-oriented audience. Different primary topics but similar presentation style.\"
";

const SYSTEM_PROMPT: &str = "You are a YouTube market analyst. You compare channels by \
niche, format, audience and presentation style. You answer only in CSV.";

/// What the model is told about the seed channel.
#[derive(Debug, Clone, Serialize)]
pub struct SeedProfile {
    /// Canonical id, when known; excluded from resolved candidates.
    pub channel_id: Option<String>,
    pub name: String,
    pub url: String,
    pub recent_titles: Vec<String>,
}

impl SeedProfile {
    pub fn new(name: impl Into<String>, url: impl Into<String>, recent_titles: Vec<String>) -> Self {
        Self {
            channel_id: None,
            name: name.into(),
            url: url.into(),
            recent_titles,
        }
    }

    pub fn from_channel(channel: &ChannelSummary, videos: &[VideoSummary]) -> Self {
        Self {
            channel_id: Some(channel.id.clone()),
            name: channel.title.clone(),
            url: channel_url(&channel.id),
            recent_titles: videos
                .iter()
                .take(MAX_SEED_TITLES as usize)
                .map(|v| v.title.clone())
                .collect(),
        }
    }

    fn prompt(&self) -> String {
        let mut prompt = format!(
            "Find up to 10 YouTube channels that are most similar to this channel.\n\n\
Channel name: {}\nChannel URL: {}\n",
            self.name, self.url
        );
        if !self.recent_titles.is_empty() {
            prompt.push_str("Recent video titles:\n");
            for title in self.recent_titles.iter().take(MAX_SEED_TITLES as usize) {
                prompt.push_str(&format!("- {title}\n"));
            }
        }
        prompt.push_str(
            "\nAnswer with a CSV table and nothing else, using exactly this header:\n\
Rank,Channel Name,Niche/Category,Similarity Score (0-10),Notes on similarity and differences\n\
Use the channel's real YouTube name. Quote any field that contains a comma.",
        );
        prompt
    }
}

pub struct SimilarityRanker<'a> {
    analyzer: Option<&'a dyn TextAnalyzer>,
    gateway: Option<&'a dyn ChannelGateway>,
    resolve: bool,
    concurrency: usize,
}

impl<'a> SimilarityRanker<'a> {
    /// `None` analyzer means no key is configured: every run returns the
    /// demonstration data.
    pub fn new(analyzer: Option<&'a dyn TextAnalyzer>) -> Self {
        Self {
            analyzer,
            gateway: None,
            resolve: false,
            concurrency: DEFAULT_SEARCH_CONCURRENCY,
        }
    }

    /// Attach a gateway; suggested names are resolved to real channels.
    pub fn with_gateway(mut self, gateway: &'a dyn ChannelGateway) -> Self {
        self.gateway = Some(gateway);
        self.resolve = true;
        self
    }

    /// Keep model suggestions as bare names.
    pub fn without_resolution(mut self) -> Self {
        self.resolve = false;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Fixed sample data, decoded through the same path as live answers.
    pub fn demonstration() -> DiscoveryReport {
        let records = decode_table(DEMONSTRATION_TABLE).records;
        let candidates = records.iter().map(|r| candidate(ChannelSummary::named(&r.name), r)).collect();
        DiscoveryReport {
            status: DiscoveryStatus::Demonstration,
            candidates,
            records,
            raw_response: Some(DEMONSTRATION_TABLE.to_string()),
        }
    }

    /// Resolve a seed channel through the gateway, then rank it.
    pub async fn discover(&self, seed_channel_id: &str) -> DiscoveryReport {
        let Some(gateway) = self.gateway else {
            let err = DiscoveryError::ConfigurationMissing("channel gateway".into());
            warn!(error = %err, "Cannot load seed channel");
            return DiscoveryReport::unavailable(&err);
        };

        let identifier = ChannelIdentifier::classify(seed_channel_id);
        let channel = match gateway.get_channel(&identifier).await {
            Ok(Some(c)) => c,
            Ok(None) => {
                info!(seed = %identifier, "Seed channel not found");
                return DiscoveryReport::no_candidates(NoCandidatesReason::UnknownSeed);
            }
            Err(e) => {
                warn!(seed = %identifier, error = %e, "Failed to fetch seed channel");
                return DiscoveryReport::unavailable(&DiscoveryError::upstream(e));
            }
        };

        let videos = match gateway.get_recent_videos(&channel.id, MAX_SEED_TITLES).await {
            Ok(v) => v,
            Err(e) => {
                warn!(seed = channel.id.as_str(), error = %e, "Failed to fetch recent videos, ranking by name only");
                Vec::new()
            }
        };

        self.rank(&SeedProfile::from_channel(&channel, &videos)).await
    }

    /// Ask the analysis endpoint for similar channels and rank the answer by
    /// the reported similarity, model order breaking ties.
    pub async fn rank(&self, seed: &SeedProfile) -> DiscoveryReport {
        let Some(analyzer) = self.analyzer else {
            info!(seed = seed.name.as_str(), "No analysis endpoint configured, showing demonstration data");
            return Self::demonstration();
        };

        let raw = match analyzer.analyze(SYSTEM_PROMPT, &seed.prompt()).await {
            Ok(raw) => raw,
            Err(e) => {
                info!(
                    seed = seed.name.as_str(),
                    provider = analyzer.name(),
                    error = %e,
                    "Analysis endpoint unavailable, showing demonstration data"
                );
                return Self::demonstration();
            }
        };

        let table = decode_table(&raw);
        if table.records.is_empty() {
            warn!(seed = seed.name.as_str(), skipped = table.rejected.len(), "No rows decoded from analysis");
            return DiscoveryReport::no_candidates(NoCandidatesReason::EmptyAnalysis)
                .with_raw_response(raw);
        }

        let resolution = match (self.resolve, self.gateway) {
            (true, Some(gateway)) => self.resolve_all(gateway, seed, &table.records).await,
            _ => Resolution {
                candidates: table
                    .records
                    .iter()
                    .map(|r| candidate(ChannelSummary::named(&r.name), r))
                    .collect(),
                ..Resolution::default()
            },
        };
        let mut candidates = resolution.candidates;

        if candidates.is_empty() {
            // Every lookup failed: the gateway is down, not the suggestions.
            if resolution.failures == table.records.len() {
                if let Some(e) = resolution.last_error {
                    warn!(seed = seed.name.as_str(), error = %e, "All channel lookups failed");
                    return DiscoveryReport::unavailable(&DiscoveryError::upstream(e))
                        .with_records(table.records)
                        .with_raw_response(raw);
                }
            }
            info!(seed = seed.name.as_str(), suggested = table.records.len(), "No suggested channel resolved");
            return DiscoveryReport::no_candidates(NoCandidatesReason::NothingResolved)
                .with_records(table.records)
                .with_raw_response(raw);
        }

        sort_by_score_desc(&mut candidates);
        info!(seed = seed.name.as_str(), found = candidates.len(), "Similarity ranking complete");
        DiscoveryReport::found(candidates)
            .with_records(table.records)
            .with_raw_response(raw)
    }

    /// Name lookups in decoder order. Failed or empty lookups, the seed
    /// itself and repeat resolutions of one channel are dropped.
    async fn resolve_all(
        &self,
        gateway: &dyn ChannelGateway,
        seed: &SeedProfile,
        records: &[ParsedRecord],
    ) -> Resolution {
        let lookups: Vec<_> = stream::iter(records.iter().map(|record| async move {
            (record, gateway.find_channel_by_name(&record.name).await)
        }))
        .buffered(self.concurrency)
        .collect()
        .await;

        let mut seen: HashSet<String> = HashSet::new();
        let mut resolution = Resolution {
            candidates: Vec::with_capacity(lookups.len()),
            ..Resolution::default()
        };
        for (record, lookup) in lookups {
            let channel = match lookup {
                Ok(Some(channel)) => channel,
                Ok(None) => {
                    debug!(name = record.name.as_str(), "Suggested channel not found");
                    continue;
                }
                Err(e) => {
                    warn!(name = record.name.as_str(), error = %e, "Channel lookup failed");
                    resolution.failures += 1;
                    resolution.last_error = Some(e);
                    continue;
                }
            };
            if seed.channel_id.as_deref() == Some(channel.id.as_str()) {
                debug!(name = record.name.as_str(), "Suggestion resolved to the seed channel");
                continue;
            }
            if !seen.insert(channel.id.clone()) {
                debug!(name = record.name.as_str(), channel_id = channel.id.as_str(), "Duplicate resolution");
                continue;
            }
            resolution.candidates.push(candidate(channel, record));
        }
        resolution
    }
}

/// Outcome of resolving suggested names.
#[derive(Default)]
struct Resolution {
    candidates: Vec<RankedCandidate>,
    failures: usize,
    last_error: Option<anyhow::Error>,
}

fn candidate(channel: ChannelSummary, record: &ParsedRecord) -> RankedCandidate {
    let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_string());
    RankedCandidate {
        channel,
        match_score: MatchScore::similarity(record.score),
        category: non_empty(&record.category),
        notes: non_empty(&record.notes),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demonstration_decodes_four_samples() {
        let report = SimilarityRanker::demonstration();
        assert_eq!(report.status, DiscoveryStatus::Demonstration);
        assert_eq!(report.records.len(), 4);
        let names: Vec<_> = report.candidates.iter().map(|c| c.channel.title.as_str()).collect();
        assert_eq!(
            names,
            vec!["Gaming Enthusiast", "Tech Reviews Pro", "Creative Tutorials", "Digital Marketing Mastery"]
        );
        assert_eq!(report.candidates[0].match_score, MatchScore::Similarity(8.5));
        assert_eq!(report.candidates[0].category.as_deref(), Some("Gaming & Let's Plays"));
        assert!(report.candidates[3].notes.as_deref().unwrap().starts_with("Complementary"));
    }

    #[test]
    fn prompt_carries_profile() {
        let seed = SeedProfile::new(
            "Woodshop Weekly",
            "https://www.youtube.com/channel/UC1",
            vec!["Workbench build".into(), "Plane restoration".into()],
        );
        let prompt = seed.prompt();
        assert!(prompt.contains("Channel name: Woodshop Weekly"));
        assert!(prompt.contains("- Plane restoration"));
        assert!(prompt.contains("Similarity Score (0-10)"));
    }

    #[test]
    fn profile_from_channel_caps_titles() {
        let mut channel = ChannelSummary::named("Seed");
        channel.id = "UCseed".into();
        let videos: Vec<VideoSummary> = (0..30)
            .map(|i| VideoSummary {
                title: format!("Video {i}"),
                ..Default::default()
            })
            .collect();
        let seed = SeedProfile::from_channel(&channel, &videos);
        assert_eq!(seed.recent_titles.len(), MAX_SEED_TITLES as usize);
        assert_eq!(seed.url, "https://www.youtube.com/channel/UCseed");
        assert_eq!(seed.channel_id.as_deref(), Some("UCseed"));
    }

    #[test]
    fn empty_category_and_notes_are_none() {
        let record = ParsedRecord {
            rank: 1,
            name: "A".into(),
            category: String::new(),
            score: 12.0,
            notes: String::new(),
        };
        let c = candidate(ChannelSummary::named("A"), &record);
        assert_eq!(c.category, None);
        assert_eq!(c.notes, None);
        assert_eq!(c.match_score, MatchScore::Similarity(0.0));
    }
}
