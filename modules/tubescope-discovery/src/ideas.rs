//! Content planning on top of a related-channel run: video ideas drawn from
//! what works for similar channels, and scripts for a chosen idea.

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use ai_client::util::fenced_or_whole;
use ai_client::TextAnalyzer;
use tubescope_common::config::DEFAULT_SEARCH_CONCURRENCY;
use tubescope_common::{ChannelSummary, RankedCandidate, VideoSummary};

use crate::traits::ChannelGateway;

/// Related channels whose videos feed the idea prompt.
pub const MAX_IDEA_SOURCES: usize = 5;

/// Top videos fetched per channel for the idea prompt.
pub const VIDEOS_PER_SOURCE: u32 = 5;

const IDEAS_SYSTEM_PROMPT: &str = "You are a YouTube content strategist. You answer only \
with a JSON array.";

const SCRIPT_SYSTEM_PROMPT: &str = "You are a YouTube scriptwriter. You write complete, \
well-paced video scripts in markdown.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentIdea {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub rationale: String,
}

/// Models sometimes wrap the array in an object.
#[derive(Deserialize)]
#[serde(untagged)]
enum IdeasAnswer {
    List(Vec<ContentIdea>),
    Wrapped { ideas: Vec<ContentIdea> },
}

pub struct ContentPlanner<'a> {
    analyzer: Option<&'a dyn TextAnalyzer>,
    gateway: Option<&'a dyn ChannelGateway>,
    concurrency: usize,
}

impl<'a> ContentPlanner<'a> {
    pub fn new(analyzer: Option<&'a dyn TextAnalyzer>) -> Self {
        Self {
            analyzer,
            gateway: None,
            concurrency: DEFAULT_SEARCH_CONCURRENCY,
        }
    }

    /// Attach a gateway so the prompt can include what performs well.
    pub fn with_gateway(mut self, gateway: &'a dyn ChannelGateway) -> Self {
        self.gateway = Some(gateway);
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Video ideas for `seed`, informed by up to [`MAX_IDEA_SOURCES`] related
    /// channels. Empty on any failure.
    pub async fn generate_ideas(
        &self,
        seed: &ChannelSummary,
        related: &[RankedCandidate],
    ) -> Vec<ContentIdea> {
        let Some(analyzer) = self.analyzer else {
            info!(seed = seed.title.as_str(), "No analysis endpoint configured, skipping ideas");
            return Vec::new();
        };

        let sources: Vec<&ChannelSummary> =
            related.iter().take(MAX_IDEA_SOURCES).map(|c| &c.channel).collect();
        let seed_videos = self.top_videos(seed).await;
        let source_videos: Vec<Vec<VideoSummary>> = stream::iter(sources.iter().map(|c| self.top_videos(c)))
            .buffered(self.concurrency)
            .collect()
            .await;

        let prompt = ideas_prompt(seed, &seed_videos, &sources, &source_videos);
        let raw = match analyzer.analyze(IDEAS_SYSTEM_PROMPT, &prompt).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(seed = seed.title.as_str(), provider = analyzer.name(), error = %e, "Idea generation failed");
                return Vec::new();
            }
        };

        let ideas = parse_ideas(&raw);
        info!(seed = seed.title.as_str(), ideas = ideas.len(), "Generated content ideas");
        ideas
    }

    /// Markdown script for one idea, or `None` on any failure.
    pub async fn generate_script(&self, seed: &ChannelSummary, idea: &ContentIdea) -> Option<String> {
        let analyzer = self.analyzer?;
        let prompt = script_prompt(seed, idea);
        match analyzer.analyze(SCRIPT_SYSTEM_PROMPT, &prompt).await {
            Ok(script) => {
                let script = script.trim();
                if script.is_empty() {
                    warn!(idea = idea.title.as_str(), "Empty script returned");
                    None
                } else {
                    Some(script.to_string())
                }
            }
            Err(e) => {
                warn!(idea = idea.title.as_str(), provider = analyzer.name(), error = %e, "Script generation failed");
                None
            }
        }
    }

    async fn top_videos(&self, channel: &ChannelSummary) -> Vec<VideoSummary> {
        let Some(gateway) = self.gateway else {
            return Vec::new();
        };
        if !channel.is_resolved() {
            return Vec::new();
        }
        match gateway.get_top_videos(&channel.id, VIDEOS_PER_SOURCE, None).await {
            Ok(videos) => videos,
            Err(e) => {
                warn!(channel_id = channel.id.as_str(), error = %e, "Failed to fetch top videos");
                Vec::new()
            }
        }
    }
}

fn push_videos(prompt: &mut String, videos: &[VideoSummary]) {
    for video in videos {
        prompt.push_str(&format!("  - {} ({} views)\n", video.title, video.view_count));
    }
}

fn ideas_prompt(
    seed: &ChannelSummary,
    seed_videos: &[VideoSummary],
    sources: &[&ChannelSummary],
    source_videos: &[Vec<VideoSummary>],
) -> String {
    let mut prompt = format!("Suggest 5 new video ideas for the YouTube channel \"{}\".\n", seed.title);
    if !seed.description.trim().is_empty() {
        prompt.push_str(&format!("Channel description: {}\n", seed.description.trim()));
    }
    if !seed_videos.is_empty() {
        prompt.push_str("Its most viewed videos:\n");
        push_videos(&mut prompt, seed_videos);
    }

    if !sources.is_empty() {
        prompt.push_str("\nSimilar channels and what performs well for them:\n");
        for (channel, videos) in sources.iter().zip(source_videos) {
            prompt.push_str(&format!("- {}\n", channel.title));
            push_videos(&mut prompt, videos);
        }
    }

    prompt.push_str(
        "\nAnswer with a JSON array only. Each element must be an object with the string \
fields \"title\", \"description\" and \"rationale\" (why it should work for this audience).",
    );
    prompt
}

fn script_prompt(seed: &ChannelSummary, idea: &ContentIdea) -> String {
    let url = seed.url().unwrap_or_default();
    format!(
        "Write a video script for the YouTube channel \"{}\" ({url}).\n\n\
Video title: {}\nConcept: {}\n\n\
Include a hook, an intro, the main sections with talking points, and a call to action. \
Match the channel's tone.",
        seed.title, idea.title, idea.description
    )
}

/// Ideas from the first fenced block, or the whole answer. Ideas without a
/// title are dropped; unparseable answers give none.
fn parse_ideas(raw: &str) -> Vec<ContentIdea> {
    let body = fenced_or_whole(raw).trim();
    let ideas = match serde_json::from_str::<IdeasAnswer>(body) {
        Ok(IdeasAnswer::List(ideas)) | Ok(IdeasAnswer::Wrapped { ideas }) => ideas,
        Err(e) => {
            warn!(error = %e, "Unparseable idea list");
            debug!(raw, "Idea answer");
            return Vec::new();
        }
    };
    ideas
        .into_iter()
        .filter(|idea| !idea.title.trim().is_empty())
        .collect()
}
