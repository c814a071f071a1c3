use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info, warn};

use ai_client::util::truncate_to_char_boundary;
use ai_client::TextAnalyzer;
use tubescope_common::VideoSummary;

/// Most search queries produced per seed channel.
pub const MAX_KEYWORDS: usize = 10;

/// Title tokens must be longer than this to count as a keyword.
const MIN_TOKEN_CHARS: usize = 3;

/// Description excerpt per video sent to the summarizer.
const DESCRIPTION_EXCERPT_BYTES: usize = 300;

const SYSTEM_PROMPT: &str = "You extract short YouTube search queries that describe a \
channel's niche. Answer with a single comma-separated list and nothing else.";

static RE_NON_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\W+").unwrap());

/// Turns a channel's videos into a short ordered list of search queries.
pub struct KeywordExtractor<'a> {
    summarizer: Option<&'a dyn TextAnalyzer>,
}

impl<'a> KeywordExtractor<'a> {
    pub fn new(summarizer: Option<&'a dyn TextAnalyzer>) -> Self {
        Self { summarizer }
    }

    /// Local extraction only.
    pub fn offline() -> Self {
        Self { summarizer: None }
    }

    /// Up to [`MAX_KEYWORDS`] queries. Never fails: when the summarizer is
    /// missing, errors or answers with nothing usable, the local fallback is
    /// used. An empty result means no discovery is possible.
    pub async fn extract(&self, videos: &[VideoSummary]) -> Vec<String> {
        if videos.is_empty() {
            return Vec::new();
        }

        if let Some(summarizer) = self.summarizer {
            match summarizer.analyze(SYSTEM_PROMPT, &build_prompt(videos)).await {
                Ok(answer) => {
                    let keywords = parse_keyword_list(&answer);
                    if !keywords.is_empty() {
                        debug!(count = keywords.len(), provider = summarizer.name(), "Keywords from summarizer");
                        return keywords;
                    }
                    warn!(provider = summarizer.name(), "Summarizer returned no keywords, using local extraction");
                }
                Err(e) => {
                    warn!(provider = summarizer.name(), error = %e, "Summarizer unavailable, using local extraction");
                }
            }
        } else {
            info!("No summarizer configured, using local keyword extraction");
        }

        fallback_keywords(videos)
    }
}

fn build_prompt(videos: &[VideoSummary]) -> String {
    let mut prompt = format!(
        "Here are {} videos from one YouTube channel. Suggest up to {MAX_KEYWORDS} short \
search queries (2-4 words each) that would find other channels in the same niche.\n\n",
        videos.len()
    );
    for video in videos {
        prompt.push_str(&format!("Title: {}\n", video.title));
        let description = video.description.trim();
        if !description.is_empty() {
            prompt.push_str(&format!(
                "Description: {}\n",
                truncate_to_char_boundary(description, DESCRIPTION_EXCERPT_BYTES)
            ));
        }
        if !video.tags.is_empty() {
            prompt.push_str(&format!("Tags: {}\n", video.tags.join(", ")));
        }
        prompt.push('\n');
    }
    prompt.push_str("Answer format: keyword one, keyword two, keyword three");
    prompt
}

/// Comma-separated answer → trimmed, non-empty, de-duplicated entries.
fn parse_keyword_list(answer: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    answer
        .split([',', '\n'])
        .map(|k| k.trim().trim_matches(|c| c == '"' || c == '\'' || c == '`').trim())
        .filter(|k| !k.is_empty())
        .filter(|k| seen.insert(k.to_lowercase()))
        .take(MAX_KEYWORDS)
        .map(str::to_string)
        .collect()
}

/// Tags verbatim plus longer lowercase title words, in first-seen order,
/// truncated to [`MAX_KEYWORDS`].
pub fn fallback_keywords(videos: &[VideoSummary]) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut keywords = Vec::new();
    let mut add = |candidate: String| {
        if seen.insert(candidate.clone()) {
            keywords.push(candidate);
        }
    };

    for video in videos {
        for tag in &video.tags {
            if !tag.trim().is_empty() {
                add(tag.clone());
            }
        }
        for token in RE_NON_WORD.split(&video.title) {
            if token.chars().count() > MIN_TOKEN_CHARS {
                add(token.to_lowercase());
            }
        }
    }

    keywords.truncate(MAX_KEYWORDS);
    keywords
}
