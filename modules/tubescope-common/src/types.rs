use std::fmt;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

// =============================================================================
// Channel identifiers
// =============================================================================

/// Length of a canonical channel id (`UC` + 22 base64url characters).
pub const CANONICAL_ID_LEN: usize = 24;

/// A channel reference as a user typed it. Classification is purely lexical:
/// no network call decides which variant a string is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ChannelIdentifier {
    /// Opaque fixed-length id, e.g. `UCxxxxxxxxxxxxxxxxxxxxxx`.
    Id(String),
    /// Handle including its leading `@`.
    Handle(String),
    /// Legacy username or custom `/c/` name.
    Username(String),
}

static RE_CHANNEL_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"youtube\.com/(channel/|user/|@|c/)([^/?#]+)").unwrap()
});

impl ChannelIdentifier {
    /// Classify a bare identifier string.
    pub fn classify(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.starts_with('@') {
            ChannelIdentifier::Handle(raw.to_string())
        } else if raw.chars().count() == CANONICAL_ID_LEN && !raw.contains(' ') {
            ChannelIdentifier::Id(raw.to_string())
        } else {
            ChannelIdentifier::Username(raw.to_string())
        }
    }

    /// Pull the identifier out of a channel URL (`/channel/`, `/user/`, `/@`,
    /// `/c/`). Video and playlist URLs are not channel URLs and yield `None`.
    pub fn from_url(url: &str) -> Option<Self> {
        let caps = RE_CHANNEL_PATH.captures(url)?;
        let value = caps.get(2)?.as_str();
        match caps.get(1)?.as_str() {
            "@" => Some(ChannelIdentifier::Handle(format!("@{value}"))),
            _ => Some(Self::classify(value)),
        }
    }

    /// Accept either a channel URL or a bare identifier.
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        if input.is_empty() {
            return None;
        }
        if input.contains("youtube.com/") {
            return Self::from_url(input);
        }
        Some(Self::classify(input))
    }

    pub fn as_str(&self) -> &str {
        match self {
            ChannelIdentifier::Id(s)
            | ChannelIdentifier::Handle(s)
            | ChannelIdentifier::Username(s) => s,
        }
    }
}

impl fmt::Display for ChannelIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Public URL for a canonical channel id.
pub fn channel_url(channel_id: &str) -> String {
    format!("https://www.youtube.com/channel/{channel_id}")
}

// =============================================================================
// Counts
// =============================================================================

/// Parse an upstream decimal-string count. Missing, blank, negative or
/// non-numeric input is zero.
pub fn parse_count(raw: Option<&str>) -> u64 {
    raw.and_then(|s| s.trim().parse::<u64>().ok()).unwrap_or(0)
}

// =============================================================================
// Summaries
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thumbnails {
    pub small: String,
    pub medium: String,
    pub large: String,
}

/// Channel metadata as fetched from the gateway. Built fresh on each fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelSummary {
    pub id: String,
    pub title: String,
    pub description: String,
    /// Custom handle (`@name`), empty when the channel has none.
    pub custom_url: String,
    pub thumbnails: Thumbnails,
    pub subscriber_count: u64,
    pub video_count: u64,
    pub view_count: u64,
    pub uploads_playlist_id: String,
    pub banner_url: String,
}

impl ChannelSummary {
    /// A channel known only by name, e.g. a model suggestion that was not
    /// resolved against the gateway.
    pub fn named(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn is_resolved(&self) -> bool {
        !self.id.is_empty()
    }

    pub fn url(&self) -> Option<String> {
        self.is_resolved().then(|| channel_url(&self.id))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoSummary {
    pub id: String,
    pub title: String,
    pub description: String,
    pub published_at: Option<DateTime<Utc>>,
    pub channel_id: String,
    pub channel_title: String,
    pub thumbnails: Thumbnails,
    /// ISO-8601 duration (`PT4M13S`); empty when unknown.
    pub duration: String,
    pub view_count: u64,
    pub like_count: u64,
    pub comment_count: u64,
    pub tags: Vec<String>,
}

/// One row of a keyword search: which channel uploaded a matching video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub channel_id: String,
    pub channel_title: String,
}

// =============================================================================
// Ranking
// =============================================================================

/// Upper bound of the model-reported similarity scale.
pub const MAX_SIMILARITY: f64 = 10.0;

/// Why a candidate ranks where it does.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum MatchScore {
    /// Number of independent keyword searches that surfaced the channel.
    Occurrences(u32),
    /// Model-reported similarity on a 0-10 scale.
    Similarity(f64),
}

impl MatchScore {
    /// Similarity outside 0..=10, or not a number, counts as zero.
    pub fn similarity(score: f64) -> Self {
        if score.is_finite() && (0.0..=MAX_SIMILARITY).contains(&score) {
            MatchScore::Similarity(score)
        } else {
            MatchScore::Similarity(0.0)
        }
    }

    pub fn value(&self) -> f64 {
        match *self {
            MatchScore::Occurrences(n) => f64::from(n),
            MatchScore::Similarity(s) => s,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedCandidate {
    #[serde(flatten)]
    pub channel: ChannelSummary,
    pub match_score: MatchScore,
    /// Niche reported by the model, LLM pipeline only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl RankedCandidate {
    pub fn new(channel: ChannelSummary, match_score: MatchScore) -> Self {
        Self {
            channel,
            match_score,
            category: None,
            notes: None,
        }
    }
}

/// Stable sort by match score, highest first. Equal scores keep their
/// discovery order.
pub fn sort_by_score_desc(candidates: &mut [RankedCandidate]) {
    candidates.sort_by(|a, b| b.match_score.value().total_cmp(&a.match_score.value()));
}
