use std::env;
use std::str::FromStr;

use tracing::{info, warn};

pub const DEFAULT_MIN_SUBSCRIBERS: u64 = 10_000;
pub const DEFAULT_MAX_SUBSCRIBERS: u64 = 500_000;
pub const DEFAULT_SEARCH_CONCURRENCY: usize = 3;
pub const DEFAULT_PERPLEXITY_MODEL: &str = "sonar";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

/// Application configuration loaded from environment variables.
///
/// Keys are optional: a missing key is the "configuration missing" case and
/// the feature that needs it degrades instead of failing startup.
#[derive(Debug, Clone)]
pub struct Config {
    // Video platform
    pub youtube_api_key: Option<String>,

    // Similarity analysis (search-grounded model)
    pub perplexity_api_key: Option<String>,
    pub perplexity_model: String,

    // Keyword summarizer / content planning
    pub openai_api_key: Option<String>,
    pub openai_model: String,

    // Discovery tuning
    pub min_subscribers: u64,
    pub max_subscribers: u64,
    pub search_concurrency: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            youtube_api_key: None,
            perplexity_api_key: None,
            perplexity_model: DEFAULT_PERPLEXITY_MODEL.to_string(),
            openai_api_key: None,
            openai_model: DEFAULT_OPENAI_MODEL.to_string(),
            min_subscribers: DEFAULT_MIN_SUBSCRIBERS,
            max_subscribers: DEFAULT_MAX_SUBSCRIBERS,
            search_concurrency: DEFAULT_SEARCH_CONCURRENCY,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let search_concurrency = parsed_or(
            &lookup,
            "TUBESCOPE_SEARCH_CONCURRENCY",
            defaults.search_concurrency,
        )
        .max(1);

        Self {
            youtube_api_key: optional(&lookup, "YOUTUBE_API_KEY"),
            perplexity_api_key: optional(&lookup, "PERPLEXITY_API_KEY"),
            perplexity_model: optional(&lookup, "PERPLEXITY_MODEL")
                .unwrap_or(defaults.perplexity_model),
            openai_api_key: optional(&lookup, "OPENAI_API_KEY"),
            openai_model: optional(&lookup, "OPENAI_MODEL").unwrap_or(defaults.openai_model),
            min_subscribers: parsed_or(&lookup, "TUBESCOPE_MIN_SUBSCRIBERS", defaults.min_subscribers),
            max_subscribers: parsed_or(&lookup, "TUBESCOPE_MAX_SUBSCRIBERS", defaults.max_subscribers),
            search_concurrency,
        }
    }

    /// Log which credentials are present without printing them.
    pub fn log_redacted(&self) {
        info!(
            youtube_api_key = presence(&self.youtube_api_key),
            perplexity_api_key = presence(&self.perplexity_api_key),
            perplexity_model = self.perplexity_model.as_str(),
            openai_api_key = presence(&self.openai_api_key),
            openai_model = self.openai_model.as_str(),
            min_subscribers = self.min_subscribers,
            max_subscribers = self.max_subscribers,
            search_concurrency = self.search_concurrency,
            "Loaded config"
        );
    }
}

fn optional(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key).filter(|v| !v.trim().is_empty())
}

fn parsed_or<T: FromStr + Copy>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> T {
    match optional(lookup, key) {
        None => default,
        Some(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                warn!(key, value = raw.as_str(), "Ignoring non-numeric config value, using default");
                default
            }
        },
    }
}

fn presence(value: &Option<String>) -> &'static str {
    if value.is_some() {
        "set"
    } else {
        "missing"
    }
}
