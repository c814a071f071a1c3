use std::fmt;

use serde::Serialize;

use tubescope_common::{DiscoveryError, RankedCandidate};

use crate::decoder::ParsedRecord;

/// Why a run ended without candidates even though nothing failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoCandidatesReason {
    /// The seed identifier matched no channel.
    UnknownSeed,
    /// The seed channel has no videos to learn from.
    NoSeedVideos,
    /// Neither the summarizer nor the local fallback produced a keyword.
    NoKeywords,
    /// Keyword searches surfaced no channel other than the seed.
    NoSearchHits,
    /// Every candidate fell outside the subscriber band.
    FilteredOut,
    /// The model answered but no table row could be decoded.
    EmptyAnalysis,
    /// No model-suggested name resolved to a real channel.
    NothingResolved,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum UnavailableReason {
    ConfigurationMissing(String),
    Upstream(String),
}

impl From<&DiscoveryError> for UnavailableReason {
    fn from(err: &DiscoveryError) -> Self {
        match err {
            DiscoveryError::ConfigurationMissing(what) => {
                UnavailableReason::ConfigurationMissing(what.clone())
            }
            other => UnavailableReason::Upstream(other.to_string()),
        }
    }
}

/// Terminal state of a discovery run. Callers render `NoCandidates`
/// ("try a different channel") differently from `Unavailable` ("try again
/// later").
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum DiscoveryStatus {
    Found,
    NoCandidates(NoCandidatesReason),
    Unavailable(UnavailableReason),
    /// The analysis endpoint could not be used; built-in sample data shown.
    Demonstration,
}

#[derive(Debug, Clone, Serialize)]
pub struct DiscoveryReport {
    pub status: DiscoveryStatus,
    pub candidates: Vec<RankedCandidate>,
    /// Decoded model table, LLM pipeline only.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub records: Vec<ParsedRecord>,
    /// Raw model text, LLM pipeline only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
}

impl DiscoveryReport {
    pub fn found(candidates: Vec<RankedCandidate>) -> Self {
        Self {
            status: DiscoveryStatus::Found,
            candidates,
            records: Vec::new(),
            raw_response: None,
        }
    }

    pub fn no_candidates(reason: NoCandidatesReason) -> Self {
        Self {
            status: DiscoveryStatus::NoCandidates(reason),
            candidates: Vec::new(),
            records: Vec::new(),
            raw_response: None,
        }
    }

    pub fn unavailable(err: &DiscoveryError) -> Self {
        Self {
            status: DiscoveryStatus::Unavailable(err.into()),
            candidates: Vec::new(),
            records: Vec::new(),
            raw_response: None,
        }
    }

    pub fn with_records(mut self, records: Vec<ParsedRecord>) -> Self {
        self.records = records;
        self
    }

    pub fn with_raw_response(mut self, raw: impl Into<String>) -> Self {
        self.raw_response = Some(raw.into());
        self
    }

    pub fn is_found(&self) -> bool {
        self.status == DiscoveryStatus::Found
    }
}

impl fmt::Display for DiscoveryReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.status {
            DiscoveryStatus::Found => write!(f, "Discovery: found={}", self.candidates.len()),
            DiscoveryStatus::NoCandidates(reason) => {
                write!(f, "Discovery: no candidates ({reason:?})")
            }
            DiscoveryStatus::Unavailable(reason) => write!(f, "Discovery: unavailable ({reason:?})"),
            DiscoveryStatus::Demonstration => {
                write!(f, "Discovery: demonstration data, {} samples", self.candidates.len())
            }
        }
    }
}
