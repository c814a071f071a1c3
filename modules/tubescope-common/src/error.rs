use thiserror::Error;

/// Failure taxonomy of a discovery run. None of these escape the public
/// pipeline operations: they are logged and folded into a report status.
#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("Configuration missing: {0}")]
    ConfigurationMissing(String),

    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Unparseable record on line {line}: {text}")]
    UnparseableRecord { line: usize, text: String },
}

impl DiscoveryError {
    pub fn upstream(err: impl std::fmt::Display) -> Self {
        DiscoveryError::UpstreamUnavailable(err.to_string())
    }
}
