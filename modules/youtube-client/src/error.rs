use thiserror::Error;

pub type Result<T> = std::result::Result<T, YouTubeError>;

#[derive(Debug, Error)]
pub enum YouTubeError {
    #[error("YouTube API key is not configured")]
    MissingApiKey,

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

impl YouTubeError {
    /// Quota exhaustion comes back as a 403 with a `quotaExceeded` reason.
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, YouTubeError::Api { status: 403, message } if message.contains("quotaExceeded"))
    }
}

impl From<reqwest::Error> for YouTubeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            YouTubeError::Parse(err.to_string())
        } else {
            YouTubeError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for YouTubeError {
    fn from(err: serde_json::Error) -> Self {
        YouTubeError::Parse(err.to_string())
    }
}
