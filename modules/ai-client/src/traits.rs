use anyhow::Result;
use async_trait::async_trait;

// =============================================================================
// Message Types
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageRole {
    System,
    User,
}

#[derive(Debug, Clone)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

// =============================================================================
// TextAnalyzer Trait
// =============================================================================

/// A language model that turns a prompt into free text.
///
/// Nothing about the returned text is guaranteed: callers must treat it as
/// untrusted and run it through their own parsing.
#[async_trait]
pub trait TextAnalyzer: Send + Sync {
    /// Send a system + user prompt pair and return the model's text answer.
    async fn analyze(&self, system: &str, prompt: &str) -> Result<String>;

    /// Provider name, for logs.
    fn name(&self) -> &str;
}
