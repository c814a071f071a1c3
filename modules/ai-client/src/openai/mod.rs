mod client;
pub(crate) mod types;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::traits::{Message, TextAnalyzer};

pub(crate) use client::ChatClient;
use client::OPENAI_API_URL;
use types::{uses_max_completion_tokens, ChatRequest, WireMessage};

/// Output cap for a single completion. Tables of ten channels and short
/// scripts fit comfortably.
const MAX_OUTPUT_TOKENS: u32 = 4096;

// =============================================================================
// OpenAi Agent
// =============================================================================

#[derive(Clone)]
pub struct OpenAi {
    api_key: String,
    pub(crate) model: String,
    base_url: Option<String>,
}

impl OpenAi {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: None,
        }
    }

    pub fn from_env(model: impl Into<String>) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow!("OPENAI_API_KEY environment variable not set"))?;
        Ok(Self::new(api_key, model))
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Get the model name.
    pub fn model(&self) -> &str {
        &self.model
    }

    pub(crate) fn client(&self) -> ChatClient {
        ChatClient::new(
            &self.api_key,
            self.base_url.as_deref().unwrap_or(OPENAI_API_URL),
        )
    }

    /// Send an arbitrary conversation and return the first choice's text.
    pub async fn chat(&self, messages: &[Message]) -> Result<String> {
        let mut request = ChatRequest::new(&self.model);
        for message in messages {
            request = request.message(WireMessage::from(message));
        }

        if uses_max_completion_tokens(&self.model) {
            request = request.max_completion_tokens(MAX_OUTPUT_TOKENS);
        } else {
            request = request.max_tokens(MAX_OUTPUT_TOKENS).temperature(0.2);
        }

        self.client()
            .chat(&request)
            .await?
            .into_text()
            .ok_or_else(|| anyhow!("No response from {}", self.model))
    }

    /// Simple chat completion (system + user).
    pub async fn chat_completion(
        &self,
        system: impl Into<String>,
        user: impl Into<String>,
    ) -> Result<String> {
        self.chat(&[Message::system(system), Message::user(user)])
            .await
    }
}

#[async_trait]
impl TextAnalyzer for OpenAi {
    async fn analyze(&self, system: &str, prompt: &str) -> Result<String> {
        self.chat_completion(system, prompt).await
    }

    fn name(&self) -> &str {
        "openai"
    }
}
