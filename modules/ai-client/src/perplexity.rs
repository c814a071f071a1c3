//! Perplexity's search-grounded models speak the OpenAI chat completion wire
//! format, so this is a preset over the shared chat client.

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::openai::types::{ChatRequest, WireMessage};
use crate::openai::ChatClient;
use crate::traits::TextAnalyzer;

const PERPLEXITY_API_URL: &str = "https://api.perplexity.ai";

pub const DEFAULT_PERPLEXITY_MODEL: &str = "sonar";

#[derive(Clone)]
pub struct Perplexity {
    api_key: String,
    model: String,
    base_url: String,
}

impl Perplexity {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: PERPLEXITY_API_URL.to_string(),
        }
    }

    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("PERPLEXITY_API_KEY")
            .map_err(|_| anyhow!("PERPLEXITY_API_KEY environment variable not set"))?;
        let model = std::env::var("PERPLEXITY_MODEL")
            .unwrap_or_else(|_| DEFAULT_PERPLEXITY_MODEL.to_string());
        Ok(Self::new(api_key, model))
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl TextAnalyzer for Perplexity {
    async fn analyze(&self, system: &str, prompt: &str) -> Result<String> {
        let request = ChatRequest::new(&self.model)
            .message(WireMessage::system(system))
            .message(WireMessage::user(prompt))
            .temperature(0.2);

        ChatClient::new(&self.api_key, &self.base_url)
            .chat(&request)
            .await?
            .into_text()
            .ok_or_else(|| anyhow!("No response from Perplexity"))
    }

    fn name(&self) -> &str {
        "perplexity"
    }
}
