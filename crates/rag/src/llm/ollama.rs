//! Self-hosted chat provider (Ollama's OpenAI-compatible endpoint)

use super::{wire, ChatCompletion, ChatProvider};
use std::time::Duration;
use wayfarer_common::config::OllamaConfig;
use wayfarer_common::errors::{AppError, Result};

/// Local chat-completion client; no credential, fixed endpoint
pub struct OllamaProvider {
    client: reqwest::Client,
    base_url: String,
}

impl OllamaProvider {
    pub fn new(config: &OllamaConfig, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Configuration {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }
}

#[async_trait::async_trait]
impl ChatProvider for OllamaProvider {
    async fn chat(&self, model: &str, prompt: &str) -> Result<ChatCompletion> {
        wire::post_chat(&self.client, &self.base_url, None, model, prompt).await
    }

    fn name(&self) -> &str {
        "ollama"
    }
}
