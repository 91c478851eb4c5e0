//! Metered cloud chat provider (OpenAI)

use super::{wire, ChatCompletion, ChatProvider};
use std::time::Duration;
use wayfarer_common::config::OpenAiConfig;
use wayfarer_common::errors::{AppError, Result};

/// OpenAI chat-completion client
#[derive(Debug)]
pub struct OpenAiProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl OpenAiProvider {
    /// Create a new provider; the API key is required
    pub fn new(config: &OpenAiConfig, timeout: Duration) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| AppError::Configuration {
                message: "OpenAI API key required".to_string(),
            })?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Configuration {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            api_key,
        })
    }
}

#[async_trait::async_trait]
impl ChatProvider for OpenAiProvider {
    async fn chat(&self, model: &str, prompt: &str) -> Result<ChatCompletion> {
        wire::post_chat(
            &self.client,
            &self.base_url,
            Some(&self.api_key),
            model,
            prompt,
        )
        .await
    }

    fn name(&self) -> &str {
        "openai"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_api_key_fails_construction() {
        let config = OpenAiConfig {
            api_key: None,
            base_url: "https://api.openai.com/v1".to_string(),
        };
        let err = OpenAiProvider::new(&config, Duration::from_secs(5)).unwrap_err();
        assert!(matches!(err, AppError::Configuration { .. }));
    }
}
