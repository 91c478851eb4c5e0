//! Model gateway
//!
//! Dispatches a prompt to one of several chat-completion backends selected
//! by a `"<provider>/<model-name>"` identifier. An unrecognized provider is
//! a caller error rejected before dispatch; everything that can go wrong
//! *after* dispatch (transport failure, provider error, timeout) soft-fails
//! into a storable result so a model outage never crashes the pipeline.

mod ollama;
mod openai;
mod wire;

pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use wayfarer_common::config::ProvidersConfig;
use wayfarer_common::errors::{AppError, Result};
use wayfarer_common::metrics::METRICS_PREFIX;

/// Token usage reported by a provider
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Raw completion returned by a provider
#[derive(Debug, Clone)]
pub struct ChatCompletion {
    pub content: String,
    pub usage: TokenUsage,
}

/// Trait for chat-completion backends
///
/// One capability: a single user message in, generated text plus token
/// usage out.
#[async_trait::async_trait]
pub trait ChatProvider: Send + Sync {
    async fn chat(&self, model: &str, prompt: &str) -> Result<ChatCompletion>;

    /// Provider prefix this backend serves
    fn name(&self) -> &str;
}

/// Whether a generation completed or soft-failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationStatus {
    Completed,
    Failed,
}

/// Outcome of one gateway invocation
///
/// Always well-formed: a failed invocation carries a short user-facing
/// error answer and zeroed usage rather than an exception.
#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub answer: String,
    pub usage: TokenUsage,
    pub response_time: Duration,
    pub status: GenerationStatus,
}

/// Registry of chat providers keyed by model-id prefix
pub struct ModelGateway {
    providers: HashMap<String, Arc<dyn ChatProvider>>,
    timeout: Duration,
}

impl ModelGateway {
    pub fn new(timeout: Duration) -> Self {
        Self {
            providers: HashMap::new(),
            timeout,
        }
    }

    /// Register a provider under a prefix
    pub fn register(mut self, prefix: impl Into<String>, provider: Arc<dyn ChatProvider>) -> Self {
        self.providers.insert(prefix.into(), provider);
        self
    }

    /// Build the gateway from configuration, resolved once at startup
    ///
    /// The cloud provider is registered only when a credential is present;
    /// the local provider always is.
    pub fn from_config(config: &ProvidersConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let mut gateway = Self::new(timeout);

        if config.openai.api_key.is_some() {
            gateway = gateway.register(
                "openai",
                Arc::new(OpenAiProvider::new(&config.openai, timeout)?),
            );
        } else {
            tracing::warn!("No OpenAI API key configured; openai/* models unavailable");
        }

        gateway = gateway.register(
            "ollama",
            Arc::new(OllamaProvider::new(&config.ollama, timeout)?),
        );

        Ok(gateway)
    }

    /// Resolve a model id to its provider and bare model name
    ///
    /// Fails fast on malformed ids and unregistered prefixes; this is the
    /// one gateway error that surfaces to the caller, since it indicates
    /// misconfiguration rather than transient failure.
    pub fn resolve(&self, model_id: &str) -> Result<(Arc<dyn ChatProvider>, String)> {
        let (prefix, model) = model_id.split_once('/').ok_or_else(|| AppError::Validation {
            message: format!(
                "model id must look like '<provider>/<model-name>', got '{}'",
                model_id
            ),
            field: Some("model".to_string()),
        })?;

        if model.is_empty() {
            return Err(AppError::Validation {
                message: format!("model id '{}' has an empty model name", model_id),
                field: Some("model".to_string()),
            });
        }

        let provider = self
            .providers
            .get(prefix)
            .cloned()
            .ok_or_else(|| AppError::UnknownProvider {
                model_id: model_id.to_string(),
            })?;

        Ok((provider, model.to_string()))
    }

    /// Generate a completion, timed end-to-end
    pub async fn generate(&self, prompt: &str, model_id: &str) -> Result<GenerationResult> {
        let (provider, model) = self.resolve(model_id)?;

        let start = Instant::now();
        let outcome = tokio::time::timeout(self.timeout, provider.chat(&model, prompt)).await;
        let response_time = start.elapsed();

        metrics::histogram!(
            format!("{}_generation_duration_seconds", METRICS_PREFIX),
            "provider" => provider.name().to_string()
        )
        .record(response_time.as_secs_f64());

        let result = match outcome {
            Ok(Ok(completion)) => GenerationResult {
                answer: completion.content,
                usage: completion.usage,
                response_time,
                status: GenerationStatus::Completed,
            },
            Ok(Err(e)) => {
                tracing::warn!(model = %model_id, error = %e, "Generation failed");
                self.record_failure(provider.name());
                GenerationResult {
                    answer: format!("Sorry, I encountered an error: {}", e),
                    usage: TokenUsage::default(),
                    response_time,
                    status: GenerationStatus::Failed,
                }
            }
            Err(_) => {
                tracing::warn!(
                    model = %model_id,
                    timeout_secs = self.timeout.as_secs(),
                    "Generation timed out"
                );
                self.record_failure(provider.name());
                GenerationResult {
                    answer: "Sorry, the model did not respond in time.".to_string(),
                    usage: TokenUsage::default(),
                    response_time,
                    status: GenerationStatus::Failed,
                }
            }
        };

        Ok(result)
    }

    fn record_failure(&self, provider: &str) {
        metrics::counter!(
            format!("{}_generation_failures_total", METRICS_PREFIX),
            "provider" => provider.to_string()
        )
        .increment(1);
    }
}
