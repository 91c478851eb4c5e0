//! Configuration management for Wayfarer services
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config.toml, config.yaml)
//! - Default values

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Vector store configuration
    #[serde(default)]
    pub qdrant: QdrantConfig,

    /// Dense embedding endpoint configuration
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Chat provider configuration
    #[serde(default)]
    pub providers: ProvidersConfig,

    /// Answer-relevance judge configuration
    #[serde(default)]
    pub judge: JudgeConfig,

    /// Retrieval tuning
    #[serde(default)]
    pub search: SearchConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Shutdown timeout in seconds
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QdrantConfig {
    /// Qdrant base URL
    #[serde(default = "default_qdrant_url")]
    pub url: String,

    /// Collection holding the document chunks
    #[serde(default = "default_collection")]
    pub collection: String,

    /// Named dense vector inside the collection
    #[serde(default = "default_dense_vector")]
    pub dense_vector: String,

    /// Named sparse vector inside the collection
    #[serde(default = "default_sparse_vector")]
    pub sparse_vector: String,

    /// Request timeout in seconds
    #[serde(default = "default_qdrant_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmbeddingConfig {
    /// OpenAI-compatible embeddings endpoint base URL
    #[serde(default = "default_embedding_endpoint")]
    pub endpoint: String,

    /// API key, if the endpoint requires one
    pub api_key: Option<String>,

    /// Embedding model name
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Dense vector dimension (fixed per collection)
    #[serde(default = "default_embedding_dimension")]
    pub dimension: usize,

    /// Request timeout in seconds
    #[serde(default = "default_embedding_timeout")]
    pub timeout_secs: u64,

    /// Maximum retries per embedding request
    #[serde(default = "default_embedding_retries")]
    pub max_retries: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProvidersConfig {
    /// Metered cloud provider (requires credential)
    #[serde(default)]
    pub openai: OpenAiConfig,

    /// Self-hosted provider (no credential)
    #[serde(default)]
    pub ollama: OllamaConfig,

    /// Per-call timeout applied at the gateway boundary, in seconds
    #[serde(default = "default_provider_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OpenAiConfig {
    /// API key; the provider is not registered without one
    pub api_key: Option<String>,

    /// API base URL
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OllamaConfig {
    /// OpenAI-compatible base URL of the local endpoint
    #[serde(default = "default_ollama_base_url")]
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JudgeConfig {
    /// Model id used for every relevance evaluation
    #[serde(default = "default_judge_model")]
    pub model: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchConfig {
    /// RRF dampening constant
    #[serde(default = "default_rrf_k")]
    pub rrf_k: f32,

    /// Hybrid prefetch size as a multiple of the requested limit
    #[serde(default = "default_prefetch_factor")]
    pub prefetch_factor: usize,

    /// Result count when the caller does not specify one
    #[serde(default = "default_search_limit")]
    pub default_limit: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level (debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default = "default_json_logging")]
    pub json_logging: bool,

    /// Prometheus metrics port (0 to disable)
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,

    /// Service name for logs and metrics
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

// Default value functions
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }
fn default_request_timeout() -> u64 { 120 }
fn default_shutdown_timeout() -> u64 { 30 }
fn default_qdrant_url() -> String { "http://localhost:6333".to_string() }
fn default_collection() -> String { crate::DEFAULT_COLLECTION.to_string() }
fn default_dense_vector() -> String { "jina-small".to_string() }
fn default_sparse_vector() -> String { "bm25".to_string() }
fn default_qdrant_timeout() -> u64 { 10 }
fn default_embedding_endpoint() -> String { "http://localhost:11434/v1".to_string() }
fn default_embedding_model() -> String { crate::DEFAULT_EMBEDDING_MODEL.to_string() }
fn default_embedding_dimension() -> usize { crate::DEFAULT_EMBEDDING_DIMENSION }
fn default_embedding_timeout() -> u64 { 30 }
fn default_embedding_retries() -> u32 { 3 }
fn default_provider_timeout() -> u64 { 60 }
fn default_openai_base_url() -> String { "https://api.openai.com/v1".to_string() }
fn default_ollama_base_url() -> String { "http://localhost:11434/v1".to_string() }
fn default_judge_model() -> String { "openai/gpt-4o-mini".to_string() }
fn default_rrf_k() -> f32 { 60.0 }
fn default_prefetch_factor() -> usize { 5 }
fn default_search_limit() -> usize { 5 }
fn default_log_level() -> String { "info".to_string() }
fn default_json_logging() -> bool { true }
fn default_metrics_port() -> u16 { 9090 }
fn default_service_name() -> String { "wayfarer".to_string() }

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Load base config file
            .add_source(File::with_name("config/default").required(false))
            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            // Load local overrides
            .add_source(File::with_name("config/local").required(false))
            // Load from environment variables with APP__ prefix
            // e.g., APP__QDRANT__URL=http://qdrant:6333
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load from a specific TOML file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Get request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }

    /// Get shutdown timeout as Duration
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.server.shutdown_timeout_secs)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout(),
            shutdown_timeout_secs: default_shutdown_timeout(),
        }
    }
}

impl Default for QdrantConfig {
    fn default() -> Self {
        Self {
            url: default_qdrant_url(),
            collection: default_collection(),
            dense_vector: default_dense_vector(),
            sparse_vector: default_sparse_vector(),
            timeout_secs: default_qdrant_timeout(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            endpoint: default_embedding_endpoint(),
            api_key: None,
            model: default_embedding_model(),
            dimension: default_embedding_dimension(),
            timeout_secs: default_embedding_timeout(),
            max_retries: default_embedding_retries(),
        }
    }
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            openai: OpenAiConfig::default(),
            ollama: OllamaConfig::default(),
            timeout_secs: default_provider_timeout(),
        }
    }
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_openai_base_url(),
        }
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: default_ollama_base_url(),
        }
    }
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            model: default_judge_model(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            rrf_k: default_rrf_k(),
            prefetch_factor: default_prefetch_factor(),
            default_limit: default_search_limit(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logging: default_json_logging(),
            metrics_port: default_metrics_port(),
            service_name: default_service_name(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            qdrant: QdrantConfig::default(),
            embedding: EmbeddingConfig::default(),
            providers: ProvidersConfig::default(),
            judge: JudgeConfig::default(),
            search: SearchConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}
