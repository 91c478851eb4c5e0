//! Wayfarer Common Library
//!
//! Shared code for the Wayfarer services including:
//! - Configuration management
//! - Error types and handling
//! - Metrics and observability

pub mod config;
pub mod errors;
pub mod metrics;

// Re-export commonly used types
pub use config::AppConfig;
pub use errors::{AppError, Result};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default dense embedding model
pub const DEFAULT_EMBEDDING_MODEL: &str = "jinaai/jina-embeddings-v2-small-en";

/// Default dense embedding dimension
pub const DEFAULT_EMBEDDING_DIMENSION: usize = 512;

/// Default document collection name
pub const DEFAULT_COLLECTION: &str = "travel_docs";
