//! Wayfarer RAG core
//!
//! The retrieval-and-answer pipeline behind the travel assistant:
//! - Vector store access (dense + sparse nearest-neighbor queries)
//! - Query embedding and sparse term encoding
//! - Hybrid retrieval with Reciprocal Rank Fusion
//! - Grounded prompt assembly
//! - Multi-provider chat-completion gateway
//! - LLM-as-judge relevance grading
//! - Pricing-snapshot cost estimation

pub mod embeddings;
pub mod judge;
pub mod llm;
pub mod pipeline;
pub mod pricing;
pub mod prompt;
pub mod retrieval;
pub mod store;

// Re-export the types callers wire together
pub use judge::{Relevance, RelevanceJudge, RelevanceVerdict};
pub use llm::{ChatProvider, GenerationResult, GenerationStatus, ModelGateway, TokenUsage};
pub use pipeline::{AnswerBundle, RagPipeline};
pub use retrieval::{Retriever, SearchMode, SearchResult};
pub use store::{ChunkPayload, ScoredPoint, SparseVector, VectorStore};
