//! Answer pipeline
//!
//! Composes retrieval, prompt assembly, generation, judging, and cost
//! estimation into one call. The sequence is strict and branch-free:
//! every upstream stage already degrades to a well-formed value, so each
//! question that enters the pipeline leaves it as a storable bundle.

use crate::judge::{Relevance, RelevanceJudge};
use crate::llm::ModelGateway;
use crate::pricing::estimate_cost;
use crate::prompt::build_prompt;
use crate::retrieval::{Retriever, SearchMode};
use serde::Serialize;
use std::sync::Arc;
use wayfarer_common::errors::Result;
use wayfarer_common::metrics::METRICS_PREFIX;

/// Everything the conversation-log collaborator needs about one answer
///
/// This shape is a stable contract: adding a field is additive, removing
/// or renaming one breaks the collaborator's schema.
#[derive(Debug, Clone, Serialize)]
pub struct AnswerBundle {
    pub answer: String,
    pub model_used: String,
    pub search_type: SearchMode,
    pub response_time: f64,
    pub relevance: Relevance,
    pub relevance_explanation: String,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
    pub eval_prompt_tokens: u32,
    pub eval_completion_tokens: u32,
    pub eval_total_tokens: u32,
    pub openai_cost: f64,
    pub search_results_count: usize,
}

/// The retrieval-and-answer pipeline
pub struct RagPipeline {
    retriever: Retriever,
    gateway: Arc<ModelGateway>,
    judge: RelevanceJudge,
    default_limit: usize,
}

impl RagPipeline {
    pub fn new(
        retriever: Retriever,
        gateway: Arc<ModelGateway>,
        judge: RelevanceJudge,
        default_limit: usize,
    ) -> Self {
        Self {
            retriever,
            gateway,
            judge,
            default_limit,
        }
    }

    /// Answer a question: retrieve, prompt, generate, judge, price, bundle
    ///
    /// Errors only on caller input (unknown provider, malformed model id);
    /// transient failures in any stage degrade inside that stage.
    pub async fn answer(
        &self,
        question: &str,
        model_id: &str,
        mode: SearchMode,
    ) -> Result<AnswerBundle> {
        // Reject misconfigured model ids before doing any work
        self.gateway.resolve(model_id)?;

        metrics::counter!(
            format!("{}_answers_total", METRICS_PREFIX),
            "model" => model_id.to_string(),
            "mode" => mode.to_string()
        )
        .increment(1);

        let results = self
            .retriever
            .search(question, mode, self.default_limit)
            .await?;

        let prompt = build_prompt(question, &results);
        let generation = self.gateway.generate(&prompt, model_id).await?;
        let verdict = self.judge.evaluate(question, &generation.answer).await;
        let cost = estimate_cost(model_id, &generation.usage);

        tracing::info!(
            model = %model_id,
            mode = %mode,
            results = results.len(),
            status = ?generation.status,
            relevance = %verdict.relevance,
            cost,
            "Question answered"
        );

        Ok(AnswerBundle {
            answer: generation.answer,
            model_used: model_id.to_string(),
            search_type: mode,
            response_time: generation.response_time.as_secs_f64(),
            relevance: verdict.relevance,
            relevance_explanation: verdict.explanation,
            prompt_tokens: generation.usage.prompt_tokens,
            completion_tokens: generation.usage.completion_tokens,
            total_tokens: generation.usage.total_tokens,
            eval_prompt_tokens: verdict.eval_usage.prompt_tokens,
            eval_completion_tokens: verdict.eval_usage.completion_tokens,
            eval_total_tokens: verdict.eval_usage.total_tokens,
            openai_cost: cost,
            search_results_count: results.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::{DenseEmbedder, HashEmbedder, SparseEncoder};
    use crate::llm::{ChatCompletion, ChatProvider, TokenUsage};
    use crate::store::{ChunkPayload, MemoryChunk, MemoryStore};
    use std::collections::HashMap;
    use std::time::Duration;
    use wayfarer_common::config::SearchConfig;
    use wayfarer_common::errors::{AppError, Result};

    /// Replies per model name; unknown models error
    struct ScriptedProvider {
        replies: HashMap<String, (String, TokenUsage)>,
    }

    #[async_trait::async_trait]
    impl ChatProvider for ScriptedProvider {
        async fn chat(&self, model: &str, _prompt: &str) -> Result<ChatCompletion> {
            let (content, usage) =
                self.replies
                    .get(model)
                    .cloned()
                    .ok_or_else(|| AppError::Generation {
                        message: format!("no script for model {}", model),
                    })?;
            Ok(ChatCompletion { content, usage })
        }

        fn name(&self) -> &str {
            "local"
        }
    }

    fn usage(prompt: u32, completion: u32, total: u32) -> TokenUsage {
        TokenUsage {
            prompt_tokens: prompt,
            completion_tokens: completion,
            total_tokens: total,
        }
    }

    async fn hampi_store(embedder: &HashEmbedder) -> MemoryStore {
        let encoder = SparseEncoder::new();
        let texts = [
            ("Hampi", "Hampi is famous for the ruins of Vijayanagara, the stone chariot, and the Virupaksha temple"),
            ("Hampi", "The best time to visit Hampi is between October and February"),
            ("Badami", "Badami has rock-cut cave temples from the Chalukya era"),
        ];

        let mut store = MemoryStore::new();
        for (i, (location, content)) in texts.iter().enumerate() {
            store.insert(MemoryChunk {
                id: format!("chunk-{}", i),
                payload: ChunkPayload {
                    content: content.to_string(),
                    location: location.to_string(),
                    doc_id: format!("doc-{}", i),
                },
                dense: embedder.embed(content).await.unwrap(),
                sparse: encoder.encode(content),
            });
        }
        store
    }

    fn pipeline_with(store: MemoryStore, replies: HashMap<String, (String, TokenUsage)>) -> RagPipeline {
        let embedder = Arc::new(HashEmbedder::new(16));
        let retriever = Retriever::new(Arc::new(store), embedder, &SearchConfig::default());

        let gateway = Arc::new(
            ModelGateway::new(Duration::from_secs(5))
                .register("local", Arc::new(ScriptedProvider { replies })),
        );
        let judge = RelevanceJudge::new(gateway.clone(), "local/eval-model");

        RagPipeline::new(retriever, gateway, judge, 5)
    }

    #[tokio::test]
    async fn test_end_to_end_hybrid_answer() {
        let embedder = HashEmbedder::new(16);
        let store = hampi_store(&embedder).await;

        let mut replies = HashMap::new();
        replies.insert(
            "test-model".to_string(),
            (
                "Hampi is famous for the ruins of the Vijayanagara empire.".to_string(),
                usage(10, 20, 30),
            ),
        );
        replies.insert(
            "eval-model".to_string(),
            (
                r#"{"Relevance": "RELEVANT", "Explanation": "Answers the question."}"#.to_string(),
                usage(5, 7, 12),
            ),
        );

        let pipeline = pipeline_with(store, replies);
        let bundle = pipeline
            .answer("What is Hampi famous for?", "local/test-model", SearchMode::Hybrid)
            .await
            .unwrap();

        assert_eq!(bundle.search_type, SearchMode::Hybrid);
        assert_eq!(bundle.model_used, "local/test-model");
        assert_eq!(bundle.total_tokens, 30);
        assert_eq!(bundle.prompt_tokens, 10);
        assert_eq!(bundle.completion_tokens, 20);
        assert_eq!(bundle.openai_cost, 0.0);
        assert_eq!(bundle.search_results_count, 3);
        assert_eq!(bundle.relevance, Relevance::Relevant);
        assert_eq!(bundle.eval_total_tokens, 12);
        assert!(bundle.response_time >= 0.0);
        assert!(bundle.answer.contains("Vijayanagara"));
    }

    #[tokio::test]
    async fn test_unknown_provider_is_rejected_up_front() {
        let embedder = HashEmbedder::new(16);
        let store = hampi_store(&embedder).await;
        let pipeline = pipeline_with(store, HashMap::new());

        let err = pipeline
            .answer("What is Hampi famous for?", "openai/gpt-4o", SearchMode::Semantic)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UnknownProvider { .. }));
    }

    #[tokio::test]
    async fn test_generation_outage_still_produces_bundle() {
        let embedder = HashEmbedder::new(16);
        let store = hampi_store(&embedder).await;
        // No script for either model: generation and judging both degrade
        let pipeline = pipeline_with(store, HashMap::new());

        let bundle = pipeline
            .answer("What is Hampi famous for?", "local/test-model", SearchMode::Semantic)
            .await
            .unwrap();

        assert!(!bundle.answer.is_empty());
        assert_eq!(bundle.total_tokens, 0);
        assert_eq!(bundle.relevance, Relevance::Unknown);
        assert_eq!(bundle.eval_total_tokens, 0);
        assert_eq!(bundle.openai_cost, 0.0);
    }

    #[test]
    fn test_bundle_serializes_with_contract_field_names() {
        let bundle = AnswerBundle {
            answer: "a".to_string(),
            model_used: "ollama/phi3".to_string(),
            search_type: SearchMode::Hybrid,
            response_time: 0.5,
            relevance: Relevance::Relevant,
            relevance_explanation: "e".to_string(),
            prompt_tokens: 1,
            completion_tokens: 2,
            total_tokens: 3,
            eval_prompt_tokens: 4,
            eval_completion_tokens: 5,
            eval_total_tokens: 9,
            openai_cost: 0.0,
            search_results_count: 5,
        };

        let json = serde_json::to_value(&bundle).unwrap();
        assert_eq!(json["search_type"], "hybrid");
        assert_eq!(json["relevance"], "RELEVANT");
        for field in [
            "answer",
            "model_used",
            "search_type",
            "response_time",
            "relevance",
            "relevance_explanation",
            "prompt_tokens",
            "completion_tokens",
            "total_tokens",
            "eval_prompt_tokens",
            "eval_completion_tokens",
            "eval_total_tokens",
            "openai_cost",
            "search_results_count",
        ] {
            assert!(json.get(field).is_some(), "missing field {}", field);
        }
    }
}
