//! Answer-relevance judging
//!
//! Sends every (question, answer) pair to one fixed evaluation model with a
//! rubric prompt and parses a structured verdict out of the reply. Parsing
//! is strict: exact key names, no extra keys, the enum must be one of the
//! three literals, and the reply must be bare JSON (no markdown fences).
//! Any failure, including a degraded generation underneath, falls back to
//! the `Unknown` verdict so judging can never take the pipeline down.

use crate::llm::{GenerationStatus, ModelGateway, TokenUsage};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use wayfarer_common::errors::{AppError, Result};
use wayfarer_common::metrics::METRICS_PREFIX;

const EVAL_TEMPLATE: &str = "\
You are an expert evaluator for a Retrieval-Augmented Generation (RAG) system.
Your task is to analyze the relevance of the generated answer to the given question.
Based on the relevance of the generated answer, you will classify it
as \"NON_RELEVANT\", \"PARTLY_RELEVANT\", or \"RELEVANT\".

Here is the data for evaluation:

Question: {question}

Generated Answer: {answer}

Please analyze the content and context of the generated answer in relation to the question
and provide your evaluation in parsable JSON without using code blocks:

{
    \"Relevance\": \"NON_RELEVANT\" | \"PARTLY_RELEVANT\" | \"RELEVANT\",
    \"Explanation\": \"[Provide a brief explanation for your evaluation]\"
}";

/// Explanation attached to every fallback verdict
pub const PARSE_FAILURE_EXPLANATION: &str = "Failed to parse evaluation";

/// Post-hoc classification of whether an answer addresses its question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Relevance {
    #[serde(rename = "RELEVANT")]
    Relevant,
    #[serde(rename = "PARTLY_RELEVANT")]
    PartlyRelevant,
    #[serde(rename = "NON_RELEVANT")]
    NonRelevant,
    /// Fallback when the judge's output cannot be parsed
    #[serde(rename = "UNKNOWN")]
    Unknown,
}

impl fmt::Display for Relevance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Relevance::Relevant => f.write_str("RELEVANT"),
            Relevance::PartlyRelevant => f.write_str("PARTLY_RELEVANT"),
            Relevance::NonRelevant => f.write_str("NON_RELEVANT"),
            Relevance::Unknown => f.write_str("UNKNOWN"),
        }
    }
}

/// Verdict for one (question, answer) pair
#[derive(Debug, Clone, Serialize)]
pub struct RelevanceVerdict {
    pub relevance: Relevance,
    pub explanation: String,
    pub eval_usage: TokenUsage,
}

impl RelevanceVerdict {
    /// The designated fallback verdict
    pub fn unknown() -> Self {
        Self {
            relevance: Relevance::Unknown,
            explanation: PARSE_FAILURE_EXPLANATION.to_string(),
            eval_usage: TokenUsage::default(),
        }
    }
}

/// The enum the judge model is allowed to reply with; `UNKNOWN` is ours,
/// never accepted off the wire
#[derive(Deserialize)]
enum WireRelevance {
    #[serde(rename = "RELEVANT")]
    Relevant,
    #[serde(rename = "PARTLY_RELEVANT")]
    PartlyRelevant,
    #[serde(rename = "NON_RELEVANT")]
    NonRelevant,
}

impl From<WireRelevance> for Relevance {
    fn from(wire: WireRelevance) -> Self {
        match wire {
            WireRelevance::Relevant => Relevance::Relevant,
            WireRelevance::PartlyRelevant => Relevance::PartlyRelevant,
            WireRelevance::NonRelevant => Relevance::NonRelevant,
        }
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct VerdictWire {
    #[serde(rename = "Relevance")]
    relevance: WireRelevance,
    #[serde(rename = "Explanation")]
    explanation: String,
}

/// Strictly parse a judge reply into a verdict
///
/// Exposed so callers and tests can assert on the exact failure path
/// instead of only observing the `Unknown` fallback.
pub fn parse_verdict(raw: &str) -> Result<(Relevance, String)> {
    let wire: VerdictWire =
        serde_json::from_str(raw.trim()).map_err(|e| AppError::JudgeParse {
            message: e.to_string(),
        })?;
    Ok((wire.relevance.into(), wire.explanation))
}

/// Judge bound to one fixed evaluation model
pub struct RelevanceJudge {
    gateway: Arc<ModelGateway>,
    model_id: String,
}

impl RelevanceJudge {
    pub fn new(gateway: Arc<ModelGateway>, model_id: impl Into<String>) -> Self {
        Self {
            gateway,
            model_id: model_id.into(),
        }
    }

    /// Evaluate how well an answer addresses its question
    ///
    /// Never fails: every error path degrades to the `Unknown` verdict with
    /// zeroed usage.
    pub async fn evaluate(&self, question: &str, answer: &str) -> RelevanceVerdict {
        let prompt = EVAL_TEMPLATE
            .replace("{question}", question)
            .replace("{answer}", answer);

        let generation = match self.gateway.generate(&prompt, &self.model_id).await {
            Ok(generation) => generation,
            Err(e) => {
                tracing::warn!(model = %self.model_id, error = %e, "Judge could not dispatch");
                self.record_fallback();
                return RelevanceVerdict::unknown();
            }
        };

        if generation.status == GenerationStatus::Failed {
            self.record_fallback();
            return RelevanceVerdict::unknown();
        }

        match parse_verdict(&generation.answer) {
            Ok((relevance, explanation)) => RelevanceVerdict {
                relevance,
                explanation,
                eval_usage: generation.usage,
            },
            Err(e) => {
                tracing::warn!(model = %self.model_id, error = %e, "Judge reply did not parse");
                self.record_fallback();
                RelevanceVerdict::unknown()
            }
        }
    }

    fn record_fallback(&self) {
        metrics::counter!(format!("{}_judge_parse_failures_total", METRICS_PREFIX)).increment(1);
    }
}
