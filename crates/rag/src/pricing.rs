//! Cost estimation
//!
//! A pricing snapshot, not a live-pricing API: per-1K-token rates keyed by
//! model id. Models absent from the table (all local models included) cost
//! nothing.

use crate::llm::TokenUsage;

/// Per-model rates in USD per 1K tokens
#[derive(Debug, Clone, Copy)]
pub struct ModelPricing {
    pub model: &'static str,
    pub prompt_per_1k: f64,
    pub completion_per_1k: f64,
}

/// Pricing snapshot for the metered models this deployment offers
pub const PRICING: &[ModelPricing] = &[
    ModelPricing {
        model: "openai/gpt-3.5-turbo",
        prompt_per_1k: 0.0015,
        completion_per_1k: 0.002,
    },
    ModelPricing {
        model: "openai/gpt-4o",
        prompt_per_1k: 0.03,
        completion_per_1k: 0.06,
    },
    ModelPricing {
        model: "openai/gpt-4o-mini",
        prompt_per_1k: 0.03,
        completion_per_1k: 0.06,
    },
];

/// Estimate the cost of one generation
pub fn estimate_cost(model_id: &str, usage: &TokenUsage) -> f64 {
    let Some(pricing) = PRICING.iter().find(|p| p.model == model_id) else {
        return 0.0;
    };

    (usage.prompt_tokens as f64 * pricing.prompt_per_1k
        + usage.completion_tokens as f64 * pricing.completion_per_1k)
        / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usage(prompt: u32, completion: u32) -> TokenUsage {
        TokenUsage {
            prompt_tokens: prompt,
            completion_tokens: completion,
            total_tokens: prompt + completion,
        }
    }

    #[test]
    fn test_gpt35_turbo_rate() {
        let cost = estimate_cost("openai/gpt-3.5-turbo", &usage(1000, 1000));
        assert!((cost - 0.0035).abs() < 1e-12);
    }

    #[test]
    fn test_unknown_model_costs_nothing() {
        assert_eq!(estimate_cost("openai/gpt-5", &usage(1000, 1000)), 0.0);
        assert_eq!(estimate_cost("ollama/phi3", &usage(1000, 1000)), 0.0);
    }

    #[test]
    fn test_zero_usage_costs_nothing() {
        assert_eq!(estimate_cost("openai/gpt-4o", &usage(0, 0)), 0.0);
    }

    #[test]
    fn test_rates_differ_for_prompt_and_completion() {
        let prompt_heavy = estimate_cost("openai/gpt-3.5-turbo", &usage(1000, 0));
        let completion_heavy = estimate_cost("openai/gpt-3.5-turbo", &usage(0, 1000));
        assert!(completion_heavy > prompt_heavy);
    }
}
