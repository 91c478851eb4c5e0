//! Grounded prompt assembly
//!
//! Pure, deterministic rendering of the instruction template around the
//! question and retrieved context. Retrieved content is concatenated in
//! input order with no truncation or deduplication; a very large limit or
//! very long chunks can exceed a model's input window.

use crate::retrieval::SearchResult;

const PROMPT_TEMPLATE: &str = "\
You're a travel assistant bot that helps users plan their itinerary and discover amazing places to visit.
Answer the QUESTION based on the CONTEXT from the travel database.
Use only the facts from the CONTEXT when answering the QUESTION.

When answering, consider:
- Must-visit tourist attractions and landmarks
- Cultural experiences and local traditions
- Historical significance of places
- Best times to visit and travel tips
- Local cuisine and specialties (if mentioned in context)
- Transportation and accessibility information (if available)

QUESTION: {question}

CONTEXT:
{context}";

/// Render the instruction prompt for a question and its retrieved context
///
/// An empty result slice produces an empty context block; the surrounding
/// template stays well-formed either way.
pub fn build_prompt(question: &str, results: &[SearchResult]) -> String {
    let mut context = String::new();
    for result in results {
        context.push_str(&format!(
            "location: {}\ncontent: {}\n\n",
            result.location, result.content
        ));
    }

    PROMPT_TEMPLATE
        .replace("{question}", question)
        .replace("{context}", &context)
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(location: &str, content: &str) -> SearchResult {
        SearchResult {
            content: content.to_string(),
            location: location.to_string(),
            doc_id: "doc-1".to_string(),
            score: 0.5,
        }
    }

    #[test]
    fn test_prompt_contains_question_and_context_in_order() {
        let results = vec![
            result("Hampi", "Ruins of the Vijayanagara empire"),
            result("Goa", "Beaches along the Arabian Sea"),
        ];
        let prompt = build_prompt("Where should I go in winter?", &results);

        assert!(prompt.contains("Where should I go in winter?"));
        assert!(prompt.contains("location: Hampi"));
        assert!(prompt.contains("Ruins of the Vijayanagara empire"));
        assert!(prompt.contains("location: Goa"));
        assert!(prompt.contains("Beaches along the Arabian Sea"));

        let hampi = prompt.find("location: Hampi").unwrap();
        let goa = prompt.find("location: Goa").unwrap();
        assert!(hampi < goa);
    }

    #[test]
    fn test_empty_results_keep_template_well_formed() {
        let prompt = build_prompt("What is Hampi famous for?", &[]);

        assert!(prompt.contains("QUESTION: What is Hampi famous for?"));
        assert!(!prompt.contains("{question}"));
        assert!(!prompt.contains("{context}"));
        assert!(prompt.ends_with("CONTEXT:"));
    }

    #[test]
    fn test_prompt_is_deterministic() {
        let results = vec![result("Hampi", "Stone chariot and Virupaksha temple")];
        let a = build_prompt("What is Hampi famous for?", &results);
        let b = build_prompt("What is Hampi famous for?", &results);
        assert_eq!(a, b);
    }
}
