//! Answer handler

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::AppState;
use wayfarer_common::errors::{AppError, Result};
use wayfarer_rag::{AnswerBundle, SearchMode};

/// Answer request
#[derive(Debug, Deserialize, Validate)]
pub struct AnswerRequest {
    #[validate(length(min = 1, max = 1000))]
    pub question: String,

    /// Model id, `<provider>/<model-name>`
    #[serde(default = "default_model")]
    pub model: String,

    /// Retrieval mode
    #[serde(default)]
    pub search_mode: SearchMode,
}

fn default_model() -> String {
    "openai/gpt-3.5-turbo".to_string()
}

/// Answer response: the bundle plus identifiers the caller needs to log
/// feedback against
#[derive(Debug, Serialize)]
pub struct AnswerResponse {
    pub answer_id: Uuid,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub bundle: AnswerBundle,
}

/// Answer a travel question
pub async fn answer(
    State(state): State<AppState>,
    Json(request): Json<AnswerRequest>,
) -> Result<Json<AnswerResponse>> {
    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: Some("question".to_string()),
    })?;

    let bundle = state
        .pipeline
        .answer(&request.question, &request.model, request.search_mode)
        .await?;

    Ok(Json(AnswerResponse {
        answer_id: Uuid::new_v4(),
        created_at: Utc::now(),
        bundle,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults() {
        let request: AnswerRequest =
            serde_json::from_str(r#"{"question": "What is Hampi famous for?"}"#).unwrap();
        assert_eq!(request.model, "openai/gpt-3.5-turbo");
        assert_eq!(request.search_mode, SearchMode::Semantic);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_empty_question_fails_validation() {
        let request: AnswerRequest = serde_json::from_str(r#"{"question": ""}"#).unwrap();
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_overlong_question_fails_validation() {
        let question = "q".repeat(1001);
        let request = AnswerRequest {
            question,
            model: default_model(),
            search_mode: SearchMode::Hybrid,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_search_mode_parses_from_wire() {
        let request: AnswerRequest =
            serde_json::from_str(r#"{"question": "q", "search_mode": "hybrid"}"#).unwrap();
        assert_eq!(request.search_mode, SearchMode::Hybrid);
    }
}
