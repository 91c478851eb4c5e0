//! OpenAI-compatible chat-completion wire format
//!
//! Both providers speak this shape; only the endpoint and credential
//! handling differ.

use super::{ChatCompletion, TokenUsage};
use serde::{Deserialize, Serialize};
use wayfarer_common::errors::{AppError, Result};

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<UsageWire>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageWire,
}

#[derive(Deserialize)]
struct ChatMessageWire {
    content: String,
}

#[derive(Deserialize)]
struct UsageWire {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

/// Issue a single-user-message chat completion
pub(crate) async fn post_chat(
    client: &reqwest::Client,
    base_url: &str,
    api_key: Option<&str>,
    model: &str,
    prompt: &str,
) -> Result<ChatCompletion> {
    let url = format!("{}/chat/completions", base_url.trim_end_matches('/'));

    let request = ChatRequest {
        model,
        messages: vec![ChatMessage {
            role: "user",
            content: prompt,
        }],
    };

    let mut builder = client.post(&url).json(&request);
    if let Some(key) = api_key {
        builder = builder.header("Authorization", format!("Bearer {}", key));
    }

    let response = builder.send().await.map_err(|e| AppError::Generation {
        message: format!("Request failed: {}", e),
    })?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(AppError::Generation {
            message: format!("API error {}: {}", status, body),
        });
    }

    let parsed: ChatResponse = response.json().await.map_err(|e| AppError::Generation {
        message: format!("Failed to parse response: {}", e),
    })?;

    let content = parsed
        .choices
        .into_iter()
        .next()
        .map(|c| c.message.content)
        .ok_or_else(|| AppError::Generation {
            message: "Empty response from model".to_string(),
        })?;

    let usage = parsed
        .usage
        .map(|u| TokenUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        })
        .unwrap_or_default();

    Ok(ChatCompletion { content, usage })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_parses_with_usage() {
        let raw = r#"{
            "choices": [{"message": {"role": "assistant", "content": "Hampi."}}],
            "usage": {"prompt_tokens": 10, "completion_tokens": 20, "total_tokens": 30}
        }"#;
        let parsed: ChatResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.choices[0].message.content, "Hampi.");
        assert_eq!(parsed.usage.unwrap().total_tokens, 30);
    }

    #[test]
    fn test_response_parses_without_usage() {
        let raw = r#"{"choices": [{"message": {"content": "hi"}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(raw).unwrap();
        assert!(parsed.usage.is_none());
    }

    #[test]
    fn test_request_wire_shape() {
        let request = ChatRequest {
            model: "phi3",
            messages: vec![ChatMessage {
                role: "user",
                content: "hello",
            }],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "phi3");
        assert_eq!(json["messages"][0]["role"], "user");
    }
}
