//! OpenAI-compatible chat completions client.

use std::time::Instant;

use async_trait::async_trait;
use coordination::TokenUsage;
use serde::{Deserialize, Serialize};

use super::{ChatMessage, Generation, GenerationRequest, Generator};
use crate::errors::GenerationError;

/// `POST {base_url}/chat/completions`.
#[derive(Debug, Clone)]
pub struct OpenAiGenerator {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl OpenAiGenerator {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url, api_key)
    }

    pub fn with_client(
        client: reqwest::Client,
        base_url: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client,
            base_url,
            api_key,
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<UsageBody>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct UsageBody {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
    #[serde(default)]
    total_tokens: u64,
}

impl From<UsageBody> for TokenUsage {
    fn from(u: UsageBody) -> Self {
        TokenUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens.max(u.prompt_tokens + u.completion_tokens),
        }
    }
}

fn parse_completion(body: &str) -> Result<(String, TokenUsage), GenerationError> {
    let response: CompletionResponse =
        serde_json::from_str(body).map_err(|e| GenerationError::Decode(e.to_string()))?;
    let text = response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .filter(|t| !t.trim().is_empty())
        .ok_or(GenerationError::EmptyCompletion)?;
    let usage = response.usage.map(TokenUsage::from).unwrap_or_default();
    Ok((text, usage))
}

#[async_trait]
impl Generator for OpenAiGenerator {
    async fn generate(&self, request: GenerationRequest) -> Result<Generation, GenerationError> {
        let started = Instant::now();
        let body = CompletionRequest {
            model: &request.model,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let mut builder = self.client.post(self.endpoint()).json(&body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }
        let resp = builder
            .send()
            .await
            .map_err(|e| GenerationError::Transport(e.to_string()))?;

        let status = resp.status();
        let raw = resp
            .text()
            .await
            .map_err(|e| GenerationError::Transport(e.to_string()))?;
        if !status.is_success() {
            return Err(GenerationError::Status {
                status: status.as_u16(),
                body: raw,
            });
        }

        let (text, usage) = parse_completion(&raw)?;
        let latency_ms = started.elapsed().as_millis() as u64;
        tracing::debug!(
            model = %request.model,
            latency_ms,
            completion_tokens = usage.completion_tokens,
            "completion received"
        );
        Ok(Generation {
            text,
            usage,
            latency_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_strips_trailing_slash() {
        let g = OpenAiGenerator::new("http://llm:8000/v1/", None);
        assert_eq!(g.endpoint(), "http://llm:8000/v1/chat/completions");
    }

    #[test]
    fn parses_content_and_usage() {
        let body = r#"{
            "choices": [{"message": {"role": "assistant", "content": "v = u + a * t"}}],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
        }"#;
        let (text, usage) = parse_completion(body).unwrap();
        assert_eq!(text, "v = u + a * t");
        assert_eq!(usage.total_tokens, 15);
    }

    #[test]
    fn missing_usage_defaults_to_zero() {
        let body = r#"{"choices": [{"message": {"content": "ok"}}]}"#;
        let (_, usage) = parse_completion(body).unwrap();
        assert_eq!(usage, TokenUsage::default());
    }

    #[test]
    fn empty_choices_is_an_error() {
        let err = parse_completion(r#"{"choices": []}"#).unwrap_err();
        assert!(matches!(err, GenerationError::EmptyCompletion));

        let err = parse_completion("not json").unwrap_err();
        assert!(matches!(err, GenerationError::Decode(_)));
    }
}
