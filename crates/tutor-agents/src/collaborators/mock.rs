//! Null-object collaborators used when no endpoint is configured.

use async_trait::async_trait;
use coordination::{EvidenceChunk, RetrievalFilters, TokenUsage};

use super::{Generation, GenerationRequest, Generator, Retriever};
use crate::errors::{GenerationError, RetrievalError};

/// Canned answer: cited, formula-free, plain English.
pub const STUB_ANSWER: &str = "This is a placeholder answer generated without a live model \
     connection [NCERT:stub:1.1].";

/// Offline generator that always returns the same cited stub.
#[derive(Debug, Clone)]
pub struct StubGenerator {
    text: String,
}

impl StubGenerator {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl Default for StubGenerator {
    fn default() -> Self {
        Self::new(STUB_ANSWER)
    }
}

#[async_trait]
impl Generator for StubGenerator {
    async fn generate(&self, request: GenerationRequest) -> Result<Generation, GenerationError> {
        let prompt_tokens: u64 = request
            .messages
            .iter()
            .map(|m| m.content.split_whitespace().count() as u64)
            .sum();
        let completion_tokens = self.text.split_whitespace().count() as u64;
        Ok(Generation {
            text: self.text.clone(),
            usage: TokenUsage {
                prompt_tokens,
                completion_tokens,
                total_tokens: prompt_tokens + completion_tokens,
            },
            latency_ms: 0,
        })
    }
}

/// Retriever that never finds anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRetriever;

#[async_trait]
impl Retriever for NullRetriever {
    async fn retrieve(
        &self,
        _query: &str,
        _filters: &RetrievalFilters,
        _top_k: usize,
    ) -> Result<Vec<EvidenceChunk>, RetrievalError> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::ChatMessage;
    use coordination::{AcceptanceGate, DraftAnswer, LanguageLabel, TaskMode};

    #[tokio::test]
    async fn stub_answer_passes_verification_in_every_mode() {
        let generation = StubGenerator::default()
            .generate(GenerationRequest {
                messages: vec![ChatMessage::user("what is inertia?")],
                model: "gpt-4o".into(),
                temperature: 0.5,
                max_tokens: 100,
            })
            .await
            .unwrap();
        assert!(generation.usage.total_tokens > 0);

        let draft = DraftAnswer::new(generation.text, "gpt-4o");
        let gate = AcceptanceGate::new();
        for mode in TaskMode::ALL {
            let report = gate.verify(&draft, LanguageLabel::English, mode, 0);
            assert!(report.overall_pass, "{mode}: {}", report.summary());
        }
    }

    #[tokio::test]
    async fn null_retriever_is_empty() {
        let chunks = NullRetriever
            .retrieve("q", &RetrievalFilters::default(), 6)
            .await
            .unwrap();
        assert!(chunks.is_empty());
    }
}
