//! Draft answers as returned by the generation collaborator.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::verifier::citations::extract_citations;
use crate::verifier::math_gate::extract_formulas;

/// Token accounting reported by the model backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

/// Raw generated text plus derived, not-yet-verified extractions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftAnswer {
    pub text: String,
    pub model: String,
    pub usage: TokenUsage,
    pub latency_ms: u64,
    /// Citation tokens found in `text`, first-appearance order, deduplicated.
    pub citations: Vec<String>,
    /// `lhs = rhs` formulas found in `text`.
    pub formulas: Vec<String>,
}

impl DraftAnswer {
    pub fn new(text: impl Into<String>, model: impl Into<String>) -> Self {
        let text = text.into();
        let citations = extract_citations(&text);
        let formulas = extract_formulas(&text);
        Self {
            text,
            model: model.into(),
            usage: TokenUsage::default(),
            latency_ms: 0,
            citations,
            formulas,
        }
    }

    pub fn with_usage(mut self, usage: TokenUsage) -> Self {
        self.usage = usage;
        self
    }

    pub fn with_latency_ms(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }
}
