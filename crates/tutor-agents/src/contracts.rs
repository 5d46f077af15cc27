//! Output contract of one pipeline run.
//!
//! ## Shape
//!
//! ```text
//! OrchestratorResult
//!   status = "success" {
//!       answer:   { kind = "final", FinalAnswer } | { kind = "plan", PlanAnswer },
//!       metadata: RunMetadata { latency, model, regeneration_count, language, confidence, attempts… }
//!   }
//!   status = "failure" {
//!       error: { code, message, latency_ms, regeneration_count, … }
//!   }
//! ```
//!
//! Exactly one of the two variants is ever produced. An answer is only
//! constructed from a draft whose verifier report passed.

use chrono::{DateTime, Utc};
use coordination::{LanguageLabel, RegenerationAction, TokenUsage, VerifierReport};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Public failure codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidInput,
    VerificationFailed,
    MaxRegenerationsExceeded,
    OrchestrationError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidInput => "INVALID_INPUT",
            Self::VerificationFailed => "VERIFICATION_FAILED",
            Self::MaxRegenerationsExceeded => "MAX_REGENERATIONS_EXCEEDED",
            Self::OrchestrationError => "ORCHESTRATION_ERROR",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A citation token from the answer, with whatever the evidence pack knew about it.
///
/// Unresolved citations keep every metadata field empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ResolvedCitation {
    pub citation: String,
    pub resolved: bool,
    /// `ncert` or `pyq`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chapter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f64>,
}

impl ResolvedCitation {
    pub fn unresolved(citation: impl Into<String>) -> Self {
        Self {
            citation: citation.into(),
            resolved: false,
            source_type: None,
            doc_id: None,
            title: None,
            chapter: None,
            page: None,
            similarity: None,
        }
    }
}

/// Accepted free-text answer (every mode except `plan`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FinalAnswer {
    pub text: String,
    pub citations: Vec<ResolvedCitation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub formulas: Vec<String>,
    pub language: LanguageLabel,
    pub confidence: f64,
}

/// One phase of a study plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PlanPhase {
    pub title: String,
    #[serde(default)]
    pub topics: Vec<String>,
}

/// Accepted `plan` mode answer: a phase/topic breakdown plus the raw text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PlanAnswer {
    pub title: String,
    pub phases: Vec<PlanPhase>,
    pub raw_text: String,
    pub citations: Vec<ResolvedCitation>,
    pub language: LanguageLabel,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Answer {
    Final(FinalAnswer),
    Plan(PlanAnswer),
}

impl Answer {
    pub fn text(&self) -> &str {
        match self {
            Self::Final(a) => &a.text,
            Self::Plan(p) => &p.raw_text,
        }
    }

    pub fn citations(&self) -> &[ResolvedCitation] {
        match self {
            Self::Final(a) => &a.citations,
            Self::Plan(p) => &p.citations,
        }
    }
}

/// One generate → verify cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AttemptRecord {
    /// 1-based attempt number.
    pub attempt: u32,
    pub model: String,
    pub confidence: f64,
    pub passed: bool,
    pub action: RegenerationAction,
    pub latency_ms: u64,
}

/// Telemetry about a successful run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RunMetadata {
    pub request_id: String,
    pub latency_ms: u64,
    pub model_used: String,
    pub regeneration_count: u32,
    pub detected_language: LanguageLabel,
    pub confidence: f64,
    pub matched_rule: String,
    pub evidence_chunks: usize,
    pub has_sufficient_evidence: bool,
    pub prompt_version: String,
    pub token_usage: TokenUsage,
    pub completed_at: DateTime<Utc>,
    pub attempts: Vec<AttemptRecord>,
}

/// Terminal failure description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PipelineFailure {
    pub code: ErrorCode,
    pub message: String,
    pub request_id: String,
    /// Elapsed time until the failure, kept for telemetry.
    pub latency_ms: u64,
    pub regeneration_count: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attempts: Vec<AttemptRecord>,
    /// Report of the last rejected draft, when one was verified.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_report: Option<VerifierReport>,
}

/// Result of `Orchestrator::run`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OrchestratorResult {
    Success {
        answer: Answer,
        metadata: RunMetadata,
    },
    Failure {
        error: PipelineFailure,
    },
}

impl OrchestratorResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn error_code(&self) -> Option<ErrorCode> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { error } => Some(error.code),
        }
    }

    pub fn regeneration_count(&self) -> u32 {
        match self {
            Self::Success { metadata, .. } => metadata.regeneration_count,
            Self::Failure { error } => error.regeneration_count,
        }
    }

    pub fn latency_ms(&self) -> u64 {
        match self {
            Self::Success { metadata, .. } => metadata.latency_ms,
            Self::Failure { error } => error.latency_ms,
        }
    }

    pub fn answer(&self) -> Option<&Answer> {
        match self {
            Self::Success { answer, .. } => Some(answer),
            Self::Failure { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure(code: ErrorCode) -> OrchestratorResult {
        OrchestratorResult::Failure {
            error: PipelineFailure {
                code,
                message: "nope".into(),
                request_id: "req-1".into(),
                latency_ms: 7,
                regeneration_count: 2,
                attempts: Vec::new(),
                last_report: None,
            },
        }
    }

    #[test]
    fn error_codes_serialize_screaming_snake() {
        let json = serde_json::to_string(&ErrorCode::MaxRegenerationsExceeded).unwrap();
        assert_eq!(json, "\"MAX_REGENERATIONS_EXCEEDED\"");
        assert_eq!(ErrorCode::InvalidInput.to_string(), "INVALID_INPUT");
    }

    #[test]
    fn failure_is_tagged_and_has_no_answer() {
        let result = failure(ErrorCode::VerificationFailed);
        assert!(!result.is_success());
        assert!(result.answer().is_none());
        assert_eq!(result.error_code(), Some(ErrorCode::VerificationFailed));
        assert_eq!(result.regeneration_count(), 2);

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["status"], "failure");
        assert_eq!(value["error"]["code"], "VERIFICATION_FAILED");
        assert!(value.get("answer").is_none());
    }

    #[test]
    fn answer_variants_are_tagged_by_kind() {
        let answer = Answer::Final(FinalAnswer {
            text: "x".into(),
            citations: vec![ResolvedCitation::unresolved("NCERT:a:1")],
            formulas: Vec::new(),
            language: LanguageLabel::English,
            confidence: 1.0,
        });
        let value = serde_json::to_value(&answer).unwrap();
        assert_eq!(value["kind"], "final");
        assert_eq!(answer.citations().len(), 1);
        assert!(!answer.citations()[0].resolved);
    }
}
