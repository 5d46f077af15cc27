//! OpenTelemetry-Compatible Span Helpers
//!
//! Structured `tracing` span builders for the answer pipeline. All spans use
//! dot-notation field names compatible with OpenTelemetry semantic
//! conventions; fields unknown at creation are declared `Empty` and filled
//! by the `record_*` helpers.
//!
//! # Span Hierarchy
//!
//! ```text
//! tutor.request            (root — one per task)
//!   ├─ tutor.retrieval     (evidence retrieval, at most one)
//!   └─ tutor.attempt       (one per generate → verify cycle)
//!       └─ tutor.gate      (fact, math, language)
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use coordination::otel;
//!
//! let span = otel::attempt_span("req-1", 0, "gpt-4o");
//! let _guard = span.enter();
//! // ... generate and verify ...
//! otel::record_attempt_result(&span, &report, 1830);
//! ```

use tracing::Span;

use crate::verifier::{GateResult, VerifierReport};

// ── Span Name Constants ──────────────────────────────────────────────

pub const SPAN_REQUEST: &str = "tutor.request";
pub const SPAN_ATTEMPT: &str = "tutor.attempt";
pub const SPAN_GATE: &str = "tutor.gate";
pub const SPAN_RETRIEVAL: &str = "tutor.retrieval";

// ── Field Name Constants ─────────────────────────────────────────────

pub const FIELD_REQUEST_ID: &str = "tutor.request.id";
pub const FIELD_MODE: &str = "tutor.mode";
pub const FIELD_LANGUAGE: &str = "tutor.language";
pub const FIELD_RULE: &str = "tutor.route.rule";
pub const FIELD_MODEL: &str = "tutor.model";
pub const FIELD_ATTEMPT: &str = "tutor.attempt.number";
pub const FIELD_CONFIDENCE: &str = "tutor.confidence";
pub const FIELD_PASSED: &str = "tutor.passed";
pub const FIELD_ACTION: &str = "tutor.regeneration.action";
pub const FIELD_OUTCOME: &str = "tutor.outcome";
pub const FIELD_DURATION_MS: &str = "tutor.duration_ms";
pub const FIELD_GATE_NAME: &str = "tutor.gate.name";
pub const FIELD_GATE_SCORE: &str = "tutor.gate.score";
pub const FIELD_CHUNKS: &str = "tutor.retrieval.chunks";
pub const FIELD_SUFFICIENT: &str = "tutor.retrieval.sufficient";

// ── Span Builders ────────────────────────────────────────────────────

/// Root span for one task.
///
/// Filled later via [`record_request_route`] and [`record_request_result`].
pub fn request_span(request_id: &str, mode: &str) -> Span {
    tracing::info_span!(
        "tutor.request",
        "tutor.request.id" = %request_id,
        "tutor.mode" = %mode,
        "tutor.language" = tracing::field::Empty,
        "tutor.route.rule" = tracing::field::Empty,
        "tutor.model" = tracing::field::Empty,
        "tutor.outcome" = tracing::field::Empty,
        "tutor.attempt.number" = tracing::field::Empty,
        "tutor.duration_ms" = tracing::field::Empty,
    )
}

pub fn record_request_route(span: &Span, language: &str, rule: &str, model: &str) {
    span.record("tutor.language", language);
    span.record("tutor.route.rule", rule);
    span.record("tutor.model", model);
}

pub fn record_request_result(span: &Span, outcome: &str, regenerations: u32, duration_ms: u64) {
    span.record("tutor.outcome", outcome);
    span.record("tutor.attempt.number", regenerations);
    span.record("tutor.duration_ms", duration_ms);
}

/// Span for one generate → verify cycle.
pub fn attempt_span(request_id: &str, attempt: u32, model: &str) -> Span {
    tracing::info_span!(
        "tutor.attempt",
        "tutor.request.id" = %request_id,
        "tutor.attempt.number" = attempt,
        "tutor.model" = %model,
        "tutor.confidence" = tracing::field::Empty,
        "tutor.passed" = tracing::field::Empty,
        "tutor.regeneration.action" = tracing::field::Empty,
        "tutor.duration_ms" = tracing::field::Empty,
    )
}

pub fn record_attempt_result(span: &Span, report: &VerifierReport, duration_ms: u64) {
    span.record("tutor.confidence", report.confidence_score);
    span.record("tutor.passed", report.overall_pass);
    span.record("tutor.regeneration.action", report.strategy.action.as_str());
    span.record("tutor.duration_ms", duration_ms);
}

/// Span for one gate; the gate has already run, so all fields are known.
pub fn gate_span(result: &GateResult) -> Span {
    tracing::debug_span!(
        "tutor.gate",
        "tutor.gate.name" = result.gate.as_str(),
        "tutor.gate.score" = result.score,
        "tutor.passed" = result.passed,
    )
}

/// Emit one gate span per enabled gate under the current attempt span.
pub fn emit_gate_spans(report: &VerifierReport) {
    for gate in report.gates().into_iter().filter(|g| g.enabled) {
        let span = gate_span(gate);
        let _guard = span.enter();
        if !gate.passed {
            tracing::debug!(errors = ?gate.errors, "gate failed");
        }
    }
}

/// Span for evidence retrieval.
pub fn retrieval_span(request_id: &str, top_k: usize) -> Span {
    tracing::info_span!(
        "tutor.retrieval",
        "tutor.request.id" = %request_id,
        "tutor.retrieval.top_k" = top_k,
        "tutor.retrieval.chunks" = tracing::field::Empty,
        "tutor.retrieval.sufficient" = tracing::field::Empty,
        "tutor.duration_ms" = tracing::field::Empty,
    )
}

pub fn record_retrieval_result(span: &Span, chunks: usize, sufficient: bool, duration_ms: u64) {
    span.record("tutor.retrieval.chunks", chunks);
    span.record("tutor.retrieval.sufficient", sufficient);
    span.record("tutor.duration_ms", duration_ms);
}
