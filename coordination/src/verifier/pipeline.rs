//! Acceptance Gate — runs the three gates and scores the draft
//!
//! Gates are independent; each one always runs (or reports itself disabled)
//! so the report shows every failure at once. Verification is pure:
//! the same draft, target and attempt always produce the same report.

use serde::{Deserialize, Serialize};

use crate::draft::DraftAnswer;
use crate::escalation::{
    AttemptOutcome, RegenerationAction, RegenerationEngine, MAX_REGENERATIONS,
};
use crate::language::LanguageLabel;
use crate::task::TaskMode;
use crate::verifier::report::{GateKind, GateResult, VerifierReport};
use crate::verifier::{fact_gate, language_gate, math_gate};

/// Minimum confidence for acceptance.
pub const CONFIDENCE_MIN: f64 = 0.82;
/// Below this a draft is regenerated even when every gate passed.
pub const AUTO_REGENERATE_BELOW: f64 = 0.72;

pub const FACT_WEIGHT: f64 = 0.4;
pub const MATH_WEIGHT: f64 = 0.3;
pub const LANGUAGE_WEIGHT: f64 = 0.3;

/// Thresholds for the acceptance gate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VerifierConfig {
    pub confidence_min: f64,
    pub auto_regenerate_below: f64,
    /// Attempt number at which the strategy escalates instead of retrying.
    pub max_regenerations: u32,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            confidence_min: CONFIDENCE_MIN,
            auto_regenerate_below: AUTO_REGENERATE_BELOW,
            max_regenerations: MAX_REGENERATIONS,
        }
    }
}

impl VerifierConfig {
    /// Escalate after `max` regenerations, capped at the default bound.
    pub fn with_max_regenerations(mut self, max: u32) -> Self {
        self.max_regenerations = max.min(MAX_REGENERATIONS);
        self
    }
}

/// Weighted mean of enabled gate scores, renormalized, rounded to 2 decimals.
pub fn confidence_score(fact: &GateResult, math: &GateResult, language: &GateResult) -> f64 {
    let weighted = [
        (fact, FACT_WEIGHT),
        (math, MATH_WEIGHT),
        (language, LANGUAGE_WEIGHT),
    ];
    let total_weight: f64 = weighted
        .iter()
        .filter(|(g, _)| g.enabled)
        .map(|(_, w)| w)
        .sum();
    if total_weight == 0.0 {
        return 1.0;
    }
    let sum: f64 = weighted
        .iter()
        .filter(|(g, _)| g.enabled)
        .map(|(g, w)| g.score * w)
        .sum();
    ((sum / total_weight) * 100.0).round() / 100.0
}

/// Multi-gate verifier for draft answers.
#[derive(Debug, Clone)]
pub struct AcceptanceGate {
    config: VerifierConfig,
    engine: RegenerationEngine,
}

impl AcceptanceGate {
    pub fn new() -> Self {
        Self::with_config(VerifierConfig::default())
    }

    pub fn with_config(config: VerifierConfig) -> Self {
        Self {
            engine: RegenerationEngine::new(config.max_regenerations),
            config,
        }
    }

    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// Verify one draft. `attempt_number` is the regeneration count so far.
    pub fn verify(
        &self,
        draft: &DraftAnswer,
        target_language: LanguageLabel,
        mode: TaskMode,
        attempt_number: u32,
    ) -> VerifierReport {
        // Numeric work is checked by the math gate instead of citations.
        let fact = if mode.is_numeric() {
            GateResult::disabled(GateKind::Fact)
        } else {
            fact_gate::run(&draft.text)
        };
        let math = if mode.is_numeric() {
            math_gate::run(&draft.text)
        } else {
            GateResult::disabled(GateKind::Math)
        };
        let language = language_gate::run(&draft.text, &draft.formulas, target_language);

        let confidence = confidence_score(&fact, &math, &language);
        let gates_pass = fact.passed && math.passed && language.passed;
        let overall_pass = gates_pass && confidence >= self.config.confidence_min;
        let low_confidence = confidence < self.config.auto_regenerate_below;

        let strategy = self.engine.plan(&AttemptOutcome {
            attempt_number,
            gates: [&fact, &math, &language],
            overall_pass,
            low_confidence,
            target_language,
        });
        let should_regenerate =
            (!overall_pass || low_confidence) && strategy.action != RegenerationAction::Escalate;

        let report = VerifierReport {
            attempt_number,
            fact,
            math,
            language,
            overall_pass,
            confidence_score: confidence,
            should_regenerate,
            strategy,
        };
        tracing::debug!(model = %draft.model, "{}", report.summary());
        report
    }
}

impl Default for AcceptanceGate {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate(kind: GateKind, score: f64) -> GateResult {
        GateResult::new(kind, score, serde_json::json!({}), Vec::new())
    }

    #[test]
    fn weights_renormalize_over_enabled_gates() {
        let fact = gate(GateKind::Fact, 0.5);
        let math = GateResult::disabled(GateKind::Math);
        let lang = gate(GateKind::Language, 1.0);
        // (0.5 * 0.4 + 1.0 * 0.3) / 0.7 = 0.714...
        assert_eq!(confidence_score(&fact, &math, &lang), 0.71);
    }

    #[test]
    fn all_gates_enabled_weighted_mean() {
        let fact = gate(GateKind::Fact, 1.0);
        let math = gate(GateKind::Math, 0.5);
        let lang = gate(GateKind::Language, 1.0);
        assert_eq!(confidence_score(&fact, &math, &lang), 0.85);
    }

    #[test]
    fn max_regenerations_is_capped() {
        let cfg = VerifierConfig::default().with_max_regenerations(9);
        assert_eq!(cfg.max_regenerations, MAX_REGENERATIONS);
        let cfg = VerifierConfig::default().with_max_regenerations(1);
        assert_eq!(cfg.max_regenerations, 1);
    }

    #[test]
    fn explain_without_citations_regenerates() {
        let draft = DraftAnswer::new(
            "Photosynthesis is the process by which green plants prepare food using sunlight.",
            "gpt-4o",
        );
        let r = AcceptanceGate::new().verify(&draft, LanguageLabel::English, TaskMode::Explain, 0);
        assert!(!r.fact.passed);
        assert!(!r.math.enabled);
        assert!(!r.overall_pass);
        assert!(r.should_regenerate);
        assert_eq!(r.strategy.action, RegenerationAction::TightenConstraints);
    }

    #[test]
    fn solve_mode_swaps_fact_gate_for_math_gate() {
        let draft = DraftAnswer::new("v = u + a * t", "qwen2.5-math-72b-instruct");
        let r = AcceptanceGate::new().verify(&draft, LanguageLabel::English, TaskMode::Solve, 0);
        assert!(!r.fact.enabled);
        assert!(r.math.enabled);
        assert!(r.math.passed);
        assert!(r.overall_pass);
        assert_eq!(r.strategy.action, RegenerationAction::None);
        assert_eq!(r.confidence_score, 1.0);
        assert!(!r.should_regenerate);
    }
}
