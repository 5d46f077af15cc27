//! Regeneration Engine — deterministic retry ladder for failed drafts
//!
//! Consumes gate results for one attempt and produces the
//! [`RegenerationStrategy`] the orchestrator follows. No model calls here.

use crate::escalation::state::{RegenerationAction, RegenerationReason, RegenerationStrategy};
use crate::language::LanguageLabel;
use crate::router::STRICT_FALLBACK_MODEL;
use crate::verifier::report::{GateIssue, GateKind, GateResult};

/// Default bound on regenerations per task.
pub const MAX_REGENERATIONS: u32 = 2;

/// Inputs for one strategy decision.
#[derive(Debug, Clone, Copy)]
pub struct AttemptOutcome<'a> {
    pub attempt_number: u32,
    pub gates: [&'a GateResult; 3],
    pub overall_pass: bool,
    pub low_confidence: bool,
    pub target_language: LanguageLabel,
}

impl<'a> AttemptOutcome<'a> {
    fn needs_regeneration(&self) -> bool {
        !self.overall_pass || self.low_confidence
    }

    fn failed_gates(&self) -> impl Iterator<Item = &'a GateResult> {
        self.gates
            .into_iter()
            .filter(|g| g.enabled && !g.passed)
    }

    fn reasons(&self) -> Vec<RegenerationReason> {
        let mut reasons: Vec<RegenerationReason> = self
            .failed_gates()
            .map(|g| match g.gate {
                GateKind::Fact => RegenerationReason::FactGate,
                GateKind::Math => RegenerationReason::MathGate,
                GateKind::Language => RegenerationReason::LanguageGate,
            })
            .collect();
        if reasons.is_empty() && self.low_confidence {
            reasons.push(RegenerationReason::LowConfidence);
        }
        reasons
    }
}

/// Retry ladder:
///
/// ```text
/// passing                      → none
/// attempt 0, failing           → tighten_constraints
/// 0 < attempt < max, failing   → switch_model_and_tighten
/// attempt ≥ max, failing       → escalate
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RegenerationEngine {
    max_regenerations: u32,
}

impl RegenerationEngine {
    pub fn new(max_regenerations: u32) -> Self {
        Self { max_regenerations }
    }

    pub fn max_regenerations(&self) -> u32 {
        self.max_regenerations
    }

    pub fn plan(&self, outcome: &AttemptOutcome<'_>) -> RegenerationStrategy {
        let attempt_number = outcome.attempt_number;
        if !outcome.needs_regeneration() {
            return RegenerationStrategy::none(attempt_number);
        }

        let reasons = outcome.reasons();

        if attempt_number >= self.max_regenerations {
            tracing::info!(
                attempt = attempt_number,
                max = self.max_regenerations,
                "regeneration bound reached, escalating"
            );
            return RegenerationStrategy {
                attempt_number,
                action: RegenerationAction::Escalate,
                switch_model: false,
                strict_model: None,
                tightened_instructions: None,
                reasons,
            };
        }

        let bullets = corrective_bullets(outcome);
        if attempt_number == 0 {
            RegenerationStrategy {
                attempt_number,
                action: RegenerationAction::TightenConstraints,
                switch_model: false,
                strict_model: None,
                tightened_instructions: Some(tighten_block(&bullets)),
                reasons,
            }
        } else {
            RegenerationStrategy {
                attempt_number,
                action: RegenerationAction::SwitchModelAndTighten,
                switch_model: true,
                strict_model: Some(STRICT_FALLBACK_MODEL),
                tightened_instructions: Some(strict_block(&bullets)),
                reasons,
            }
        }
    }
}

impl Default for RegenerationEngine {
    fn default() -> Self {
        Self::new(MAX_REGENERATIONS)
    }
}

/// One corrective bullet per distinct gate issue.
pub fn corrective_bullets(outcome: &AttemptOutcome<'_>) -> Vec<String> {
    let mut bullets = Vec::new();

    for gate in outcome.failed_gates() {
        for issue in &gate.issues {
            match issue {
                GateIssue::NoCitations | GateIssue::UncitedClaims { .. } => push_unique(
                    &mut bullets,
                    "Cite every factual statement with an evidence token such as \
                     NCERT:<doc_id>:<section> or PYQ:<EXAM>:<YYYY>:<SLOT>:<qid>, \
                     placed right after the statement."
                        .to_string(),
                ),
                GateIssue::MixedUnits { family } => push_unique(
                    &mut bullets,
                    format!(
                        "Use one unit system for {family}; show the conversion explicitly \
                         before combining values."
                    ),
                ),
                GateIssue::ExcessPrecision { .. } => push_unique(
                    &mut bullets,
                    "Round the final answer to at most one decimal place more than the \
                     given data."
                        .to_string(),
                ),
                GateIssue::LanguageMismatch { .. } => push_unique(
                    &mut bullets,
                    format!("Write the entire answer in {}.", outcome.target_language),
                ),
                GateIssue::ReasoningLeak { .. } => push_unique(
                    &mut bullets,
                    "Do not show internal reasoning or thinking steps; give only the \
                     explanation meant for the student."
                        .to_string(),
                ),
                GateIssue::NonEnglishFormula { .. } => push_unique(
                    &mut bullets,
                    "Write every formula with standard English symbols and unit names."
                        .to_string(),
                ),
            }
        }
    }

    if bullets.is_empty() {
        push_unique(
            &mut bullets,
            "Be more precise: ground each statement in the provided evidence and keep the \
             answer focused on the question."
                .to_string(),
        );
    }
    bullets
}

fn push_unique(bullets: &mut Vec<String>, line: String) {
    if !bullets.contains(&line) {
        bullets.push(line);
    }
}

fn tighten_block(bullets: &[String]) -> String {
    let mut out = String::from("Corrections required for this answer:\n");
    for b in bullets {
        out.push_str("- ");
        out.push_str(b);
        out.push('\n');
    }
    out
}

fn strict_block(bullets: &[String]) -> String {
    let mut out = String::from(
        "STRICT MODE: the previous answer was rejected by automated review.\n\
         Every rule below is mandatory. Any violation = rejection.\n",
    );
    for (i, b) in bullets.iter().enumerate() {
        out.push_str(&format!("{}. {}\n", i + 1, b));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passing(gate: GateKind) -> GateResult {
        GateResult::new(gate, 1.0, serde_json::json!({}), Vec::new())
    }

    fn failing(gate: GateKind, issue: GateIssue) -> GateResult {
        GateResult::new(gate, 0.0, serde_json::json!({}), vec![issue])
    }

    fn outcome<'a>(
        attempt_number: u32,
        gates: [&'a GateResult; 3],
        low_confidence: bool,
    ) -> AttemptOutcome<'a> {
        AttemptOutcome {
            attempt_number,
            gates,
            overall_pass: gates.iter().all(|g| g.passed) && !low_confidence,
            low_confidence,
            target_language: LanguageLabel::Hindi,
        }
    }

    #[test]
    fn passing_attempt_plans_nothing() {
        let (f, m, l) = (
            passing(GateKind::Fact),
            passing(GateKind::Math),
            passing(GateKind::Language),
        );
        let s = RegenerationEngine::default().plan(&outcome(0, [&f, &m, &l], false));
        assert_eq!(s.action, RegenerationAction::None);
        assert!(s.tightened_instructions.is_none());
    }

    #[test]
    fn ladder_tightens_then_switches_then_escalates() {
        let f = failing(GateKind::Fact, GateIssue::NoCitations);
        let (m, l) = (passing(GateKind::Math), passing(GateKind::Language));
        let engine = RegenerationEngine::default();

        let s0 = engine.plan(&outcome(0, [&f, &m, &l], false));
        assert_eq!(s0.action, RegenerationAction::TightenConstraints);
        assert!(!s0.switch_model);
        assert!(s0.tightened_instructions.as_deref().unwrap().contains("- Cite"));
        assert_eq!(s0.reasons, vec![RegenerationReason::FactGate]);

        let s1 = engine.plan(&outcome(1, [&f, &m, &l], false));
        assert_eq!(s1.action, RegenerationAction::SwitchModelAndTighten);
        assert!(s1.switch_model);
        assert_eq!(s1.strict_model, Some(STRICT_FALLBACK_MODEL));
        let text = s1.tightened_instructions.unwrap();
        assert!(text.contains("STRICT MODE"));
        assert!(text.contains("violation = rejection"));

        let s2 = engine.plan(&outcome(2, [&f, &m, &l], false));
        assert_eq!(s2.action, RegenerationAction::Escalate);
        assert!(!s2.action.retries());
    }

    #[test]
    fn lower_bound_escalates_earlier() {
        let f = failing(GateKind::Fact, GateIssue::NoCitations);
        let (m, l) = (passing(GateKind::Math), passing(GateKind::Language));
        let s = RegenerationEngine::new(1).plan(&outcome(1, [&f, &m, &l], false));
        assert_eq!(s.action, RegenerationAction::Escalate);
    }

    #[test]
    fn low_confidence_alone_triggers_tightening() {
        let (f, m, l) = (
            passing(GateKind::Fact),
            passing(GateKind::Math),
            passing(GateKind::Language),
        );
        let s = RegenerationEngine::default().plan(&outcome(0, [&f, &m, &l], true));
        assert_eq!(s.action, RegenerationAction::TightenConstraints);
        assert_eq!(s.reasons, vec![RegenerationReason::LowConfidence]);
    }

    #[test]
    fn language_bullet_names_target() {
        let f = passing(GateKind::Fact);
        let m = passing(GateKind::Math);
        let l = failing(
            GateKind::Language,
            GateIssue::LanguageMismatch {
                expected: "hindi".into(),
                detected: "english".into(),
            },
        );
        let bullets = corrective_bullets(&outcome(0, [&f, &m, &l], false));
        assert_eq!(bullets, vec!["Write the entire answer in hindi.".to_string()]);
    }

    #[test]
    fn disabled_gate_never_contributes() {
        let f = passing(GateKind::Fact);
        let m = GateResult::disabled(GateKind::Math);
        let l = passing(GateKind::Language);
        let o = outcome(0, [&f, &m, &l], false);
        assert_eq!(o.failed_gates().count(), 0);
    }
}
