//! Verifier Report — structured output of the acceptance gate
//!
//! One [`GateResult`] per gate plus the aggregate decision and the
//! regeneration strategy for the orchestrator. Reports carry no timestamps
//! so that verifying the same draft twice yields identical reports.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::escalation::{RegenerationAction, RegenerationStrategy};

/// Which quality gate produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum GateKind {
    Fact,
    Math,
    Language,
}

impl GateKind {
    pub const ALL: [GateKind; 3] = [Self::Fact, Self::Math, Self::Language];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fact => "fact",
            Self::Math => "math",
            Self::Language => "language",
        }
    }
}

impl std::fmt::Display for GateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a single gate, for logs and summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateOutcome {
    Passed,
    Failed,
    /// Gate disabled for this task mode.
    Skipped,
}

impl std::fmt::Display for GateOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Passed => write!(f, "PASS"),
            Self::Failed => write!(f, "FAIL"),
            Self::Skipped => write!(f, "SKIP"),
        }
    }
}

/// Typed reason a gate failed. Drives corrective instructions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum GateIssue {
    NoCitations,
    UncitedClaims { count: usize },
    MixedUnits { family: String },
    ExcessPrecision {
        final_decimals: usize,
        max_input_decimals: usize,
    },
    LanguageMismatch { expected: String, detected: String },
    ReasoningLeak { markers: Vec<String> },
    NonEnglishFormula { count: usize },
}

impl std::fmt::Display for GateIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoCitations => write!(f, "no evidence citations found"),
            Self::UncitedClaims { count } => {
                write!(f, "{count} factual claim(s) without a citation")
            }
            Self::MixedUnits { family } => {
                write!(f, "mixed {family} units without an explicit conversion")
            }
            Self::ExcessPrecision {
                final_decimals,
                max_input_decimals,
            } => write!(
                f,
                "final answer has {final_decimals} decimal place(s); inputs have at most {max_input_decimals}"
            ),
            Self::LanguageMismatch { expected, detected } => {
                write!(f, "answer is in {detected}, expected {expected}")
            }
            Self::ReasoningLeak { markers } => {
                write!(f, "internal reasoning leaked: {}", markers.join(", "))
            }
            Self::NonEnglishFormula { count } => {
                write!(f, "{count} formula(s) use non-English symbols")
            }
        }
    }
}

/// Result of one gate over one draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GateResult {
    pub gate: GateKind,
    pub enabled: bool,
    pub passed: bool,
    /// In [0, 1].
    pub score: f64,
    /// Gate-specific structured details.
    pub details: serde_json::Value,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<GateIssue>,
    /// Human-readable rendering of `issues`.
    #[serde(default)]
    pub errors: Vec<String>,
}

impl GateResult {
    pub fn new(gate: GateKind, score: f64, details: serde_json::Value, issues: Vec<GateIssue>) -> Self {
        let errors = issues.iter().map(ToString::to_string).collect();
        Self {
            gate,
            enabled: true,
            passed: issues.is_empty(),
            score: score.clamp(0.0, 1.0),
            details,
            issues,
            errors,
        }
    }

    /// A gate that does not apply to the task mode. Never blocks acceptance.
    pub fn disabled(gate: GateKind) -> Self {
        Self {
            gate,
            enabled: false,
            passed: true,
            score: 1.0,
            details: serde_json::json!({ "reason": "disabled for mode" }),
            issues: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn outcome(&self) -> GateOutcome {
        match (self.enabled, self.passed) {
            (false, _) => GateOutcome::Skipped,
            (true, true) => GateOutcome::Passed,
            (true, false) => GateOutcome::Failed,
        }
    }
}

/// Aggregate verdict over all gates for one draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct VerifierReport {
    pub attempt_number: u32,
    pub fact: GateResult,
    pub math: GateResult,
    pub language: GateResult,
    pub overall_pass: bool,
    /// Weighted over enabled gates, rounded to 2 decimals.
    pub confidence_score: f64,
    pub should_regenerate: bool,
    pub strategy: RegenerationStrategy,
}

impl VerifierReport {
    pub fn gates(&self) -> [&GateResult; 3] {
        [&self.fact, &self.math, &self.language]
    }

    pub fn failed_gates(&self) -> Vec<GateKind> {
        self.gates()
            .into_iter()
            .filter(|g| g.enabled && !g.passed)
            .map(|g| g.gate)
            .collect()
    }

    pub fn all_errors(&self) -> Vec<String> {
        self.gates()
            .into_iter()
            .flat_map(|g| g.errors.iter().map(move |e| format!("{}: {e}", g.gate)))
            .collect()
    }

    pub fn is_escalation(&self) -> bool {
        self.strategy.action == RegenerationAction::Escalate
    }

    /// One-line summary for logs.
    pub fn summary(&self) -> String {
        let gates: Vec<String> = self
            .gates()
            .into_iter()
            .map(|g| format!("{}={}", g.gate, g.outcome()))
            .collect();
        format!(
            "attempt {} [{}] confidence={:.2} pass={} action={}",
            self.attempt_number,
            gates.join(" "),
            self.confidence_score,
            self.overall_pass,
            self.strategy.action
        )
    }
}
