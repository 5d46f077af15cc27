//! Regeneration State — actions, reasons and the per-attempt strategy

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::router::ModelId;

/// What the orchestrator should do after a verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RegenerationAction {
    /// Draft accepted; no retry.
    None,
    /// Retry on the same model with corrective bullets appended.
    TightenConstraints,
    /// Retry on a stricter model with a strict-mode instruction block.
    SwitchModelAndTighten,
    /// Bound reached; surface failure.
    Escalate,
}

impl RegenerationAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::TightenConstraints => "tighten_constraints",
            Self::SwitchModelAndTighten => "switch_model_and_tighten",
            Self::Escalate => "escalate",
        }
    }

    /// Whether this action leads to another generation.
    pub fn retries(&self) -> bool {
        matches!(self, Self::TightenConstraints | Self::SwitchModelAndTighten)
    }
}

impl std::fmt::Display for RegenerationAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a draft was sent back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RegenerationReason {
    FactGate,
    MathGate,
    LanguageGate,
    /// All gates passed but confidence stayed below the auto-regenerate floor.
    LowConfidence,
}

impl RegenerationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FactGate => "fact_gate",
            Self::MathGate => "math_gate",
            Self::LanguageGate => "language_gate",
            Self::LowConfidence => "low_confidence",
        }
    }
}

impl std::fmt::Display for RegenerationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strategy attached to every verifier report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RegenerationStrategy {
    /// Regeneration count the report was produced for (0 = first draft).
    pub attempt_number: u32,
    pub action: RegenerationAction,
    pub switch_model: bool,
    /// Strict model to use when the router's fallback list is exhausted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strict_model: Option<ModelId>,
    /// Text to append to the system prompt for the next attempt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tightened_instructions: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reasons: Vec<RegenerationReason>,
}

impl RegenerationStrategy {
    pub fn none(attempt_number: u32) -> Self {
        Self {
            attempt_number,
            action: RegenerationAction::None,
            switch_model: false,
            strict_model: None,
            tightened_instructions: None,
            reasons: Vec::new(),
        }
    }
}
