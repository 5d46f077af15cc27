//! Language Module — script analysis and session-level language tracking
//!
//! Classifies a message as English, Hindi or Hinglish from three cheap
//! signals: Devanagari character ratio, Latin character ratio, and hits
//! against a fixed romanized-Hindi lexicon.
//!
//! # Classification (first match wins)
//!
//! ```text
//! Devanagari ratio > 0.5                          → hindi     0.95
//! Latin, ≥3 lexicon hits, hindi-word ratio > 0.3  → hinglish  0.70–0.95
//! Mixed script                                    → hinglish  0.80
//! Latin, 0 lexicon hits, Latin ratio > 0.7        → english   0.90
//! otherwise                                       → english   0.60
//! ```

pub mod detector;
pub mod lexicon;

pub use detector::{
    analyze, classify, detect_once, LanguageDetectionResult, LanguageDetector, ScriptStats,
    CONFIDENCE_THRESHOLD, HYSTERESIS_THRESHOLD, MIN_CHARS,
};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Target / detected answer language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum LanguageLabel {
    English,
    Hindi,
    Hinglish,
}

impl LanguageLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::English => "english",
            Self::Hindi => "hindi",
            Self::Hinglish => "hinglish",
        }
    }
}

impl std::fmt::Display for LanguageLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse script classification of a text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ScriptKind {
    Latin,
    Devanagari,
    Mixed,
    /// No letters from either script (digits, symbols).
    Other,
}

impl std::fmt::Display for ScriptKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Latin => write!(f, "latin"),
            Self::Devanagari => write!(f, "devanagari"),
            Self::Mixed => write!(f, "mixed"),
            Self::Other => write!(f, "other"),
        }
    }
}
