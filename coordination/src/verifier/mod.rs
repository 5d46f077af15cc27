//! Verifier Module — deterministic acceptance gates for draft answers
//!
//! Every draft passes through three independent gates before it may become
//! a final answer. No model calls: all checks are regex and lexicon based,
//! and the same draft always yields the same report.
//!
//! # Gates
//!
//! ```text
//! Gate      | Enabled for          | Weight | Passes iff
//! ----------|----------------------|--------|------------------------------------------
//! fact      | all but solve/derive | 0.4    | ≥1 citation and no uncited claims
//! math      | solve, derive        | 0.3    | units consistent and precision sane
//! language  | always               | 0.3    | target language, no leaked reasoning,
//!           |                      |        | English-only formulas
//! ```
//!
//! Confidence is the weighted mean over enabled gates. A draft is accepted
//! when every gate passes and confidence ≥ 0.82; below 0.72 it is always
//! regenerated.

pub mod citations;
pub mod fact_gate;
pub mod language_gate;
pub mod math_gate;
pub mod pipeline;
pub mod report;

pub use citations::{extract_citations, is_valid_citation, Citation};
pub use pipeline::{
    confidence_score, AcceptanceGate, VerifierConfig, AUTO_REGENERATE_BELOW, CONFIDENCE_MIN,
};
pub use report::{GateIssue, GateKind, GateOutcome, GateResult, VerifierReport};
