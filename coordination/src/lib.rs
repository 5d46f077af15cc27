//! Tutor answer pipeline: deterministic core
//!
//! Everything in this crate is synchronous and free of I/O: language
//! detection, model routing, evidence bookkeeping, the acceptance gates, and
//! the regeneration state machine. The async orchestrator, collaborators and
//! HTTP surface live in `tutor-agents`.
//!
//! # Flow
//!
//! ```text
//! Task ─► LanguageDetector ─► Router ─► (retrieval) ─► (prompt) ─► generate
//!                                                                    │
//!            ┌──────────── RegenerationStrategy ◄── AcceptanceGate ◄─┘
//!            ▼
//!   pass → final answer   |   retry → tighten / switch model   |   escalate → failure
//! ```

pub mod draft;
pub mod escalation;
pub mod evidence;
pub mod language;
pub mod otel;
pub mod router;
pub mod task;
pub mod verifier;

pub use draft::{DraftAnswer, TokenUsage};
pub use evidence::{ChunkSource, EvidenceChunk, EvidencePack, RetrievalFilters};
pub use language::{LanguageDetectionResult, LanguageDetector, LanguageLabel, ScriptKind};
pub use router::{ModelCatalog, ModelId, Router, RouterDecision};
pub use task::{ConversationTurn, Task, TaskMode, TaskSignals, TaskValidationError};

pub use escalation::{RegenerationAction, RegenerationEngine, RegenerationStrategy};
pub use verifier::{AcceptanceGate, GateKind, GateResult, VerifierConfig, VerifierReport};
