//! Async layer of the tutor answer pipeline.
//!
//! Wraps the deterministic core in `coordination` with collaborators
//! (generation, retrieval, prompt building), the bounded regeneration loop,
//! typed results, Prometheus metrics, configuration and an HTTP service.

pub mod collaborators;
pub mod config;
pub mod contracts;
pub mod errors;
pub mod metrics;
pub mod orchestrator;
pub mod plan;
pub mod planner;
pub mod prompts;
pub mod server;
pub mod session;

pub use config::PipelineConfig;
pub use contracts::{Answer, ErrorCode, OrchestratorResult};
pub use errors::PipelineError;
pub use orchestrator::Orchestrator;
pub use planner::ToolPlanner;
pub use session::{ConversationSession, SessionStore};
