//! Regeneration Module — deterministic retry ladder for rejected drafts
//!
//! Pure state machine: given one attempt's gate results it decides whether
//! the orchestrator retries, how it tightens the prompt, and when it gives up.
//!
//! # Ladder
//!
//! ```text
//! attempt 0 fails
//!     │  append corrective bullets derived from failed gates
//!     ▼
//! attempt 1 fails
//!     │  switch to the strict model + STRICT MODE instruction block
//!     ▼
//! attempt ≥ max (2) fails
//!     │  escalate: no further automatic retry
//!     ▼
//! orchestrator surfaces MAX_REGENERATIONS_EXCEEDED
//! ```

pub mod engine;
pub mod state;

pub use engine::{corrective_bullets, AttemptOutcome, RegenerationEngine, MAX_REGENERATIONS};
pub use state::{RegenerationAction, RegenerationReason, RegenerationStrategy};
