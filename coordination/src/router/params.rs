//! Static per-mode generation parameters.
//!
//! Looked up after rule matching; never part of it.

use serde::{Deserialize, Serialize};

use crate::task::TaskMode;

/// Sampling temperature and completion budget for one mode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl GenerationParams {
    pub fn for_mode(mode: TaskMode) -> Self {
        let (temperature, max_tokens) = match mode {
            TaskMode::Explain => (0.5, 1500),
            TaskMode::Solve => (0.2, 1200),
            TaskMode::Derive => (0.2, 1800),
            TaskMode::Revise => (0.4, 1200),
            TaskMode::DocChat => (0.3, 1000),
            TaskMode::Strategy => (0.6, 1500),
            TaskMode::Plan => (0.5, 2500),
        };
        Self {
            temperature,
            max_tokens,
        }
    }
}
