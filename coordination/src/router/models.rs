//! Model identities and their provider-facing names.

use std::collections::HashMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Logical model roles the routing table refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ModelId {
    /// Math-specialized model for numeric and derivation work
    MathSpecialist,
    /// Careful, conservative reasoner for safety-sensitive pedagogy
    CarefulReasoner,
    /// General structured reasoner; default primary
    StructuredReasoner,
    /// Fastest / cheapest model
    Fast,
}

impl ModelId {
    pub const ALL: [ModelId; 4] = [
        Self::MathSpecialist,
        Self::CarefulReasoner,
        Self::StructuredReasoner,
        Self::Fast,
    ];

    /// Built-in provider model name.
    pub fn default_name(&self) -> &'static str {
        match self {
            Self::MathSpecialist => "qwen2.5-math-72b-instruct",
            Self::CarefulReasoner => "claude-3-5-sonnet",
            Self::StructuredReasoner => "gpt-4o",
            Self::Fast => "gpt-4o-mini",
        }
    }

    /// Suffix used for `TUTOR_MODEL_<ID>` overrides.
    pub fn env_suffix(&self) -> &'static str {
        match self {
            Self::MathSpecialist => "MATH_SPECIALIST",
            Self::CarefulReasoner => "CAREFUL_REASONER",
            Self::StructuredReasoner => "STRUCTURED_REASONER",
            Self::Fast => "FAST",
        }
    }
}

impl std::fmt::Display for ModelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MathSpecialist => write!(f, "math_specialist"),
            Self::CarefulReasoner => write!(f, "careful_reasoner"),
            Self::StructuredReasoner => write!(f, "structured_reasoner"),
            Self::Fast => write!(f, "fast"),
        }
    }
}

/// Maps logical model ids to deployed model names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelCatalog {
    #[serde(default)]
    overrides: HashMap<ModelId, String>,
}

impl ModelCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_override(mut self, id: ModelId, name: impl Into<String>) -> Self {
        self.set(id, name);
        self
    }

    pub fn set(&mut self, id: ModelId, name: impl Into<String>) {
        self.overrides.insert(id, name.into());
    }

    pub fn name(&self, id: ModelId) -> &str {
        self.overrides
            .get(&id)
            .map(String::as_str)
            .unwrap_or_else(|| id.default_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_falls_back_to_default_names() {
        let catalog = ModelCatalog::new().with_override(ModelId::Fast, "local-8b");
        assert_eq!(catalog.name(ModelId::Fast), "local-8b");
        assert_eq!(catalog.name(ModelId::StructuredReasoner), "gpt-4o");
    }
}
