//! Model Router Module
//!
//! Maps task signals to a primary model plus an ordered fallback list.
//! Pure and stateless: one `Router` is shared by every concurrent request.
//!
//! # Routing Table
//!
//! ```text
//! Rule                      | Primary             | Fallbacks
//! --------------------------|---------------------|-------------------------------
//! numeric_derivation        | math specialist     | careful → structured
//! safety_sensitive_science  | careful reasoner    | structured → fast
//! document_chat             | fast                | structured → careful
//! structured_planning       | structured reasoner | careful → fast
//! default                   | structured reasoner | fast → careful
//! ```
//!
//! Temperature and token budget come from [`GenerationParams::for_mode`].

pub mod models;
pub mod params;
pub mod rules;

pub use models::{ModelCatalog, ModelId};
pub use params::GenerationParams;
pub use rules::{default_rules, RoutingRule, DEFAULT_MODELS, DEFAULT_RULE_ID};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::task::Task;

/// Model used for `switch_model_and_tighten` once the fallback list is spent.
pub const STRICT_FALLBACK_MODEL: ModelId = ModelId::CarefulReasoner;

/// Routing result for one task. Immutable once computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RouterDecision {
    pub selected_model: String,
    pub fallback_models: Vec<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub rationale: String,
    pub matched_rule: String,
}

/// Deterministic first-match router over a rule table.
#[derive(Debug, Clone)]
pub struct Router {
    rules: Vec<RoutingRule>,
    catalog: ModelCatalog,
}

impl Router {
    /// Router with the built-in table and default model names.
    pub fn new() -> Self {
        Self::with_catalog(ModelCatalog::default())
    }

    pub fn with_catalog(catalog: ModelCatalog) -> Self {
        Self {
            rules: default_rules(),
            catalog,
        }
    }

    /// Router with a custom rule table.
    pub fn with_rules(rules: Vec<RoutingRule>, catalog: ModelCatalog) -> Self {
        Self { rules, catalog }
    }

    pub fn rules(&self) -> &[RoutingRule] {
        &self.rules
    }

    pub fn catalog(&self) -> &ModelCatalog {
        &self.catalog
    }

    /// Evaluate rules top to bottom; the first match wins.
    pub fn route(&self, task: &Task) -> RouterDecision {
        let params = GenerationParams::for_mode(task.mode);

        let (rule_id, models, rationale) = match self.rules.iter().find(|r| r.matches(task)) {
            Some(rule) => (rule.id, rule.models.as_slice(), rule.rationale),
            None => (
                DEFAULT_RULE_ID,
                DEFAULT_MODELS,
                "no rule matched; default model chain",
            ),
        };

        let mut names = models.iter().map(|id| self.catalog.name(*id).to_string());
        let selected_model = names
            .next()
            .unwrap_or_else(|| self.catalog.name(DEFAULT_MODELS[0]).to_string());
        let fallback_models: Vec<String> = names.collect();

        tracing::debug!(
            rule = rule_id,
            model = %selected_model,
            fallbacks = fallback_models.len(),
            mode = %task.mode,
            "routed task"
        );

        RouterDecision {
            selected_model,
            fallback_models,
            temperature: params.temperature,
            max_tokens: params.max_tokens,
            rationale: rationale.to_string(),
            matched_rule: rule_id.to_string(),
        }
    }

    /// Fallback for regeneration attempt `attempt_number` (1-based), if any.
    pub fn next_fallback<'a>(
        &self,
        decision: &'a RouterDecision,
        attempt_number: u32,
    ) -> Option<&'a str> {
        let index = attempt_number.checked_sub(1)? as usize;
        decision.fallback_models.get(index).map(String::as_str)
    }

    /// Deployed name of the strict fallback model.
    pub fn strict_fallback_model(&self) -> &str {
        self.catalog.name(STRICT_FALLBACK_MODEL)
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}
