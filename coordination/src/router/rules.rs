//! The ordered routing table.
//!
//! Each rule is a pure predicate over the task plus a priority-ordered
//! model list. Rules are evaluated top to bottom; the first match wins.

use super::models::ModelId;
use crate::task::{Task, TaskMode};

/// Identifier reported when no rule matches.
pub const DEFAULT_RULE_ID: &str = "default";

/// Models used when no rule matches.
pub const DEFAULT_MODELS: &[ModelId] = &[
    ModelId::StructuredReasoner,
    ModelId::Fast,
    ModelId::CarefulReasoner,
];

/// One row of the routing table.
#[derive(Debug, Clone)]
pub struct RoutingRule {
    pub id: &'static str,
    pub predicate: fn(&Task) -> bool,
    /// Primary model first, then fallbacks in order.
    pub models: Vec<ModelId>,
    pub rationale: &'static str,
}

impl RoutingRule {
    pub fn matches(&self, task: &Task) -> bool {
        (self.predicate)(task)
    }
}

fn is_numeric_or_derivation(task: &Task) -> bool {
    task.mode.is_numeric() || task.signals.numeric_heavy
}

fn is_safety_sensitive_science(task: &Task) -> bool {
    if task.signals.safety_critical {
        return true;
    }
    let subject = task.subject.trim().to_ascii_lowercase();
    task.mode == TaskMode::Explain && matches!(subject.as_str(), "biology" | "chemistry")
}

fn is_document_chat(task: &Task) -> bool {
    task.mode == TaskMode::DocChat
}

fn is_planning(task: &Task) -> bool {
    matches!(task.mode, TaskMode::Plan | TaskMode::Strategy)
}

/// The built-in routing table.
pub fn default_rules() -> Vec<RoutingRule> {
    vec![
        RoutingRule {
            id: "numeric_derivation",
            predicate: is_numeric_or_derivation,
            models: vec![
                ModelId::MathSpecialist,
                ModelId::CarefulReasoner,
                ModelId::StructuredReasoner,
            ],
            rationale: "numeric or derivation work goes to the math specialist first",
        },
        RoutingRule {
            id: "safety_sensitive_science",
            predicate: is_safety_sensitive_science,
            models: vec![
                ModelId::CarefulReasoner,
                ModelId::StructuredReasoner,
                ModelId::Fast,
            ],
            rationale: "safety-sensitive science explanations need the careful reasoner",
        },
        RoutingRule {
            id: "document_chat",
            predicate: is_document_chat,
            models: vec![
                ModelId::Fast,
                ModelId::StructuredReasoner,
                ModelId::CarefulReasoner,
            ],
            rationale: "document chat is retrieval-bound; fastest model first",
        },
        RoutingRule {
            id: "structured_planning",
            predicate: is_planning,
            models: vec![
                ModelId::StructuredReasoner,
                ModelId::CarefulReasoner,
                ModelId::Fast,
            ],
            rationale: "plans and strategies need structured multi-step output",
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskSignals;

    fn task(mode: TaskMode, subject: &str) -> Task {
        Task::new("q", mode, subject, "CBSE", 10)
    }

    #[test]
    fn numeric_rule_matches_solve_and_signal() {
        assert!(is_numeric_or_derivation(&task(TaskMode::Solve, "physics")));
        assert!(is_numeric_or_derivation(&task(TaskMode::Derive, "physics")));
        let signalled = task(TaskMode::Explain, "physics").with_signals(TaskSignals {
            numeric_heavy: true,
            safety_critical: false,
        });
        assert!(is_numeric_or_derivation(&signalled));
        assert!(!is_numeric_or_derivation(&task(TaskMode::Explain, "physics")));
    }

    #[test]
    fn safety_rule_matches_bio_chem_explanations() {
        assert!(is_safety_sensitive_science(&task(TaskMode::Explain, "Biology")));
        assert!(is_safety_sensitive_science(&task(TaskMode::Explain, "chemistry")));
        assert!(!is_safety_sensitive_science(&task(TaskMode::Revise, "chemistry")));
        assert!(!is_safety_sensitive_science(&task(TaskMode::Explain, "history")));
    }

    #[test]
    fn planning_rule_covers_plan_and_strategy() {
        assert!(is_planning(&task(TaskMode::Plan, "physics")));
        assert!(is_planning(&task(TaskMode::Strategy, "physics")));
        assert!(!is_planning(&task(TaskMode::DocChat, "physics")));
    }

    #[test]
    fn rule_ids_are_unique() {
        let rules = default_rules();
        let mut ids: Vec<_> = rules.iter().map(|r| r.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), rules.len());
        assert!(!ids.contains(&DEFAULT_RULE_ID));
    }
}
