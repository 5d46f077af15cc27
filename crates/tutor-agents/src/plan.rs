//! Best-effort study plan extraction from a plan-mode draft.
//!
//! Recognized layout:
//!
//! ```text
//! # Title                      (optional)
//! Phase 1: Foundations         (or a markdown heading)
//! - Kinematics                 (bullets or numbered items become topics)
//! - Laws of motion
//! ```
//!
//! Text that yields no phases falls back to one phase named after the subject.

use std::sync::LazyLock;

use regex::Regex;

use crate::contracts::PlanPhase;

static PHASE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:#{1,6}\s*)?(?:\*\*)?(phase|week|stage)\s+\d+\s*[:.\-)]?\s*(.*?)(?:\*\*)?\s*$")
        .expect("phase regex should compile")
});

static HEADING_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(#{1,6})\s+(.+?)\s*#*\s*$").expect("heading regex should compile")
});

static BULLET_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:[-*•]|\d+[.)])\s+(.+?)\s*$").expect("bullet regex should compile")
});

/// Parsed plan structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPlan {
    pub title: String,
    pub phases: Vec<PlanPhase>,
}

pub fn parse_plan(text: &str, subject: &str) -> ParsedPlan {
    let mut title: Option<String> = None;
    let mut phases: Vec<PlanPhase> = Vec::new();
    let mut loose_topics: Vec<String> = Vec::new();

    for line in text.lines() {
        if let Some(caps) = PHASE_LINE.captures(line) {
            let kind = capitalize(&caps[1]);
            let name = caps[2].trim();
            let number = phases.len() + 1;
            let title = if name.is_empty() {
                format!("{kind} {number}")
            } else {
                name.to_string()
            };
            phases.push(PlanPhase {
                title,
                topics: Vec::new(),
            });
            continue;
        }
        if let Some(caps) = HEADING_LINE.captures(line) {
            let text = caps[2].trim().to_string();
            // A lone top-level heading before any phase is the plan title.
            if caps[1].len() == 1 && title.is_none() && phases.is_empty() {
                title = Some(text);
            } else {
                phases.push(PlanPhase {
                    title: text,
                    topics: Vec::new(),
                });
            }
            continue;
        }
        if let Some(caps) = BULLET_LINE.captures(line) {
            let topic = caps[1].trim().to_string();
            match phases.last_mut() {
                Some(phase) => phase.topics.push(topic),
                None => loose_topics.push(topic),
            }
        }
    }

    if phases.is_empty() {
        phases.push(PlanPhase {
            title: format!("{} study plan", capitalize(subject.trim())),
            topics: loose_topics,
        });
    }

    ParsedPlan {
        title: title.unwrap_or_else(|| format!("{} study plan", capitalize(subject.trim()))),
        phases,
    }
}

fn capitalize(s: &str) -> String {
    let lower = s.to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
