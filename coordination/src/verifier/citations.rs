//! Citation grammar for grounding evidence.
//!
//! ```text
//! NCERT:<doc_id>:<section>          doc_id  [A-Za-z0-9_-]+
//!                                   section [A-Za-z0-9._-]+ (never ends in '.')
//! PYQ:<EXAM>:<YYYY>:<SLOT>:<qid>    SLOT ∈ {JAN, APR, MAY, JUN, SEP, OCT}, qid numeric
//! ```
//!
//! A section never absorbs a sentence-ending period, so
//! `"... food [NCERT:sci10:6.2]."` and `"... food NCERT:sci10:6.2."` both
//! yield `NCERT:sci10:6.2`. Digits are ASCII only.

use std::sync::LazyLock;

use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Exam slots accepted in PYQ citations.
pub const PYQ_SLOTS: &[&str] = &["JAN", "APR", "MAY", "JUN", "SEP", "OCT"];

const NCERT_BODY: &str = r"NCERT:([A-Za-z0-9_-]+):([A-Za-z0-9._-]*[A-Za-z0-9_-])";
const PYQ_BODY: &str = r"PYQ:([A-Za-z0-9_-]+):([0-9]{4}):(JAN|APR|MAY|JUN|SEP|OCT):([0-9]+)";

pub(crate) static CITATION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(?:NCERT:[A-Za-z0-9_-]+:[A-Za-z0-9._-]*[A-Za-z0-9_-]|PYQ:[A-Za-z0-9_-]+:[0-9]{4}:(?:JAN|APR|MAY|JUN|SEP|OCT):[0-9]+\b)",
    )
    .expect("CITATION_PATTERN regex should compile")
});

static NCERT_EXACT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!("^{NCERT_BODY}$")).expect("NCERT_EXACT regex should compile")
});

static PYQ_EXACT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!("^{PYQ_BODY}$")).expect("PYQ_EXACT regex should compile")
});

/// Parsed citation token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Citation {
    Ncert {
        doc_id: String,
        section: String,
    },
    Pyq {
        exam: String,
        year: u16,
        slot: String,
        qid: u64,
    },
}

impl Citation {
    /// Parse a complete token; anything else returns `None`.
    pub fn parse(token: &str) -> Option<Self> {
        if let Some(caps) = NCERT_EXACT.captures(token) {
            return Some(Self::Ncert {
                doc_id: caps[1].to_string(),
                section: caps[2].to_string(),
            });
        }
        let caps = PYQ_EXACT.captures(token)?;
        Some(Self::Pyq {
            exam: caps[1].to_string(),
            year: caps[2].parse().ok()?,
            slot: caps[3].to_string(),
            qid: caps[4].parse().ok()?,
        })
    }

    pub fn source_type(&self) -> &'static str {
        match self {
            Self::Ncert { .. } => "ncert",
            Self::Pyq { .. } => "pyq",
        }
    }
}

impl std::fmt::Display for Citation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ncert { doc_id, section } => write!(f, "NCERT:{doc_id}:{section}"),
            Self::Pyq {
                exam,
                year,
                slot,
                qid,
            } => write!(f, "PYQ:{exam}:{year:04}:{slot}:{qid}"),
        }
    }
}

/// All citation tokens in `text`, deduplicated, in first-appearance order.
pub fn extract_citations(text: &str) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    CITATION_PATTERN
        .find_iter(text)
        .map(|m| m.as_str())
        .filter(|c| seen.insert(*c))
        .map(str::to_string)
        .collect()
}

pub fn contains_citation(text: &str) -> bool {
    CITATION_PATTERN.is_match(text)
}

/// Whether `text` opens with a citation, ignoring whitespace and brackets.
pub fn starts_with_citation(text: &str) -> bool {
    let trimmed = text.trim_start_matches(|c: char| c.is_whitespace() || c == '[' || c == '(');
    CITATION_PATTERN
        .find(trimmed)
        .is_some_and(|m| m.start() == 0)
}

/// `text` with every citation token removed.
pub fn strip_citations(text: &str) -> String {
    CITATION_PATTERN.replace_all(text, " ").into_owned()
}

pub fn is_valid_citation(token: &str) -> bool {
    Citation::parse(token).is_some()
}
