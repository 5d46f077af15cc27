//! Fact gate: every factual claim must carry an evidence citation.
//!
//! A sentence is a factual claim when, with citations removed, it is at
//! least [`CLAIM_MIN_CHARS`] long, is not a question or a heading, and
//! contains an assertion keyword. A claim counts as cited when the sentence
//! itself contains a citation or the next sentence opens with one
//! (`"... in chloroplasts. [NCERT:bio10:6.2]"`).

use serde_json::json;

use super::citations::{contains_citation, extract_citations, starts_with_citation, strip_citations};
use super::report::{GateIssue, GateKind, GateResult};

pub const CLAIM_MIN_CHARS: usize = 30;

pub const CLAIM_KEYWORDS: &[&str] = &[
    "is", "are", "was", "were", "has", "have", "contains", "consists", "causes", "produces",
    "defined", "called", "known", "discovered", "states", "equals", "occurs", "found", "made",
];

const MULTI_CITATION_BONUS: f64 = 0.1;

/// Split into sentences after `.`, `!`, `?` followed by whitespace, and at newlines.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        let end = match c {
            '\n' => Some(i),
            '.' | '!' | '?' => match chars.peek() {
                Some((_, next)) if next.is_whitespace() => Some(i + c.len_utf8()),
                None => Some(i + c.len_utf8()),
                _ => None,
            },
            _ => None,
        };
        if let Some(end) = end {
            let segment = text[start..end].trim();
            if !segment.is_empty() {
                out.push(segment);
            }
            start = if c == '\n' { i + 1 } else { end };
        }
    }

    let tail = text[start..].trim();
    if !tail.is_empty() {
        out.push(tail);
    }
    out
}

/// Whether a sentence asserts something checkable.
pub fn is_factual_claim(sentence: &str) -> bool {
    let body = strip_citations(sentence);
    let body = body.trim();
    if body.starts_with('#') || body.ends_with('?') {
        return false;
    }
    let stripped = body.trim_end_matches(|c: char| c.is_ascii_punctuation() || c.is_whitespace());
    if stripped.chars().count() < CLAIM_MIN_CHARS {
        return false;
    }
    body.split(|c: char| !c.is_alphanumeric())
        .any(|w| CLAIM_KEYWORDS.contains(&w.to_lowercase().as_str()))
}

/// A claim and whether it is backed by a citation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimCheck {
    pub sentence: String,
    pub cited: bool,
}

pub fn check_claims(text: &str) -> Vec<ClaimCheck> {
    let sentences = split_sentences(text);
    sentences
        .iter()
        .enumerate()
        .filter(|(_, s)| is_factual_claim(s))
        .map(|(i, s)| ClaimCheck {
            sentence: s.to_string(),
            cited: contains_citation(s)
                || sentences
                    .get(i + 1)
                    .is_some_and(|next| starts_with_citation(next)),
        })
        .collect()
}

pub fn run(text: &str) -> GateResult {
    let citations = extract_citations(text);
    let claims = check_claims(text);
    let cited = claims.iter().filter(|c| c.cited).count();
    let uncited: Vec<&str> = claims
        .iter()
        .filter(|c| !c.cited)
        .map(|c| c.sentence.as_str())
        .collect();

    let mut score = if claims.is_empty() {
        if citations.is_empty() {
            0.0
        } else {
            1.0
        }
    } else {
        cited as f64 / claims.len() as f64
    };
    if citations.len() >= 2 {
        score = (score + MULTI_CITATION_BONUS).min(1.0);
    }

    let mut issues = Vec::new();
    if citations.is_empty() {
        issues.push(GateIssue::NoCitations);
    }
    if !uncited.is_empty() {
        issues.push(GateIssue::UncitedClaims {
            count: uncited.len(),
        });
    }

    let details = json!({
        "citations": citations,
        "claims": claims.len(),
        "cited_claims": cited,
        "uncited_claims": uncited,
    });

    GateResult::new(GateKind::Fact, score, details, issues)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_terminators_and_newlines() {
        let s = split_sentences("One is here. Two? Three!\nFour 3.5 units");
        assert_eq!(s, vec!["One is here.", "Two?", "Three!", "Four 3.5 units"]);
    }

    #[test]
    fn short_sentence_is_not_a_claim() {
        assert!(!is_factual_claim("Water is wet."));
    }

    #[test]
    fn questions_and_headings_are_not_claims() {
        assert!(!is_factual_claim(
            "Is photosynthesis the process that plants use to make food?"
        ));
        assert!(!is_factual_claim("# Photosynthesis is the topic of this chapter"));
    }

    #[test]
    fn keyword_sentence_is_a_claim() {
        assert!(is_factual_claim(
            "Photosynthesis is the process by which green plants make food."
        ));
    }

    #[test]
    fn citation_in_next_sentence_counts() {
        let claims = check_claims(
            "Chlorophyll is found in the chloroplasts of leaf cells. [NCERT:bio10:6.2]",
        );
        assert_eq!(claims.len(), 1);
        assert!(claims[0].cited);
    }

    #[test]
    fn uncited_claim_fails_gate() {
        let r = run("Mitochondria are known as the powerhouse of the cell in biology. \
                     Ribosomes are the site of protein synthesis [NCERT:bio9:5.2].");
        assert!(!r.passed);
        assert_eq!(r.score, 0.5);
        assert_eq!(r.issues, vec![GateIssue::UncitedClaims { count: 1 }]);
    }

    #[test]
    fn no_citations_and_no_claims_scores_zero() {
        let r = run("Hello there.");
        assert!(!r.passed);
        assert_eq!(r.score, 0.0);
        assert_eq!(r.issues, vec![GateIssue::NoCitations]);
    }

    #[test]
    fn two_citations_earn_bonus_capped_at_one() {
        let r = run("Photosynthesis is the process by which plants make food [NCERT:bio10:6.1]. \
                     Chlorophyll is the green pigment found in leaves [NCERT:bio10:6.2].");
        assert!(r.passed);
        assert_eq!(r.score, 1.0);
    }
}
