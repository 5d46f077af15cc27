//! Language gate: right language, no leaked reasoning, English formulas.
//!
//! ```text
//! check                      penalty
//! language mismatch          0.4
//! chain-of-thought leakage   0.4
//! non-English formula        0.2
//! ```
//!
//! A draft detected as Hinglish satisfies any target. Script alone decides
//! nothing: Hindi answers routinely carry Latin formulas and units, and are
//! still detected as Hindi.

use serde_json::json;

use super::report::{GateIssue, GateKind, GateResult};
use crate::language::{detect_once, LanguageLabel};

const MISMATCH_PENALTY: f64 = 0.4;
const LEAKAGE_PENALTY: f64 = 0.4;
const FORMULA_PENALTY: f64 = 0.2;

/// Phrases that expose internal reasoning. Matched case-insensitively.
pub const COT_MARKERS: &[&str] = &[
    "let me think",
    "let's think",
    "step 1:",
    "first, i will",
    "thinking:",
    "my reasoning",
    "i need to figure out",
    "<think>",
    "chain of thought",
    "internal reasoning",
    "let me work through",
    "wait, actually",
];

/// Romanized Hindi quantity names that must not appear in formulas.
pub const FORMULA_BLOCKLIST: &[&str] = &[
    "gati", "veg", "doori", "duri", "samay", "bal", "dravyaman", "tvaran", "urja", "shakti",
    "karya", "dabav", "ghanatva", "sankhya", "dooriyan", "pratirodh", "dhara", "vibhav",
];

/// Reasoning markers present in `text`, in table order.
pub fn find_reasoning_markers(text: &str) -> Vec<&'static str> {
    let lower = text.to_lowercase();
    COT_MARKERS
        .iter()
        .copied()
        .filter(|m| lower.contains(m))
        .collect()
}

/// Whether a formula uses only English symbols and names.
pub fn is_english_formula(formula: &str) -> bool {
    if formula.chars().any(|c| ('\u{0900}'..='\u{097F}').contains(&c)) {
        return false;
    }
    !formula
        .split(|c: char| !c.is_alphanumeric())
        .any(|w| FORMULA_BLOCKLIST.contains(&w.to_lowercase().as_str()))
}

pub fn run(text: &str, formulas: &[String], target: LanguageLabel) -> GateResult {
    let detection = detect_once(text, Some(target));
    let language_ok =
        detection.language == target || detection.language == LanguageLabel::Hinglish;
    let markers = find_reasoning_markers(text);
    let non_english: Vec<&str> = formulas
        .iter()
        .map(String::as_str)
        .filter(|f| !is_english_formula(f))
        .collect();

    let mut issues = Vec::new();
    let mut score = 1.0;
    if !language_ok {
        score -= MISMATCH_PENALTY;
        issues.push(GateIssue::LanguageMismatch {
            expected: target.to_string(),
            detected: detection.language.to_string(),
        });
    }
    if !markers.is_empty() {
        score -= LEAKAGE_PENALTY;
        issues.push(GateIssue::ReasoningLeak {
            markers: markers.iter().map(|m| m.to_string()).collect(),
        });
    }
    if !non_english.is_empty() {
        score -= FORMULA_PENALTY;
        issues.push(GateIssue::NonEnglishFormula {
            count: non_english.len(),
        });
    }

    let details = json!({
        "target": target,
        "detected": detection.language,
        "detected_confidence": detection.confidence,
        "script": detection.script,
        "cot_markers": markers,
        "non_english_formulas": non_english,
    });

    GateResult::new(GateKind::Language, f64::max(score, 0.0), details, issues)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_english_passes() {
        let r = run(
            "Photosynthesis is how green plants make their food from sunlight.",
            &[],
            LanguageLabel::English,
        );
        assert!(r.passed);
        assert_eq!(r.score, 1.0);
    }

    #[test]
    fn english_draft_for_hindi_target_fails() {
        let r = run(
            "Photosynthesis is how green plants make their food from sunlight.",
            &[],
            LanguageLabel::Hindi,
        );
        assert!(!r.passed);
        assert!((r.score - 0.6).abs() < 1e-9);
    }

    #[test]
    fn hindi_draft_with_latin_formula_passes() {
        let r = run(
            "वेग का सूत्र v = u + at है।",
            &["v = u + at".to_string()],
            LanguageLabel::Hindi,
        );
        assert!(r.passed, "{:?}", r.errors);
    }

    #[test]
    fn hindi_draft_with_latin_formula_fails_english_target() {
        let text = "न्यूटन का दूसरा नियम कहता है कि बल द्रव्यमान और त्वरण का गुणनफल होता है \
                    [NCERT:phy9:9.3]. सूत्र है:\nF = m * a";
        let r = run(text, &["F = m * a".to_string()], LanguageLabel::English);
        assert!(!r.passed);
        assert_eq!(r.details["detected"], "hindi");
        assert!(matches!(r.issues[0], GateIssue::LanguageMismatch { .. }));
    }

    #[test]
    fn reasoning_leak_is_detected() {
        let r = run(
            "Let me think about this. Force equals mass times acceleration.",
            &[],
            LanguageLabel::English,
        );
        assert!(!r.passed);
        assert!(matches!(r.issues[0], GateIssue::ReasoningLeak { .. }));
    }

    #[test]
    fn hindi_formula_names_are_rejected() {
        assert!(!is_english_formula("gati = doori / samay"));
        assert!(!is_english_formula("बल = m × a"));
        assert!(is_english_formula("F = m * a"));
    }

    #[test]
    fn all_penalties_floor_at_zero_or_above() {
        let r = run(
            "Let me think. gati = doori / samay",
            &["gati = doori / samay".to_string()],
            LanguageLabel::Hindi,
        );
        assert_eq!(r.issues.len(), 3);
        assert!((r.score - 0.0).abs() < 1e-9);
    }
}
