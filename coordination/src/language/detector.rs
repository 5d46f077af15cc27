//! Session-scoped language detection with hysteresis.
//!
//! One [`LanguageDetector`] belongs to one conversation. It remembers the
//! last language it reported so that a short or ambiguous turn cannot flip
//! the session's language on its own. Never share a detector between
//! unrelated sessions.

use serde::{Deserialize, Serialize};

use super::lexicon::is_hinglish_word;
use super::{LanguageLabel, ScriptKind};

/// Inputs shorter than this (in characters) carry too little signal to act on.
pub const MIN_CHARS: usize = 6;
/// Confidence required before `should_switch` is raised.
pub const CONFIDENCE_THRESHOLD: f64 = 0.75;
/// A disagreeing classification below this confidence keeps the previous language.
pub const HYSTERESIS_THRESHOLD: f64 = 0.65;

const SHORT_INPUT_CONFIDENCE: f64 = 0.5;

/// Raw character and word statistics for a piece of text.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScriptStats {
    pub char_count: usize,
    pub devanagari_ratio: f64,
    pub latin_ratio: f64,
    pub word_count: usize,
    pub lexicon_hits: usize,
    pub hindi_word_ratio: f64,
    pub script: ScriptKind,
}

/// Outcome of a single detection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LanguageDetectionResult {
    pub language: LanguageLabel,
    pub confidence: f64,
    /// True only for confident detections on inputs of at least [`MIN_CHARS`].
    pub should_switch: bool,
    pub script: ScriptKind,
    /// The raw classification disagreed with the session and was overridden.
    pub held_by_hysteresis: bool,
}

fn is_devanagari(c: char) -> bool {
    ('\u{0900}'..='\u{097F}').contains(&c)
}

fn is_latin_letter(c: char) -> bool {
    c.is_ascii_alphabetic() || (c.is_alphabetic() && ('\u{00C0}'..='\u{024F}').contains(&c))
}

/// Compute script ratios and lexicon hits for `text`.
pub fn analyze(text: &str) -> ScriptStats {
    let trimmed = text.trim();
    let char_count = trimmed.chars().count();

    let mut counted = 0usize;
    let mut devanagari = 0usize;
    let mut latin = 0usize;
    for c in trimmed.chars() {
        if c.is_whitespace() || c.is_ascii_punctuation() || c.is_ascii_digit() {
            continue;
        }
        counted += 1;
        if is_devanagari(c) {
            devanagari += 1;
        } else if is_latin_letter(c) {
            latin += 1;
        }
    }

    let ratio = |n: usize| {
        if counted == 0 {
            0.0
        } else {
            n as f64 / counted as f64
        }
    };

    let mut word_count = 0usize;
    let mut lexicon_hits = 0usize;
    for raw in trimmed.split_whitespace() {
        let word: String = raw
            .trim_matches(|c: char| !c.is_alphanumeric())
            .to_lowercase();
        if !word.chars().any(char::is_alphabetic) {
            continue;
        }
        word_count += 1;
        if is_hinglish_word(&word) {
            lexicon_hits += 1;
        }
    }

    let script = match (devanagari > 0, latin > 0) {
        (true, true) => ScriptKind::Mixed,
        (true, false) => ScriptKind::Devanagari,
        (false, true) => ScriptKind::Latin,
        (false, false) => ScriptKind::Other,
    };

    ScriptStats {
        char_count,
        devanagari_ratio: ratio(devanagari),
        latin_ratio: ratio(latin),
        word_count,
        lexicon_hits,
        hindi_word_ratio: if word_count == 0 {
            0.0
        } else {
            lexicon_hits as f64 / word_count as f64
        },
        script,
    }
}

/// Stateless classification: label and confidence, before hysteresis.
pub fn classify(
    stats: &ScriptStats,
    preferred: Option<LanguageLabel>,
) -> (LanguageLabel, f64) {
    if stats.char_count < MIN_CHARS {
        return (
            preferred.unwrap_or(LanguageLabel::English),
            SHORT_INPUT_CONFIDENCE,
        );
    }

    if stats.devanagari_ratio > 0.5 {
        return (LanguageLabel::Hindi, 0.95);
    }

    if stats.script == ScriptKind::Latin
        && stats.lexicon_hits >= 3
        && stats.hindi_word_ratio > 0.3
    {
        let confidence = (0.70 + 0.25 * stats.hindi_word_ratio).min(0.95);
        return (LanguageLabel::Hinglish, confidence);
    }

    if stats.script == ScriptKind::Mixed {
        return (LanguageLabel::Hinglish, 0.8);
    }

    if stats.script == ScriptKind::Latin && stats.lexicon_hits == 0 && stats.latin_ratio > 0.7 {
        return (LanguageLabel::English, 0.9);
    }

    (LanguageLabel::English, 0.6)
}

fn should_switch(stats: &ScriptStats, confidence: f64) -> bool {
    confidence >= CONFIDENCE_THRESHOLD && stats.char_count >= MIN_CHARS
}

/// Detect without any session state (used to check generated drafts).
pub fn detect_once(text: &str, preferred: Option<LanguageLabel>) -> LanguageDetectionResult {
    let stats = analyze(text);
    let (language, confidence) = classify(&stats, preferred);
    LanguageDetectionResult {
        language,
        confidence,
        should_switch: should_switch(&stats, confidence),
        script: stats.script,
        held_by_hysteresis: false,
    }
}

/// Per-session detector. Holds the last language it reported.
#[derive(Debug, Clone, Default)]
pub struct LanguageDetector {
    last_detected: Option<LanguageLabel>,
}

impl LanguageDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a known session language (e.g. restored from storage).
    pub fn with_last_detected(language: LanguageLabel) -> Self {
        Self {
            last_detected: Some(language),
        }
    }

    pub fn last_detected(&self) -> Option<LanguageLabel> {
        self.last_detected
    }

    /// Classify `text`, apply hysteresis against the session, and update it.
    pub fn detect(
        &mut self,
        text: &str,
        preferred: Option<LanguageLabel>,
    ) -> LanguageDetectionResult {
        let stats = analyze(text);
        let (raw_language, confidence) = classify(&stats, preferred);

        let (language, held) = match self.last_detected {
            Some(previous) if previous != raw_language && confidence < HYSTERESIS_THRESHOLD => {
                tracing::debug!(
                    previous = %previous,
                    candidate = %raw_language,
                    confidence,
                    "language change damped by hysteresis"
                );
                (previous, true)
            }
            _ => (raw_language, false),
        };

        self.last_detected = Some(language);

        LanguageDetectionResult {
            language,
            confidence,
            should_switch: !held && should_switch(&stats, confidence),
            script: stats.script,
            held_by_hysteresis: held,
        }
    }

    /// Forget the session language (new conversation).
    pub fn reset(&mut self) {
        self.last_detected = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn devanagari_text_is_hindi() {
        let mut d = LanguageDetector::new();
        let r = d.detect("प्रकाश संश्लेषण क्या है? समझाइए", None);
        assert_eq!(r.language, LanguageLabel::Hindi);
        assert_eq!(r.confidence, 0.95);
        assert!(r.should_switch);
    }

    #[test]
    fn plain_english_is_english() {
        let r = detect_once("Explain the laws of motion with examples", None);
        assert_eq!(r.language, LanguageLabel::English);
        assert_eq!(r.confidence, 0.9);
        assert_eq!(r.script, ScriptKind::Latin);
    }

    #[test]
    fn romanized_hindi_is_hinglish() {
        let r = detect_once("newton ka second law kya hai samjhao", None);
        assert_eq!(r.language, LanguageLabel::Hinglish);
        assert!(r.confidence >= 0.70 && r.confidence <= 0.95);
    }

    #[test]
    fn mixed_script_is_hinglish() {
        // One Devanagari word among Latin words keeps the ratio below 0.5.
        let r = detect_once("photosynthesis process ko explain करो please", None);
        assert_eq!(r.script, ScriptKind::Mixed);
        assert_eq!(r.language, LanguageLabel::Hinglish);
        assert_eq!(r.confidence, 0.8);
    }

    #[test]
    fn short_input_uses_preferred_language() {
        let r = detect_once("ok", Some(LanguageLabel::Hindi));
        assert_eq!(r.language, LanguageLabel::Hindi);
        assert_eq!(r.confidence, 0.5);
        assert!(!r.should_switch);

        let r = detect_once("ok", None);
        assert_eq!(r.language, LanguageLabel::English);
    }

    #[test]
    fn hysteresis_keeps_previous_language_on_weak_disagreement() {
        let mut d = LanguageDetector::new();
        d.detect("प्रकाश संश्लेषण क्या है? समझाइए", None);
        assert_eq!(d.last_detected(), Some(LanguageLabel::Hindi));

        // "hmm" is short: English at 0.5, below the hysteresis threshold.
        let r = d.detect("hmm", None);
        assert_eq!(r.language, LanguageLabel::Hindi);
        assert!(r.held_by_hysteresis);
        assert!(!r.should_switch);
        assert_eq!(d.last_detected(), Some(LanguageLabel::Hindi));
    }

    #[test]
    fn confident_disagreement_switches() {
        let mut d = LanguageDetector::with_last_detected(LanguageLabel::Hindi);
        let r = d.detect("Explain the laws of motion with examples", None);
        assert_eq!(r.language, LanguageLabel::English);
        assert!(!r.held_by_hysteresis);
        assert_eq!(d.last_detected(), Some(LanguageLabel::English));
    }

    #[test]
    fn reset_clears_session() {
        let mut d = LanguageDetector::with_last_detected(LanguageLabel::Hinglish);
        d.reset();
        assert_eq!(d.last_detected(), None);
        let r = d.detect("hmm", None);
        assert_eq!(r.language, LanguageLabel::English);
        assert!(!r.held_by_hysteresis);
    }

    #[test]
    fn digits_only_is_other_script() {
        let stats = analyze("12345 + 678");
        assert_eq!(stats.script, ScriptKind::Other);
        let (label, confidence) = classify(&stats, None);
        assert_eq!(label, LanguageLabel::English);
        assert_eq!(confidence, 0.6);
    }
}
