//! Integration tests for session language tracking and routing

use coordination::language::detect_once;
use coordination::router::{ModelCatalog, ModelId};
use coordination::{LanguageDetector, LanguageLabel, Router, Task, TaskMode, TaskSignals};

/// Test: a Devanagari-heavy message is Hindi at 0.95 regardless of session
#[test]
fn test_devanagari_is_always_hindi() {
    let samples = [
        "न्यूटन का दूसरा नियम समझाइए",
        "ऊर्जा संरक्षण का सिद्धांत क्या है?",
        "कृपया प्रकाश संश्लेषण की प्रक्रिया बताइए",
    ];
    for text in samples {
        for prior in [None, Some(LanguageLabel::English), Some(LanguageLabel::Hinglish)] {
            let mut detector =
                prior.map_or_else(LanguageDetector::new, LanguageDetector::with_last_detected);
            let r = detector.detect(text, None);
            assert_eq!(r.language, LanguageLabel::Hindi, "{text}");
            assert_eq!(r.confidence, 0.95);
        }
    }
}

/// Test: a conversation keeps its language through short replies
#[test]
fn test_conversation_language_is_sticky() {
    let mut detector = LanguageDetector::new();

    let first = detector.detect("newton ka second law kya hai samjhao", None);
    assert_eq!(first.language, LanguageLabel::Hinglish);

    for reply in ["ok", "hmm", "acha"] {
        let r = detector.detect(reply, None);
        assert_eq!(r.language, LanguageLabel::Hinglish, "reply {reply:?}");
        assert!(!r.should_switch);
    }

    let r = detector.detect("Please explain the third law of motion in detail", None);
    assert_eq!(r.language, LanguageLabel::English);
    assert!(r.should_switch);
}

/// Test: two sessions never share language state
#[test]
fn test_sessions_are_independent() {
    let mut hindi = LanguageDetector::new();
    let mut english = LanguageDetector::new();
    hindi.detect("प्रकाश संश्लेषण क्या है? समझाइए", None);
    english.detect("What is photosynthesis and why does it matter", None);

    assert_eq!(hindi.detect("ok", None).language, LanguageLabel::Hindi);
    assert_eq!(english.detect("ok", None).language, LanguageLabel::English);
    assert_eq!(detect_once("ok", None).language, LanguageLabel::English);
}

/// Test: every mode routes to a model with a non-empty fallback chain
#[test]
fn test_every_mode_routes_with_fallbacks() {
    let router = Router::new();
    for mode in TaskMode::ALL {
        let task = Task::new("question", mode, "biology", "CBSE", 10);
        let d = router.route(&task);
        assert!(!d.selected_model.is_empty());
        assert_eq!(d.fallback_models.len(), 2, "{mode}");
        assert!(!d.fallback_models.contains(&d.selected_model));
    }
}

/// Test: safety-critical science goes to the careful reasoner
#[test]
fn test_safety_critical_science_route() {
    let catalog = ModelCatalog::new().with_override(ModelId::CarefulReasoner, "careful-local");
    let router = Router::with_catalog(catalog);
    let task = Task::new(
        "Is mixing bleach and ammonia safe?",
        TaskMode::Explain,
        "physics",
        "CBSE",
        10,
    )
    .with_signals(TaskSignals {
        numeric_heavy: false,
        safety_critical: true,
    });

    let d = router.route(&task);
    assert_eq!(d.matched_rule, "safety_sensitive_science");
    assert_eq!(d.selected_model, "careful-local");
    assert_eq!(
        router.next_fallback(&d, 1),
        Some(ModelId::StructuredReasoner.default_name())
    );
}
