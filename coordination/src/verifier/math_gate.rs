//! Math gate: unit consistency and significant-figure sanity.
//!
//! Only enabled for numeric modes (`solve`, `derive`). Two checks, each
//! costing 0.5 of the score when it fails:
//!
//! - Units: a draft that mixes units of one family (`km/h` with `m/s`,
//!   `g`/`mg` with `kg`) must show a conversion hint.
//! - Precision: the final answer may carry at most one decimal place more
//!   than the most precise input value.
//!
//! The final answer is the last number on the right-hand side of the last
//! formula that contains a number, or the last number in the text. A
//! right-hand side ends at a sentence break, a comma, a newline, or a
//! connective such as `and` / `where`.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::json;

use super::citations::strip_citations;
use super::report::{GateIssue, GateKind, GateResult};

const CHECK_PENALTY: f64 = 0.5;

static FORMULA_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)\b([\p{L}][\p{L}\p{M}0-9_]*(?:\([^()\n]*\))?)[ \t]*=[ \t]*([^=\n]+?)(?:\.\s|,\s|;|\n|$|\s+(?:and|so|where|when|then|with|gives|if)\b)",
    )
    .expect("FORMULA_PATTERN regex should compile")
});

static NUMBER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[0-9]+(?:\.[0-9]+)?\b").expect("NUMBER_PATTERN regex should compile")
});

static UNIT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[0-9]\s*(km/h|kmph|m/s|kg|mg|g)\b").expect("UNIT_PATTERN regex should compile")
});

/// Units of one physical quantity that must not be mixed unconverted.
struct UnitFamily {
    name: &'static str,
    left: &'static [&'static str],
    right: &'static [&'static str],
    conversion_hints: &'static [&'static str],
}

const UNIT_FAMILIES: &[UnitFamily] = &[
    UnitFamily {
        name: "speed",
        left: &["km/h", "kmph"],
        right: &["m/s"],
        conversion_hints: &["convert", "conversion", "5/18", "18/5", "1000"],
    },
    UnitFamily {
        name: "mass",
        left: &["g", "mg"],
        right: &["kg"],
        conversion_hints: &["convert", "conversion", "1000"],
    },
];

/// `lhs = rhs` formulas in order of appearance, trimmed.
pub fn extract_formulas(text: &str) -> Vec<String> {
    formula_spans(text)
        .map(|(lhs, rhs, _)| format!("{lhs} = {rhs}"))
        .collect()
}

/// (lhs, rhs, rhs byte offset) for each formula.
fn formula_spans(text: &str) -> impl Iterator<Item = (&str, &str, usize)> {
    FORMULA_PATTERN.captures_iter(text).filter_map(|caps| {
        let lhs = caps.get(1)?;
        let rhs = caps.get(2)?;
        let trimmed = rhs.as_str().trim_end_matches(['.', ',', ' ', '\t']);
        let trimmed_start = trimmed.len() - trimmed.trim_start().len();
        let value = trimmed.trim();
        if value.is_empty() {
            return None;
        }
        Some((lhs.as_str(), value, rhs.start() + trimmed_start))
    })
}

fn decimal_places(number: &str) -> usize {
    number.split_once('.').map_or(0, |(_, frac)| frac.len())
}

/// Unit families mixed without any conversion hint in the text.
pub fn unconverted_unit_families(text: &str) -> Vec<&'static str> {
    let units: Vec<&str> = UNIT_PATTERN
        .captures_iter(text)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect();
    let lower = text.to_lowercase();

    UNIT_FAMILIES
        .iter()
        .filter(|family| {
            let mixed = units.iter().any(|u| family.left.contains(u))
                && units.iter().any(|u| family.right.contains(u));
            mixed && !family.conversion_hints.iter().any(|h| lower.contains(h))
        })
        .map(|family| family.name)
        .collect()
}

/// Precision of the final answer against the inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrecisionCheck {
    pub final_decimals: usize,
    pub max_input_decimals: usize,
}

impl PrecisionCheck {
    pub fn passed(&self) -> bool {
        self.final_decimals <= self.max_input_decimals + 1
    }
}

/// `None` when fewer than two numbers appear.
pub fn check_precision(text: &str) -> Option<PrecisionCheck> {
    let body = strip_citations(text);
    let numbers: Vec<(usize, &str)> = NUMBER_PATTERN
        .find_iter(&body)
        .map(|m| (m.start(), m.as_str()))
        .collect();
    if numbers.len() < 2 {
        return None;
    }

    let from_formula = formula_spans(&body)
        .filter_map(|(_, rhs, offset)| {
            NUMBER_PATTERN
                .find_iter(rhs)
                .last()
                .map(|m| offset + m.start())
        })
        .last();
    let final_start = from_formula.unwrap_or(numbers[numbers.len() - 1].0);

    let (final_number, inputs): (Vec<&(usize, &str)>, Vec<&(usize, &str)>) =
        numbers.iter().partition(|(start, _)| *start == final_start);
    let final_decimals = decimal_places(final_number.first()?.1);
    let max_input_decimals = inputs
        .iter()
        .map(|(_, n)| decimal_places(n))
        .max()
        .unwrap_or(0);

    Some(PrecisionCheck {
        final_decimals,
        max_input_decimals,
    })
}

pub fn run(text: &str) -> GateResult {
    let formulas = extract_formulas(text);
    let mixed = unconverted_unit_families(text);
    let precision = check_precision(text);

    let mut issues: Vec<GateIssue> = mixed
        .iter()
        .map(|family| GateIssue::MixedUnits {
            family: family.to_string(),
        })
        .collect();
    let units_ok = issues.is_empty();

    let precision_ok = precision.map_or(true, |p| p.passed());
    if let Some(p) = precision.filter(|p| !p.passed()) {
        issues.push(GateIssue::ExcessPrecision {
            final_decimals: p.final_decimals,
            max_input_decimals: p.max_input_decimals,
        });
    }

    let failing = [units_ok, precision_ok].iter().filter(|ok| !**ok).count();
    let score = 1.0 - CHECK_PENALTY * failing as f64;

    let details = json!({
        "formulas": formulas,
        "unit_consistency": units_ok,
        "mixed_unit_families": mixed,
        "precision_ok": precision_ok,
        "final_decimals": precision.map(|p| p.final_decimals),
        "max_input_decimals": precision.map(|p| p.max_input_decimals),
    });

    GateResult::new(GateKind::Math, score, details, issues)
}
