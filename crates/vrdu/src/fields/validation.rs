//! Per-kind pattern checks with OCR confusion repair.
//!
//! Validation never drops data: a value that fails every check keeps its raw
//! text and only loses confidence.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::core::config::ValidationConfig;
use crate::types::{FieldKind, ValidationStatus};

static DATE_NUMERIC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{1,4}[-/.]\d{1,2}[-/.]\d{1,4}$").expect("Date pattern is valid and should compile")
});

static DATE_DAY_MONTH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{1,2}[\s-]?[A-Za-z]{3,9}\.?,?[\s-]?\d{2,4}$").expect("Date pattern is valid and should compile")
});

static DATE_MONTH_DAY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z]{3,9}\.?\s\d{1,2},?\s\d{2,4}$").expect("Date pattern is valid and should compile")
});

static CURRENCY_DECIMAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[A-Z]{3}\s?)?[-(]?[$€£¥]?\s?-?\d{1,3}(?:[,.\s']?\d{3})*[.,]\d{2}\)?(?:\s?(?:[$€£¥]|[A-Z]{3}))?$")
        .expect("Currency pattern is valid and should compile")
});

static CURRENCY_SYMBOL_WHOLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[-(]?[$€£¥]\s?\d{1,3}(?:,?\d{3})*\)?$").expect("Currency pattern is valid and should compile")
});

const DATE_NAME_HINTS: &[&str] = &["date", "dated"];
/// Weaker than the currency hints: "Amount Due" is an amount, "Due" alone a date.
const DUE_HINT: &str = "due";
const CURRENCY_NAME_HINTS: &[&str] = &[
    "total", "amount", "subtotal", "tax", "balance", "price", "fee", "cost",
];

/// Outcome of validating one raw value.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationOutcome {
    pub status: ValidationStatus,
    /// Value that passed the check (possibly repaired); `None` on mismatch.
    pub validated_value: Option<String>,
    /// Multiplier applied to the locator confidence.
    pub confidence_factor: f64,
}

/// Guess a field's kind from its name.
pub fn infer_kind(field_name: &str) -> FieldKind {
    let lowered = field_name.to_lowercase();
    let words: Vec<&str> = lowered.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()).collect();

    if words.iter().any(|w| DATE_NAME_HINTS.contains(w)) {
        FieldKind::Date
    } else if words.iter().any(|w| CURRENCY_NAME_HINTS.contains(w)) {
        FieldKind::Currency
    } else if words.contains(&DUE_HINT) {
        FieldKind::Date
    } else {
        FieldKind::Text
    }
}

fn matches_kind(value: &str, kind: FieldKind) -> bool {
    match kind {
        FieldKind::Date => DATE_NUMERIC.is_match(value) || DATE_DAY_MONTH.is_match(value) || DATE_MONTH_DAY.is_match(value),
        FieldKind::Currency => CURRENCY_DECIMAL.is_match(value) || CURRENCY_SYMBOL_WHOLE.is_match(value),
        FieldKind::Text => !value.is_empty(),
    }
}

fn repair_char(c: char, leading: bool, kind: FieldKind) -> char {
    match c {
        'S' | 's' if leading && kind == FieldKind::Currency => '$',
        'O' | 'o' | 'Q' | 'D' => '0',
        'I' | 'l' | '|' => '1',
        'Z' | 'z' => '2',
        'S' | 's' => '5',
        'B' => '8',
        other => other,
    }
}

fn is_lookalike(c: char) -> bool {
    matches!(c, 'O' | 'o' | 'Q' | 'D' | 'I' | 'l' | '|' | 'Z' | 'z' | 'S' | 's' | 'B')
}

/// Letter runs of at least this length that contain a real letter are words.
const MIN_WORD_RUN: usize = 3;

/// Positions inside `chars` that belong to a word-like letter run, such as the
/// month in `12-Dec-2024`.
fn word_runs(chars: &[char]) -> Vec<bool> {
    let mut protected = vec![false; chars.len()];
    let mut start = 0;
    while start < chars.len() {
        if !chars[start].is_alphabetic() {
            start += 1;
            continue;
        }
        let end = (start..chars.len()).find(|&i| !chars[i].is_alphabetic()).unwrap_or(chars.len());
        let run = &chars[start..end];
        if run.len() >= MIN_WORD_RUN && run.iter().any(|&c| !is_lookalike(c)) {
            protected[start..end].fill(true);
        }
        start = end;
    }
    protected
}

/// Substitute common OCR confusions inside tokens that contain digits.
///
/// Tokens without any digit (month names, currency codes) are left alone, as
/// are word-like letter runs inside a token.
pub fn repair_ocr_confusions(value: &str, kind: FieldKind) -> String {
    let mut repaired = String::with_capacity(value.len());
    let mut first_token = true;

    for (i, token) in value.split(' ').enumerate() {
        if i > 0 {
            repaired.push(' ');
        }
        if token.chars().any(|c| c.is_ascii_digit()) {
            let chars: Vec<char> = token.chars().collect();
            let protected = word_runs(&chars);
            for (position, &c) in chars.iter().enumerate() {
                if protected[position] {
                    repaired.push(c);
                } else {
                    repaired.push(repair_char(c, first_token && position == 0, kind));
                }
            }
        } else {
            repaired.push_str(token);
        }
        if !token.is_empty() {
            first_token = false;
        }
    }

    repaired
}

/// Check `raw` against `kind`, repairing OCR confusions when the value
/// looks like a near miss.
pub fn validate_value(raw: &str, kind: FieldKind, config: &ValidationConfig) -> ValidationOutcome {
    let value = raw.trim();

    if matches_kind(value, kind) {
        return ValidationOutcome {
            status: ValidationStatus::Valid,
            validated_value: Some(value.to_string()),
            confidence_factor: 1.0,
        };
    }

    if kind != FieldKind::Text && value.chars().any(|c| c.is_ascii_digit()) {
        let repaired = repair_ocr_confusions(value, kind);
        if repaired != value && matches_kind(&repaired, kind) {
            return ValidationOutcome {
                status: ValidationStatus::Repaired,
                validated_value: Some(repaired),
                confidence_factor: config.repair_penalty,
            };
        }
    }

    ValidationOutcome {
        status: ValidationStatus::Mismatch,
        validated_value: None,
        confidence_factor: config.mismatch_penalty,
    }
}
