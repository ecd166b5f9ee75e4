//! Fuzzy label matching. Pure functions, no layout knowledge.

/// Lower-case alphanumerics only: `"Invoice No.:"` becomes `"invoiceno"`.
pub fn normalize_label(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Edits tolerated for a normalized label of `len` characters.
///
/// Short labels must match exactly; longer ones tolerate one edit per four
/// characters up to `max_edit_distance`.
pub fn allowed_distance(len: usize, max_edit_distance: usize) -> usize {
    max_edit_distance.min(len / 4)
}

/// Levenshtein distance between the normalized forms of two strings.
pub fn label_distance(a: &str, b: &str) -> usize {
    strsim::levenshtein(&normalize_label(a), &normalize_label(b))
}

/// Quality of `candidate` as an occurrence of `label`, in `0.0..=1.0`.
///
/// `None` when the candidate is farther than the allowed distance or either
/// side normalizes to nothing.
pub fn match_quality(candidate: &str, label: &str, max_edit_distance: usize) -> Option<f64> {
    let label = normalize_label(label);
    let candidate = normalize_label(candidate);
    if label.is_empty() || candidate.is_empty() {
        return None;
    }

    let len = label.chars().count();
    let distance = strsim::levenshtein(&candidate, &label);
    if distance > allowed_distance(len, max_edit_distance) {
        return None;
    }

    Some((1.0 - distance as f64 / len as f64).max(0.0))
}

/// Number of whitespace-separated tokens in a label (at least 1).
pub fn token_count(label: &str) -> usize {
    label.split_whitespace().count().max(1)
}
