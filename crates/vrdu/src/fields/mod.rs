//! Field location and validation.
//!
//! A field is found in two steps: [`locator::find_anchors`] looks for the
//! field's label on the page (fuzzy, see [`matching`]), then
//! [`locator::locate_value`] searches the neighbourhood of each label for the
//! most plausible value. [`validation`] checks the value against the field's
//! kind and repairs common OCR confusions.

pub mod locator;
pub mod matching;
pub mod validation;

pub use locator::{Anchor, Located, ValueMatch, find_anchors, locate_field, locate_value};
pub use matching::{label_distance, match_quality, normalize_label};
pub use validation::{ValidationOutcome, infer_kind, repair_ocr_confusions, validate_value};

use ahash::AHashSet;

use crate::core::config::VrduConfig;
use crate::types::{FieldKind, FieldRequest};
use crate::{Result, VrduError};

/// A requested field with its kind settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
    pub table: bool,
}

/// Check a field list before a job is created.
///
/// Names are trimmed. The list must be non-empty, and no name may be blank or
/// repeated.
///
/// # Errors
///
/// Returns `VrduError::Validation` describing the first problem found.
pub fn validate_field_requests(requests: Vec<FieldRequest>) -> Result<Vec<FieldRequest>> {
    if requests.is_empty() {
        return Err(VrduError::validation("At least one field name is required"));
    }

    let mut seen = AHashSet::new();
    requests
        .into_iter()
        .enumerate()
        .map(|(position, mut request)| {
            let trimmed = request.name.trim();
            if trimmed.is_empty() {
                return Err(VrduError::validation(format!("Field name at position {} is blank", position)));
            }
            if !seen.insert(trimmed.to_string()) {
                return Err(VrduError::validation(format!("Duplicate field name '{}'", trimmed)));
            }
            request.name = trimmed.to_string();
            Ok(request)
        })
        .collect()
}

/// Split a comma-separated field list (`"Total, Date"`).
///
/// Empty entries are kept so [`validate_field_requests`] can reject them.
pub fn parse_field_list(list: &str) -> Vec<FieldRequest> {
    list.split(',').map(|name| FieldRequest::new(name.trim())).collect()
}

/// Settle each request's kind: explicit, then configured, then inferred from the name.
pub fn resolve_fields(requests: &[FieldRequest], config: &VrduConfig) -> Vec<FieldSpec> {
    requests
        .iter()
        .map(|request| FieldSpec {
            name: request.name.clone(),
            kind: request
                .kind
                .or_else(|| config.configured_kind(&request.name))
                .unwrap_or_else(|| infer_kind(&request.name)),
            table: request.table,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_field_requests_trims_names() {
        let fields = validate_field_requests(vec![" Total ".into(), "Date".into()]).unwrap();
        assert_eq!(fields[0].name, "Total");
        assert_eq!(fields[1].name, "Date");
    }

    #[test]
    fn test_validate_field_requests_rejects_bad_lists() {
        assert!(matches!(validate_field_requests(vec![]), Err(VrduError::Validation { .. })));

        let blank = validate_field_requests(vec!["Total".into(), "  ".into()]).unwrap_err();
        assert!(blank.to_string().contains("blank"));

        let duplicate = validate_field_requests(vec!["Total".into(), "Total ".into()]).unwrap_err();
        assert!(duplicate.to_string().contains("Duplicate field name 'Total'"));
    }

    #[test]
    fn test_parse_field_list() {
        let fields = parse_field_list("Total, Invoice Date,,");
        assert_eq!(fields.len(), 4);
        assert_eq!(fields[1].name, "Invoice Date");
        assert!(validate_field_requests(fields).is_err());
    }

    #[test]
    fn test_resolve_fields_precedence() {
        let mut config = VrduConfig::default();
        config.validation.field_kinds.insert("Reference".to_string(), FieldKind::Date);

        let specs = resolve_fields(
            &[
                FieldRequest::new("Total").with_kind(FieldKind::Text),
                FieldRequest::new("reference"),
                FieldRequest::new("Due Date"),
                FieldRequest::new("Items").as_table(),
            ],
            &config,
        );

        assert_eq!(specs[0].kind, FieldKind::Text);
        assert_eq!(specs[1].kind, FieldKind::Date);
        assert_eq!(specs[2].kind, FieldKind::Date);
        assert_eq!(specs[3].kind, FieldKind::Text);
        assert!(specs[3].table);
    }
}
