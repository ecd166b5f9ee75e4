//! Document-level field extraction through the public API.

mod common;

use common::{invoice_tsv, item_table, tsv, word};
use vrdu::{
    AggregationPolicy, Document, FieldKind, FieldRequest, FieldStatus, ValidationStatus, VrduConfig, VrduError,
    extract_document,
};

#[tokio::test]
async fn test_invoice_fields_across_pages() {
    let document = Document::from_tsv(&invoice_tsv()).unwrap().with_name("invoice.tsv");
    let result = extract_document(
        document,
        vec!["Invoice Number".into(), "Date".into(), "Total".into()],
        &VrduConfig::default(),
    )
    .await
    .unwrap();

    let names: Vec<&str> = result.fields.keys().map(String::as_str).collect();
    assert_eq!(names, vec!["Invoice Number", "Date", "Total"]);

    let number = &result.fields["Invoice Number"];
    assert_eq!(number.value.as_deref(), Some("INV-001"));
    assert_eq!(number.page, Some(1));

    let date = &result.fields["Date"];
    assert_eq!(date.value.as_deref(), Some("12/01/2024"));
    assert_eq!(date.validation, Some(ValidationStatus::Valid));

    let total = &result.fields["Total"];
    assert_eq!(total.value.as_deref(), Some("$45.00"));
    assert_eq!(total.page, Some(2), "first page with a total wins");
    assert!(total.confidence > 0.0 && total.confidence <= 1.0);

    assert_eq!(result.metadata.page_count, 3);
    assert_eq!(result.metadata.pages_processed, 3);
    assert!(result.metadata.skipped_pages.is_empty());
    assert_eq!(result.pages.len(), 3);
}

#[tokio::test]
async fn test_last_found_policy() {
    let mut config = VrduConfig::default();
    config.jobs.aggregation = AggregationPolicy::LastFound;

    let document = Document::from_tsv(&invoice_tsv()).unwrap();
    let result = extract_document(document, vec!["Total".into()], &config).await.unwrap();

    assert_eq!(result.fields["Total"].value.as_deref(), Some("$99.00"));
    assert_eq!(result.fields["Total"].page, Some(3));
    assert_eq!(result.metadata.aggregation, AggregationPolicy::LastFound);
}

#[tokio::test]
async fn test_ocr_confusion_is_repaired() {
    let document = Document::from_tsv(&tsv(&[(1, "Total", 10, 100, 40), (1, "$4S.O0", 80, 100, 48)])).unwrap();
    let result = extract_document(document, vec!["Total".into()], &VrduConfig::default())
        .await
        .unwrap();

    let total = &result.fields["Total"];
    assert_eq!(total.raw_value.as_deref(), Some("$4S.O0"));
    assert_eq!(total.value.as_deref(), Some("$45.00"));
    assert_eq!(total.validation, Some(ValidationStatus::Repaired));
}

#[tokio::test]
async fn test_fuzzy_label_match() {
    let document = Document::from_tsv(&tsv(&[(1, "Tota1", 10, 100, 40), (1, "$45.00", 80, 100, 48)])).unwrap();
    let result = extract_document(document, vec!["Total".into()], &VrduConfig::default())
        .await
        .unwrap();

    assert_eq!(result.fields["Total"].status, FieldStatus::Found);
    assert_eq!(result.fields["Total"].value.as_deref(), Some("$45.00"));
}

#[tokio::test]
async fn test_value_and_label_missing() {
    let document = Document::from_pages(vec![vec![word("Date", 0.0, 0.0, 35.0)]]);
    let result = extract_document(document, vec!["Date".into(), "Total".into()], &VrduConfig::default())
        .await
        .unwrap();

    assert_eq!(result.fields["Date"].status, FieldStatus::ValueMissing);
    assert_eq!(result.fields["Total"].status, FieldStatus::LabelMissing);
    assert!(!result.fields["Total"].found);
}

#[tokio::test]
async fn test_explicit_kind_overrides_inference() {
    let document = Document::from_pages(vec![vec![word("Ref", 0.0, 0.0, 30.0), word("2024-01-12", 60.0, 0.0, 80.0)]]);
    let request = FieldRequest::new("Ref").with_kind(FieldKind::Date);

    let result = extract_document(document, vec![request], &VrduConfig::default())
        .await
        .unwrap();

    assert_eq!(result.fields["Ref"].validation, Some(ValidationStatus::Valid));
}

#[tokio::test]
async fn test_table_field_reads_grid() {
    let mut words = vec![word("Items", 0.0, -30.0, 45.0)];
    words.extend(item_table());
    let document = Document::from_pages(vec![words]);

    let result = extract_document(document, vec![FieldRequest::new("Items").as_table()], &VrduConfig::default())
        .await
        .unwrap();

    let items = &result.fields["Items"];
    assert_eq!(items.status, FieldStatus::Found);
    let table = items.table.as_ref().expect("table field carries a grid");
    assert_eq!(table.rows[0], vec!["Item", "Qty", "Price"]);
    assert_eq!(table.rows[2], vec!["Gadget", "1", "$25.00"]);
}

#[tokio::test]
async fn test_rejects_bad_field_lists() {
    let empty: Vec<FieldRequest> = Vec::new();
    let err = extract_document(Document::from_pages(vec![vec![]]), empty, &VrduConfig::default())
        .await
        .unwrap_err();
    assert!(matches!(err, VrduError::Validation { .. }));

    let distinct = extract_document(
        Document::from_pages(vec![vec![]]),
        vec!["Total".into(), " total ".into()],
        &VrduConfig::default(),
    )
    .await;
    assert!(distinct.is_ok(), "names are compared exactly after trimming");

    let err = extract_document(Document::from_pages(vec![vec![]]), vec!["Total".into(), "Total ".into()], &VrduConfig::default())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Duplicate field name 'Total'"));
}
