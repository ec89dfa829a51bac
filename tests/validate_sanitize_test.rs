use ieeepaper::document::{
    BlockKind, Document, KindEncoding, TableContent, is_row_length_error, parse_document,
};
use ieeepaper::{sanitize_document, validate_document};

fn fixture() -> Document {
    parse_document(include_str!("fixtures/paper.json")).unwrap()
}

#[test]
fn test_row_length_errors_are_reported_with_location() {
    let document = fixture();
    let report = validate_document(&document);

    assert!(!report.is_valid);
    assert_eq!(
        report.errors,
        vec![
            "Standalone table 1: Row 2: expected 2 cells, got 1".to_string(),
            "Section 2, block 1: Row 2: expected 3 cells, got 2".to_string(),
            "Section 2, block 1: Row 3: expected 3 cells, got 4".to_string(),
        ]
    );
    assert!(report.errors.iter().all(|e| is_row_length_error(e)));
}

#[test]
fn test_sanitize_repairs_rows_and_leaves_input_alone() {
    let document = fixture();
    let before = document.clone();
    let repaired = sanitize_document(&document);

    assert_eq!(document, before);

    let report = validate_document(&repaired);
    assert!(report.is_valid, "errors after sanitize: {:?}", report.errors);
    assert!(report.errors.is_empty());

    let BlockKind::Table(table) = &repaired.sections[1].content_blocks[0].kind else {
        panic!("expected a table block");
    };
    let TableContent::Interactive(grid) = &table.content else {
        panic!("expected an interactive table");
    };
    assert_eq!(
        grid.table_data,
        vec![
            vec!["A".to_string(), "4".to_string(), "32".to_string()],
            vec!["B".to_string(), "2".to_string(), String::new()],
            vec!["C".to_string(), "8".to_string(), "64".to_string()],
        ]
    );
    assert_eq!(grid.rows, Some(3));
    assert_eq!(grid.columns, Some(3));
}

#[test]
fn test_sanitize_writes_both_kind_fields() {
    let repaired = sanitize_document(&fixture());
    assert_eq!(repaired.tables[0].encoding, KindEncoding::Both);

    let json = serde_json::to_value(&repaired.tables[0]).unwrap();
    assert_eq!(json["type"], "interactive");
    assert_eq!(json["tableType"], "interactive");
}

#[test]
fn test_sanitize_is_idempotent_on_fixture() {
    let once = sanitize_document(&fixture());
    let twice = sanitize_document(&once);
    assert_eq!(once, twice);
}

#[test]
fn test_conflicting_kind_fields_are_an_error() {
    let document = parse_document(
        r#"{
            "title": "T",
            "tables": [{
                "id": "t1",
                "type": "latex",
                "tableType": "interactive",
                "latexCode": "x",
                "tableName": "n"
            }]
        }"#,
    )
    .unwrap();

    let report = validate_document(&document);
    assert!(!report.is_valid);
    assert!(
        report
            .errors
            .contains(&"Standalone table 1: Table type 'latex' does not match tableType 'interactive'".to_string())
    );

    // The sanitizer does not guess which field was right.
    let repaired = sanitize_document(&document);
    assert!(!validate_document(&repaired).is_valid);
}

#[test]
fn test_missing_names_and_hint_mismatch_are_warnings() {
    let document = parse_document(
        r#"{
            "sections": [{
                "id": "s1",
                "title": "Data",
                "contentBlocks": [],
                "subsections": [{
                    "id": "s1a",
                    "title": "Raw",
                    "contentBlocks": [{
                        "id": "b1",
                        "type": "table",
                        "tableType": "interactive",
                        "headers": ["x"],
                        "tableData": [["1"]],
                        "rows": 5
                    }]
                }]
            }]
        }"#,
    )
    .unwrap();

    let report = validate_document(&document);
    assert!(report.is_valid);
    assert_eq!(
        report.warnings,
        vec![
            "Section 1, subsection 1, block 1: Row count hint 5 does not match actual row count 1".to_string(),
            "Section 1, subsection 1, block 1: Table has neither a name nor a caption".to_string(),
        ]
    );
}

#[test]
fn test_empty_and_unknown_tables() {
    let document = parse_document(
        r#"{
            "tables": [
                { "id": "t1", "type": "interactive", "tableName": "Empty" },
                { "id": "", "type": "chart", "caption": "c" },
                { "id": "t3", "type": "image", "caption": "c" }
            ]
        }"#,
    )
    .unwrap();

    let report = validate_document(&document);
    assert_eq!(
        report.errors,
        vec![
            "Standalone table 1: Interactive table has no headers".to_string(),
            "Standalone table 1: Interactive table has no data rows".to_string(),
            "Standalone table 2: Table is missing an id".to_string(),
            "Standalone table 2: Unknown table type 'chart'".to_string(),
            "Standalone table 3: Image table has no image data".to_string(),
        ]
    );
    assert_eq!(
        report.warnings,
        vec!["Standalone table 3: Image table has no MIME type".to_string()]
    );
}

#[test]
fn test_latex_tables_without_code_are_errors() {
    let document = parse_document(
        r#"{
            "tables": [
                { "id": "t1", "type": "latex", "tableName": "Bounds", "latexCode": "   " }
            ],
            "sections": [{ "id": "s1", "title": "Model", "contentBlocks": [
                { "id": "b1", "type": "table", "tableType": "latex", "tableName": "Fit",
                  "latexCode": "\\begin{tabular}{c} x \\end{tabular}" },
                { "id": "b2", "type": "table", "tableType": "latex", "tableName": "Gap" }
            ]}]
        }"#,
    )
    .unwrap();

    let report = validate_document(&document);
    assert!(!report.is_valid);
    assert_eq!(
        report.errors,
        vec![
            "Standalone table 1: LaTeX table has no LaTeX code".to_string(),
            "Section 1, block 2: LaTeX table has no LaTeX code".to_string(),
        ]
    );
    assert!(!report.errors.iter().any(|e| is_row_length_error(e)));

    // sanitize cannot invent the missing code
    let repaired = sanitize_document(&document);
    assert_eq!(validate_document(&repaired).errors, report.errors);
}

#[test]
fn test_report_serializes_camel_case() {
    let report = validate_document(&fixture());
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["isValid"], false);
    assert!(json["errors"].is_array());
    assert!(json["warnings"].is_array());
}
