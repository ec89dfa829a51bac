//! Table consistency validation
//!
//! Read-only inspection of every standalone table and every table block in a
//! document. Findings are collected into a [`ValidationReport`]; nothing here
//! fails or modifies the document.

use serde::{Deserialize, Serialize};

use super::models::*;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

impl ValidationReport {
    fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
        self.is_valid = false;
    }

    fn warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// Fold another report into this one, prefixing every finding with `origin`.
    fn absorb(&mut self, origin: &str, other: ValidationReport) {
        for error in other.errors {
            self.error(format!("{origin}: {error}"));
        }
        for warning in other.warnings {
            self.warning(format!("{origin}: {warning}"));
        }
    }
}

/// Validate a whole document.
pub fn validate_document(document: &Document) -> ValidationReport {
    let mut report = ValidationReport::default();

    for (index, table) in document.tables.iter().enumerate() {
        report.absorb(
            &format!("Standalone table {}", index + 1),
            validate_table(table),
        );
    }

    for (section, subsection, block_index, block) in document.blocks() {
        if !matches!(block.kind, BlockKind::Table(_)) {
            continue;
        }
        let origin = match subsection {
            Some(sub) => format!("Section {section}, subsection {sub}, block {block_index}"),
            None => format!("Section {section}, block {block_index}"),
        };
        report.absorb(&origin, validate_table_block(block));
    }

    report
}

/// Validate a standalone table, including its `type`/`tableType` encoding.
pub fn validate_table(table: &Table) -> ValidationReport {
    let mut report = ValidationReport::default();

    if table.id.trim().is_empty() {
        report.error("Table is missing an id");
    }

    if let KindEncoding::Conflict { legacy } = &table.encoding {
        report.error(format!(
            "Table type '{}' does not match tableType '{}'",
            table.content.kind_name(),
            legacy
        ));
    }

    check_content(&table.content, &mut report);
    check_naming(&table.table_name, &table.caption, &mut report);
    report
}

/// Validate a table-kind content block. Other block kinds produce an empty report.
pub fn validate_table_block(block: &ContentBlock) -> ValidationReport {
    let mut report = ValidationReport::default();
    let BlockKind::Table(table) = &block.kind else {
        return report;
    };

    if block.id.trim().is_empty() {
        report.error("Table block is missing an id");
    }

    check_content(&table.content, &mut report);
    check_naming(&table.table_name, &table.caption, &mut report);
    report
}

fn check_content(content: &TableContent, report: &mut ValidationReport) {
    match content {
        TableContent::Interactive(table) => check_interactive(table, report),
        TableContent::Image(image) => {
            if image.data.trim().is_empty() {
                report.error("Image table has no image data");
            }
            if image.mime_type.trim().is_empty() {
                report.warning("Image table has no MIME type");
            }
        }
        TableContent::Latex(latex) => {
            if latex.latex_code.trim().is_empty() {
                report.error("LaTeX table has no LaTeX code");
            }
        }
        TableContent::Unknown(name) if name.is_empty() => {
            report.error("Table type is missing");
        }
        TableContent::Unknown(name) => {
            report.error(format!("Unknown table type '{name}'"));
        }
    }
}

fn check_interactive(table: &InteractiveTable, report: &mut ValidationReport) {
    let expected = table.headers.len();

    if table.headers.is_empty() {
        report.error("Interactive table has no headers");
    }
    if table.table_data.is_empty() {
        report.error("Interactive table has no data rows");
    }

    if expected > 0 {
        for (index, row) in table.table_data.iter().enumerate() {
            if row.len() != expected {
                report.error(format!(
                    "Row {}: expected {} cells, got {}",
                    index + 1,
                    expected,
                    row.len()
                ));
            }
        }
    }

    if let Some(rows) = table.rows {
        if rows != table.table_data.len() {
            report.warning(format!(
                "Row count hint {} does not match actual row count {}",
                rows,
                table.table_data.len()
            ));
        }
    }
    if let Some(columns) = table.columns {
        if columns != expected {
            report.warning(format!(
                "Column count hint {columns} does not match header count {expected}"
            ));
        }
    }
}

fn check_naming(table_name: &str, caption: &str, report: &mut ValidationReport) {
    if table_name.trim().is_empty() && caption.trim().is_empty() {
        report.warning("Table has neither a name nor a caption");
    }
}

/// Messages reporting a row whose cell count differs from the header count.
pub fn is_row_length_error(message: &str) -> bool {
    message
        .rsplit(": ")
        .nth(1)
        .is_some_and(|head| head.starts_with("Row "))
        && message.contains("cells, got")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interactive(headers: &[&str], rows: &[&[&str]]) -> Table {
        Table {
            id: "t1".to_string(),
            content: TableContent::Interactive(InteractiveTable {
                headers: headers.iter().map(|h| h.to_string()).collect(),
                table_data: rows
                    .iter()
                    .map(|row| row.iter().map(|c| c.to_string()).collect())
                    .collect(),
                rows: None,
                columns: None,
            }),
            encoding: KindEncoding::Both,
            table_name: "Results".to_string(),
            caption: String::new(),
        }
    }

    #[test]
    fn test_row_length_errors_are_one_indexed() {
        let table = interactive(&["A", "B"], &[&["1"], &["2", "3", "4"]]);
        let report = validate_table(&table);

        assert!(!report.is_valid);
        assert_eq!(
            report.errors,
            vec![
                "Row 1: expected 2 cells, got 1".to_string(),
                "Row 2: expected 2 cells, got 3".to_string(),
            ]
        );
    }

    #[test]
    fn test_dimension_hints_only_warn() {
        let mut table = interactive(&["A"], &[&["1"]]);
        if let TableContent::Interactive(data) = &mut table.content {
            data.rows = Some(4);
            data.columns = Some(3);
        }
        let report = validate_table(&table);

        assert!(report.is_valid);
        assert_eq!(report.warnings.len(), 2);
    }

    #[test]
    fn test_missing_name_and_caption_warns() {
        let mut table = interactive(&["A"], &[&["1"]]);
        table.table_name.clear();
        let report = validate_table(&table);

        assert!(report.is_valid);
        assert_eq!(report.warnings, vec!["Table has neither a name nor a caption"]);
    }

    #[test]
    fn test_row_length_error_detection() {
        assert!(is_row_length_error("Section 1, block 2: Row 3: expected 2 cells, got 1"));
        assert!(is_row_length_error("Row 1: expected 2 cells, got 1"));
        assert!(!is_row_length_error("Interactive table has no headers"));
    }
}
