//! Table repair pass
//!
//! Rebuilds a document with every interactive table reshaped to its headers
//! and every standalone table's kind encoded in both wire fields. Anything
//! else a validator would flag is carried over untouched.

use super::models::*;

/// Return a corrected copy of `document`. The input is never modified.
pub fn sanitize_document(document: &Document) -> Document {
    let repaired = Document {
        sections: document.sections.iter().map(sanitize_section).collect(),
        tables: document.tables.iter().map(sanitize_table).collect(),
        ..document.clone()
    };
    tracing::debug!(
        changed = repaired != *document,
        "sanitized paper tables"
    );
    repaired
}

fn sanitize_section(section: &Section) -> Section {
    Section {
        content_blocks: section.content_blocks.iter().map(sanitize_table_block).collect(),
        subsections: section
            .subsections
            .iter()
            .map(|sub| Subsection {
                content_blocks: sub.content_blocks.iter().map(sanitize_table_block).collect(),
                ..sub.clone()
            })
            .collect(),
        ..section.clone()
    }
}

/// Repair a standalone table.
pub fn sanitize_table(table: &Table) -> Table {
    let encoding = match &table.encoding {
        KindEncoding::TypeOnly | KindEncoding::LegacyOnly => KindEncoding::Both,
        other => other.clone(),
    };
    Table {
        id: table.id.clone(),
        content: sanitize_content(&table.content),
        encoding,
        table_name: table.table_name.clone(),
        caption: table.caption.clone(),
    }
}

/// Repair a content block; blocks that are not tables come back unchanged.
pub fn sanitize_table_block(block: &ContentBlock) -> ContentBlock {
    let kind = match &block.kind {
        BlockKind::Table(table) => BlockKind::Table(TableBlock {
            content: sanitize_content(&table.content),
            table_name: table.table_name.clone(),
            caption: table.caption.clone(),
        }),
        other => other.clone(),
    };
    ContentBlock {
        id: block.id.clone(),
        order: block.order,
        kind,
    }
}

fn sanitize_content(content: &TableContent) -> TableContent {
    match content {
        TableContent::Interactive(table) => TableContent::Interactive(reshape(table)),
        other => other.clone(),
    }
}

/// Pad short rows with empty cells and cut long rows down to the header count.
fn reshape(table: &InteractiveTable) -> InteractiveTable {
    let width = table.headers.len();
    let data: TableRows = table
        .table_data
        .iter()
        .map(|row| {
            row.iter()
                .cloned()
                .chain(std::iter::repeat(String::new()))
                .take(width)
                .collect()
        })
        .collect();
    InteractiveTable::new(table.headers.clone(), data)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_reshape_pads_and_truncates() {
        let table = InteractiveTable {
            headers: strings(&["A", "B"]),
            table_data: vec![strings(&["1"]), strings(&["2", "3", "4"])],
            rows: Some(7),
            columns: None,
        };
        let fixed = reshape(&table);

        assert_eq!(fixed.table_data, vec![strings(&["1", ""]), strings(&["2", "3"])]);
        assert_eq!(fixed.rows, Some(2));
        assert_eq!(fixed.columns, Some(2));
    }

    #[test]
    fn test_headerless_rows_become_empty() {
        let table = InteractiveTable {
            headers: Vec::new(),
            table_data: vec![strings(&["x", "y"])],
            rows: None,
            columns: None,
        };
        let fixed = reshape(&table);

        assert!(fixed.headers.is_empty());
        assert_eq!(fixed.table_data, vec![Vec::<String>::new()]);
        assert_eq!(fixed.columns, Some(0));
    }

    #[test]
    fn test_conflicting_encoding_is_left_for_validation() {
        let table = Table {
            id: "t".to_string(),
            content: TableContent::Latex(LatexTable {
                latex_code: "x".to_string(),
            }),
            encoding: KindEncoding::Conflict {
                legacy: "image".to_string(),
            },
            table_name: String::new(),
            caption: String::new(),
        };

        assert_eq!(sanitize_table(&table), table);
    }
}
