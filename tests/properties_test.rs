use ieeepaper::document::{
    BlockKind, ContentBlock, Document, InteractiveTable, KindEncoding, Section, Table, TableBlock,
    TableContent, is_row_length_error,
};
use ieeepaper::{sanitize_document, validate_document};
use proptest::prelude::*;

fn cell() -> impl Strategy<Value = String> {
    "[a-z0-9 ]{0,6}"
}

fn interactive() -> impl Strategy<Value = InteractiveTable> {
    (
        prop::collection::vec(cell(), 0..5),
        prop::collection::vec(prop::collection::vec(cell(), 0..7), 0..6),
        prop::option::of(0usize..8),
        prop::option::of(0usize..8),
    )
        .prop_map(|(headers, table_data, rows, columns)| InteractiveTable {
            headers,
            table_data,
            rows,
            columns,
        })
}

fn encoding() -> impl Strategy<Value = KindEncoding> {
    prop_oneof![
        Just(KindEncoding::Both),
        Just(KindEncoding::TypeOnly),
        Just(KindEncoding::LegacyOnly),
    ]
}

fn document() -> impl Strategy<Value = Document> {
    (
        prop::collection::vec((interactive(), encoding()), 0..3),
        prop::collection::vec(interactive(), 0..4),
        "[A-Za-z ]{0,20}",
    )
        .prop_map(|(tables, blocks, title)| Document {
            title,
            tables: tables
                .into_iter()
                .enumerate()
                .map(|(i, (table, encoding))| Table {
                    id: format!("t{i}"),
                    content: TableContent::Interactive(table),
                    encoding,
                    table_name: "Table".to_string(),
                    caption: String::new(),
                })
                .collect(),
            sections: vec![Section {
                id: "s1".to_string(),
                title: "Data".to_string(),
                content_blocks: blocks
                    .into_iter()
                    .enumerate()
                    .map(|(i, table)| ContentBlock {
                        id: format!("b{i}"),
                        order: i as i64,
                        kind: BlockKind::Table(TableBlock {
                            content: TableContent::Interactive(table),
                            table_name: String::new(),
                            caption: "Caption".to_string(),
                        }),
                    })
                    .collect(),
                ..Section::default()
            }],
            ..Document::default()
        })
}

fn interactive_tables(document: &Document) -> Vec<&InteractiveTable> {
    let standalone = document.tables.iter().map(|table| &table.content);
    let blocks = document.blocks().filter_map(|(_, _, _, block)| match &block.kind {
        BlockKind::Table(table) => Some(&table.content),
        _ => None,
    });
    standalone
        .chain(blocks)
        .filter_map(|content| match content {
            TableContent::Interactive(table) => Some(table),
            _ => None,
        })
        .collect()
}

proptest! {
    #[test]
    fn sanitize_is_idempotent(document in document()) {
        let once = sanitize_document(&document);
        let twice = sanitize_document(&once);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn sanitized_tables_are_rectangular(document in document()) {
        let repaired = sanitize_document(&document);
        for table in interactive_tables(&repaired) {
            prop_assert!(table.is_rectangular());
            prop_assert_eq!(table.rows, Some(table.table_data.len()));
            prop_assert_eq!(table.columns, Some(table.headers.len()));
        }
    }

    #[test]
    fn validator_agrees_with_sanitizer(document in document()) {
        let report = validate_document(&sanitize_document(&document));
        prop_assert!(
            !report.errors.iter().any(|e| is_row_length_error(e)),
            "row errors after sanitize: {:?}",
            report.errors
        );
        prop_assert!(!report.warnings.iter().any(|w| w.contains("count hint")));
    }

    #[test]
    fn sanitize_keeps_row_count_and_cell_prefixes(document in document()) {
        let repaired = sanitize_document(&document);
        let before = interactive_tables(&document);
        let after = interactive_tables(&repaired);
        prop_assert_eq!(before.len(), after.len());
        for (old, new) in before.iter().zip(after.iter()) {
            prop_assert_eq!(old.table_data.len(), new.table_data.len());
            prop_assert_eq!(&old.headers, &new.headers);
            for (old_row, new_row) in old.table_data.iter().zip(&new.table_data) {
                let kept = old_row.len().min(new_row.len());
                prop_assert_eq!(&old_row[..kept], &new_row[..kept]);
                prop_assert!(new_row[kept..].iter().all(String::is_empty));
            }
        }
        prop_assert_eq!(&repaired.title, &document.title);
    }
}
