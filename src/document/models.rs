//! Core data structures for paper representation
//!
//! This module defines the public types used to represent a paper as the
//! editor produces it: authors, sections with their content blocks, tables,
//! figures, references and export settings.
//!
//! Content blocks and standalone tables are closed sum types internally. The
//! editor's flat JSON shape lives in [`super::wire`], which the serde
//! attributes below route through.

use serde::{Deserialize, Serialize};

use super::wire::{self, WireBlock, WireTable};
use crate::ExportFormat;

pub type TableRows = Vec<Vec<String>>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Document {
    #[serde(deserialize_with = "wire::null_as_default")]
    pub title: String,
    #[serde(rename = "abstract", deserialize_with = "wire::null_as_default")]
    pub abstract_text: String,
    #[serde(deserialize_with = "wire::null_as_default")]
    pub keywords: String,
    #[serde(deserialize_with = "wire::null_as_default")]
    pub authors: Vec<Author>,
    #[serde(deserialize_with = "wire::null_as_default")]
    pub sections: Vec<Section>,
    #[serde(deserialize_with = "wire::null_as_default")]
    pub references: Vec<Reference>,
    #[serde(deserialize_with = "wire::null_as_default")]
    pub figures: Vec<Figure>,
    #[serde(
        deserialize_with = "wire::null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub tables: Vec<Table>,
    #[serde(deserialize_with = "wire::null_as_default")]
    pub settings: Settings,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Author {
    #[serde(deserialize_with = "wire::null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "wire::null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "wire::null_as_default")]
    pub department: String,
    #[serde(deserialize_with = "wire::null_as_default")]
    pub organization: String,
    #[serde(deserialize_with = "wire::null_as_default")]
    pub city: String,
    #[serde(deserialize_with = "wire::null_as_default")]
    pub state: String,
    #[serde(deserialize_with = "wire::null_as_default")]
    pub email: String,
    #[serde(alias = "custom_fields", deserialize_with = "wire::null_as_default")]
    pub custom_fields: Vec<CustomField>,
}

/// Extra author line. Identity is the field id, so two fields may share a name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomField {
    #[serde(deserialize_with = "wire::null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "wire::null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "wire::null_as_default")]
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Section {
    #[serde(deserialize_with = "wire::null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "wire::null_as_default")]
    pub title: String,
    /// Editor hint only; reading order is the position in `Document::sections`.
    #[serde(deserialize_with = "wire::null_as_default")]
    pub order: i64,
    #[serde(alias = "content_blocks", deserialize_with = "wire::null_as_default")]
    pub content_blocks: Vec<ContentBlock>,
    #[serde(deserialize_with = "wire::null_as_default")]
    pub subsections: Vec<Subsection>,
    /// Pre-block editor format: a single body string used when there are no blocks.
    #[serde(
        deserialize_with = "wire::null_as_default",
        skip_serializing_if = "String::is_empty"
    )]
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Subsection {
    #[serde(deserialize_with = "wire::null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "wire::null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "wire::null_as_default")]
    pub order: i64,
    #[serde(alias = "content_blocks", deserialize_with = "wire::null_as_default")]
    pub content_blocks: Vec<ContentBlock>,
    #[serde(
        deserialize_with = "wire::null_as_default",
        skip_serializing_if = "String::is_empty"
    )]
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "WireBlock", into = "WireBlock")]
pub struct ContentBlock {
    pub id: String,
    pub order: i64,
    pub kind: BlockKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BlockKind {
    Text(TextBlock),
    Image(InlineImage),
    FigureReference { figure_id: String },
    Table(TableBlock),
    /// A kind this engine does not know how to render. Kept so that export can
    /// fail loudly instead of silently dropping content; `fields` holds the
    /// rest of the block as sent so it is written back unchanged.
    Unrecognized {
        kind: String,
        fields: serde_json::Map<String, serde_json::Value>,
    },
}

impl BlockKind {
    /// Wire name of the block kind.
    pub fn name(&self) -> &str {
        match self {
            BlockKind::Text(_) => "text",
            BlockKind::Image(_) => "image",
            BlockKind::FigureReference { .. } => "figure-reference",
            BlockKind::Table(_) => "table",
            BlockKind::Unrecognized { kind, .. } => kind,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextBlock {
    pub content: String,
    /// Image pasted into a text block; rendered as a figure after the paragraph.
    pub attachment: Option<InlineImage>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InlineImage {
    pub data: String,
    pub caption: String,
    pub size: ImageSize,
    pub mime_type: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableBlock {
    pub content: TableContent,
    pub table_name: String,
    pub caption: String,
}

/// Payload of a table, shared by standalone tables and table blocks.
#[derive(Debug, Clone, PartialEq)]
pub enum TableContent {
    Interactive(InteractiveTable),
    Image(ImageTable),
    Latex(LatexTable),
    /// Unrecognized sub-kind name; empty when the kind was missing entirely.
    Unknown(String),
}

impl TableContent {
    pub fn kind_name(&self) -> &str {
        match self {
            TableContent::Interactive(_) => "interactive",
            TableContent::Image(_) => "image",
            TableContent::Latex(_) => "latex",
            TableContent::Unknown(name) => name,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InteractiveTable {
    pub headers: Vec<String>,
    pub table_data: TableRows,
    /// Cached row count. Advisory; must equal `table_data.len()`.
    pub rows: Option<usize>,
    /// Cached column count. Advisory; must equal `headers.len()`.
    pub columns: Option<usize>,
}

impl InteractiveTable {
    pub fn new(headers: Vec<String>, table_data: TableRows) -> Self {
        let rows = Some(table_data.len());
        let columns = Some(headers.len());
        Self {
            headers,
            table_data,
            rows,
            columns,
        }
    }

    /// True when every row has exactly one cell per header.
    pub fn is_rectangular(&self) -> bool {
        self.table_data
            .iter()
            .all(|row| row.len() == self.headers.len())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageTable {
    pub data: String,
    pub mime_type: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LatexTable {
    pub latex_code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "WireTable", into = "WireTable")]
pub struct Table {
    pub id: String,
    pub content: TableContent,
    /// Which of the wire's `type` / `tableType` fields carried the kind.
    pub encoding: KindEncoding,
    pub table_name: String,
    pub caption: String,
}

/// Record of how a standalone table's kind was encoded on the wire.
///
/// Older editor revisions wrote the kind to `tableType`, newer ones to `type`;
/// both are emitted again on serialization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum KindEncoding {
    #[default]
    Both,
    TypeOnly,
    LegacyOnly,
    /// `type` and `tableType` named different kinds; `legacy` is the `tableType` value.
    Conflict { legacy: String },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Reference {
    #[serde(deserialize_with = "wire::null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "wire::null_as_default")]
    pub text: String,
    /// Citation number, printed verbatim as `[order]`.
    #[serde(deserialize_with = "wire::null_as_default")]
    pub order: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Figure {
    #[serde(deserialize_with = "wire::null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "wire::null_as_default")]
    pub data: String,
    #[serde(deserialize_with = "wire::null_as_default")]
    pub caption: String,
    #[serde(deserialize_with = "wire::null_as_default")]
    pub size: ImageSize,
    #[serde(
        deserialize_with = "wire::null_as_default",
        skip_serializing_if = "String::is_empty"
    )]
    pub mime_type: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImageSize {
    VerySmall,
    Small,
    #[default]
    Medium,
    Large,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Body text size override such as `"9.5pt"` or `"10"`.
    #[serde(deserialize_with = "wire::null_as_default")]
    pub font_size: String,
    #[serde(deserialize_with = "wire::columns_from_any")]
    pub columns: u8,
    #[serde(deserialize_with = "wire::null_as_default")]
    pub export_format: ExportFormat,
    #[serde(deserialize_with = "wire::null_as_default")]
    pub include_page_numbers: bool,
    #[serde(deserialize_with = "wire::null_as_default")]
    pub include_copyright: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            font_size: String::new(),
            columns: 2,
            export_format: ExportFormat::Docx,
            include_page_numbers: false,
            include_copyright: false,
        }
    }
}

impl Settings {
    /// Column count clamped to the supported {1, 2}.
    pub fn column_count(&self) -> u8 {
        if self.columns == 1 { 1 } else { 2 }
    }

    /// Parsed body font size in points, if the override is usable.
    pub fn body_font_size(&self) -> Option<f32> {
        let raw = self.font_size.trim().trim_end_matches("pt").trim();
        raw.parse::<f32>()
            .ok()
            .filter(|size| size.is_finite() && *size > 0.0)
    }
}

impl Document {
    /// Iterate over every content block with its 1-based section index, optional
    /// 1-based subsection index and 1-based block index.
    pub fn blocks(&self) -> impl Iterator<Item = (usize, Option<usize>, usize, &ContentBlock)> {
        self.sections
            .iter()
            .enumerate()
            .flat_map(|(section_idx, section)| {
                let own = section
                    .content_blocks
                    .iter()
                    .enumerate()
                    .map(move |(block_idx, block)| (section_idx + 1, None, block_idx + 1, block));
                let nested = section
                    .subsections
                    .iter()
                    .enumerate()
                    .flat_map(move |(sub_idx, sub)| {
                        sub.content_blocks.iter().enumerate().map(move |(block_idx, block)| {
                            (section_idx + 1, Some(sub_idx + 1), block_idx + 1, block)
                        })
                    });
                own.chain(nested)
            })
    }

    pub fn figure(&self, id: &str) -> Option<&Figure> {
        self.figures.iter().find(|figure| figure.id == id)
    }

    pub fn word_count(&self) -> usize {
        let mut count = self.abstract_text.split_whitespace().count();
        for (_, _, _, block) in self.blocks() {
            if let BlockKind::Text(text) = &block.kind {
                count += text.content.split_whitespace().count();
            }
        }
        for section in &self.sections {
            count += section.content.split_whitespace().count();
            for sub in &section.subsections {
                count += sub.content.split_whitespace().count();
            }
        }
        count
    }
}
