//! Editor wire format adapters
//!
//! The editor sends content blocks and tables as flat JSON objects whose
//! meaning depends on a `type` string plus whichever extra fields that kind
//! uses. These structs mirror that shape and convert to and from the closed
//! sum types in [`super::models`].

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::models::*;

/// Deserialize `null` the same way as an absent field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Column count arrives as `2`, `"2"`, or not at all depending on the editor version.
pub(crate) fn columns_from_any<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Columns {
        Number(u64),
        Text(String),
    }

    Ok(match Option::<Columns>::deserialize(deserializer)? {
        Some(Columns::Number(1)) => 1,
        Some(Columns::Text(text)) if text.trim() == "1" => 1,
        _ => 2,
    })
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WireBlock {
    #[serde(deserialize_with = "null_as_default")]
    id: String,
    #[serde(rename = "type", deserialize_with = "null_as_default")]
    kind: String,
    #[serde(deserialize_with = "null_as_default")]
    order: i64,
    #[serde(deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    content: String,
    #[serde(deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    data: String,
    #[serde(deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    caption: String,
    #[serde(deserialize_with = "null_as_default", skip_serializing_if = "Option::is_none")]
    size: Option<ImageSize>,
    #[serde(deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    figure_id: String,
    #[serde(flatten)]
    table: WireTableFields,
    /// Fields no known block kind uses.
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl WireBlock {
    /// Everything but `id`, `type` and `order`, as it would be written back.
    fn passthrough_fields(&self) -> Map<String, Value> {
        let mut fields = match serde_json::to_value(self) {
            Ok(Value::Object(fields)) => fields,
            _ => Map::new(),
        };
        for key in ["id", "type", "order"] {
            fields.remove(key);
        }
        fields
    }
}

/// Fields shared by table blocks and standalone tables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WireTableFields {
    #[serde(deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    table_type: String,
    #[serde(deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    headers: Vec<String>,
    #[serde(deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    table_data: TableRows,
    #[serde(deserialize_with = "null_as_default", skip_serializing_if = "Option::is_none")]
    rows: Option<usize>,
    #[serde(deserialize_with = "null_as_default", skip_serializing_if = "Option::is_none")]
    columns: Option<usize>,
    #[serde(deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    mime_type: String,
    #[serde(deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    latex_code: String,
    #[serde(deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    table_name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WireTable {
    #[serde(deserialize_with = "null_as_default")]
    id: String,
    #[serde(rename = "type", deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    kind: String,
    #[serde(deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    data: String,
    #[serde(deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    caption: String,
    #[serde(flatten)]
    table: WireTableFields,
}

fn table_content(kind: &str, data: String, fields: &WireTableFields) -> TableContent {
    match kind.trim() {
        "interactive" => TableContent::Interactive(InteractiveTable {
            headers: fields.headers.clone(),
            table_data: fields.table_data.clone(),
            rows: fields.rows,
            columns: fields.columns,
        }),
        "image" => TableContent::Image(ImageTable {
            data,
            mime_type: fields.mime_type.clone(),
        }),
        "latex" => TableContent::Latex(LatexTable {
            latex_code: fields.latex_code.clone(),
        }),
        other => TableContent::Unknown(other.to_string()),
    }
}

/// Write a table payload back into flat fields, returning the `data` value.
fn flatten_content(content: &TableContent, fields: &mut WireTableFields) -> String {
    match content {
        TableContent::Interactive(table) => {
            fields.headers = table.headers.clone();
            fields.table_data = table.table_data.clone();
            fields.rows = table.rows;
            fields.columns = table.columns;
            String::new()
        }
        TableContent::Image(table) => {
            fields.mime_type = table.mime_type.clone();
            table.data.clone()
        }
        TableContent::Latex(table) => {
            fields.latex_code = table.latex_code.clone();
            String::new()
        }
        TableContent::Unknown(_) => String::new(),
    }
}

impl From<WireBlock> for ContentBlock {
    fn from(wire: WireBlock) -> Self {
        let image = |wire: &WireBlock| InlineImage {
            data: wire.data.clone(),
            caption: wire.caption.clone(),
            size: wire.size.unwrap_or_default(),
            mime_type: wire.table.mime_type.clone(),
        };

        let kind = match wire.kind.as_str() {
            "text" => BlockKind::Text(TextBlock {
                content: wire.content.clone(),
                attachment: (!wire.data.is_empty()).then(|| image(&wire)),
            }),
            "image" => BlockKind::Image(image(&wire)),
            "figure-reference" | "figure" => BlockKind::FigureReference {
                figure_id: wire.figure_id.clone(),
            },
            "table" => BlockKind::Table(TableBlock {
                content: table_content(&wire.table.table_type, wire.data.clone(), &wire.table),
                table_name: wire.table.table_name.clone(),
                caption: wire.caption.clone(),
            }),
            other => BlockKind::Unrecognized {
                kind: other.to_string(),
                fields: wire.passthrough_fields(),
            },
        };

        ContentBlock {
            id: wire.id,
            order: wire.order,
            kind,
        }
    }
}

impl From<ContentBlock> for WireBlock {
    fn from(block: ContentBlock) -> Self {
        let mut wire = WireBlock {
            id: block.id,
            kind: block.kind.name().to_string(),
            order: block.order,
            ..WireBlock::default()
        };

        match block.kind {
            BlockKind::Text(text) => {
                wire.content = text.content;
                if let Some(image) = text.attachment {
                    wire.data = image.data;
                    wire.caption = image.caption;
                    wire.size = Some(image.size);
                    wire.table.mime_type = image.mime_type;
                }
            }
            BlockKind::Image(image) => {
                wire.data = image.data;
                wire.caption = image.caption;
                wire.size = Some(image.size);
                wire.table.mime_type = image.mime_type;
            }
            BlockKind::FigureReference { figure_id } => wire.figure_id = figure_id,
            BlockKind::Table(table) => {
                wire.table.table_type = table.content.kind_name().to_string();
                wire.data = flatten_content(&table.content, &mut wire.table);
                wire.table.table_name = table.table_name;
                wire.caption = table.caption;
            }
            BlockKind::Unrecognized { fields, .. } => wire.extra = fields,
        }

        wire
    }
}

impl From<WireTable> for Table {
    fn from(wire: WireTable) -> Self {
        let declared = wire.kind.trim().to_string();
        let legacy = wire.table.table_type.trim().to_string();

        let (kind, encoding) = match (declared.is_empty(), legacy.is_empty()) {
            (false, false) if declared == legacy => (declared, KindEncoding::Both),
            (false, false) => (declared, KindEncoding::Conflict { legacy }),
            (false, true) => (declared, KindEncoding::TypeOnly),
            (true, false) => (legacy, KindEncoding::LegacyOnly),
            (true, true) => (String::new(), KindEncoding::Both),
        };

        Table {
            content: table_content(&kind, wire.data, &wire.table),
            id: wire.id,
            encoding,
            table_name: wire.table.table_name,
            caption: wire.caption,
        }
    }
}

impl From<Table> for WireTable {
    fn from(table: Table) -> Self {
        let mut wire = WireTable {
            id: table.id,
            caption: table.caption,
            ..WireTable::default()
        };
        let kind = table.content.kind_name().to_string();
        wire.data = flatten_content(&table.content, &mut wire.table);
        wire.table.table_name = table.table_name;

        match table.encoding {
            KindEncoding::Both => {
                wire.kind = kind.clone();
                wire.table.table_type = kind;
            }
            KindEncoding::TypeOnly => wire.kind = kind,
            KindEncoding::LegacyOnly => wire.table.table_type = kind,
            KindEncoding::Conflict { legacy } => {
                wire.kind = kind;
                wire.table.table_type = legacy;
            }
        }

        wire
    }
}
