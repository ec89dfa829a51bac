//! Paper model and structural checks
//!
//! This module holds the in-memory paper representation together with the
//! read-only validator and the copy-producing sanitizer for its tables.

pub mod models;
pub mod sanitize;
pub mod validate;
pub(crate) mod wire;

pub use models::*;
pub use sanitize::{sanitize_document, sanitize_table, sanitize_table_block};
pub use validate::{
    ValidationReport, is_row_length_error, validate_document, validate_table, validate_table_block,
};

use anyhow::{Context, Result};
use std::path::Path;

/// Load a paper from the editor's JSON format.
pub async fn load_document(path: &Path) -> Result<Document> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    parse_document(&raw).with_context(|| format!("Invalid paper JSON in {}", path.display()))
}

pub fn parse_document(raw: &str) -> Result<Document> {
    let document: Document = serde_json::from_str(raw)?;
    tracing::debug!(
        sections = document.sections.len(),
        tables = document.tables.len(),
        figures = document.figures.len(),
        "parsed paper"
    );
    Ok(document)
}
