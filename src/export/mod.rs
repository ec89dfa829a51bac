//! Export renderers
//!
//! [`Exporter`] lays a paper out once with its style sheet and hands the
//! result to the renderer for the requested format.

pub mod docx;
pub mod html;
pub mod latex;
pub mod pdf;

use std::sync::Arc;

use crate::ExportFormat;
use crate::document::Document;
use crate::error::{ExportError, Result};
use crate::format::{PaperLayout, layout};
use crate::style::StyleSheet;

pub use latex::Asset;
pub use pdf::{PdfConverter, SofficeConverter};

/// A rendered paper ready for download.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportedDocument {
    pub bytes: Vec<u8>,
    pub format: ExportFormat,
    pub filename: String,
    /// Files that belong next to the main file (LaTeX figures).
    pub assets: Vec<Asset>,
}

impl ExportedDocument {
    pub fn media_type(&self) -> &'static str {
        self.format.media_type()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Renders papers with a fixed style sheet.
#[derive(Clone)]
pub struct Exporter {
    style: StyleSheet,
    pdf: Option<Arc<dyn PdfConverter>>,
}

impl Default for Exporter {
    fn default() -> Self {
        Self::new(StyleSheet::default())
    }
}

impl std::fmt::Debug for Exporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Exporter")
            .field("style", &self.style)
            .field("pdf", &self.pdf.is_some())
            .finish()
    }
}

impl Exporter {
    pub fn new(style: StyleSheet) -> Self {
        Self { style, pdf: None }
    }

    pub fn with_pdf_converter(mut self, converter: Arc<dyn PdfConverter>) -> Self {
        self.pdf = Some(converter);
        self
    }

    pub fn style(&self) -> &StyleSheet {
        &self.style
    }

    /// Lay the paper out without rendering it.
    pub fn layout(&self, document: &Document) -> Result<PaperLayout> {
        layout(document, &self.style)
    }

    /// Export in the format named by the paper's own settings.
    pub fn export_default(&self, document: &Document) -> Result<ExportedDocument> {
        self.export(document, document.settings.export_format)
    }

    pub fn export(&self, document: &Document, format: ExportFormat) -> Result<ExportedDocument> {
        let paper = self.layout(document)?;
        let mut assets = Vec::new();

        let bytes = match format {
            ExportFormat::Docx => docx::render(&paper, &self.style)?,
            ExportFormat::Pdf => {
                let converter = self.pdf.as_ref().ok_or_else(|| {
                    ExportError::PdfUnavailable("no PDF converter is configured".to_string())
                })?;
                let container = docx::render(&paper, &self.style)?;
                converter.convert(&container)?
            }
            ExportFormat::Latex => {
                let source = latex::render(document, &self.style)?;
                assets = source.assets;
                source.source.into_bytes()
            }
        };

        let exported = ExportedDocument {
            bytes,
            format,
            filename: suggested_filename(&document.title, format),
            assets,
        };
        tracing::info!(
            filename = %exported.filename,
            bytes = exported.len(),
            "exported paper"
        );
        Ok(exported)
    }

    /// The HTML mirror of the DOCX rendering, as a full page.
    pub fn html(&self, document: &Document) -> Result<String> {
        Ok(html::render_page(&self.layout(document)?))
    }
}

/// `"My Paper"` becomes `My_Paper.docx`. Characters that are unsafe in file
/// names are dropped; an empty result falls back to `document`.
pub fn suggested_filename(title: &str, format: ExportFormat) -> String {
    let stem: String = title
        .trim()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .filter(|c| !matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|') && !c.is_control())
        .collect();
    let stem = stem.trim_matches('.');
    let stem = if stem.is_empty() { "document" } else { stem };
    format!("{stem}.{}", format.extension())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suggested_filename() {
        assert_eq!(suggested_filename("My Paper", ExportFormat::Docx), "My_Paper.docx");
        assert_eq!(
            suggested_filename("  A/B:  Test?  ", ExportFormat::Pdf),
            "AB_Test.pdf"
        );
        assert_eq!(suggested_filename("", ExportFormat::Latex), "document.tex");
        assert_eq!(suggested_filename("..", ExportFormat::Docx), "document.docx");
    }
}
