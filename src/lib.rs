//! ieeepaper: IEEE paper composition and export engine
//!
//! This library takes a paper as the structured editor produces it, checks and
//! repairs its tables, derives IEEE numbering and typography, and renders the
//! result as a DOCX container, a LaTeX source, a PDF (through an external
//! converter), an HTML mirror or an ANSI terminal preview.

pub mod ansi;
pub mod document;
pub mod error;
pub mod export;
pub mod format;
pub mod preview;
pub mod service;
pub mod style;

use serde::{Deserialize, Serialize};

/// Export format options
#[derive(clap::ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Word container with IEEE styling
    #[default]
    Docx,
    /// DOCX converted through headless LibreOffice
    Pdf,
    /// IEEEtran LaTeX source
    Latex,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Docx => "docx",
            ExportFormat::Pdf => "pdf",
            ExportFormat::Latex => "tex",
        }
    }

    pub fn media_type(self) -> &'static str {
        match self {
            ExportFormat::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            ExportFormat::Pdf => "application/pdf",
            ExportFormat::Latex => "application/x-tex",
        }
    }
}

// Re-export commonly used types
pub use document::{Document, ValidationReport, sanitize_document, validate_document};
pub use error::{BlockLocation, ExportError};
pub use export::{ExportedDocument, Exporter};
pub use preview::{PreviewState, Previewer};
pub use style::StyleSheet;
