//! Error types for the export and preview paths.
//!
//! Validation findings are values ([`crate::ValidationReport`]), never errors.
//! What lives here are the failures that abort an export or a preview.

use std::fmt;
use std::io;
use thiserror::Error;

/// Result type alias for export operations.
pub type Result<T> = std::result::Result<T, ExportError>;

/// Where in the paper an offending piece of content sits. Indices are 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockLocation {
    Block {
        section: usize,
        section_title: String,
        subsection: Option<usize>,
        block: usize,
        block_id: String,
    },
    StandaloneTable {
        index: usize,
        table_id: String,
    },
    Figure {
        figure_id: String,
    },
}

impl fmt::Display for BlockLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockLocation::Block {
                section,
                section_title,
                subsection,
                block,
                block_id,
            } => {
                write!(f, "section {section} \"{section_title}\"")?;
                if let Some(sub) = subsection {
                    write!(f, ", subsection {sub}")?;
                }
                write!(f, ", block {block} (id \"{block_id}\")")
            }
            BlockLocation::StandaloneTable { index, table_id } => {
                write!(f, "standalone table {index} (id \"{table_id}\")")
            }
            BlockLocation::Figure { figure_id } => write!(f, "figure \"{figure_id}\""),
        }
    }
}

/// Failures that abort an export.
#[derive(Error, Debug)]
pub enum ExportError {
    /// A content block of a kind the renderer has no path for.
    #[error("Unrecognized content block kind '{kind}' at {location}")]
    UnrecognizedBlock { location: BlockLocation, kind: String },

    /// Table data that the sanitizer should have repaired, or an unknown table kind.
    #[error("Malformed table at {location}: {reason}")]
    MalformedTable {
        location: BlockLocation,
        reason: String,
    },

    /// A required payload (image data, LaTeX code) is absent.
    #[error("Missing {what} at {location}")]
    MissingContent {
        location: BlockLocation,
        what: &'static str,
    },

    /// Image payload that does not decode.
    #[error("Invalid image at {location}: {reason}")]
    InvalidImage {
        location: BlockLocation,
        reason: String,
    },

    /// A figure reference names a figure the paper does not contain.
    #[error("Figure '{figure_id}' referenced at {location} does not exist")]
    MissingFigure {
        location: BlockLocation,
        figure_id: String,
    },

    /// I/O error when writing files or talking to a converter.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Failure while assembling the DOCX container.
    #[error("Container error: {0}")]
    Container(String),

    /// The PDF converter ran but did not produce a document.
    #[error("PDF conversion failed: {0}")]
    Pdf(String),

    /// No PDF converter is installed or configured.
    #[error("PDF conversion is unavailable: {0}")]
    PdfUnavailable(String),

    /// A caller-imposed deadline passed before the export finished.
    #[error("Export timed out after {0:?}")]
    TimedOut(std::time::Duration),

    /// The blocking export task was lost.
    #[error("Export task failed: {0}")]
    Task(String),
}

impl ExportError {
    /// Content position of the failure, when there is one.
    pub fn location(&self) -> Option<&BlockLocation> {
        match self {
            ExportError::UnrecognizedBlock { location, .. }
            | ExportError::MalformedTable { location, .. }
            | ExportError::MissingContent { location, .. }
            | ExportError::InvalidImage { location, .. }
            | ExportError::MissingFigure { location, .. } => Some(location),
            _ => None,
        }
    }
}

impl From<zip::result::ZipError> for ExportError {
    fn from(err: zip::result::ZipError) -> Self {
        ExportError::Container(err.to_string())
    }
}

/// Failures while turning an exported binary back into something viewable.
#[derive(Error, Debug)]
pub enum PreviewError {
    #[error("Nothing to preview: the exported document is empty")]
    Empty,

    #[error("Could not read the DOCX for preview: {0}")]
    Flow(String),

    #[error("Could not render page {page}: {reason}")]
    Page { page: usize, reason: String },

    #[error("Could not inspect the PDF: {0}")]
    Pdf(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Export failed: {0}")]
    Export(#[from] ExportError),

    #[error("Preview task failed: {0}")]
    Task(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_location_names_section_and_block() {
        let location = BlockLocation::Block {
            section: 2,
            section_title: "Methods".to_string(),
            subsection: Some(1),
            block: 3,
            block_id: "b-9".to_string(),
        };
        assert_eq!(
            location.to_string(),
            "section 2 \"Methods\", subsection 1, block 3 (id \"b-9\")"
        );
    }
}
