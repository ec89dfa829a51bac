//! DOCX to PDF conversion through an external office suite

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{ExportError, Result};

/// Turns a Word container into a PDF.
pub trait PdfConverter: Send + Sync {
    fn convert(&self, docx: &[u8]) -> Result<Vec<u8>>;
}

/// Headless LibreOffice (`soffice --headless --convert-to pdf`).
#[derive(Debug, Clone)]
pub struct SofficeConverter {
    program: PathBuf,
}

impl SofficeConverter {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Find `soffice` or `libreoffice` on `PATH`.
    pub fn detect() -> Option<Self> {
        ["soffice", "libreoffice"]
            .iter()
            .find_map(|name| find_on_path(name))
            .map(Self::new)
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl PdfConverter for SofficeConverter {
    fn convert(&self, docx: &[u8]) -> Result<Vec<u8>> {
        let workdir = tempfile::tempdir()?;
        let input = workdir.path().join("paper.docx");
        std::fs::write(&input, docx)?;

        tracing::debug!(program = %self.program.display(), "converting docx to pdf");
        let output = Command::new(&self.program)
            .arg("--headless")
            .arg("--convert-to")
            .arg("pdf")
            .arg("--outdir")
            .arg(workdir.path())
            .arg(&input)
            .output()
            .map_err(|err| match err.kind() {
                std::io::ErrorKind::NotFound => ExportError::PdfUnavailable(format!(
                    "{} is not installed",
                    self.program.display()
                )),
                _ => ExportError::Io(err),
            })?;

        if !output.status.success() {
            return Err(ExportError::Pdf(format!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let pdf_path = workdir.path().join("paper.pdf");
        let pdf = std::fs::read(&pdf_path).map_err(|_| {
            ExportError::Pdf("converter finished without writing a PDF".to_string())
        })?;
        if !pdf.starts_with(b"%PDF") {
            return Err(ExportError::Pdf("converter output is not a PDF".to_string()));
        }
        Ok(pdf)
    }
}

/// Look up an executable by name in the directories of `PATH`.
pub(crate) fn find_on_path(name: &str) -> Option<PathBuf> {
    let paths = std::env::var_os("PATH")?;
    std::env::split_paths(&paths)
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_program_is_unavailable() {
        let converter = SofficeConverter::new("/nonexistent/soffice-for-tests");
        let err = converter.convert(b"PK").unwrap_err();
        assert!(matches!(err, ExportError::PdfUnavailable(_)));
    }
}
