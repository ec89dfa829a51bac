//! Reading parts back out of a Word container

use std::io::{Cursor, Read};
use zip::ZipArchive;

use crate::error::{ExportError, Result};

/// Check that `bytes` is a Word container: a ZIP holding `word/document.xml`.
pub fn check_container(bytes: &[u8]) -> Result<()> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;

    if archive.by_name("word/document.xml").is_err() {
        // Check if it might be an Excel file
        if archive.by_name("xl/workbook.xml").is_ok() {
            return Err(ExportError::Container(
                "this is a spreadsheet (.xlsx), not a Word document".to_string(),
            ));
        }

        return Err(ExportError::Container(
            "missing word/document.xml; the file may be corrupted or is not a Word document"
                .to_string(),
        ));
    }

    Ok(())
}

/// Read one part of a container as text.
pub fn read_part(bytes: &[u8], name: &str) -> Result<String> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let mut entry = archive.by_name(name)?;
    let mut text = String::new();
    entry.read_to_string(&mut text)?;
    Ok(text)
}

/// Names of all parts in a container, in stored order.
pub fn part_names(bytes: &[u8]) -> Result<Vec<String>> {
    let archive = ZipArchive::new(Cursor::new(bytes))?;
    Ok(archive.file_names().map(str::to_string).collect::<Vec<_>>())
}
