//! Word (`.docx`) renderer
//!
//! Builds the document through `docx-rs` from a [`PaperLayout`]. Paragraph and
//! picture ids are assigned in layout order and the core properties keep their
//! fixed dates, so the same layout always produces the same bytes.

mod document;
mod package;
mod styles;

pub use package::{check_container, part_names, read_part};

use docx_rs::Docx;
use std::io::Cursor;

use crate::error::{ExportError, Result};
use crate::format::PaperLayout;
use crate::style::StyleSheet;

use document::BodyBuilder;

/// Points to half-points, the unit of `w:sz`.
pub(crate) fn half_points(points: f32) -> usize {
    (points * 2.0).round().max(0.0) as usize
}

/// Points to twentieths of a point.
pub(crate) fn twips_pt(points: f32) -> u32 {
    (points * 20.0).round().max(0.0) as u32
}

/// Inches to twentieths of a point.
pub(crate) fn twips_in(inches: f32) -> i32 {
    (inches * 1440.0).round() as i32
}

/// Inches to English Metric Units.
pub(crate) fn emu(inches: f32) -> u32 {
    (f64::from(inches) * 914_400.0).round().max(0.0) as u32
}

/// Render a laid-out paper as a Word container.
pub fn render(layout: &PaperLayout, style: &StyleSheet) -> Result<Vec<u8>> {
    let docx = styles::apply(Docx::new(), style, layout);
    let docx = BodyBuilder::new(layout).build(docx)?;

    let mut buffer = Cursor::new(Vec::new());
    docx.build()
        .pack(&mut buffer)
        .map_err(|err| ExportError::Container(err.to_string()))?;

    tracing::debug!(footer = layout.footer.is_some(), "packed docx");
    Ok(buffer.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_conversions() {
        assert_eq!(half_points(24.0), 48);
        assert_eq!(half_points(9.5), 19);
        assert_eq!(twips_pt(12.0), 240);
        assert_eq!(twips_in(0.5), 720);
        assert_eq!(twips_in(0.25), 360);
        assert_eq!(emu(1.0), 914_400);
    }
}
