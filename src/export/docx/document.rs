//! Document body and footer built through `docx-rs`

use docx_rs::{
    AlignmentType, BreakType, Docx, Footer as FooterPart, FooterReference, LineSpacing, PageMargin,
    PageNum, PageSize, Paragraph, Pic, Run, RunFonts, SectionProperty, SectionType,
    SpecialIndentType, Table, TableAlignmentType, TableCell, TableRow, WidthType,
    create_footer_rid,
};
use image::ImageFormat;
use std::io::Cursor;

use crate::error::{ExportError, Result};
use crate::format::media::{EmbeddedImage, MediaFormat};
use crate::format::{
    Footer, LayoutElement, LayoutGrid, LayoutImage, LayoutParagraph, PaperLayout, Role, StyledRun,
};
use crate::style::Alignment;

use super::styles::style_id;
use super::{emu, half_points, twips_in, twips_pt};

pub(crate) struct BodyBuilder<'a> {
    layout: &'a PaperLayout,
    paragraphs: u32,
    pictures: usize,
}

impl<'a> BodyBuilder<'a> {
    pub fn new(layout: &'a PaperLayout) -> Self {
        BodyBuilder {
            layout,
            paragraphs: 0,
            pictures: 0,
        }
    }

    /// Add the front matter, the body, both section properties and the footer.
    pub fn build(mut self, mut docx: Docx) -> Result<Docx> {
        let layout = self.layout;
        let page = &layout.page;
        let (width, height) = (twips_in(page.width).max(0) as u32, twips_in(page.height).max(0) as u32);
        let margin = twips_in(page.margin);
        let page_margin = PageMargin::new()
            .top(margin)
            .right(margin)
            .bottom(margin)
            .left(margin)
            .header(margin / 2)
            .footer(margin / 2)
            .gutter(0);
        let gutter = twips_in(page.gutter).max(0) as usize;
        docx = docx.page_size(width, height).page_margin(page_margin.clone());

        for element in &layout.front_matter {
            docx = self.element(docx, element)?;
        }
        let split = !layout.front_matter.is_empty() && !layout.body.is_empty();
        if split {
            // Front matter section ends here, always one column.
            let mut section = SectionProperty::new()
                .page_size(PageSize::new().size(width, height))
                .page_margin(page_margin);
            section.space = gutter;
            if layout.footer.is_some() {
                section.footer_reference = Some(FooterReference::new("default", create_footer_rid(1)));
            }
            docx = docx.add_paragraph(self.paragraph_shell().section_property(section));
        }
        for element in &layout.body {
            docx = self.element(docx, element)?;
        }

        if let Some(footer) = &layout.footer {
            docx = docx.footer(self.footer(footer));
        }
        let section = &mut docx.document.section_property;
        section.columns = if layout.columns >= 2 && !layout.body.is_empty() { 2 } else { 1 };
        section.space = gutter;
        if split {
            section.section_type = Some(SectionType::Continuous);
        }
        Ok(docx)
    }

    fn element(&mut self, docx: Docx, element: &LayoutElement) -> Result<Docx> {
        Ok(match element {
            LayoutElement::Paragraph(para) => docx.add_paragraph(self.paragraph(para)),
            LayoutElement::Grid(grid) => docx.add_table(self.grid(grid)),
            LayoutElement::Image(image) => docx.add_paragraph(self.image(image)?),
        })
    }

    /// Paragraph with the next id in layout order.
    fn paragraph_shell(&mut self) -> Paragraph {
        self.paragraphs += 1;
        Paragraph::new().id(format!("{:08x}", self.paragraphs))
    }

    fn paragraph(&mut self, para: &LayoutParagraph) -> Paragraph {
        let mut paragraph = self
            .paragraph_shell()
            .align(alignment(para.alignment))
            .line_spacing(
                LineSpacing::new()
                    .before(twips_pt(para.space_before))
                    .after(twips_pt(para.space_after)),
            );
        if let Some(style) = style_id(para.role) {
            paragraph = paragraph.style(style);
        }
        if matches!(
            para.role,
            Role::SectionHeading | Role::SubsectionHeading | Role::ReferencesHeading
        ) {
            paragraph = paragraph.keep_next(true);
        }
        if para.hanging_indent > 0.0 {
            let indent = twips_in(para.hanging_indent);
            paragraph = paragraph.indent(Some(indent), Some(SpecialIndentType::Hanging(indent)), None, None);
        }
        for run in &para.runs {
            paragraph = paragraph.add_run(self.run(run));
        }
        paragraph
    }

    fn run(&self, run: &StyledRun) -> Run {
        let family = if run.monospace {
            &self.layout.mono_family
        } else {
            &self.layout.font_family
        };
        text_run(&run.text, family, run.size, run.bold, run.italic)
    }

    fn grid(&mut self, grid: &LayoutGrid) -> Table {
        let layout = self.layout;
        let total = twips_in(layout.page.column_width(layout.columns)).max(0) as usize;
        let count = grid.headers.len().max(1);
        let width = total / count;

        let header = std::iter::once((true, &grid.headers));
        let body = grid.rows.iter().map(|row| (false, row));
        let mut rows = Vec::with_capacity(grid.rows.len() + 1);
        for (is_header, cells) in header.chain(body) {
            let mut row = Vec::with_capacity(cells.len());
            for cell in cells {
                let mut paragraph = self
                    .paragraph_shell()
                    .line_spacing(LineSpacing::new().before(0).after(0))
                    .align(alignment(grid.cell.alignment));
                if !cell.is_empty() {
                    paragraph = paragraph.add_run(text_run(
                        cell,
                        &layout.font_family,
                        grid.cell.size,
                        is_header || grid.cell.bold,
                        grid.cell.italic,
                    ));
                }
                row.push(TableCell::new().add_paragraph(paragraph).width(width, WidthType::Dxa));
            }
            rows.push(TableRow::new(row));
        }

        Table::new(rows)
            .set_grid(vec![width; count])
            .align(TableAlignmentType::Center)
    }

    fn image(&mut self, image: &LayoutImage) -> Result<Paragraph> {
        self.pictures += 1;
        let embedded = &image.image;
        let pic = Pic::new_with_dimensions(png_bytes(embedded)?, embedded.pixel_width, embedded.pixel_height)
            .size(emu(image.width), emu(image.height))
            .id(format!("rIdImage{}", self.pictures));

        Ok(self
            .paragraph_shell()
            .align(AlignmentType::Center)
            .line_spacing(LineSpacing::new().before(60).after(0))
            .add_run(Run::new().add_image(pic)))
    }

    /// Centered PAGE field and optional notice line.
    fn footer(&mut self, footer: &Footer) -> FooterPart {
        let layout = self.layout;
        let family = &layout.font_family;
        let mut part = FooterPart::new();
        if footer.page_numbers {
            let number = self
                .paragraph_shell()
                .align(AlignmentType::Center)
                .add_page_num(PageNum::new());
            part = part.add_paragraph(number);
        }
        if let Some(notice) = &footer.notice {
            let style = &footer.style;
            let line = self
                .paragraph_shell()
                .align(AlignmentType::Left)
                .add_run(text_run(notice, family, style.size, style.bold, style.italic));
            part = part.add_paragraph(line);
        }
        if !footer.page_numbers && footer.notice.is_none() {
            part = part.add_paragraph(self.paragraph_shell());
        }
        part
    }
}

fn text_run(text: &str, family: &str, size: f32, bold: bool, italic: bool) -> Run {
    let mut run = Run::new()
        .fonts(RunFonts::new().ascii(family).hi_ansi(family).cs(family))
        .size(half_points(size));
    if bold {
        run = run.bold();
    }
    if italic {
        run = run.italic();
    }
    for (index, line) in text.split('\n').enumerate() {
        if index > 0 {
            run = run.add_break(BreakType::TextWrapping);
        }
        run = run.add_text(line);
    }
    run
}

/// `docx-rs` pictures are PNG only; other formats are re-encoded.
fn png_bytes(embedded: &EmbeddedImage) -> Result<Vec<u8>> {
    if embedded.format == MediaFormat::Png {
        return Ok(embedded.bytes.clone());
    }
    let reencode_error = |err: image::ImageError| {
        ExportError::Container(format!(
            "cannot convert {} image to png: {err}",
            embedded.format.extension()
        ))
    };
    let decoded = image::load_from_memory(&embedded.bytes).map_err(reencode_error)?;
    let mut png = Cursor::new(Vec::new());
    decoded
        .write_to(&mut png, ImageFormat::Png)
        .map_err(reencode_error)?;
    Ok(png.into_inner())
}

fn alignment(alignment: Alignment) -> AlignmentType {
    match alignment {
        Alignment::Left => AlignmentType::Left,
        Alignment::Center => AlignmentType::Center,
        Alignment::Right => AlignmentType::Right,
        Alignment::Justify => AlignmentType::Both,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jpeg_is_reencoded_as_png() {
        let mut jpeg = Cursor::new(Vec::new());
        image::RgbImage::new(4, 3)
            .write_to(&mut jpeg, ImageFormat::Jpeg)
            .unwrap();
        let embedded = EmbeddedImage {
            bytes: jpeg.into_inner(),
            format: MediaFormat::Jpeg,
            pixel_width: 4,
            pixel_height: 3,
        };

        let png = png_bytes(&embedded).unwrap();
        assert_eq!(image::guess_format(&png).unwrap(), ImageFormat::Png);
    }

    #[test]
    fn test_corrupt_image_is_a_container_error() {
        let embedded = EmbeddedImage {
            bytes: b"not a gif".to_vec(),
            format: MediaFormat::Gif,
            pixel_width: 1,
            pixel_height: 1,
        };
        assert!(matches!(png_bytes(&embedded), Err(ExportError::Container(_))));
    }
}
