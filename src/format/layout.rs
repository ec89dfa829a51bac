//! Layout engine
//!
//! Walks a paper in reading order and produces a flat list of styled
//! elements. Every output format renders from this list, so numbering,
//! typography and the fatal-content checks are decided exactly once.

use std::collections::HashSet;

use crate::document::*;
use crate::error::{BlockLocation, ExportError, Result};
use crate::style::{Alignment, PageLayout, StyleSheet, TextStyle};

use super::media::{EmbeddedImage, decode_image, display_size};
use super::numbering::{self, FloatCounters};
use super::typography::{self, clean_text};

/// A paper laid out for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct PaperLayout {
    pub title: String,
    pub columns: u8,
    pub font_family: String,
    pub mono_family: String,
    pub page: PageLayout,
    /// Title, authors, abstract and keywords; always single column.
    pub front_matter: Vec<LayoutElement>,
    /// Sections, floats and references; set in `columns` columns.
    pub body: Vec<LayoutElement>,
    pub footer: Option<Footer>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LayoutElement {
    Paragraph(LayoutParagraph),
    Grid(LayoutGrid),
    Image(LayoutImage),
}

/// What a paragraph is, independent of how it is styled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Title,
    Author,
    Affiliation,
    Abstract,
    Keywords,
    SectionHeading,
    SubsectionHeading,
    Body,
    Caption,
    Latex,
    ReferencesHeading,
    Reference,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StyledRun {
    pub text: String,
    pub size: f32,
    pub bold: bool,
    pub italic: bool,
    pub monospace: bool,
}

impl StyledRun {
    fn new(text: impl Into<String>, style: &TextStyle) -> Self {
        StyledRun {
            text: text.into(),
            size: style.size,
            bold: style.bold,
            italic: style.italic,
            monospace: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutParagraph {
    pub role: Role,
    pub runs: Vec<StyledRun>,
    pub alignment: Alignment,
    /// Points
    pub space_before: f32,
    /// Points
    pub space_after: f32,
    /// Inches; zero for none
    pub hanging_indent: f32,
}

impl LayoutParagraph {
    fn styled(role: Role, style: &TextStyle, runs: Vec<StyledRun>) -> Self {
        LayoutParagraph {
            role,
            runs,
            alignment: style.alignment,
            space_before: style.space_before,
            space_after: style.space_after,
            hanging_indent: 0.0,
        }
    }

    fn single(role: Role, style: &TextStyle, text: impl Into<String>) -> Self {
        Self::styled(role, style, vec![StyledRun::new(text, style)])
    }

    /// Concatenated run text.
    pub fn text(&self) -> String {
        self.runs.iter().map(|run| run.text.as_str()).collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutGrid {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub cell: TextStyle,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutImage {
    pub image: EmbeddedImage,
    /// Inches
    pub width: f32,
    /// Inches
    pub height: f32,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Footer {
    pub page_numbers: bool,
    pub notice: Option<String>,
    pub style: TextStyle,
}

/// Lay out `document` with `style`. The document is only read.
pub fn layout(document: &Document, style: &StyleSheet) -> Result<PaperLayout> {
    let mut builder = LayoutBuilder::new(document, style);
    let front_matter = builder.front_matter();
    builder.sections()?;
    builder.trailing_floats()?;
    builder.references();

    let settings = &document.settings;
    let footer = (settings.include_page_numbers || settings.include_copyright).then(|| Footer {
        page_numbers: settings.include_page_numbers,
        notice: settings
            .include_copyright
            .then(|| style.copyright_notice.clone()),
        style: style.footer,
    });

    tracing::debug!(
        front = front_matter.len(),
        body = builder.body.len(),
        "laid out paper"
    );

    Ok(PaperLayout {
        title: clean_text(document.title.trim()),
        columns: settings.column_count(),
        font_family: style.font_family.clone(),
        mono_family: style.mono_family.clone(),
        page: style.page,
        front_matter,
        body: builder.body,
        footer,
    })
}

struct LayoutBuilder<'a> {
    document: &'a Document,
    style: &'a StyleSheet,
    body_style: TextStyle,
    columns: u8,
    counters: FloatCounters,
    placed_figures: HashSet<&'a str>,
    body: Vec<LayoutElement>,
}

impl<'a> LayoutBuilder<'a> {
    fn new(document: &'a Document, style: &'a StyleSheet) -> Self {
        LayoutBuilder {
            document,
            style,
            body_style: style.body_for(&document.settings),
            columns: document.settings.column_count(),
            counters: FloatCounters::new(),
            placed_figures: HashSet::new(),
            body: Vec::new(),
        }
    }

    fn front_matter(&self) -> Vec<LayoutElement> {
        let style = self.style;
        let document = self.document;
        let mut out = Vec::new();

        let title = clean_text(document.title.trim());
        if !title.is_empty() {
            out.push(paragraph(LayoutParagraph::single(Role::Title, &style.title, title)));
        }

        let names = typography::author_runs(&document.authors);
        if !names.is_empty() {
            let runs = names
                .into_iter()
                .map(|name| StyledRun::new(name, &style.author))
                .collect();
            out.push(paragraph(LayoutParagraph::styled(Role::Author, &style.author, runs)));
        }

        for author in &document.authors {
            let affiliation = typography::affiliation_line(author);
            let lines = std::iter::once(affiliation).chain(typography::contact_lines(author));
            for line in lines.filter(|line| !line.is_empty()) {
                out.push(paragraph(LayoutParagraph::single(
                    Role::Affiliation,
                    &style.affiliation,
                    line,
                )));
            }
        }

        let labels = &style.labels;
        if let Some(para) = self.lead_in_paragraph(Role::Abstract, &labels.abstract_heading, &document.abstract_text) {
            out.push(paragraph(para));
        }
        if let Some(para) = self.lead_in_paragraph(Role::Keywords, &labels.keywords_heading, &document.keywords) {
            out.push(paragraph(para));
        }

        out
    }

    /// `"Abstract—"` in the lead-in style followed by the body text in one paragraph.
    fn lead_in_paragraph(&self, role: Role, heading: &str, text: &str) -> Option<LayoutParagraph> {
        let text = typography::paragraphs(text).join(" ");
        if text.is_empty() {
            return None;
        }
        let body = &self.style.abstract_body;
        let runs = vec![
            StyledRun::new(typography::lead_in(heading), &self.style.lead_in),
            StyledRun::new(text, body),
        ];
        Some(LayoutParagraph::styled(role, body, runs))
    }

    fn sections(&mut self) -> Result<()> {
        let document = self.document;
        for (index, section) in document.sections.iter().enumerate() {
            let heading = numbering::section_label(index + 1, &clean_text(&section.title));
            self.body.push(paragraph(LayoutParagraph::single(
                Role::SectionHeading,
                &self.style.section_heading,
                heading,
            )));

            self.blocks(index + 1, section, None, &section.content_blocks, &section.content)?;

            for (sub_index, sub) in section.subsections.iter().enumerate() {
                let heading = numbering::subsection_label(sub_index + 1, &clean_text(&sub.title));
                self.body.push(paragraph(LayoutParagraph::single(
                    Role::SubsectionHeading,
                    &self.style.subsection_heading,
                    heading,
                )));
                self.blocks(index + 1, section, Some(sub_index + 1), &sub.content_blocks, &sub.content)?;
            }
        }
        Ok(())
    }

    fn blocks(
        &mut self,
        section_index: usize,
        section: &Section,
        subsection: Option<usize>,
        blocks: &'a [ContentBlock],
        legacy_content: &str,
    ) -> Result<()> {
        if blocks.is_empty() {
            self.body_text(legacy_content);
            return Ok(());
        }

        for (block_index, block) in blocks.iter().enumerate() {
            let location = BlockLocation::Block {
                section: section_index,
                section_title: section.title.clone(),
                subsection,
                block: block_index + 1,
                block_id: block.id.clone(),
            };
            self.block(block, location)?;
        }
        Ok(())
    }

    fn block(&mut self, block: &'a ContentBlock, location: BlockLocation) -> Result<()> {
        match &block.kind {
            BlockKind::Text(text) => {
                self.body_text(&text.content);
                if let Some(image) = &text.attachment {
                    self.figure(&image.data, &image.caption, image.size, location)?;
                }
            }
            BlockKind::Image(image) => {
                self.figure(&image.data, &image.caption, image.size, location)?;
            }
            BlockKind::FigureReference { figure_id } => {
                let document = self.document;
                let figure = document.figure(figure_id).ok_or_else(|| ExportError::MissingFigure {
                    location: location.clone(),
                    figure_id: figure_id.clone(),
                })?;
                if self.placed_figures.insert(figure.id.as_str()) {
                    self.figure(&figure.data, &figure.caption, figure.size, location)?;
                } else {
                    tracing::debug!(figure = %figure_id, "figure already placed, skipping repeat reference");
                }
            }
            BlockKind::Table(table) => {
                self.table(&table.content, &table.table_name, &table.caption, location)?;
            }
            BlockKind::Unrecognized { kind, .. } => {
                return Err(ExportError::UnrecognizedBlock {
                    location,
                    kind: kind.clone(),
                });
            }
        }
        Ok(())
    }

    fn body_text(&mut self, text: &str) {
        for para in typography::paragraphs(text) {
            self.body.push(paragraph(LayoutParagraph::single(Role::Body, &self.body_style, para)));
        }
    }

    /// Image followed by its `"Fig. n."` caption.
    fn figure(&mut self, data: &str, caption: &str, size: ImageSize, location: BlockLocation) -> Result<()> {
        if data.trim().is_empty() {
            return Err(ExportError::MissingContent {
                location,
                what: "image data",
            });
        }
        let image = decode_image(data).map_err(|reason| ExportError::InvalidImage {
            location: location.clone(),
            reason,
        })?;
        let (width, height) = display_size(&image, size, self.style, self.columns);
        let caption = clean_text(caption.trim());
        let label = self.counters.next_figure(&self.style.labels);

        self.body.push(LayoutElement::Image(LayoutImage {
            image,
            width,
            height,
            description: if caption.is_empty() { label.clone() } else { caption.clone() },
        }));

        let caption_style = &self.style.caption;
        let mut runs = vec![StyledRun::new(label, caption_style)];
        if !caption.is_empty() {
            runs.push(StyledRun::new(format!(" {caption}"), caption_style));
        }
        self.body.push(paragraph(LayoutParagraph::styled(Role::Caption, caption_style, runs)));
        Ok(())
    }

    /// `"TABLE n"` and title above the table body.
    fn table(&mut self, content: &TableContent, name: &str, caption: &str, location: BlockLocation) -> Result<()> {
        let element = match content {
            TableContent::Interactive(table) => LayoutElement::Grid(grid(table, &self.style.table_cell, &location)?),
            TableContent::Image(table) => {
                if table.data.trim().is_empty() {
                    return Err(ExportError::MissingContent {
                        location,
                        what: "table image data",
                    });
                }
                let image = decode_image(&table.data).map_err(|reason| ExportError::InvalidImage {
                    location: location.clone(),
                    reason,
                })?;
                let (width, height) = display_size(&image, ImageSize::Large, self.style, self.columns);
                LayoutElement::Image(LayoutImage {
                    image,
                    width,
                    height,
                    description: clean_text(name.trim()),
                })
            }
            TableContent::Latex(table) => {
                if table.latex_code.trim().is_empty() {
                    return Err(ExportError::MissingContent {
                        location,
                        what: "LaTeX code",
                    });
                }
                paragraph(self.latex_paragraph(&table.latex_code))
            }
            TableContent::Unknown(kind) => {
                let reason = if kind.is_empty() {
                    "table kind is missing".to_string()
                } else {
                    format!("unknown table kind '{kind}'")
                };
                return Err(ExportError::MalformedTable { location, reason });
            }
        };

        let caption_style = &self.style.caption;
        let label = self.counters.next_table(&self.style.labels);
        self.body.push(paragraph(LayoutParagraph::single(Role::Caption, caption_style, label)));

        let title = [name.trim(), caption.trim()]
            .iter()
            .filter(|part| !part.is_empty())
            .map(|part| clean_text(part))
            .collect::<Vec<_>>()
            .join(". ");
        if !title.is_empty() {
            self.body.push(paragraph(LayoutParagraph::single(Role::Caption, caption_style, title)));
        }

        self.body.push(element);
        Ok(())
    }

    fn latex_paragraph(&self, code: &str) -> LayoutParagraph {
        let style = &self.style.latex;
        let mut run = StyledRun::new(clean_text(code.trim()), style);
        run.monospace = true;
        LayoutParagraph::styled(Role::Latex, style, vec![run])
    }

    /// Figures never referenced from a block, then standalone tables.
    fn trailing_floats(&mut self) -> Result<()> {
        let document = self.document;
        for figure in &document.figures {
            if self.placed_figures.contains(figure.id.as_str()) {
                continue;
            }
            let location = BlockLocation::Figure {
                figure_id: figure.id.clone(),
            };
            self.placed_figures.insert(figure.id.as_str());
            self.figure(&figure.data, &figure.caption, figure.size, location)?;
        }

        for (index, table) in document.tables.iter().enumerate() {
            let location = BlockLocation::StandaloneTable {
                index: index + 1,
                table_id: table.id.clone(),
            };
            self.table(&table.content, &table.table_name, &table.caption, location)?;
        }
        Ok(())
    }

    fn references(&mut self) {
        let document = self.document;
        let listed = numbering::ordered_references(&document.references);
        if listed.is_empty() {
            return;
        }

        let style = self.style;
        self.body.push(paragraph(LayoutParagraph::single(
            Role::ReferencesHeading,
            &style.references_heading,
            style.labels.references_heading.clone(),
        )));
        for reference in listed {
            let mut para = LayoutParagraph::single(
                Role::Reference,
                &style.reference,
                clean_text(&numbering::reference_entry(reference)),
            );
            para.hanging_indent = style.page.hanging_indent;
            self.body.push(paragraph(para));
        }
    }
}

fn paragraph(para: LayoutParagraph) -> LayoutElement {
    LayoutElement::Paragraph(para)
}

fn grid(table: &InteractiveTable, cell: &TextStyle, location: &BlockLocation) -> Result<LayoutGrid> {
    let malformed = |reason: String| ExportError::MalformedTable {
        location: location.clone(),
        reason,
    };

    if table.headers.is_empty() {
        return Err(malformed("interactive table has no headers".to_string()));
    }
    if let Some((index, row)) = table
        .table_data
        .iter()
        .enumerate()
        .find(|(_, row)| row.len() != table.headers.len())
    {
        return Err(malformed(format!(
            "row {} has {} cells but there are {} headers",
            index + 1,
            row.len(),
            table.headers.len()
        )));
    }

    Ok(LayoutGrid {
        headers: table.headers.iter().map(|h| clean_text(h.trim())).collect(),
        rows: table
            .table_data
            .iter()
            .map(|row| row.iter().map(|c| clean_text(c.trim())).collect())
            .collect(),
        cell: *cell,
    })
}

impl PaperLayout {
    /// Every paragraph in reading order, front matter first.
    pub fn paragraphs(&self) -> impl Iterator<Item = &LayoutParagraph> {
        self.front_matter
            .iter()
            .chain(self.body.iter())
            .filter_map(|element| match element {
                LayoutElement::Paragraph(para) => Some(para),
                _ => None,
            })
    }

    pub fn paragraphs_with_role(&self, role: Role) -> impl Iterator<Item = &LayoutParagraph> {
        self.paragraphs().filter(move |para| para.role == role)
    }

    pub fn images(&self) -> impl Iterator<Item = &LayoutImage> {
        self.body.iter().filter_map(|element| match element {
            LayoutElement::Image(image) => Some(image),
            _ => None,
        })
    }
}
