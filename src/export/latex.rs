//! IEEEtran LaTeX source export
//!
//! LaTeX numbers sections, floats and citations itself, so this writer walks
//! the paper directly instead of the pre-numbered layout. Figure images are
//! returned as assets to be saved next to the `.tex` file.

use std::collections::HashSet;

use crate::document::*;
use crate::error::{BlockLocation, ExportError, Result};
use crate::format::media::decode_image;
use crate::format::numbering::ordered_references;
use crate::format::typography::{self, clean_text};
use crate::style::StyleSheet;

/// File written alongside the LaTeX source.
#[derive(Debug, Clone, PartialEq)]
pub struct Asset {
    pub name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LatexExport {
    pub source: String,
    pub assets: Vec<Asset>,
}

const PREAMBLE: &str = r"\documentclass[conference]{IEEEtran}
\IEEEoverridecommandlockouts
\usepackage{cite}
\usepackage{amsmath,amssymb,amsfonts}
\usepackage{graphicx}
\usepackage{textcomp}
\usepackage{xcolor}

\begin{document}
";

/// Escape text for a LaTeX paragraph.
pub fn escape_latex(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in clean_text(text).chars() {
        match c {
            '\\' => out.push_str(r"\textbackslash{}"),
            '&' | '%' | '$' | '#' | '_' | '{' | '}' => {
                out.push('\\');
                out.push(c);
            }
            '~' => out.push_str(r"\textasciitilde{}"),
            '^' => out.push_str(r"\textasciicircum{}"),
            '\u{2014}' => out.push_str("---"),
            _ => out.push(c),
        }
    }
    out
}

pub fn render(document: &Document, style: &StyleSheet) -> Result<LatexExport> {
    let mut writer = LatexWriter {
        document,
        style,
        out: String::from(PREAMBLE),
        assets: Vec::new(),
        placed_figures: HashSet::new(),
    };
    writer.front_matter();
    writer.sections()?;
    writer.trailing_floats()?;
    writer.bibliography();
    writer.out.push_str("\n\\end{document}\n");

    Ok(LatexExport {
        source: writer.out,
        assets: writer.assets,
    })
}

struct LatexWriter<'a> {
    document: &'a Document,
    style: &'a StyleSheet,
    out: String,
    assets: Vec<Asset>,
    placed_figures: HashSet<&'a str>,
}

impl<'a> LatexWriter<'a> {
    fn front_matter(&mut self) {
        let document = self.document;
        self.out.push_str(&format!("\n\\title{{{}}}\n\n", escape_latex(document.title.trim())));

        let blocks: Vec<String> = document
            .authors
            .iter()
            .filter(|author| !author.name.trim().is_empty())
            .map(|author| {
                let mut lines = Vec::new();
                let affiliation = typography::affiliation_line(author);
                if !affiliation.is_empty() {
                    lines.push(format!("\\textit{{{}}}", escape_latex(&affiliation)));
                }
                lines.extend(typography::contact_lines(author).iter().map(|line| escape_latex(line)));
                format!(
                    "\\IEEEauthorblockN{{{}}}\n\\IEEEauthorblockA{{{}}}",
                    escape_latex(author.name.trim()),
                    lines.join(" \\\\\n")
                )
            })
            .collect();
        if !blocks.is_empty() {
            self.out.push_str(&format!("\\author{{{}}}\n\n", blocks.join("\n\\and\n")));
        }
        self.out.push_str("\\maketitle\n");

        let abstract_text = typography::paragraphs(&document.abstract_text).join(" ");
        if !abstract_text.is_empty() {
            self.out.push_str(&format!(
                "\n\\begin{{abstract}}\n{}\n\\end{{abstract}}\n",
                escape_latex(&abstract_text)
            ));
        }
        let keywords = typography::paragraphs(&document.keywords).join(" ");
        if !keywords.is_empty() {
            self.out.push_str(&format!(
                "\n\\begin{{IEEEkeywords}}\n{}\n\\end{{IEEEkeywords}}\n",
                escape_latex(&keywords)
            ));
        }
    }

    fn sections(&mut self) -> Result<()> {
        let document = self.document;
        for (index, section) in document.sections.iter().enumerate() {
            self.out.push_str(&format!("\n\\section{{{}}}\n", escape_latex(section.title.trim())));
            self.blocks(index + 1, section, None, &section.content_blocks, &section.content)?;
            for (sub_index, sub) in section.subsections.iter().enumerate() {
                self.out.push_str(&format!("\n\\subsection{{{}}}\n", escape_latex(sub.title.trim())));
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
            self.text(legacy_content);
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
            match &block.kind {
                BlockKind::Text(text) => {
                    self.text(&text.content);
                    if let Some(image) = &text.attachment {
                        self.figure(&image.data, &image.caption, image.size, location)?;
                    }
                }
                BlockKind::Image(image) => self.figure(&image.data, &image.caption, image.size, location)?,
                BlockKind::FigureReference { figure_id } => {
                    let document = self.document;
                    let figure = document.figure(figure_id).ok_or_else(|| ExportError::MissingFigure {
                        location: location.clone(),
                        figure_id: figure_id.clone(),
                    })?;
                    if self.placed_figures.insert(figure.id.as_str()) {
                        self.figure(&figure.data, &figure.caption, figure.size, location)?;
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
        }
        Ok(())
    }

    fn text(&mut self, text: &str) {
        for para in typography::paragraphs(text) {
            self.out.push_str(&format!("\n{}\n", escape_latex(&para)));
        }
    }

    fn asset(&mut self, data: &str, location: &BlockLocation) -> Result<String> {
        let image = decode_image(data).map_err(|reason| ExportError::InvalidImage {
            location: location.clone(),
            reason,
        })?;
        let name = format!("figure_{}.{}", self.assets.len() + 1, image.format.extension());
        self.assets.push(Asset {
            name: name.clone(),
            bytes: image.bytes,
        });
        Ok(name)
    }

    fn figure(&mut self, data: &str, caption: &str, size: ImageSize, location: BlockLocation) -> Result<()> {
        if data.trim().is_empty() {
            return Err(ExportError::MissingContent {
                location,
                what: "image data",
            });
        }
        let name = self.asset(data, &location)?;
        let width = self.style.figures.width(size);
        self.out.push_str(&format!(
            "\n\\begin{{figure}}[htbp]\n\\centering\n\\includegraphics[width={width}in]{{{name}}}\n"
        ));
        let caption = caption.trim();
        if !caption.is_empty() {
            self.out.push_str(&format!("\\caption{{{}}}\n", escape_latex(caption)));
        }
        self.out.push_str("\\end{figure}\n");
        Ok(())
    }

    fn table(&mut self, content: &TableContent, name: &str, caption: &str, location: BlockLocation) -> Result<()> {
        let body = match content {
            TableContent::Interactive(table) => {
                if table.headers.is_empty() || !table.is_rectangular() {
                    return Err(ExportError::MalformedTable {
                        location,
                        reason: "rows do not match the headers".to_string(),
                    });
                }
                let column_format = "|c".repeat(table.headers.len()) + "|";
                let mut tabular = format!("\\begin{{tabular}}{{{column_format}}}\n\\hline\n");
                let header: Vec<String> = table
                    .headers
                    .iter()
                    .map(|h| format!("\\textbf{{{}}}", escape_latex(h.trim())))
                    .collect();
                tabular.push_str(&format!("{} \\\\\n\\hline\n", header.join(" & ")));
                for row in &table.table_data {
                    let cells: Vec<String> = row.iter().map(|c| escape_latex(c.trim())).collect();
                    tabular.push_str(&format!("{} \\\\\n\\hline\n", cells.join(" & ")));
                }
                tabular.push_str("\\end{tabular}");
                tabular
            }
            TableContent::Image(table) => {
                if table.data.trim().is_empty() {
                    return Err(ExportError::MissingContent {
                        location,
                        what: "table image data",
                    });
                }
                let asset = self.asset(&table.data, &location)?;
                format!("\\includegraphics[width=\\columnwidth]{{{asset}}}")
            }
            TableContent::Latex(table) => {
                if table.latex_code.trim().is_empty() {
                    return Err(ExportError::MissingContent {
                        location,
                        what: "LaTeX code",
                    });
                }
                clean_text(table.latex_code.trim())
            }
            TableContent::Unknown(kind) => {
                return Err(ExportError::MalformedTable {
                    location,
                    reason: format!("unknown table kind '{kind}'"),
                });
            }
        };

        let title = [name.trim(), caption.trim()]
            .iter()
            .filter(|part| !part.is_empty())
            .map(|part| escape_latex(part))
            .collect::<Vec<_>>()
            .join(". ");
        self.out.push_str("\n\\begin{table}[htbp]\n");
        if !title.is_empty() {
            self.out.push_str(&format!("\\caption{{{title}}}\n"));
        }
        self.out.push_str(&format!("\\centering\n{body}\n\\end{{table}}\n"));
        Ok(())
    }

    fn trailing_floats(&mut self) -> Result<()> {
        let document = self.document;
        for figure in &document.figures {
            if !self.placed_figures.insert(figure.id.as_str()) {
                continue;
            }
            let location = BlockLocation::Figure {
                figure_id: figure.id.clone(),
            };
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

    fn bibliography(&mut self) {
        let document = self.document;
        let listed = ordered_references(&document.references);
        if listed.is_empty() {
            return;
        }
        self.out.push_str(&format!("\n\\begin{{thebibliography}}{{{}}}\n", listed.len()));
        for reference in listed {
            self.out.push_str(&format!(
                "\\bibitem[{0}]{{ref{0}}} {1}\n",
                reference.order,
                escape_latex(reference.text.trim())
            ));
        }
        self.out.push_str("\\end{thebibliography}\n");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_latex() {
        assert_eq!(escape_latex("50% of $x_1$ & more"), r"50\% of \$x\_1\$ \& more");
        assert_eq!(escape_latex(r"a\b"), r"a\textbackslash{}b");
    }
}
