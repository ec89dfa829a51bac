//! Browser-previewable mirror of the DOCX rendering
//!
//! Renders the same [`PaperLayout`] the Word writer consumes, so the two
//! outputs agree on numbering, wording and styling.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use quick_xml::escape::escape;

use crate::format::{LayoutElement, LayoutGrid, LayoutImage, LayoutParagraph, PaperLayout, Role, StyledRun};
use crate::style::Alignment;

/// A complete HTML page.
pub fn render_page(layout: &PaperLayout) -> String {
    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str(&format!("<title>{}</title>\n", escape(layout.title.as_str())));
    html.push_str(&format!("<style>\n{}</style>\n", stylesheet(layout)));
    html.push_str("</head>\n<body>\n");
    html.push_str(&render_fragment(layout));
    html.push_str("</body>\n</html>\n");
    html
}

/// The paper as an embeddable `<article>` element.
pub fn render_fragment(layout: &PaperLayout) -> String {
    let mut html = String::from("<article class=\"paper\">\n<header class=\"front-matter\">\n");
    for element in &layout.front_matter {
        element_html(&mut html, element);
    }
    html.push_str(&format!("</header>\n<main class=\"body columns-{}\">\n", layout.columns));
    for element in &layout.body {
        element_html(&mut html, element);
    }
    html.push_str("</main>\n");
    if let Some(footer) = &layout.footer {
        html.push_str("<footer>");
        if footer.page_numbers {
            html.push_str("<span class=\"page-number\">1</span>");
        }
        if let Some(notice) = &footer.notice {
            html.push_str(&format!("<span class=\"notice\">{}</span>", escape(notice.as_str())));
        }
        html.push_str("</footer>\n");
    }
    html.push_str("</article>\n");
    html
}

fn stylesheet(layout: &PaperLayout) -> String {
    let page = &layout.page;
    format!(
        concat!(
            ".paper {{ font-family: \"{font}\", serif; width: {width}in; margin: 0 auto; padding: {margin}in; box-sizing: border-box; }}\n",
            ".paper p {{ margin: 0; }}\n",
            ".body.columns-2 {{ column-count: 2; column-gap: {gutter}in; }}\n",
            ".paper table {{ border-collapse: collapse; margin: 0 auto; break-inside: avoid; }}\n",
            ".paper td, .paper th {{ border: 1px solid #000; padding: 1pt 4pt; }}\n",
            ".paper figure {{ margin: 4pt 0 0; text-align: center; break-inside: avoid; }}\n",
            ".paper .latex {{ font-family: \"{mono}\", monospace; white-space: pre-wrap; }}\n",
            ".paper footer {{ text-align: center; font-size: 8pt; margin-top: 12pt; }}\n"
        ),
        font = layout.font_family,
        mono = layout.mono_family,
        width = page.width,
        margin = page.margin,
        gutter = page.gutter,
    )
}

fn element_html(html: &mut String, element: &LayoutElement) {
    match element {
        LayoutElement::Paragraph(para) => paragraph_html(html, para),
        LayoutElement::Grid(grid) => grid_html(html, grid),
        LayoutElement::Image(image) => image_html(html, image),
    }
}

fn paragraph_html(html: &mut String, para: &LayoutParagraph) {
    let (tag, class) = match para.role {
        Role::Title => ("h1", "title"),
        Role::SectionHeading => ("h2", "section-heading"),
        Role::SubsectionHeading => ("h3", "subsection-heading"),
        Role::ReferencesHeading => ("h2", "references-heading"),
        Role::Author => ("p", "author"),
        Role::Affiliation => ("p", "affiliation"),
        Role::Abstract => ("p", "abstract"),
        Role::Keywords => ("p", "keywords"),
        Role::Caption => ("p", "caption"),
        Role::Latex => ("div", "latex"),
        Role::Reference => ("p", "reference"),
        Role::Body => ("p", "body"),
    };

    let mut style = format!(
        "text-align: {}; margin-top: {}pt; margin-bottom: {}pt;",
        text_align(para.alignment),
        para.space_before,
        para.space_after
    );
    if para.hanging_indent > 0.0 {
        style.push_str(&format!(
            " padding-left: {0}in; text-indent: -{0}in;",
            para.hanging_indent
        ));
    }

    html.push_str(&format!("<{tag} class=\"{class}\" style=\"{style}\">"));
    if para.role == Role::Latex {
        let code: String = para.runs.iter().map(|run| run.text.as_str()).collect();
        html.push_str(&format!("\\[{}\\]", escape(code.as_str())));
    } else {
        for run in &para.runs {
            run_html(html, run);
        }
    }
    html.push_str(&format!("</{tag}>\n"));
}

fn run_html(html: &mut String, run: &StyledRun) {
    let mut style = format!("font-size: {}pt;", run.size);
    if run.bold {
        style.push_str(" font-weight: bold;");
    }
    if run.italic {
        style.push_str(" font-style: italic;");
    }
    let text = escape(run.text.as_str()).replace('\n', "<br>");
    html.push_str(&format!("<span style=\"{style}\">{text}</span>"));
}

fn grid_html(html: &mut String, grid: &LayoutGrid) {
    let cell_style = format!(
        "font-size: {}pt; text-align: {};",
        grid.cell.size,
        text_align(grid.cell.alignment)
    );
    html.push_str("<table>\n<thead><tr>");
    for header in &grid.headers {
        html.push_str(&format!("<th style=\"{cell_style}\">{}</th>", escape(header.as_str())));
    }
    html.push_str("</tr></thead>\n<tbody>\n");
    for row in &grid.rows {
        html.push_str("<tr>");
        for cell in row {
            html.push_str(&format!("<td style=\"{cell_style}\">{}</td>", escape(cell.as_str())));
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</tbody>\n</table>\n");
}

fn image_html(html: &mut String, image: &LayoutImage) {
    html.push_str(&format!(
        "<figure><img src=\"data:{};base64,{}\" alt=\"{}\" style=\"width: {}in; height: {}in;\"></figure>\n",
        image.image.format.mime_type(),
        STANDARD.encode(&image.image.bytes),
        escape(image.description.as_str()),
        image.width,
        image.height
    ));
}

fn text_align(alignment: Alignment) -> &'static str {
    match alignment {
        Alignment::Left => "left",
        Alignment::Center => "center",
        Alignment::Right => "right",
        Alignment::Justify => "justify",
    }
}
