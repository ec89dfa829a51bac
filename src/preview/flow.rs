//! Reflowed HTML preview of a Word container
//!
//! Reads the container back with docx-rs and rebuilds a light HTML fragment
//! from paragraph styles, run formatting, tables and embedded media.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use quick_xml::escape::escape;
use serde::Serialize;
use std::io::{Cursor, Read};
use zip::ZipArchive;

use crate::error::PreviewError;

/// Convert DOCX bytes into an HTML fragment.
pub fn docx_to_html(bytes: &[u8]) -> Result<String, PreviewError> {
    if bytes.is_empty() {
        return Err(PreviewError::Empty);
    }
    crate::export::docx::check_container(bytes).map_err(|err| PreviewError::Flow(err.to_string()))?;

    let docx = docx_rs::read_docx(bytes).map_err(|err| PreviewError::Flow(err.to_string()))?;
    let mut media = media_data_urls(bytes)?.into_iter();

    let mut html = String::from("<div class=\"docx-flow\">\n");
    for child in &docx.document.children {
        match child {
            docx_rs::DocumentChild::Paragraph(para) => paragraph_html(&mut html, para, &mut media),
            docx_rs::DocumentChild::Table(table) => table_html(&mut html, table),
            _ => {}
        }
    }
    html.push_str("</div>\n");
    Ok(html)
}

/// Media parts as data URLs, in container order. Drawings are matched to
/// them by position.
fn media_data_urls(bytes: &[u8]) -> Result<Vec<String>, PreviewError> {
    let mut archive =
        ZipArchive::new(Cursor::new(bytes)).map_err(|err| PreviewError::Flow(err.to_string()))?;
    let mut urls = Vec::new();

    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .map_err(|err| PreviewError::Flow(err.to_string()))?;
        let name = entry.name().to_string();
        if entry.is_dir() || !name.starts_with("word/media/") {
            continue;
        }
        let mime = match name.rsplit('.').next() {
            Some("png") => "image/png",
            Some("jpeg") | Some("jpg") => "image/jpeg",
            Some("gif") => "image/gif",
            Some("bmp") => "image/bmp",
            _ => "application/octet-stream",
        };
        let mut data = Vec::new();
        entry.read_to_end(&mut data)?;
        urls.push(format!("data:{mime};base64,{}", STANDARD.encode(&data)));
    }

    Ok(urls)
}

fn paragraph_html(html: &mut String, para: &docx_rs::Paragraph, media: &mut impl Iterator<Item = String>) {
    let style = para
        .property
        .style
        .as_ref()
        .map(|style| style.val.as_str())
        .unwrap_or("Normal");
    let tag = match style {
        "Title" => "h1",
        "Heading1" | "ReferencesHeading" => "h2",
        "Heading2" => "h3",
        _ => "p",
    };
    let align = para
        .property
        .alignment
        .as_ref()
        .map(|jc| match jc.val.as_str() {
            "both" | "distribute" => "justify",
            other => other,
        });

    let mut body = String::new();
    let mut images = Vec::new();
    for child in &para.children {
        if let docx_rs::ParagraphChild::Run(run) = child {
            run_html(&mut body, run, &mut images, media);
        }
    }
    if body.trim().is_empty() && images.is_empty() {
        return;
    }

    let class = style.to_lowercase();
    html.push_str(&format!("<{tag} class=\"{class}\""));
    if let Some(align) = align {
        html.push_str(&format!(" style=\"text-align: {align};\""));
    }
    html.push_str(&format!(">{body}{}</{tag}>\n", images.join("")));
}

fn run_html(
    html: &mut String,
    run: &docx_rs::Run,
    images: &mut Vec<String>,
    media: &mut impl Iterator<Item = String>,
) {
    let props = &run.run_property;
    let mut text = String::new();
    for child in &run.children {
        match child {
            docx_rs::RunChild::Text(text_elem) => text.push_str(&escape(text_elem.text.as_str())),
            docx_rs::RunChild::Tab(_) => text.push('\t'),
            docx_rs::RunChild::Break(_) => text.push_str("<br>"),
            docx_rs::RunChild::Drawing(_) => {
                if let Some(url) = media.next() {
                    images.push(format!("<img src=\"{url}\" style=\"display: block; margin: 0 auto; max-width: 100%;\">"));
                }
            }
            _ => {}
        }
    }
    if text.is_empty() {
        return;
    }

    let mut style = String::new();
    if is_on(props.bold.as_ref()) {
        style.push_str("font-weight: bold;");
    }
    if is_on(props.italic.as_ref()) {
        style.push_str("font-style: italic;");
    }
    // w:sz is in half-points
    if let Some(size) = props.sz.as_ref().and_then(|sz| serialized(sz)).and_then(|v| v.as_f64()) {
        style.push_str(&format!("font-size: {}pt;", size / 2.0));
    }

    if style.is_empty() {
        html.push_str(&text);
    } else {
        html.push_str(&format!("<span style=\"{style}\">{text}</span>"));
    }
}

fn table_html(html: &mut String, table: &docx_rs::Table) {
    html.push_str("<table class=\"docx-table\">\n");
    for table_child in &table.rows {
        let docx_rs::TableChild::TableRow(row) = table_child;
        html.push_str("<tr>");
        for row_child in &row.cells {
            let docx_rs::TableRowChild::TableCell(cell) = row_child;
            let mut cell_text = String::new();
            for content in &cell.children {
                if let docx_rs::TableCellContent::Paragraph(para) = content {
                    for para_child in &para.children {
                        if let docx_rs::ParagraphChild::Run(run) = para_child {
                            for run_child in &run.children {
                                if let docx_rs::RunChild::Text(text_elem) = run_child {
                                    cell_text.push_str(&text_elem.text);
                                }
                            }
                        }
                    }
                }
            }
            html.push_str(&format!("<td>{}</td>", escape(cell_text.trim())));
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</table>\n");
}

/// docx-rs keeps the value of some run properties private and exposes it
/// only through `Serialize`: sizes as numbers, toggles as booleans.
fn serialized(property: &impl Serialize) -> Option<serde_json::Value> {
    serde_json::to_value(property).ok()
}

fn is_on(toggle: Option<&impl Serialize>) -> bool {
    toggle
        .and_then(|toggle| serialized(toggle))
        .and_then(|value| value.as_bool())
        .unwrap_or(false)
}

/// Wrap a fragment so it is displayed at `zoom` without re-conversion.
pub fn zoomed(fragment: &str, zoom: f32) -> String {
    format!(
        "<div class=\"flow-zoom\" style=\"transform: scale({zoom}); transform-origin: top left;\">\n{fragment}</div>\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_properties_read_through_serialize() {
        let run = docx_rs::Run::new().size(19).bold();
        let props = &run.run_property;
        assert!(is_on(props.bold.as_ref()));
        assert!(!is_on(props.italic.as_ref()));
        let size = props.sz.as_ref().and_then(|sz| serialized(sz)).and_then(|v| v.as_u64());
        assert_eq!(size, Some(19));

        let plain = docx_rs::Run::new().bold().disable_bold();
        assert!(!is_on(plain.run_property.bold.as_ref()));
    }

    #[test]
    fn test_rejects_empty_and_non_docx() {
        assert!(matches!(docx_to_html(b""), Err(PreviewError::Empty)));
        assert!(matches!(docx_to_html(b"nope"), Err(PreviewError::Flow(_))));
    }
}
