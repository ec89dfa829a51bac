//! Terminal rendering of a laid-out paper
//!
//! A quick proof-reading view: the same front matter, headings, captions and
//! grids as the DOCX, reflowed to the terminal width with bold and italic
//! carried over as SGR attributes.

use crossterm::style::{Attribute, Color as CrosstermColor, ResetColor, SetAttribute, SetForegroundColor};
use unicode_segmentation::UnicodeSegmentation;

use crate::format::{LayoutElement, LayoutGrid, LayoutImage, LayoutParagraph, PaperLayout, Role, StyledRun};
use crate::style::Alignment;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ColorDepth {
    #[default]
    Auto,
    TrueColor,
    Extended,
    Standard,
    Monochrome,
}

impl ColorDepth {
    /// `Auto` resolved from `COLORTERM` and `NO_COLOR`.
    pub fn detect() -> Self {
        if std::env::var_os("NO_COLOR").is_some() {
            return ColorDepth::Monochrome;
        }
        match std::env::var("COLORTERM").as_deref() {
            Ok("truecolor") | Ok("24bit") => ColorDepth::TrueColor,
            _ => ColorDepth::Extended,
        }
    }
}

pub struct AnsiOptions {
    pub terminal_width: usize,
    pub color_depth: ColorDepth,
}

impl Default for AnsiOptions {
    fn default() -> Self {
        Self {
            terminal_width: crossterm::terminal::size()
                .map(|(cols, _)| cols as usize)
                .ok()
                .or_else(|| std::env::var("COLUMNS").ok().and_then(|s| s.parse().ok()))
                .unwrap_or(80),
            color_depth: ColorDepth::Auto,
        }
    }
}

const HEADING_COLOR: &str = "#FFFF00";
const CAPTION_COLOR: &str = "#0066FF";
const FIGURE_COLOR: &str = "#FF00FF";
const RULE_COLOR: &str = "#666666";

pub fn render_layout(layout: &PaperLayout, options: &AnsiOptions) -> String {
    let width = options.terminal_width.clamp(20, 120);
    let mut output = String::new();

    for element in &layout.front_matter {
        write_element(&mut output, element, width, options);
    }

    output.push_str(&format!(
        "{}{}{}\n",
        format_ansi_color(Some(RULE_COLOR), options),
        "─".repeat(width.min(60)),
        format_ansi_reset()
    ));
    output.push('\n');

    for element in &layout.body {
        write_element(&mut output, element, width, options);
    }

    if let Some(footer) = &layout.footer {
        if let Some(notice) = &footer.notice {
            output.push('\n');
            output.push_str(&format!("{}\n", align_line(notice, width, Alignment::Center)));
        }
    }

    output
}

fn write_element(output: &mut String, element: &LayoutElement, width: usize, options: &AnsiOptions) {
    match element {
        LayoutElement::Paragraph(paragraph) => write_paragraph(output, paragraph, width, options),
        LayoutElement::Grid(grid) => write_grid(output, grid, options),
        LayoutElement::Image(image) => write_image(output, image, options),
    }
}

fn write_paragraph(output: &mut String, paragraph: &LayoutParagraph, width: usize, options: &AnsiOptions) {
    if paragraph.runs.iter().all(|run| run.text.trim().is_empty()) {
        return;
    }

    let color = match paragraph.role {
        Role::Title | Role::SectionHeading | Role::ReferencesHeading => Some(HEADING_COLOR),
        Role::Caption => Some(CAPTION_COLOR),
        _ => None,
    };
    let indent = if paragraph.hanging_indent > 0.0 { 4 } else { 0 };

    let lines = wrap_runs(&paragraph.runs, width.saturating_sub(indent).max(10));
    for (i, line) in lines.iter().enumerate() {
        let plain: String = line.iter().map(|(text, _)| text.as_str()).collect();
        let pad = match paragraph.alignment {
            Alignment::Center => width.saturating_sub(display_width(&plain)) / 2,
            Alignment::Right => width.saturating_sub(display_width(&plain)),
            Alignment::Left | Alignment::Justify if i > 0 => indent,
            Alignment::Left | Alignment::Justify => 0,
        };
        output.push_str(&" ".repeat(pad));
        for (text, run) in line {
            output.push_str(&format_ansi_text(text, run.bold, run.italic, color, options));
        }
        output.push('\n');
    }

    if !matches!(paragraph.role, Role::Author | Role::Reference) {
        output.push('\n');
    }
}

/// Greedy word wrap over styled runs. Each line is a list of (text, run)
/// pieces that keep their run's attributes.
fn wrap_runs(runs: &[StyledRun], width: usize) -> Vec<Vec<(String, &StyledRun)>> {
    let mut lines: Vec<Vec<(String, &StyledRun)>> = Vec::new();
    let mut line: Vec<(String, &StyledRun)> = Vec::new();
    let mut used = 0;

    for run in runs {
        for (i, segment) in run.text.split('\n').enumerate() {
            if i > 0 {
                lines.push(std::mem::take(&mut line));
                used = 0;
            }
            for word in segment.split_word_bounds() {
                let w = display_width(word);
                if used + w > width && used > 0 && !word.trim().is_empty() {
                    lines.push(std::mem::take(&mut line));
                    used = 0;
                }
                if used == 0 && word.trim().is_empty() {
                    continue;
                }
                match line.last_mut() {
                    Some((text, last)) if std::ptr::eq(*last, run) => text.push_str(word),
                    _ => line.push((word.to_string(), run)),
                }
                used += w;
            }
        }
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

fn display_width(text: &str) -> usize {
    text.graphemes(true).count()
}

fn align_line(text: &str, width: usize, alignment: Alignment) -> String {
    let pad = match alignment {
        Alignment::Center => width.saturating_sub(display_width(text)) / 2,
        Alignment::Right => width.saturating_sub(display_width(text)),
        Alignment::Left | Alignment::Justify => 0,
    };
    format!("{}{text}", " ".repeat(pad))
}

fn write_grid(output: &mut String, grid: &LayoutGrid, options: &AnsiOptions) {
    let columns = grid.headers.len();
    if columns == 0 {
        return;
    }

    let mut widths: Vec<usize> = grid.headers.iter().map(|h| display_width(h)).collect();
    for row in &grid.rows {
        for (i, cell) in row.iter().enumerate().take(columns) {
            widths[i] = widths[i].max(display_width(cell));
        }
    }

    let pad = |text: &str, width: usize| format!("{text}{}", " ".repeat(width.saturating_sub(display_width(text))));

    output.push('│');
    for (header, width) in grid.headers.iter().zip(&widths) {
        output.push_str(&format!(" {} │", format_ansi_text(&pad(header, *width), true, false, None, options)));
    }
    output.push('\n');

    output.push('├');
    let separators: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
    output.push_str(&separators.join("┼"));
    output.push_str("┤\n");

    for row in &grid.rows {
        output.push('│');
        for (cell, width) in row.iter().zip(&widths) {
            output.push_str(&format!(" {} │", pad(cell, *width)));
        }
        output.push('\n');
    }
    output.push('\n');
}

fn write_image(output: &mut String, image: &LayoutImage, options: &AnsiOptions) {
    output.push_str(&format!(
        "{}[Image: {} ({}x{} px, {:.1}in x {:.1}in)]{}\n",
        format_ansi_color(Some(FIGURE_COLOR), options),
        if image.description.is_empty() { "figure" } else { image.description.as_str() },
        image.image.pixel_width,
        image.image.pixel_height,
        image.width,
        image.height,
        format_ansi_reset()
    ));
}

fn format_ansi_text(text: &str, bold: bool, italic: bool, color: Option<&str>, options: &AnsiOptions) -> String {
    let mut result = String::new();

    if bold {
        result.push_str(&format!("{}", SetAttribute(Attribute::Bold)));
    }
    if italic {
        result.push_str(&format!("{}", SetAttribute(Attribute::Italic)));
    }
    result.push_str(&format_ansi_color(color, options));
    result.push_str(text);

    if bold || italic || color.is_some() {
        result.push_str(&format!("{}", SetAttribute(Attribute::Reset)));
        result.push_str(&format_ansi_reset());
    }

    result
}

fn format_ansi_color(color_hex: Option<&str>, options: &AnsiOptions) -> String {
    let Some(hex) = color_hex else {
        return String::new();
    };

    match convert_hex_to_crossterm_color(hex, options.color_depth) {
        Some(color) => format!("{}", SetForegroundColor(color)),
        None => String::new(),
    }
}

fn format_ansi_reset() -> String {
    format!("{ResetColor}")
}

fn convert_hex_to_crossterm_color(hex: &str, color_depth: ColorDepth) -> Option<CrosstermColor> {
    let hex = hex.trim_start_matches('#');
    if hex.len() != 6 {
        return None;
    }

    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;

    let depth = match color_depth {
        ColorDepth::Auto => ColorDepth::detect(),
        other => other,
    };
    match depth {
        ColorDepth::Monochrome => None,
        ColorDepth::Standard => Some(CrosstermColor::AnsiValue(rgb_to_ansi_16(r, g, b))),
        ColorDepth::Extended => Some(CrosstermColor::AnsiValue(rgb_to_ansi_256(r, g, b))),
        ColorDepth::TrueColor | ColorDepth::Auto => Some(CrosstermColor::Rgb { r, g, b }),
    }
}

fn rgb_to_ansi_16(r: u8, g: u8, b: u8) -> u8 {
    let base = match (r > 64, g > 64, b > 64) {
        (false, false, false) => 0,
        (false, false, true) => 4,
        (false, true, false) => 2,
        (false, true, true) => 6,
        (true, false, false) => 1,
        (true, false, true) => 5,
        (true, true, false) => 3,
        (true, true, true) => 7,
    };

    if r > 127 || g > 127 || b > 127 { base + 8 } else { base }
}

fn rgb_to_ansi_256(r: u8, g: u8, b: u8) -> u8 {
    if r == g && g == b {
        // Grayscale ramp
        if r < 8 {
            16
        } else if r > 247 {
            231
        } else {
            232 + (r - 8) / 10
        }
    } else {
        let r_index = (r as f32 / 255.0 * 5.0) as u8;
        let g_index = (g as f32 / 255.0 * 5.0) as u8;
        let b_index = (b as f32 / 255.0 * 5.0) as u8;
        16 + 36 * r_index + 6 * g_index + b_index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(text: &str, bold: bool) -> StyledRun {
        StyledRun {
            text: text.to_string(),
            size: 9.0,
            bold,
            italic: false,
            monospace: false,
        }
    }

    #[test]
    fn test_wrap_respects_width() {
        let runs = vec![run("alpha beta gamma delta epsilon", false)];
        let lines = wrap_runs(&runs, 12);
        for line in &lines {
            let text: String = line.iter().map(|(t, _)| t.as_str()).collect();
            assert!(display_width(&text) <= 12, "line too wide: {text:?}");
        }
        let joined: Vec<String> = lines
            .iter()
            .map(|line| line.iter().map(|(t, _)| t.as_str()).collect::<String>().trim().to_string())
            .collect();
        assert_eq!(joined.join(" "), "alpha beta gamma delta epsilon");
    }

    #[test]
    fn test_wrap_keeps_run_attributes() {
        let runs = vec![run("Abstract—", true), run("We study things.", false)];
        let lines = wrap_runs(&runs, 80);
        assert_eq!(lines.len(), 1);
        assert!(lines[0][0].1.bold);
        assert!(!lines[0].last().map(|(_, r)| r.bold).unwrap_or(true));
    }

    #[test]
    fn test_monochrome_has_no_color() {
        let options = AnsiOptions {
            terminal_width: 80,
            color_depth: ColorDepth::Monochrome,
        };
        assert_eq!(format_ansi_color(Some("#FF0000"), &options), "");
    }

    #[test]
    fn test_rgb_to_ansi_256_grayscale() {
        assert_eq!(rgb_to_ansi_256(0, 0, 0), 16);
        assert_eq!(rgb_to_ansi_256(255, 255, 255), 231);
    }
}
