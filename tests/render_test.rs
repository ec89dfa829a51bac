use ieeepaper::ansi::{AnsiOptions, ColorDepth, render_layout};
use ieeepaper::document::{Document, parse_document};
use ieeepaper::format::Role;
use ieeepaper::style::Alignment;
use ieeepaper::{ExportFormat, Exporter, StyleSheet, sanitize_document};
use tempfile::TempDir;

fn fixture() -> Document {
    sanitize_document(&parse_document(include_str!("fixtures/paper.json")).unwrap())
}

#[test]
fn test_style_sheet_round_trips_through_toml() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("style.toml");

    let mut sheet = StyleSheet::ieee();
    sheet.font_family = "Nimbus Roman".to_string();
    sheet.title.size = 22.0;
    sheet.labels.references_heading = "Bibliography".to_string();
    sheet.save_to(&path).unwrap();

    let loaded = StyleSheet::load_from(&path).unwrap();
    assert_eq!(loaded, sheet);
}

#[test]
fn test_invalid_style_sheet_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("style.toml");
    std::fs::write(&path, "title = 12").unwrap();

    let err = StyleSheet::load_from(&path).unwrap_err();
    assert!(err.to_string().contains("Invalid style sheet"));
}

#[test]
fn test_custom_style_drives_layout() {
    let mut sheet = StyleSheet::ieee();
    sheet.title.size = 20.0;
    sheet.title.alignment = Alignment::Left;
    sheet.labels.references_heading = "Bibliography".to_string();

    let layout = Exporter::new(sheet).layout(&fixture()).unwrap();
    let title = layout.paragraphs_with_role(Role::Title).next().unwrap();
    assert_eq!(title.runs[0].size, 20.0);
    assert_eq!(title.alignment, Alignment::Left);
    assert_eq!(layout.font_family, "Times New Roman");

    let heading = layout
        .paragraphs_with_role(Role::ReferencesHeading)
        .next()
        .unwrap();
    assert_eq!(heading.text(), "Bibliography");
}

#[test]
fn test_front_matter_lines() {
    let layout = Exporter::default().layout(&fixture()).unwrap();

    let author = layout.paragraphs_with_role(Role::Author).next().unwrap();
    let names: Vec<&str> = author.runs.iter().map(|r| r.text.as_str()).collect();
    assert_eq!(names, vec!["Ada Lovelace", ", Alan Turing"]);

    let affiliations: Vec<String> = layout
        .paragraphs_with_role(Role::Affiliation)
        .map(|p| p.text())
        .collect();
    assert_eq!(
        affiliations,
        vec![
            "MIT, MA",
            "ada@example.edu",
            "0000-0002-1825-0097",
            "Computer Laboratory, University of Cambridge, Cambridge",
        ]
    );

    let abstract_para = layout.paragraphs_with_role(Role::Abstract).next().unwrap();
    assert_eq!(abstract_para.runs[0].text, "Abstract\u{2014}");
    assert!(abstract_para.runs[0].bold && abstract_para.runs[0].italic);
    assert_eq!(
        abstract_para.runs[1].text,
        "We present a scheduler for small clusters. It adapts to load."
    );

    let keywords = layout.paragraphs_with_role(Role::Keywords).next().unwrap();
    assert_eq!(keywords.runs[0].text, "Index Terms\u{2014}");
}

#[test]
fn test_ansi_preview_shows_paper() {
    let layout = Exporter::default().layout(&fixture()).unwrap();
    let options = AnsiOptions {
        terminal_width: 80,
        color_depth: ColorDepth::TrueColor,
    };
    let output = render_layout(&layout, &options);

    assert!(output.contains("Adaptive Scheduling for Edge Clusters"));
    assert!(output.contains("II. METHODS"));
    assert!(output.contains("[1m"));
    assert!(output.contains("[38;2;"));
    assert!(output.contains("Site"));
    assert!(output.contains("│ A    │"));
    assert!(output.contains("[Image: System overview"));

    let mono = render_layout(
        &layout,
        &AnsiOptions {
            terminal_width: 80,
            color_depth: ColorDepth::Monochrome,
        },
    );
    assert!(!mono.contains("[38;2;"));
    assert!(!mono.contains("[38;5;"));
}

#[test]
fn test_html_mirror_matches_layout() {
    let html = Exporter::default().html(&fixture()).unwrap();

    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("<title>Adaptive Scheduling for Edge Clusters</title>"));
    assert!(html.contains("<h1 class=\"title\""));
    assert!(html.contains(">I. INTRODUCTION</span></h2>"));
    assert!(html.contains("<th style="));
    assert!(html.contains("data:image/png;base64,"));
    assert!(html.contains("column-count: 2"));
    assert!(html.contains("class=\"notice\""));
}

#[test]
fn test_latex_export() {
    let exported = Exporter::default()
        .export(&fixture(), ExportFormat::Latex)
        .unwrap();
    let source = String::from_utf8(exported.bytes.clone()).unwrap();

    assert_eq!(exported.filename, "Adaptive_Scheduling_for_Edge_Clusters.tex");
    assert!(source.starts_with("\\documentclass[conference]{IEEEtran}"));
    assert!(source.contains("\\IEEEauthorblockN{Ada Lovelace}"));
    assert!(source.contains("\\and"));
    assert!(source.contains("\\begin{abstract}"));
    assert!(source.contains("\\begin{IEEEkeywords}"));
    assert!(source.contains("\\section{Introduction}"));
    assert!(source.contains("\\subsection{Workload Model}"));
    assert!(source.contains("\\includegraphics[width=1.8in]{figure_1.png}"));
    assert!(source.contains("\\begin{thebibliography}"));
    assert!(source.trim_end().ends_with("\\end{document}"));

    assert_eq!(exported.assets.len(), 1);
    assert_eq!(exported.assets[0].name, "figure_1.png");
    assert!(exported.assets[0].bytes.starts_with(b"\x89PNG"));
}
