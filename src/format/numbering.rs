//! Numbering for sections, subsections, references, tables and figures
//!
//! Nothing here is stored on the model. Every label is recomputed from the
//! position of the item in reading order each time a paper is rendered.

use serde::Serialize;

use crate::document::{Document, Reference};
use crate::style::Labels;

/// Upper-case Roman numeral by greedy subtraction. Zero yields an empty string.
pub fn to_roman(num: u32) -> String {
    const TABLE: [(u32, &str); 13] = [
        (1000, "M"),
        (900, "CM"),
        (500, "D"),
        (400, "CD"),
        (100, "C"),
        (90, "XC"),
        (50, "L"),
        (40, "XL"),
        (10, "X"),
        (9, "IX"),
        (5, "V"),
        (4, "IV"),
        (1, "I"),
    ];

    let mut result = String::new();
    let mut n = num;

    for (value, symbol) in TABLE {
        while n >= value {
            result.push_str(symbol);
            n -= value;
        }
    }

    result
}

/// 1 -> A, 26 -> Z, 27 -> AA.
pub fn to_letters(num: u32) -> String {
    let mut letters = Vec::new();
    let mut n = num;
    while n > 0 {
        let rem = ((n - 1) % 26) as u8;
        letters.push((b'A' + rem) as char);
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// `"II. METHODS"` for the second section.
pub fn section_label(position: usize, title: &str) -> String {
    join_label(&format!("{}.", to_roman(position as u32)), &title.trim().to_uppercase())
}

/// `"B. Data Collection"` for the second subsection of a section.
pub fn subsection_label(position: usize, title: &str) -> String {
    join_label(&format!("{}.", to_letters(position as u32)), title.trim())
}

fn join_label(number: &str, title: &str) -> String {
    if title.is_empty() {
        number.to_string()
    } else {
        format!("{number} {title}")
    }
}

/// Stored order printed verbatim: `[3] A. Author, ...`.
pub fn reference_entry(reference: &Reference) -> String {
    format!("[{}] {}", reference.order, reference.text.trim())
}

/// References in listing order: stable by `order`, entries without text dropped.
pub fn ordered_references(references: &[Reference]) -> Vec<&Reference> {
    let mut listed: Vec<&Reference> = references
        .iter()
        .filter(|reference| !reference.text.trim().is_empty())
        .collect();
    listed.sort_by_key(|reference| reference.order);
    listed
}

/// Running counters for captioned floats, advanced in reading order.
#[derive(Debug, Default)]
pub struct FloatCounters {
    tables: u32,
    figures: u32,
}

impl FloatCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// `"TABLE III"`
    pub fn next_table(&mut self, labels: &Labels) -> String {
        self.tables += 1;
        format!("{} {}", labels.table_prefix, to_roman(self.tables))
    }

    /// `"Fig. 2."`
    pub fn next_figure(&mut self, labels: &Labels) -> String {
        self.figures += 1;
        format!("{} {}.", labels.figure_prefix, self.figures)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutlineEntry {
    pub level: u8,
    pub label: String,
    pub id: String,
}

/// Section and subsection labels in reading order.
pub fn outline(document: &Document) -> Vec<OutlineEntry> {
    let mut entries = Vec::new();
    for (index, section) in document.sections.iter().enumerate() {
        entries.push(OutlineEntry {
            level: 1,
            label: section_label(index + 1, &section.title),
            id: section.id.clone(),
        });
        for (sub_index, sub) in section.subsections.iter().enumerate() {
            entries.push(OutlineEntry {
                level: 2,
                label: subsection_label(sub_index + 1, &sub.title),
                id: sub.id.clone(),
            });
        }
    }
    entries
}

/// Heading labels for every top-level section, in sequence order.
pub fn section_labels(document: &Document) -> Vec<String> {
    document
        .sections
        .iter()
        .enumerate()
        .map(|(index, section)| section_label(index + 1, &section.title))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_roman() {
        assert_eq!(to_roman(1), "I");
        assert_eq!(to_roman(4), "IV");
        assert_eq!(to_roman(9), "IX");
        assert_eq!(to_roman(14), "XIV");
        assert_eq!(to_roman(40), "XL");
        assert_eq!(to_roman(1994), "MCMXCIV");
        assert_eq!(to_roman(0), "");
    }

    #[test]
    fn test_to_letters() {
        assert_eq!(to_letters(1), "A");
        assert_eq!(to_letters(26), "Z");
        assert_eq!(to_letters(27), "AA");
        assert_eq!(to_letters(0), "");
    }

    #[test]
    fn test_empty_titles_keep_number() {
        assert_eq!(section_label(3, "  "), "III.");
        assert_eq!(subsection_label(1, ""), "A.");
    }

    #[test]
    fn test_float_counters() {
        let labels = Labels::default();
        let mut counters = FloatCounters::new();
        assert_eq!(counters.next_table(&labels), "TABLE I");
        assert_eq!(counters.next_figure(&labels), "Fig. 1.");
        assert_eq!(counters.next_table(&labels), "TABLE II");
    }
}
