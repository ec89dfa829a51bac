//! Text shaping rules for front matter and body text

use once_cell::sync::Lazy;
use regex::Regex;

use crate::document::Author;

/// C0/C1 control characters other than tab, line feed and carriage return.
static CONTROL_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\x00-\x08\x0B\x0C\x0E-\x1F\x7F-\u{9F}]").unwrap());

/// Runs of commas separated only by whitespace.
static DOUBLED_COMMAS: Lazy<Regex> = Lazy::new(|| Regex::new(r",(\s*,)+").unwrap());

/// Strip characters that are not allowed in the rendered output.
pub fn clean_text(text: &str) -> String {
    CONTROL_CHARS.replace_all(text, "").into_owned()
}

/// Department, organization, city and state joined by `", "`, with empty
/// fields and the commas they leave behind removed.
pub fn affiliation_line(author: &Author) -> String {
    let joined = [
        author.department.as_str(),
        author.organization.as_str(),
        author.city.as_str(),
        author.state.as_str(),
    ]
    .iter()
    .map(|field| clean_text(field.trim()))
    .collect::<Vec<_>>()
    .join(", ");

    let collapsed = DOUBLED_COMMAS.replace_all(&joined, ",");
    collapsed
        .trim_matches(|c: char| c == ',' || c.is_whitespace())
        .to_string()
}

/// Email and custom field values, in that order, skipping empty values.
pub fn contact_lines(author: &Author) -> Vec<String> {
    std::iter::once(author.email.as_str())
        .chain(author.custom_fields.iter().map(|field| field.value.as_str()))
        .map(|value| clean_text(value.trim()))
        .filter(|value| !value.is_empty())
        .collect()
}

/// Author names as run texts: first unprefixed, later ones prefixed `", "`.
/// Authors without a name are left out.
pub fn author_runs(authors: &[Author]) -> Vec<String> {
    authors
        .iter()
        .map(|author| clean_text(author.name.trim()))
        .filter(|name| !name.is_empty())
        .enumerate()
        .map(|(index, name)| {
            if index == 0 {
                name
            } else {
                format!(", {name}")
            }
        })
        .collect()
}

/// Em-dash joined lead-in, as in `"Abstract—"`.
pub fn lead_in(heading: &str) -> String {
    format!("{heading}\u{2014}")
}

/// Split body text into paragraphs on blank lines; single newlines fold to spaces.
pub fn paragraphs(text: &str) -> Vec<String> {
    let cleaned = clean_text(text).replace("\r\n", "\n");
    cleaned
        .split("\n\n")
        .map(|chunk| {
            chunk
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .filter(|paragraph| !paragraph.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn author(department: &str, organization: &str, city: &str, state: &str) -> Author {
        Author {
            name: "A. Author".to_string(),
            department: department.to_string(),
            organization: organization.to_string(),
            city: city.to_string(),
            state: state.to_string(),
            ..Author::default()
        }
    }

    #[test]
    fn test_affiliation_trims_every_gap() {
        assert_eq!(affiliation_line(&author("", "", "", "")), "");
        assert_eq!(affiliation_line(&author("EE", "", "", "")), "EE");
        assert_eq!(affiliation_line(&author("EE", "", "", "CA")), "EE, CA");
        assert_eq!(
            affiliation_line(&author(" CS ", "Stanford", "Palo Alto", "CA")),
            "CS, Stanford, Palo Alto, CA"
        );
    }

    #[test]
    fn test_clean_text_strips_control_characters() {
        assert_eq!(clean_text("a\u{0}b\u{7}c\td\u{85}"), "abc\td");
    }

    #[test]
    fn test_paragraph_splitting() {
        assert_eq!(
            paragraphs("first line\nsame paragraph\n\n\nsecond"),
            vec!["first line same paragraph", "second"]
        );
        assert!(paragraphs("  \n ").is_empty());
    }
}
