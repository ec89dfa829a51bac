//! Paragraph styles and document defaults

use docx_rs::{Docx, LineSpacing, RunFonts, Style, StyleType};

use crate::format::{PaperLayout, Role};
use crate::style::{StyleSheet, TextStyle};

use super::{half_points, twips_pt};

/// Paragraph style ids added by [`apply`].
pub(crate) fn style_id(role: Role) -> Option<&'static str> {
    match role {
        Role::Title => Some("Title"),
        Role::SectionHeading => Some("Heading1"),
        Role::SubsectionHeading => Some("Heading2"),
        Role::Caption => Some("Caption"),
        Role::ReferencesHeading => Some("ReferencesHeading"),
        Role::Reference => Some("Reference"),
        Role::Abstract | Role::Keywords => Some("Abstract"),
        Role::Author | Role::Affiliation | Role::Body | Role::Latex => None,
    }
}

/// Set the document defaults and add one paragraph style per styled role.
pub(crate) fn apply(docx: Docx, style: &StyleSheet, layout: &PaperLayout) -> Docx {
    let family = layout.font_family.as_str();
    let mut docx = docx
        .default_fonts(
            RunFonts::new()
                .ascii(family)
                .hi_ansi(family)
                .east_asia(family)
                .cs(family),
        )
        .default_size(half_points(style.body.size))
        .default_line_spacing(LineSpacing::new().after(0).line(240))
        .default_tab_stop(720)
        .add_style(Style::new("Normal", StyleType::Paragraph).name("Normal").q_format(true));

    let paragraph_styles = [
        ("Title", "Title", &style.title, None),
        ("Heading1", "heading 1", &style.section_heading, Some(0)),
        ("Heading2", "heading 2", &style.subsection_heading, Some(1)),
        ("Abstract", "Abstract", &style.abstract_body, None),
        ("Caption", "caption", &style.caption, None),
        ("ReferencesHeading", "References Heading", &style.references_heading, None),
        ("Reference", "Reference", &style.reference, None),
    ];
    for (id, name, text, outline) in paragraph_styles {
        docx = docx.add_style(paragraph_style(id, name, text, outline));
    }
    docx
}

fn paragraph_style(id: &str, name: &str, text: &TextStyle, outline: Option<usize>) -> Style {
    let mut style = Style::new(id, StyleType::Paragraph)
        .name(name)
        .based_on("Normal")
        .next("Normal")
        .q_format(true)
        .size(half_points(text.size))
        .line_spacing(
            LineSpacing::new()
                .before(twips_pt(text.space_before))
                .after(twips_pt(text.space_after)),
        );
    if text.bold {
        style = style.bold();
    }
    if text.italic {
        style = style.italic();
    }
    if let Some(level) = outline {
        style = style.outline_lvl(level);
    }
    style
}
