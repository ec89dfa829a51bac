//! Presentation rules: numbering, typography, media and layout
//!
//! Everything here derives from the paper without changing it.

pub mod layout;
pub mod media;
pub mod numbering;
pub mod typography;

pub use layout::{
    Footer, LayoutElement, LayoutGrid, LayoutImage, LayoutParagraph, PaperLayout, Role, StyledRun,
    layout,
};
pub use numbering::{OutlineEntry, outline, section_label, subsection_label, to_roman};
pub use typography::{affiliation_line, author_runs, clean_text};
