use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Typography and page geometry for a rendered paper.
///
/// The built-in sheet is the IEEE conference layout. Every renderer takes a
/// sheet explicitly, so alternate house styles only need a different file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleSheet {
    pub font_family: String,
    pub mono_family: String,

    pub title: TextStyle,
    pub author: TextStyle,
    pub affiliation: TextStyle,
    /// Run style of the "Abstract" / "Index Terms" lead-ins
    pub lead_in: TextStyle,
    /// Paragraph style of the abstract and keyword bodies
    pub abstract_body: TextStyle,
    pub section_heading: TextStyle,
    pub subsection_heading: TextStyle,
    pub body: TextStyle,
    pub caption: TextStyle,
    pub table_cell: TextStyle,
    pub latex: TextStyle,
    pub references_heading: TextStyle,
    pub reference: TextStyle,
    pub footer: TextStyle,

    pub page: PageLayout,
    pub figures: FigureSizes,
    pub labels: Labels,
    pub copyright_notice: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextStyle {
    pub size: f32,
    pub bold: bool,
    pub italic: bool,
    pub alignment: Alignment,
    pub space_before: f32,
    pub space_after: f32,
}

impl Default for TextStyle {
    fn default() -> Self {
        TextStyle {
            size: 10.0,
            bold: false,
            italic: false,
            alignment: Alignment::Left,
            space_before: 0.0,
            space_after: 0.0,
        }
    }
}

impl TextStyle {
    fn new(size: f32, alignment: Alignment) -> Self {
        TextStyle {
            size,
            alignment,
            ..TextStyle::default()
        }
    }

    fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    fn spacing(mut self, before: f32, after: f32) -> Self {
        self.space_before = before;
        self.space_after = after;
        self
    }

    /// Same style at a different point size.
    pub fn sized(mut self, size: f32) -> Self {
        self.size = size;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Left,
    Center,
    Right,
    Justify,
}

/// Page geometry in inches.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageLayout {
    pub width: f32,
    pub height: f32,
    pub margin: f32,
    pub gutter: f32,
    pub hanging_indent: f32,
}

impl Default for PageLayout {
    fn default() -> Self {
        PageLayout {
            width: 8.5,
            height: 11.0,
            margin: 0.5,
            gutter: 0.5,
            hanging_indent: 0.25,
        }
    }
}

impl PageLayout {
    /// Width available to one text column.
    pub fn column_width(&self, columns: u8) -> f32 {
        let text = self.width - 2.0 * self.margin;
        if columns >= 2 {
            (text - self.gutter) / 2.0
        } else {
            text
        }
    }
}

/// Figure widths per size preset, plus the height cap, in inches.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FigureSizes {
    pub very_small: f32,
    pub small: f32,
    pub medium: f32,
    pub large: f32,
    pub max_height: f32,
}

impl Default for FigureSizes {
    fn default() -> Self {
        FigureSizes {
            very_small: 1.2,
            small: 1.8,
            medium: 2.5,
            large: 3.2,
            max_height: 4.0,
        }
    }
}

impl FigureSizes {
    pub fn width(&self, size: crate::document::ImageSize) -> f32 {
        use crate::document::ImageSize;
        match size {
            ImageSize::VerySmall => self.very_small,
            ImageSize::Small => self.small,
            ImageSize::Medium => self.medium,
            ImageSize::Large => self.large,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Labels {
    pub abstract_heading: String,
    pub keywords_heading: String,
    pub references_heading: String,
    pub table_prefix: String,
    pub figure_prefix: String,
}

impl Default for Labels {
    fn default() -> Self {
        Labels {
            abstract_heading: "Abstract".to_string(),
            keywords_heading: "Index Terms".to_string(),
            references_heading: "REFERENCES".to_string(),
            table_prefix: "TABLE".to_string(),
            figure_prefix: "Fig.".to_string(),
        }
    }
}

impl Default for StyleSheet {
    fn default() -> Self {
        use Alignment::*;
        StyleSheet {
            font_family: "Times New Roman".to_string(),
            mono_family: "Courier New".to_string(),

            title: TextStyle::new(24.0, Center).bold().spacing(0.0, 12.0),
            author: TextStyle::new(12.0, Center).spacing(0.0, 2.0),
            affiliation: TextStyle::new(10.0, Center).italic().spacing(0.0, 12.0),
            lead_in: TextStyle::new(9.0, Justify).bold().italic(),
            abstract_body: TextStyle::new(9.0, Justify).spacing(0.0, 12.0),
            section_heading: TextStyle::new(10.0, Center).bold().spacing(6.0, 3.0),
            subsection_heading: TextStyle::new(10.0, Left).italic().spacing(6.0, 3.0),
            body: TextStyle::new(9.0, Justify).spacing(3.0, 12.0),
            caption: TextStyle::new(8.0, Center).spacing(3.0, 6.0),
            table_cell: TextStyle::new(8.0, Center),
            latex: TextStyle::new(8.0, Left).spacing(3.0, 6.0),
            references_heading: TextStyle::new(10.0, Center).bold().spacing(12.0, 6.0),
            reference: TextStyle::new(8.0, Justify).spacing(0.0, 2.0),
            footer: TextStyle::new(8.0, Center),

            page: PageLayout::default(),
            figures: FigureSizes::default(),
            labels: Labels::default(),
            copyright_notice: "XXX-X-XXXX-XXXX-X/XX/$XX.00 \u{a9}20XX IEEE".to_string(),
        }
    }
}

impl StyleSheet {
    /// The IEEE conference sheet.
    pub fn ieee() -> Self {
        Self::default()
    }

    /// Load the style sheet from the config directory, or the IEEE default
    pub fn load() -> Result<Self> {
        if let Some(config_path) = Self::get_config_path() {
            if config_path.exists() {
                return Self::load_from(&config_path);
            }
        }

        Ok(StyleSheet::default())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read style sheet {}", path.display()))?;
        let sheet: StyleSheet = toml::from_str(&content)
            .with_context(|| format!("Invalid style sheet {}", path.display()))?;
        tracing::debug!(path = %path.display(), "loaded style sheet");
        Ok(sheet)
    }

    /// Save the style sheet to the config directory
    pub fn save(&self) -> Result<Option<PathBuf>> {
        match Self::get_config_path() {
            Some(config_path) => {
                self.save_to(&config_path)?;
                Ok(Some(config_path))
            }
            None => Ok(None),
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Get the path to the style config file
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("ieeepaper").join("style.toml"))
    }

    /// Initialize the default style file
    pub fn init_default() -> Result<Option<PathBuf>> {
        StyleSheet::default().save()
    }

    /// Body style with the paper's font size override applied.
    pub fn body_for(&self, settings: &crate::document::Settings) -> TextStyle {
        match settings.body_font_size() {
            Some(size) => self.body.sized(size),
            None => self.body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_width() {
        let page = PageLayout::default();
        assert_eq!(page.column_width(1), 7.5);
        assert_eq!(page.column_width(2), 3.5);
    }

    #[test]
    fn test_partial_sheet_fills_defaults() {
        let sheet: StyleSheet = toml::from_str(
            r#"
            font_family = "Helvetica"

            [title]
            size = 20.0
            bold = true
            alignment = "center"
            "#,
        )
        .unwrap();

        assert_eq!(sheet.font_family, "Helvetica");
        assert_eq!(sheet.title.size, 20.0);
        assert_eq!(sheet.body, StyleSheet::default().body);
    }
}
