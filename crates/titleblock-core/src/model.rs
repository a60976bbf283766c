use serde::{Deserialize, Serialize};
use std::fmt;

/// Width and height of a page in points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    pub width: f64,
    pub height: f64,
}

/// One positioned run of text, as delivered by the text extraction layer.
///
/// `x`/`y` is the anchor point of the run in page space (origin bottom-left).
/// The annotation fields are filled in while a page is processed and are
/// absent on input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextFragment {
    pub text: String,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
    #[serde(default)]
    pub font_size: f64,
    #[serde(default)]
    pub font_name: String,
    #[serde(default)]
    pub fill_color: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cell_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cell_role: Option<CellRole>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cell_role_confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_cell_field_value: Option<String>,
}

impl TextFragment {
    pub fn new(text: impl Into<String>, x: f64, y: f64, font_size: f64) -> Self {
        let text = text.into();
        let width = text.chars().count() as f64 * font_size * 0.5;
        TextFragment {
            text,
            x,
            y,
            width,
            height: font_size,
            font_size,
            font_name: String::new(),
            fill_color: String::new(),
            cell_id: None,
            cell_role: None,
            cell_role_confidence: None,
            in_cell_field_value: None,
        }
    }

    pub fn with_font(mut self, font_name: impl Into<String>) -> Self {
        self.font_name = font_name.into();
        self
    }

    pub fn with_color(mut self, fill_color: impl Into<String>) -> Self {
        self.fill_color = fill_color.into();
        self
    }

    pub fn is_bold(&self) -> bool {
        let lower = self.font_name.to_lowercase();
        lower.contains("bold") || lower.contains("heavy") || lower.contains("black")
    }

    pub fn is_italic(&self) -> bool {
        let lower = self.font_name.to_lowercase();
        lower.contains("italic") || lower.contains("oblique")
    }

    /// Height used for vertical proximity checks; falls back to the font size.
    pub fn line_height(&self) -> f64 {
        if self.height > 0.0 {
            self.height
        } else if self.font_size > 0.0 {
            self.font_size
        } else {
            10.0
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width.max(0.0)
    }

    pub fn trimmed(&self) -> &str {
        self.text.trim()
    }
}

/// Role a populated cell plays inside the title block table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellRole {
    Header,
    Label,
    Value,
    Mixed,
}

impl fmt::Display for CellRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellRole::Header => write!(f, "header"),
            CellRole::Label => write!(f, "label"),
            CellRole::Value => write!(f, "value"),
            CellRole::Mixed => write!(f, "mixed"),
        }
    }
}

/// Metadata fields the extractor knows how to recognize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Drawing,
    Title,
    Revision,
    Scale,
    Date,
    Project,
    Client,
    Sheet,
    DrawnBy,
    CheckedBy,
    ApprovedBy,
}

impl FieldType {
    pub const ALL: [FieldType; 11] = [
        FieldType::Drawing,
        FieldType::Title,
        FieldType::Revision,
        FieldType::Scale,
        FieldType::Date,
        FieldType::Project,
        FieldType::Client,
        FieldType::Sheet,
        FieldType::DrawnBy,
        FieldType::CheckedBy,
        FieldType::ApprovedBy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Drawing => "drawing",
            FieldType::Title => "title",
            FieldType::Revision => "revision",
            FieldType::Scale => "scale",
            FieldType::Date => "date",
            FieldType::Project => "project",
            FieldType::Client => "client",
            FieldType::Sheet => "sheet",
            FieldType::DrawnBy => "drawn_by",
            FieldType::CheckedBy => "checked_by",
            FieldType::ApprovedBy => "approved_by",
        }
    }

    /// Free-text fields collect every value fragment of a cell instead of one.
    pub fn is_free_text(&self) -> bool {
        matches!(
            self,
            FieldType::Title | FieldType::Project | FieldType::Client
        )
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalize text for label comparison: lowercase, drop `.` and trailing
/// colons, collapse whitespace.
pub fn normalize_label(text: &str) -> String {
    let lower = text.trim().to_lowercase().replace('.', " ");
    let lower = lower.trim_end_matches(|c: char| c == ':' || c.is_whitespace());
    lower.split_whitespace().collect::<Vec<_>>().join(" ")
}
