use serde::{Deserialize, Serialize};

/// Opaque CFI-like reference anchoring an annotation in the document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnnotationValue(String);

impl AnnotationValue {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AnnotationValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for AnnotationValue {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for AnnotationValue {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum HighlightColor {
    #[default]
    Yellow,
    Green,
    Blue,
    Pink,
    Purple,
    Other(String),
}

impl HighlightColor {
    pub fn as_str(&self) -> &str {
        match self {
            HighlightColor::Yellow => "yellow",
            HighlightColor::Green => "green",
            HighlightColor::Blue => "blue",
            HighlightColor::Pink => "pink",
            HighlightColor::Purple => "purple",
            HighlightColor::Other(name) => name,
        }
    }
}

impl std::fmt::Display for HighlightColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for HighlightColor {
    type Err = std::convert::Infallible;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        Ok(match value.to_ascii_lowercase().as_str() {
            "yellow" => HighlightColor::Yellow,
            "green" => HighlightColor::Green,
            "blue" => HighlightColor::Blue,
            "pink" => HighlightColor::Pink,
            "purple" => HighlightColor::Purple,
            _ => HighlightColor::Other(value.to_string()),
        })
    }
}

/// A highlight attached to the document. Identity is `value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub value: AnnotationValue,
    pub color: HighlightColor,
    pub note: Option<String>,
}

impl Annotation {
    /// The note, unless it is absent or empty.
    pub fn visible_note(&self) -> Option<&str> {
        self.note.as_deref().filter(|note| !note.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HighlightStyle {
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub which: Option<String>,
}

/// One entry of a calibre-style bookmark export.
///
/// Highlights carry `spine_index`, the two CFIs and a style; plain bookmarks carry
/// `title` and `pos` instead. Fields not listed here are ignored.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawBookmark {
    #[serde(rename = "type")]
    pub kind: String,
    pub spine_index: Option<usize>,
    pub start_cfi: Option<String>,
    pub end_cfi: Option<String>,
    pub style: Option<HighlightStyle>,
    pub notes: Option<String>,
    pub highlighted_text: Option<String>,
    pub uuid: Option<String>,
    pub timestamp: Option<String>,
    pub title: Option<String>,
    pub pos: Option<String>,
}

impl RawBookmark {
    pub fn is_highlight(&self) -> bool {
        self.kind == "highlight"
    }

    pub fn color(&self) -> HighlightColor {
        self.style
            .as_ref()
            .and_then(|style| style.which.as_deref())
            .and_then(|which| which.parse().ok())
            .unwrap_or_default()
    }
}
