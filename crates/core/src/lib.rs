//! Core domain types for Quire.

mod annotation;
mod book;

pub use annotation::{Annotation, AnnotationValue, HighlightColor, HighlightStyle, RawBookmark};
pub use book::{
    BookMetadata, Contributor, Contributors, LanguageMap, Location, PageItem, RelocateEvent,
    SectionPosition, TextDirection, TocItem, flatten_toc, format_contributors,
    format_language_map, format_list, format_percent,
};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub style: ReaderStyle,
    pub flow: Flow,
    pub lines_per_page: usize,
    pub show_sidebar: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderStyle {
    pub spacing: f32,
    pub justify: bool,
    pub hyphenate: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Flow {
    Paginated,
    Scrolled,
}

impl Flow {
    pub fn as_str(&self) -> &'static str {
        match self {
            Flow::Paginated => "paginated",
            Flow::Scrolled => "scrolled",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Flow::Paginated => "Paginated",
            Flow::Scrolled => "Scrolled",
        }
    }
}

impl std::fmt::Display for Flow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Flow {
    type Err = &'static str;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "paginated" => Ok(Flow::Paginated),
            "scrolled" => Ok(Flow::Scrolled),
            _ => Err("unknown flow"),
        }
    }
}

impl Default for ReaderStyle {
    fn default() -> Self {
        Self {
            spacing: 1.4,
            justify: true,
            hyphenate: true,
        }
    }
}

impl ReaderStyle {
    /// Stylesheet handed to renderers that accept user styles.
    pub fn css(&self) -> String {
        let align = if self.justify { "justify" } else { "start" };
        let hyphens = if self.hyphenate { "auto" } else { "manual" };
        format!(
            r#"@namespace epub "http://www.idpf.org/2007/ops";
html {{
    color-scheme: light dark;
}}
@media (prefers-color-scheme: dark) {{
    a:link {{
        color: lightblue;
    }}
}}
p, li, blockquote, dd {{
    line-height: {spacing};
    text-align: {align};
    -webkit-hyphens: {hyphens};
    hyphens: {hyphens};
    -webkit-hyphenate-limit-before: 3;
    -webkit-hyphenate-limit-after: 2;
    -webkit-hyphenate-limit-lines: 2;
    hanging-punctuation: allow-end last;
    widows: 2;
}}
[align="left"] {{ text-align: left; }}
[align="right"] {{ text-align: right; }}
[align="center"] {{ text-align: center; }}
[align="justify"] {{ text-align: justify; }}
pre {{
    white-space: pre-wrap !important;
}}
aside[epub|type~="endnote"],
aside[epub|type~="footnote"],
aside[epub|type~="note"],
aside[epub|type~="rearnote"] {{
    display: none;
}}
"#,
            spacing = self.spacing,
        )
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            style: ReaderStyle::default(),
            flow: Flow::Paginated,
            lines_per_page: 30,
            show_sidebar: false,
        }
    }
}

impl Settings {
    pub fn normalize(&mut self) {
        if !self.style.spacing.is_finite() {
            self.style.spacing = ReaderStyle::default().spacing;
        }
        self.style.spacing = self.style.spacing.clamp(1.0, 3.0);
        self.lines_per_page = self.lines_per_page.clamp(5, 200);
    }

    pub fn toggle_sidebar(&mut self) {
        self.show_sidebar = !self.show_sidebar;
    }
}

/// Raw document bytes fetched from a path or URL, before any renderer sees them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedSource {
    pub name: String,
    pub location: String,
    pub bytes: Vec<u8>,
}

/// Keyboard input, independent of the terminal backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Left,
    Right,
    Up,
    Down,
    PageUp,
    PageDown,
    Home,
    End,
    Enter,
    Esc,
    Tab,
    Backspace,
    Char(char),
}
