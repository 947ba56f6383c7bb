use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

/// A string that may be given once or per language (`{"en": "..", "fr": ".."}`).
///
/// The localized form keeps document order; the first entry is the one displayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LanguageMap {
    Plain(String),
    Localized(Vec<(String, String)>),
}

impl LanguageMap {
    pub fn text(&self) -> &str {
        match self {
            LanguageMap::Plain(text) => text,
            LanguageMap::Localized(entries) => {
                entries.first().map(|(_, text)| text.as_str()).unwrap_or("")
            }
        }
    }
}

impl<'de> Deserialize<'de> for LanguageMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct LanguageMapVisitor;

        impl<'de> Visitor<'de> for LanguageMapVisitor {
            type Value = LanguageMap;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("a string or a map of language tags to strings")
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
                Ok(LanguageMap::Plain(value.to_string()))
            }

            fn visit_string<E: de::Error>(self, value: String) -> Result<Self::Value, E> {
                Ok(LanguageMap::Plain(value))
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::new();
                while let Some((lang, text)) = map.next_entry::<String, String>()? {
                    entries.push((lang, text));
                }
                Ok(LanguageMap::Localized(entries))
            }
        }

        deserializer.deserialize_any(LanguageMapVisitor)
    }
}

impl Serialize for LanguageMap {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap as _;
        match self {
            LanguageMap::Plain(text) => serializer.serialize_str(text),
            LanguageMap::Localized(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (lang, text) in entries {
                    map.serialize_entry(lang, text)?;
                }
                map.end()
            }
        }
    }
}

pub fn format_language_map(value: Option<&LanguageMap>) -> String {
    value.map(|v| v.text().to_string()).unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Contributor {
    Name(String),
    Person {
        name: Option<LanguageMap>,
        #[serde(default)]
        role: Option<String>,
    },
}

impl Contributor {
    pub fn display_name(&self) -> String {
        match self {
            Contributor::Name(name) => name.clone(),
            Contributor::Person { name, .. } => format_language_map(name.as_ref()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Contributors {
    Many(Vec<Contributor>),
    One(Contributor),
}

/// Short conjunction list, en-US style: "A", "A & B", "A, B, & C".
pub fn format_list(items: &[String]) -> String {
    match items {
        [] => String::new(),
        [one] => one.clone(),
        [first, second] => format!("{first} & {second}"),
        [rest @ .., last] => format!("{}, & {last}", rest.join(", ")),
    }
}

pub fn format_contributors(contributors: Option<&Contributors>) -> String {
    match contributors {
        None => String::new(),
        Some(Contributors::One(one)) => one.display_name(),
        Some(Contributors::Many(many)) => {
            let names: Vec<String> = many.iter().map(Contributor::display_name).collect();
            format_list(&names)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BookMetadata {
    pub title: Option<LanguageMap>,
    pub author: Option<Contributors>,
    pub language: Option<String>,
    pub publisher: Option<String>,
    pub description: Option<String>,
    pub identifier: Option<String>,
}

impl BookMetadata {
    pub fn display_title(&self) -> String {
        let title = format_language_map(self.title.as_ref());
        if title.trim().is_empty() {
            "Untitled Book".to_string()
        } else {
            title
        }
    }

    pub fn display_author(&self) -> String {
        format_contributors(self.author.as_ref())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextDirection {
    #[default]
    Ltr,
    Rtl,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocItem {
    pub label: String,
    #[serde(default)]
    pub href: String,
    #[serde(default)]
    pub subitems: Vec<TocItem>,
}

/// Depth-first walk of a toc tree, paired with nesting depth.
pub fn flatten_toc(items: &[TocItem]) -> Vec<(usize, &TocItem)> {
    fn walk<'a>(items: &'a [TocItem], depth: usize, out: &mut Vec<(usize, &'a TocItem)>) {
        for item in items {
            out.push((depth, item));
            walk(&item.subitems, depth + 1, out);
        }
    }

    let mut out = Vec::new();
    walk(items, 0, &mut out);
    out
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageItem {
    pub label: String,
    #[serde(default)]
    pub href: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Location {
    pub current: usize,
    pub next: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SectionPosition {
    pub current: usize,
    pub total: usize,
}

/// The reading position changed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RelocateEvent {
    pub fraction: f64,
    pub location: Location,
    pub toc_item: Option<TocItem>,
    pub page_item: Option<PageItem>,
    pub section: Option<SectionPosition>,
}

impl RelocateEvent {
    pub fn location_label(&self) -> String {
        match &self.page_item {
            Some(page) => format!("Page {}", page.label),
            None => format!("Loc {}", self.location.current),
        }
    }
}

/// en-US percent formatting of a 0..=1 fraction.
pub fn format_percent(fraction: f64) -> String {
    let fraction = if fraction.is_finite() { fraction } else { 0.0 };
    format!("{}%", (fraction * 100.0).round() as i64)
}
