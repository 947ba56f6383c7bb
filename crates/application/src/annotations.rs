//! Per-session highlight index.

use std::collections::{BTreeMap, HashMap};

use anyhow::Context as _;
use quire_core::{Annotation, AnnotationValue, RawBookmark};

use crate::view::HighlightDecoder;

/// Highlights by spine section (import order) and by value.
///
/// Every annotation lives in exactly one section list and once in the value map.
#[derive(Debug, Clone, Default)]
pub struct AnnotationIndex {
    by_section: BTreeMap<usize, Vec<Annotation>>,
    by_value: HashMap<AnnotationValue, Annotation>,
    section_of: HashMap<AnnotationValue, usize>,
}

impl AnnotationIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Imports every `highlight` bookmark; other kinds are skipped.
    ///
    /// A decoder failure aborts the whole import. A decoded highlight with no
    /// `spine_index` cannot be placed in a section and is skipped.
    pub fn build(bookmarks: &[RawBookmark], decoder: &dyn HighlightDecoder) -> anyhow::Result<Self> {
        let mut index = Self::new();
        for (position, bookmark) in bookmarks.iter().enumerate() {
            if !bookmark.is_highlight() {
                continue;
            }
            let value = decoder
                .decode(bookmark)
                .with_context(|| format!("decode highlight #{position}"))?;
            let Some(spine_index) = bookmark.spine_index else {
                log::warn!("highlight #{position} ({value}) has no spine_index; skipped");
                continue;
            };
            index.insert(
                spine_index,
                Annotation {
                    value,
                    color: bookmark.color(),
                    note: bookmark.notes.clone(),
                },
            );
        }
        log::debug!(
            "imported {} highlights across {} sections",
            index.len(),
            index.by_section.len()
        );
        Ok(index)
    }

    /// Adds an annotation; a repeated value replaces the earlier entry.
    pub fn insert(&mut self, section: usize, annotation: Annotation) {
        if let Some(previous) = self.section_of.remove(&annotation.value) {
            log::warn!("duplicate highlight {}; keeping the latest", annotation.value);
            if let Some(list) = self.by_section.get_mut(&previous) {
                list.retain(|a| a.value != annotation.value);
                if list.is_empty() {
                    self.by_section.remove(&previous);
                }
            }
        }
        self.section_of.insert(annotation.value.clone(), section);
        self.by_value
            .insert(annotation.value.clone(), annotation.clone());
        self.by_section.entry(section).or_default().push(annotation);
    }

    pub fn section(&self, index: usize) -> &[Annotation] {
        self.by_section
            .get(&index)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn by_value(&self, value: &AnnotationValue) -> Option<&Annotation> {
        self.by_value.get(value)
    }

    pub fn sections(&self) -> impl Iterator<Item = usize> + '_ {
        self.by_section.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.by_value.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_value.is_empty()
    }
}
