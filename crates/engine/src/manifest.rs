//! Plain-text reference renderer driven by a JSON manifest.
//!
//! A manifest lists the spine sections with their text plus the book
//! metadata, toc and page list. Sections are cut into fixed-height pages; in
//! scrolled flow consecutive pages overlap so the view advances a third of a
//! screen at a time.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use quire_application::{
    AnnotationSink, Book, BookmarkSource, CoverSource, Decoration, DrawPrimitive, RenderedPage,
    StyleTarget, View, ViewEvent, ViewFactory,
};
use quire_core::{
    Annotation, AnnotationValue, BookMetadata, Flow, HighlightColor, LoadedSource, Location,
    PageItem, RawBookmark, RelocateEvent, SectionPosition, TextDirection, TocItem, flatten_toc,
};
use serde::Deserialize;

use crate::calibre::spine_index_of;
use crate::loader::{SourceKind, sniff};

pub const DEFAULT_LINES_PER_PAGE: usize = 30;

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct Manifest {
    pub metadata: BookMetadata,
    pub dir: TextDirection,
    pub toc: Vec<TocItem>,
    pub sections: Vec<ManifestSection>,
    #[serde(alias = "pageList")]
    pub page_list: Vec<PageItem>,
    pub bookmarks: Option<Vec<RawBookmark>>,
    /// Cover image path, relative to the manifest file.
    pub cover: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ManifestSection {
    pub href: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub text: String,
}

impl Manifest {
    pub fn parse(bytes: &[u8]) -> anyhow::Result<Self> {
        let body = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
        let manifest: Manifest = serde_json::from_slice(body).context("invalid manifest")?;
        if manifest.sections.is_empty() {
            anyhow::bail!("manifest has no sections");
        }
        Ok(manifest)
    }

    /// Section index for an href; the fragment is ignored.
    pub fn section_of(&self, href: &str) -> Option<usize> {
        let path = href.split('#').next().unwrap_or(href);
        self.sections.iter().position(|section| section.href == path)
    }
}

#[derive(Debug, Clone)]
pub struct ManifestBook {
    manifest: Manifest,
    base_dir: Option<PathBuf>,
}

impl ManifestBook {
    pub fn new(manifest: Manifest, base_dir: Option<PathBuf>) -> Self {
        Self { manifest, base_dir }
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }
}

impl Book for ManifestBook {
    fn metadata(&self) -> &BookMetadata {
        &self.manifest.metadata
    }

    fn toc(&self) -> &[TocItem] {
        &self.manifest.toc
    }

    fn direction(&self) -> TextDirection {
        self.manifest.dir
    }

    fn cover_source(&self) -> Option<&dyn CoverSource> {
        self.manifest.cover.as_ref().map(|_| self as &dyn CoverSource)
    }

    fn bookmark_source(&self) -> Option<&dyn BookmarkSource> {
        self.manifest
            .bookmarks
            .as_ref()
            .map(|_| self as &dyn BookmarkSource)
    }
}

impl CoverSource for ManifestBook {
    fn cover(&self) -> anyhow::Result<Option<Vec<u8>>> {
        let Some(cover) = self.manifest.cover.as_deref() else {
            return Ok(None);
        };
        let path = match &self.base_dir {
            Some(dir) => dir.join(cover),
            None => PathBuf::from(cover),
        };
        let bytes = fs::read(&path).with_context(|| format!("reading cover {}", path.display()))?;
        Ok(Some(bytes))
    }
}

impl BookmarkSource for ManifestBook {
    fn calibre_bookmarks(&self) -> anyhow::Result<Vec<RawBookmark>> {
        Ok(self.manifest.bookmarks.clone().unwrap_or_default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Page {
    section: usize,
    start: usize,
}

pub struct ManifestView {
    book: ManifestBook,
    lines: Vec<Vec<String>>,
    flow: Flow,
    lines_per_page: usize,
    pages: Vec<Page>,
    current: Option<usize>,
    fraction: f64,
    shown_section: Option<usize>,
    overlay: Vec<Annotation>,
    decorations: Vec<Decoration>,
    events: Vec<ViewEvent>,
    styles: String,
}

impl ManifestView {
    pub fn new(book: ManifestBook, lines_per_page: usize) -> Self {
        let lines = book
            .manifest
            .sections
            .iter()
            .map(|section| section.text.lines().map(str::to_string).collect())
            .collect();
        let mut view = Self {
            book,
            lines,
            flow: Flow::Paginated,
            lines_per_page: lines_per_page.max(1),
            pages: Vec::new(),
            current: None,
            fraction: 0.0,
            shown_section: None,
            overlay: Vec::new(),
            decorations: Vec::new(),
            events: Vec::new(),
            styles: String::new(),
        };
        view.paginate();
        view
    }

    pub fn flow(&self) -> Flow {
        self.flow
    }

    pub fn styles(&self) -> &str {
        &self.styles
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn current_page(&self) -> Option<usize> {
        self.current
    }

    pub fn current_section(&self) -> Option<usize> {
        self.shown_section
    }

    fn step(&self) -> usize {
        match self.flow {
            Flow::Paginated => self.lines_per_page,
            Flow::Scrolled => (self.lines_per_page / 3).max(1),
        }
    }

    fn paginate(&mut self) {
        let step = self.step();
        self.pages.clear();
        for (section, lines) in self.lines.iter().enumerate() {
            let mut start = 0;
            loop {
                self.pages.push(Page { section, start });
                start += step;
                if start >= lines.len() {
                    break;
                }
            }
        }
    }

    fn page_fraction(&self, index: usize) -> f64 {
        match self.pages.len() {
            0 | 1 => 0.0,
            n => index as f64 / (n - 1) as f64,
        }
    }

    fn first_page_of(&self, section: usize) -> Option<usize> {
        self.pages.iter().position(|page| page.section == section)
    }

    /// Last item whose target section is at or before `section`; the first
    /// one wins when several point at the same section.
    fn nearest<'a, T: 'a>(
        &self,
        section: usize,
        items: impl Iterator<Item = &'a T>,
        href: impl Fn(&T) -> &str,
    ) -> Option<&'a T> {
        let mut best: Option<(usize, &'a T)> = None;
        for item in items {
            let Some(target) = self.book.manifest.section_of(href(item)) else {
                continue;
            };
            if target > section {
                continue;
            }
            if best.is_none_or(|(found, _)| target > found) {
                best = Some((target, item));
            }
        }
        best.map(|(_, item)| item)
    }

    fn display(&mut self, index: usize, fraction: Option<f64>) {
        let Some(page) = self.pages.get(index).copied() else {
            return;
        };
        if self.shown_section != Some(page.section) {
            self.overlay.clear();
            self.decorations.clear();
            self.shown_section = Some(page.section);
            log::debug!("rendering section {}", page.section);
            self.events.push(ViewEvent::Load {
                index: page.section,
            });
            self.events.push(ViewEvent::CreateOverlay {
                index: page.section,
            });
        }
        self.current = Some(index);
        self.fraction = fraction.unwrap_or_else(|| self.page_fraction(index));

        let toc = flatten_toc(&self.book.manifest.toc);
        let toc_item = self
            .nearest(page.section, toc.iter().map(|(_, item)| *item), |item| {
                item.href.as_str()
            })
            .cloned();
        let page_item = self
            .nearest(page.section, self.book.manifest.page_list.iter(), |item| {
                item.href.as_str()
            })
            .cloned();
        let total = self.pages.len();
        self.events.push(ViewEvent::Relocate(RelocateEvent {
            fraction: self.fraction,
            location: Location {
                current: index,
                next: (index + 1).min(total),
                total,
            },
            toc_item,
            page_item,
            section: Some(SectionPosition {
                current: page.section,
                total: self.lines.len(),
            }),
        }));
    }

    fn forward(&mut self) {
        match self.current {
            None => self.display(0, None),
            Some(index) if index + 1 < self.pages.len() => self.display(index + 1, None),
            Some(_) => {}
        }
    }

    fn back(&mut self) {
        if let Some(index) = self.current
            && index > 0
        {
            self.display(index - 1, None);
        }
    }
}

impl AnnotationSink for ManifestView {
    fn add_annotation(&mut self, annotation: &Annotation) {
        let section = spine_index_of(annotation.value.as_str());
        if section.is_none() || section != self.shown_section {
            log::debug!(
                "annotation {} is not in the rendered section",
                annotation.value
            );
            return;
        }
        self.overlay.retain(|a| a.value != annotation.value);
        self.overlay.push(annotation.clone());
        self.events.push(ViewEvent::DrawAnnotation {
            annotation: annotation.clone(),
        });
    }
}

impl StyleTarget for ManifestView {
    fn set_styles(&mut self, css: &str) {
        self.styles = css.to_string();
    }
}

impl View for ManifestView {
    fn book(&self) -> &dyn Book {
        &self.book
    }

    fn next(&mut self) {
        self.forward();
    }

    fn go_left(&mut self) {
        match self.book.direction() {
            TextDirection::Ltr => self.back(),
            TextDirection::Rtl => self.forward(),
        }
    }

    fn go_right(&mut self) {
        match self.book.direction() {
            TextDirection::Ltr => self.forward(),
            TextDirection::Rtl => self.back(),
        }
    }

    fn go_to(&mut self, href: &str) -> anyhow::Result<()> {
        let section = self
            .book
            .manifest
            .section_of(href)
            .with_context(|| format!("no section for {href}"))?;
        let index = self
            .first_page_of(section)
            .with_context(|| format!("section {section} has no pages"))?;
        self.display(index, None);
        Ok(())
    }

    fn go_to_fraction(&mut self, fraction: f64) {
        let fraction = if fraction.is_finite() {
            fraction.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let last = self.pages.len().saturating_sub(1);
        let index = (fraction * last as f64).round() as usize;
        self.display(index.min(last), Some(fraction));
    }

    fn section_fractions(&self) -> Vec<f64> {
        let mut fractions: Vec<f64> = (0..self.lines.len())
            .filter_map(|section| self.first_page_of(section))
            .map(|index| self.page_fraction(index))
            .collect();
        fractions.push(1.0);
        fractions
    }

    fn set_flow(&mut self, flow: Flow) {
        if self.flow == flow {
            return;
        }
        let anchor = self.current.and_then(|index| self.pages.get(index).copied());
        self.flow = flow;
        self.paginate();
        log::debug!("{} pages in {flow} flow", self.pages.len());

        if let Some(anchor) = anchor {
            let index = self
                .pages
                .iter()
                .rposition(|page| page.section == anchor.section && page.start <= anchor.start)
                .unwrap_or(0);
            self.display(index, None);
        }
    }

    fn draw(&mut self, value: &AnnotationValue, primitive: DrawPrimitive, color: &HighlightColor) {
        self.decorations.retain(|d| &d.value != value);
        self.decorations.push(Decoration {
            value: value.clone(),
            primitive,
            color: color.clone(),
        });
    }

    fn visible_annotations(&self) -> Vec<AnnotationValue> {
        self.overlay.iter().map(|a| a.value.clone()).collect()
    }

    fn activate_annotation(&mut self, value: &AnnotationValue) {
        if self.overlay.iter().any(|a| &a.value == value) {
            self.events.push(ViewEvent::ShowAnnotation {
                value: value.clone(),
            });
        }
    }

    fn take_events(&mut self) -> Vec<ViewEvent> {
        std::mem::take(&mut self.events)
    }

    fn rendered(&self) -> RenderedPage {
        let text = self
            .current
            .and_then(|index| self.pages.get(index))
            .map(|page| {
                let lines = &self.lines[page.section];
                let end = (page.start + self.lines_per_page).min(lines.len());
                lines[page.start.min(end)..end].join("\n")
            })
            .unwrap_or_default();
        RenderedPage {
            text,
            decorations: self.decorations.clone(),
        }
    }

    fn style_target(&mut self) -> Option<&mut dyn StyleTarget> {
        Some(self)
    }
}

/// Opens manifests; other formats are recognised but have no renderer.
#[derive(Debug, Clone, Copy)]
pub struct ManifestViewFactory {
    pub lines_per_page: usize,
}

impl Default for ManifestViewFactory {
    fn default() -> Self {
        Self {
            lines_per_page: DEFAULT_LINES_PER_PAGE,
        }
    }
}

impl ManifestViewFactory {
    pub fn new(lines_per_page: usize) -> Self {
        Self { lines_per_page }
    }
}

impl ViewFactory for ManifestViewFactory {
    fn open(&self, source: LoadedSource) -> anyhow::Result<Box<dyn View>> {
        match sniff(&source) {
            SourceKind::Manifest => {}
            SourceKind::Epub => anyhow::bail!("no renderer for EPUB documents ({})", source.name),
            SourceKind::ComicArchive => {
                anyhow::bail!("no renderer for comic archives ({})", source.name)
            }
            SourceKind::Unknown => anyhow::bail!("no renderer for {}", source.name),
        }
        let manifest = Manifest::parse(&source.bytes)
            .with_context(|| format!("parsing {}", source.name))?;
        let base_dir = Path::new(&source.location).parent().map(Path::to_path_buf);
        log::info!(
            "opened manifest {} with {} sections",
            source.name,
            manifest.sections.len()
        );
        Ok(Box::new(ManifestView::new(
            ManifestBook::new(manifest, base_dir),
            self.lines_per_page,
        )))
    }
}
