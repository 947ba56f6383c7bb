//! In-memory view used by the unit tests.

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::Context as _;
use quire_core::{
    Annotation, AnnotationValue, BookMetadata, Flow, HighlightColor, LanguageMap, LoadedSource,
    RawBookmark, RelocateEvent, TocItem,
};

use crate::view::{
    AnnotationSink, Book, BookmarkSource, CoverSource, Decoration, DrawPrimitive, HighlightDecoder,
    RenderedPage, StyleTarget, View, ViewEvent, ViewFactory,
};

#[derive(Debug, Clone, Default)]
pub struct FakeBook {
    pub metadata: BookMetadata,
    pub toc: Vec<TocItem>,
    pub bookmarks: Option<Vec<RawBookmark>>,
    pub cover: Option<Vec<u8>>,
}

impl Book for FakeBook {
    fn metadata(&self) -> &BookMetadata {
        &self.metadata
    }

    fn toc(&self) -> &[TocItem] {
        &self.toc
    }

    fn cover_source(&self) -> Option<&dyn CoverSource> {
        self.cover.as_ref().map(|_| self as &dyn CoverSource)
    }

    fn bookmark_source(&self) -> Option<&dyn BookmarkSource> {
        self.bookmarks.as_ref().map(|_| self as &dyn BookmarkSource)
    }
}

impl CoverSource for FakeBook {
    fn cover(&self) -> anyhow::Result<Option<Vec<u8>>> {
        Ok(self.cover.clone())
    }
}

impl BookmarkSource for FakeBook {
    fn calibre_bookmarks(&self) -> anyhow::Result<Vec<RawBookmark>> {
        Ok(self.bookmarks.clone().unwrap_or_default())
    }
}

/// Calls a `FakeView` received. Clones of the view share one log, so a test
/// can still read it after the reader took ownership of the view.
pub type CallLog = Rc<RefCell<Vec<String>>>;

#[derive(Debug, Clone, Default)]
pub struct FakeView {
    pub book: FakeBook,
    pub calls: CallLog,
    pub fractions: Vec<f64>,
    pub reject_go_to: bool,
    pub events: Vec<ViewEvent>,
    pub added: Vec<Annotation>,
    pub drawn: Vec<Decoration>,
}

impl FakeView {
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.borrow_mut().push(call.into());
    }

    /// Pretend the renderer displayed `section`.
    pub fn render_section(&mut self, section: usize) {
        self.added.clear();
        self.drawn.clear();
        self.events.push(ViewEvent::Load { index: section });
        self.events.push(ViewEvent::CreateOverlay { index: section });
        self.events.push(ViewEvent::Relocate(RelocateEvent {
            fraction: section as f64 / 10.0,
            ..RelocateEvent::default()
        }));
    }
}

impl AnnotationSink for FakeView {
    fn add_annotation(&mut self, annotation: &Annotation) {
        self.added.push(annotation.clone());
        self.events.push(ViewEvent::DrawAnnotation {
            annotation: annotation.clone(),
        });
    }
}

impl StyleTarget for FakeView {
    fn set_styles(&mut self, css: &str) {
        self.record(format!("styles {css}"));
    }
}

impl View for FakeView {
    fn book(&self) -> &dyn Book {
        &self.book
    }

    fn next(&mut self) {
        self.record("next");
        self.render_section(0);
    }

    fn go_left(&mut self) {
        self.record("left");
    }

    fn go_right(&mut self) {
        self.record("right");
    }

    fn go_to(&mut self, href: &str) -> anyhow::Result<()> {
        if self.reject_go_to {
            anyhow::bail!("no section for {href}");
        }
        self.record(format!("goto {href}"));
        if let Some(section) = href
            .strip_prefix("section:")
            .and_then(|n| n.parse::<usize>().ok())
        {
            self.render_section(section);
        }
        Ok(())
    }

    fn go_to_fraction(&mut self, fraction: f64) {
        self.record(format!("fraction {fraction}"));
    }

    fn section_fractions(&self) -> Vec<f64> {
        self.fractions.clone()
    }

    fn set_flow(&mut self, flow: Flow) {
        self.record(format!("flow {flow}"));
    }

    fn draw(&mut self, value: &AnnotationValue, primitive: DrawPrimitive, color: &HighlightColor) {
        self.drawn.push(Decoration {
            value: value.clone(),
            primitive,
            color: color.clone(),
        });
    }

    fn visible_annotations(&self) -> Vec<AnnotationValue> {
        self.added.iter().map(|a| a.value.clone()).collect()
    }

    fn activate_annotation(&mut self, value: &AnnotationValue) {
        self.events.push(ViewEvent::ShowAnnotation {
            value: value.clone(),
        });
    }

    fn take_events(&mut self) -> Vec<ViewEvent> {
        std::mem::take(&mut self.events)
    }

    fn rendered(&self) -> RenderedPage {
        RenderedPage {
            text: String::new(),
            decorations: self.drawn.clone(),
        }
    }

    fn style_target(&mut self) -> Option<&mut dyn StyleTarget> {
        Some(self)
    }
}

/// Hands out a clone of `view`, or fails when `reject` is set.
#[derive(Debug, Clone, Default)]
pub struct FakeFactory {
    pub view: FakeView,
    pub reject: bool,
}

impl ViewFactory for FakeFactory {
    fn open(&self, source: LoadedSource) -> anyhow::Result<Box<dyn View>> {
        if self.reject {
            anyhow::bail!("unsupported document {}", source.name);
        }
        let mut view = self.view.clone();
        if view.book.metadata.title.is_none() {
            view.book.metadata.title = Some(LanguageMap::Plain(source.name));
        }
        Ok(Box::new(view))
    }
}

pub struct PassthroughDecoder;

impl HighlightDecoder for PassthroughDecoder {
    fn decode(&self, bookmark: &RawBookmark) -> anyhow::Result<AnnotationValue> {
        let start = bookmark.start_cfi.as_deref().context("missing start_cfi")?;
        Ok(AnnotationValue::new(start))
    }
}

pub fn source(name: &str) -> LoadedSource {
    LoadedSource {
        name: name.to_string(),
        location: format!("/books/{name}"),
        bytes: b"{}".to_vec(),
    }
}
