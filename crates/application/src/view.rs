//! Capability interfaces for the rendering component and the book it opened.
//!
//! The renderer owns parsing, layout and pagination. The shell only talks to it
//! through these traits. Optional capabilities (styles, covers, bookmark export)
//! are exposed as accessors returning `Option`, so callers check for presence
//! instead of probing.

use quire_core::{
    Annotation, AnnotationValue, BookMetadata, Flow, HighlightColor, LoadedSource, RawBookmark,
    RelocateEvent, TextDirection, TocItem,
};

/// Notifications a view queues while it renders and navigates.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    /// A section document finished loading.
    Load { index: usize },
    Relocate(RelocateEvent),
    /// A section was rendered and has a fresh overlay for annotations.
    CreateOverlay { index: usize },
    /// An annotation added to the rendered section needs a decoration.
    DrawAnnotation { annotation: Annotation },
    /// The user activated an annotation.
    ShowAnnotation { value: AnnotationValue },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawPrimitive {
    Highlight,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoration {
    pub value: AnnotationValue,
    pub primitive: DrawPrimitive,
    pub color: HighlightColor,
}

/// What the view currently shows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RenderedPage {
    pub text: String,
    pub decorations: Vec<Decoration>,
}

pub trait AnnotationSink {
    fn add_annotation(&mut self, annotation: &Annotation);
}

pub trait View: AnnotationSink {
    fn book(&self) -> &dyn Book;

    /// Display the first page after opening.
    fn next(&mut self);
    fn go_left(&mut self);
    fn go_right(&mut self);
    fn go_to(&mut self, href: &str) -> anyhow::Result<()>;
    fn go_to_fraction(&mut self, fraction: f64);
    fn section_fractions(&self) -> Vec<f64>;
    fn set_flow(&mut self, flow: Flow);

    fn draw(&mut self, value: &AnnotationValue, primitive: DrawPrimitive, color: &HighlightColor);
    fn visible_annotations(&self) -> Vec<AnnotationValue>;
    fn activate_annotation(&mut self, value: &AnnotationValue);

    fn take_events(&mut self) -> Vec<ViewEvent>;
    fn rendered(&self) -> RenderedPage;

    fn style_target(&mut self) -> Option<&mut dyn StyleTarget> {
        None
    }
}

pub trait StyleTarget {
    fn set_styles(&mut self, css: &str);
}

pub trait Book {
    fn metadata(&self) -> &BookMetadata;
    fn toc(&self) -> &[TocItem];

    fn direction(&self) -> TextDirection {
        TextDirection::Ltr
    }

    fn cover_source(&self) -> Option<&dyn CoverSource> {
        None
    }

    fn bookmark_source(&self) -> Option<&dyn BookmarkSource> {
        None
    }
}

pub trait CoverSource {
    fn cover(&self) -> anyhow::Result<Option<Vec<u8>>>;
}

pub trait BookmarkSource {
    fn calibre_bookmarks(&self) -> anyhow::Result<Vec<RawBookmark>>;
}

/// Builds a view for a fetched source. Rejecting the source is an open failure.
pub trait ViewFactory {
    fn open(&self, source: LoadedSource) -> anyhow::Result<Box<dyn View>>;
}

/// Fetches a document by path or URL.
pub trait SourceLoader {
    fn load(&self, source: &str) -> anyhow::Result<LoadedSource>;
}

/// Turns a native highlight descriptor into a canonical annotation value.
pub trait HighlightDecoder {
    fn decode(&self, bookmark: &RawBookmark) -> anyhow::Result<AnnotationValue>;
}

/// Shows an annotation note to the user. Blocking is acceptable.
pub trait NoteSurface {
    fn show_note(&mut self, note: &str);
}

impl NoteSurface for Vec<String> {
    fn show_note(&mut self, note: &str) {
        self.push(note.to_string());
    }
}
