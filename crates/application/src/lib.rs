//! Application orchestration layer for Quire.
//!
//! Wires rendering-component events to the annotation store, the overlay bridge
//! and the navigation controller, and owns the document session lifecycle.

mod annotations;
mod commands;
mod error;
mod navigation;
mod overlay;
mod reader;
mod view;

#[cfg(test)]
mod testing;

pub use annotations::AnnotationIndex;
pub use commands::{Command, CommandRegistry};
pub use error::{NavigationError, ReaderError, error_chain};
pub use navigation::{NavigationController, ProgressState, clamp_fraction};
pub use overlay::OverlayBridge;
pub use reader::{BookInfo, KeyOutcome, OpenOutcome, Phase, Reader, Session, SessionToken};
pub use view::{
    AnnotationSink, Book, BookmarkSource, CoverSource, Decoration, DrawPrimitive,
    HighlightDecoder, NoteSurface, RenderedPage, SourceLoader, StyleTarget, View, ViewEvent,
    ViewFactory,
};
