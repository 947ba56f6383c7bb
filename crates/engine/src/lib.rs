//! Document loading, highlight decoding and the manifest renderer.

mod calibre;
mod loader;
mod manifest;

pub use calibre::{CalibreHighlightDecoder, DecodeError, range_cfi, spine_index_of, spine_step};
pub use loader::{FileLoader, LoadError, SourceKind, sniff};
pub use manifest::{
    DEFAULT_LINES_PER_PAGE, Manifest, ManifestBook, ManifestSection, ManifestView,
    ManifestViewFactory,
};
