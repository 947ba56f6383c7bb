//! Injects stored highlights into rendered sections and decorates them.

use quire_core::{Annotation, AnnotationValue, HighlightColor};

use crate::annotations::AnnotationIndex;
use crate::view::{AnnotationSink, DrawPrimitive, NoteSurface};

#[derive(Debug, Default)]
pub struct OverlayBridge {
    index: AnnotationIndex,
}

impl OverlayBridge {
    pub fn new(index: AnnotationIndex) -> Self {
        Self { index }
    }

    pub fn index(&self) -> &AnnotationIndex {
        &self.index
    }

    /// A section was rendered: hand its highlights to the view.
    pub fn create_overlay<S: AnnotationSink + ?Sized>(&self, section: usize, sink: &mut S) {
        let list = self.index.section(section);
        if !list.is_empty() {
            log::debug!("section {section}: adding {} annotations", list.len());
        }
        for annotation in list {
            sink.add_annotation(annotation);
        }
    }

    /// Decorate an annotation the view already resolved.
    pub fn draw_annotation(
        &self,
        annotation: &Annotation,
        draw: impl FnOnce(DrawPrimitive, &HighlightColor),
    ) {
        draw(DrawPrimitive::Highlight, &annotation.color);
    }

    /// Surface the note of an activated annotation. Returns whether one was shown.
    pub fn show_annotation(&self, value: &AnnotationValue, surface: &mut dyn NoteSurface) -> bool {
        let Some(annotation) = self.index.by_value(value) else {
            log::warn!("activated unknown annotation {value}");
            return false;
        };
        match annotation.visible_note() {
            Some(note) => {
                surface.show_note(note);
                true
            }
            None => false,
        }
    }
}
