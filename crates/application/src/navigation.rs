//! Reading position: input to view navigation, relocations back to progress state.

use quire_core::{Key, RelocateEvent, format_percent};

use crate::error::NavigationError;
use crate::view::View;

/// What the progress bar and sidebar show.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProgressState {
    pub fraction: f64,
    pub label: String,
    pub tooltip: String,
    pub visible: bool,
    pub active_toc_href: Option<String>,
    pub section_fractions: Vec<f64>,
}

#[derive(Debug, Default)]
pub struct NavigationController {
    progress: ProgressState,
}

pub fn clamp_fraction(fraction: f64) -> f64 {
    if fraction.is_nan() {
        0.0
    } else {
        fraction.clamp(0.0, 1.0)
    }
}

impl NavigationController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn progress(&self) -> &ProgressState {
        &self.progress
    }

    /// Tick marks for the progress bar.
    pub fn load_section_fractions(&mut self, view: &dyn View) {
        self.progress.section_fractions = view
            .section_fractions()
            .into_iter()
            .map(clamp_fraction)
            .collect();
    }

    pub fn go_left(&mut self, view: &mut dyn View) {
        view.go_left();
    }

    pub fn go_right(&mut self, view: &mut dyn View) {
        view.go_right();
    }

    /// Jump to a fraction of the book. Out-of-range input is clamped, not rejected.
    pub fn go_to_fraction(&mut self, view: &mut dyn View, fraction: f64) -> f64 {
        let fraction = clamp_fraction(fraction);
        self.progress.fraction = fraction;
        view.go_to_fraction(fraction);
        fraction
    }

    /// Navigate to a toc target. On rejection the progress state is untouched.
    pub fn go_to(&mut self, view: &mut dyn View, href: &str) -> Result<(), NavigationError> {
        view.go_to(href).map_err(|source| {
            log::error!("go to {href} failed: {source:#}");
            NavigationError::Rejected {
                href: href.to_string(),
                source,
            }
        })
    }

    pub fn relocate(&mut self, event: &RelocateEvent) {
        let fraction = clamp_fraction(event.fraction);
        let label = event.location_label();
        self.progress.tooltip = format!("{} · {label}", format_percent(fraction));
        self.progress.label = label;
        self.progress.fraction = fraction;
        self.progress.visible = true;
        if let Some(item) = &event.toc_item
            && !item.href.is_empty()
        {
            self.progress.active_toc_href = Some(item.href.clone());
        }
    }

    /// Page keys only; returns false for anything else.
    pub fn handle_key(&mut self, view: &mut dyn View, key: Key) -> bool {
        match key {
            Key::Left | Key::Char('h') | Key::PageUp => {
                self.go_left(view);
                true
            }
            Key::Right | Key::Char('l') | Key::PageDown => {
                self.go_right(view);
                true
            }
            _ => false,
        }
    }
}
