//! Calibre highlight export -> EPUB CFI ranges.
//!
//! Calibre stores a highlight as a spine index plus two CFIs relative to that
//! spine item's document. The canonical value is a range CFI rooted at the
//! package spine: `epubcfi(/6/N!parent,start,end)`.

use quire_application::HighlightDecoder;
use quire_core::{AnnotationValue, RawBookmark};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("highlight has no {0}")]
    Missing(&'static str),

    #[error("malformed cfi {0:?}")]
    Malformed(String),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CalibreHighlightDecoder;

impl CalibreHighlightDecoder {
    pub fn to_cfi(&self, bookmark: &RawBookmark) -> Result<String, DecodeError> {
        let spine_index = bookmark
            .spine_index
            .ok_or(DecodeError::Missing("spine_index"))?;
        let start = bookmark
            .start_cfi
            .as_deref()
            .ok_or(DecodeError::Missing("start_cfi"))?;
        let end = bookmark
            .end_cfi
            .as_deref()
            .ok_or(DecodeError::Missing("end_cfi"))?;
        range_cfi(spine_index, start, end)
    }
}

impl HighlightDecoder for CalibreHighlightDecoder {
    fn decode(&self, bookmark: &RawBookmark) -> anyhow::Result<AnnotationValue> {
        Ok(AnnotationValue::new(self.to_cfi(bookmark)?))
    }
}

/// `/6/{(index + 1) * 2}`, the spine step of a package document.
pub fn spine_step(spine_index: usize) -> String {
    format!("/6/{}", (spine_index + 1) * 2)
}

/// Recovers the spine index from a value produced by `range_cfi` (or any CFI
/// rooted at the package spine).
pub fn spine_index_of(cfi: &str) -> Option<usize> {
    let body = cfi
        .strip_prefix("epubcfi(")
        .and_then(|rest| rest.strip_suffix(')'))
        .unwrap_or(cfi);
    let rest = body.strip_prefix("/6/")?;
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    let step: usize = digits.parse().ok()?;
    if step < 2 || step % 2 != 0 {
        return None;
    }
    Some(step / 2 - 1)
}

fn steps(cfi: &str) -> Result<Vec<&str>, DecodeError> {
    let trimmed = cfi.trim().trim_start_matches('/');
    if trimmed.is_empty() {
        return Err(DecodeError::Malformed(cfi.to_string()));
    }
    let steps: Vec<&str> = trimmed.split('/').collect();
    let well_formed = steps
        .iter()
        .all(|step| step.chars().next().is_some_and(|c| c.is_ascii_digit()));
    if !well_formed {
        return Err(DecodeError::Malformed(cfi.to_string()));
    }
    Ok(steps)
}

/// Range CFI with the longest common step prefix of both ends as parent.
pub fn range_cfi(spine_index: usize, start: &str, end: &str) -> Result<String, DecodeError> {
    let start_steps = steps(start)?;
    let end_steps = steps(end)?;

    let max_shared = start_steps.len().min(end_steps.len()) - 1;
    let shared = start_steps
        .iter()
        .zip(&end_steps)
        .take(max_shared)
        .take_while(|(a, b)| a == b)
        .count();

    let join = |steps: &[&str]| -> String {
        steps.iter().map(|step| format!("/{step}")).collect()
    };

    Ok(format!(
        "epubcfi({}!{},{},{})",
        spine_step(spine_index),
        join(&start_steps[..shared]),
        join(&start_steps[shared..]),
        join(&end_steps[shared..]),
    ))
}
