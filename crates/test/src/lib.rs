//! Test helpers and fixtures.

use std::fs;
use std::path::PathBuf;

use quire_application::Reader;
use quire_core::{Flow, HighlightStyle, RawBookmark, Settings};
use quire_engine::{CalibreHighlightDecoder, ManifestViewFactory};
use serde_json::json;
use tempfile::TempDir;

pub fn make_settings(lines_per_page: usize) -> Settings {
    Settings {
        lines_per_page,
        flow: Flow::Paginated,
        ..Settings::default()
    }
}

/// A calibre highlight export entry.
pub fn highlight(
    spine_index: usize,
    start_cfi: &str,
    end_cfi: &str,
    color: &str,
    note: Option<&str>,
) -> RawBookmark {
    RawBookmark {
        kind: "highlight".to_string(),
        spine_index: Some(spine_index),
        start_cfi: Some(start_cfi.to_string()),
        end_cfi: Some(end_cfi.to_string()),
        style: Some(HighlightStyle {
            kind: Some("color".to_string()),
            which: Some(color.to_string()),
        }),
        notes: note.map(str::to_string),
        ..RawBookmark::default()
    }
}

pub fn plain_bookmark(title: &str) -> RawBookmark {
    RawBookmark {
        kind: "bookmark".to_string(),
        title: Some(title.to_string()),
        pos: Some("epubcfi(/6/2!/4/2)".to_string()),
        ..RawBookmark::default()
    }
}

/// Four chapters of `lines` lines each, with a toc and a page list.
pub fn sample_manifest(lines: usize, bookmarks: &[RawBookmark]) -> String {
    let sections: Vec<_> = (1..=4)
        .map(|n| {
            let text: Vec<String> = (1..=lines).map(|l| format!("chapter {n} line {l}")).collect();
            json!({
                "href": format!("ch{n}.xhtml"),
                "title": format!("Chapter {n}"),
                "text": text.join("\n"),
            })
        })
        .collect();
    let toc: Vec<_> = (1..=4)
        .map(|n| json!({ "label": format!("Chapter {n}"), "href": format!("ch{n}.xhtml") }))
        .collect();
    json!({
        "metadata": {
            "title": { "en": "The Sample" },
            "author": ["Ann Author", { "name": "Bo Coauthor" }],
            "language": "en"
        },
        "dir": "ltr",
        "toc": toc,
        "sections": sections,
        "page_list": [
            { "label": "1", "href": "ch1.xhtml" },
            { "label": "9", "href": "ch3.xhtml" }
        ],
        "bookmarks": bookmarks,
    })
    .to_string()
}

/// Writes `manifest` into a fresh temporary directory.
pub fn write_manifest(manifest: &str) -> anyhow::Result<(TempDir, PathBuf)> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("book.json");
    fs::write(&path, manifest)?;
    Ok((dir, path))
}

pub fn manifest_reader(settings: Settings) -> Reader {
    Reader::new(
        Box::new(ManifestViewFactory::new(settings.lines_per_page)),
        Box::new(CalibreHighlightDecoder),
        settings,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_engine::Manifest;

    #[test]
    fn builds_settings() {
        let settings = make_settings(12);
        assert_eq!(settings.lines_per_page, 12);
    }

    #[test]
    fn sample_manifest_parses() -> anyhow::Result<()> {
        let json = sample_manifest(3, &[highlight(2, "/4/1:0", "/4/1:5", "yellow", None)]);
        let manifest = Manifest::parse(json.as_bytes())?;
        assert_eq!(manifest.sections.len(), 4);
        assert_eq!(manifest.bookmarks.map(|b| b.len()), Some(1));
        Ok(())
    }
}
