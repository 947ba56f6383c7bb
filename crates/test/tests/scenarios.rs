use std::fs;

use anyhow::Context as _;
use pretty_assertions::assert_eq;
use quire_application::{NavigationError, OpenOutcome, Phase, Reader, ReaderError};
use quire_core::{AnnotationValue, Flow, HighlightColor};
use quire_engine::FileLoader;
use quire_storage::Storage;
use quire_test::{
    highlight, make_settings, manifest_reader, plain_bookmark, sample_manifest, write_manifest,
};
use rstest::rstest;

/// Ten lines per chapter at five lines per page: two pages per chapter.
fn open_sample(bookmarks: &[quire_core::RawBookmark]) -> anyhow::Result<(tempfile::TempDir, Reader)> {
    let (dir, path) = write_manifest(&sample_manifest(10, bookmarks))?;
    let mut reader = manifest_reader(make_settings(5));
    let outcome = reader.open(&FileLoader, path.to_str().context("utf-8 path")?)?;
    assert_eq!(outcome, OpenOutcome::Opened);
    reader.pump(&mut Vec::new());
    Ok((dir, reader))
}

#[test]
fn highlight_is_drawn_when_its_section_renders() -> anyhow::Result<()> {
    let (_dir, mut reader) = open_sample(&[
        highlight(2, "/4/2/1:0", "/4/2/1:12", "yellow", Some("check this")),
        plain_bookmark("start"),
    ])?;
    let mut notes: Vec<String> = Vec::new();

    let session = reader.session().context("no session")?;
    assert_eq!(session.info().title, "The Sample");
    assert_eq!(session.info().author, "Ann Author & Bo Coauthor");
    assert_eq!(session.annotations().len(), 1);
    assert!(session.view().rendered().decorations.is_empty());

    reader.go_to("ch3.xhtml")?;
    reader.pump(&mut notes);

    let page = reader.session().context("no session")?.view().rendered();
    assert_eq!(page.decorations.len(), 1);
    assert_eq!(page.decorations[0].color, HighlightColor::Yellow);
    assert_eq!(
        page.decorations[0].value,
        AnnotationValue::new("epubcfi(/6/6!/4/2,/1:0,/1:12)")
    );
    assert!(page.text.starts_with("chapter 3 line 1"));

    assert!(reader.activate_next_annotation(&mut notes)?);
    assert_eq!(notes, vec!["check this".to_string()]);
    Ok(())
}

#[test]
fn leaving_the_section_clears_decorations() -> anyhow::Result<()> {
    let (_dir, mut reader) =
        open_sample(&[highlight(1, "/2/1:0", "/2/1:4", "green", None)])?;
    let mut notes: Vec<String> = Vec::new();

    reader.go_to("ch2.xhtml")?;
    reader.pump(&mut notes);
    assert_eq!(
        reader.session().context("no session")?.view().rendered().decorations.len(),
        1
    );

    reader.go_to("ch4.xhtml")?;
    reader.pump(&mut notes);
    let session = reader.session().context("no session")?;
    assert!(session.view().rendered().decorations.is_empty());
    assert!(!reader.activate_next_annotation(&mut notes)?);
    assert!(notes.is_empty());
    Ok(())
}

#[test]
fn empty_note_surfaces_nothing() -> anyhow::Result<()> {
    let (_dir, mut reader) =
        open_sample(&[highlight(0, "/2/1:0", "/2/1:4", "blue", Some(""))])?;
    let mut notes: Vec<String> = Vec::new();
    assert!(!reader.activate_next_annotation(&mut notes)?);
    assert!(notes.is_empty());
    Ok(())
}

#[test]
fn imported_color_name_is_kept() -> anyhow::Result<()> {
    let (_dir, reader) =
        open_sample(&[highlight(0, "/2/1:0", "/2/1:4", "red", Some("   "))])?;
    let session = reader.session().context("no session")?;
    let stored = session
        .annotations()
        .by_value(&AnnotationValue::new("epubcfi(/6/2!/2,/1:0,/1:4)"))
        .context("highlight not indexed")?;
    assert_eq!(stored.color.as_str(), "red");
    assert_eq!(stored.visible_note(), Some("   "));
    Ok(())
}

#[rstest]
#[case(1.5, 1.0, "100% · Page 9")]
#[case(-0.2, 0.0, "0% · Page 1")]
fn out_of_range_fraction_is_clamped(
    #[case] input: f64,
    #[case] expected: f64,
    #[case] tooltip: &str,
) -> anyhow::Result<()> {
    let (_dir, mut reader) = open_sample(&[])?;
    assert_eq!(reader.go_to_fraction(input)?, expected);
    reader.pump(&mut Vec::new());

    let progress = reader.session().context("no session")?.progress();
    assert_eq!(progress.fraction, expected);
    assert_eq!(progress.tooltip, tooltip);
    Ok(())
}

#[test]
fn go_to_fraction_is_idempotent() -> anyhow::Result<()> {
    let (_dir, mut reader) = open_sample(&[])?;
    reader.go_to_fraction(0.4)?;
    reader.pump(&mut Vec::new());
    let first = reader.session().context("no session")?.progress().clone();

    reader.go_to_fraction(0.4)?;
    reader.pump(&mut Vec::new());
    let second = reader.session().context("no session")?.progress().clone();
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn relocation_tracks_toc_and_ticks() -> anyhow::Result<()> {
    let (_dir, mut reader) = open_sample(&[])?;
    reader.go_to("ch2.xhtml#middle")?;
    reader.pump(&mut Vec::new());

    let progress = reader.session().context("no session")?.progress();
    assert!(progress.visible);
    assert_eq!(progress.active_toc_href.as_deref(), Some("ch2.xhtml"));
    assert_eq!(progress.label, "Page 1");
    assert_eq!(
        progress.section_fractions,
        vec![0.0, 2.0 / 7.0, 4.0 / 7.0, 6.0 / 7.0, 1.0]
    );
    Ok(())
}

#[test]
fn unknown_href_leaves_progress_alone() -> anyhow::Result<()> {
    let (_dir, mut reader) = open_sample(&[])?;
    let before = reader.session().context("no session")?.progress().clone();

    let err = reader.go_to("appendix.xhtml").unwrap_err();
    assert!(matches!(
        err,
        ReaderError::Navigation(NavigationError::Rejected { .. })
    ));
    reader.pump(&mut Vec::new());
    assert_eq!(reader.session().context("no session")?.progress(), &before);
    Ok(())
}

#[test]
fn epub_archives_have_no_renderer() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("book.epub");
    fs::write(&path, b"PK\x03\x04\x0a\x00\x00\x00\x00\x00mimetypeapplication/epub+zip")?;

    let mut reader = manifest_reader(make_settings(5));
    let err = reader
        .open(&FileLoader, path.to_str().context("utf-8 path")?)
        .unwrap_err();
    assert!(matches!(err, ReaderError::Render { .. }));
    assert_eq!(reader.phase(), Phase::Closed);
    Ok(())
}

#[test]
fn missing_file_is_a_source_error() {
    let mut reader = manifest_reader(make_settings(5));
    let err = reader
        .open(&FileLoader, "/no/such/dir/book.json")
        .unwrap_err();
    assert!(matches!(err, ReaderError::Source { .. }));
    assert_eq!(reader.phase(), Phase::Closed);
}

#[test]
fn undecodable_highlight_fails_the_open() -> anyhow::Result<()> {
    let mut broken = highlight(1, "/2/1:0", "/2/1:4", "yellow", None);
    broken.end_cfi = None;
    let (_dir, path) = write_manifest(&sample_manifest(10, &[broken]))?;

    let mut reader = manifest_reader(make_settings(5));
    let err = reader
        .open(&FileLoader, path.to_str().context("utf-8 path")?)
        .unwrap_err();
    assert!(matches!(err, ReaderError::Annotations { .. }));
    assert_eq!(reader.phase(), Phase::Closed);
    Ok(())
}

#[test]
fn layout_choice_survives_restart() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let db = dir.path().join("quire.db");
    let (_book_dir, mut reader) = open_sample(&[])?;

    reader.set_flow(Flow::Scrolled);
    Storage::open(&db)?.save_settings(reader.settings())?;

    let settings = Storage::open(&db)?.load_settings()?;
    assert_eq!(settings.flow, Flow::Scrolled);
    assert_eq!(settings.lines_per_page, 5);
    Ok(())
}
