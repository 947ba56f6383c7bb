//! Reader facade: one document session at a time.

use quire_core::{Flow, Key, LoadedSource, Settings, TextDirection, TocItem};

use crate::annotations::AnnotationIndex;
use crate::commands::{Command, CommandRegistry};
use crate::error::{ReaderError, error_chain};
use crate::navigation::{NavigationController, ProgressState};
use crate::overlay::OverlayBridge;
use crate::view::{HighlightDecoder, NoteSurface, SourceLoader, View, ViewEvent, ViewFactory};

/// Upper bound on event rounds per pump; views may queue events while handling others.
const MAX_EVENT_ROUNDS: usize = 16;

/// Identifies one `begin_open` call. Completions carrying an older token are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionToken(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Closed,
    Opening,
    Open,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenOutcome {
    Opened,
    Superseded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    Handled,
    /// A command the host shell has to run (sidebar, open prompt, quit).
    Shell(Command),
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookInfo {
    pub title: String,
    pub author: String,
    pub source_name: String,
    pub direction: TextDirection,
    pub toc: Vec<TocItem>,
    pub cover: Option<Vec<u8>>,
}

pub struct Session {
    token: SessionToken,
    info: BookInfo,
    view: Box<dyn View>,
    overlay: OverlayBridge,
    navigation: NavigationController,
    annotation_cursor: usize,
}

impl Session {
    pub fn token(&self) -> SessionToken {
        self.token
    }

    pub fn info(&self) -> &BookInfo {
        &self.info
    }

    pub fn view(&self) -> &dyn View {
        self.view.as_ref()
    }

    pub fn annotations(&self) -> &AnnotationIndex {
        self.overlay.index()
    }

    pub fn progress(&self) -> &ProgressState {
        self.navigation.progress()
    }

    fn dispatch(&mut self, surface: &mut dyn NoteSurface) -> usize {
        let mut dispatched = 0;
        for _ in 0..MAX_EVENT_ROUNDS {
            let events = self.view.take_events();
            if events.is_empty() {
                break;
            }
            for event in events {
                dispatched += 1;
                match event {
                    ViewEvent::Load { index } => {
                        log::debug!("section {index} loaded");
                        self.annotation_cursor = 0;
                    }
                    ViewEvent::Relocate(event) => self.navigation.relocate(&event),
                    ViewEvent::CreateOverlay { index } => {
                        self.overlay.create_overlay(index, self.view.as_mut());
                    }
                    ViewEvent::DrawAnnotation { annotation } => {
                        let view = self.view.as_mut();
                        self.overlay
                            .draw_annotation(&annotation, |primitive, color| {
                                view.draw(&annotation.value, primitive, color)
                            });
                    }
                    ViewEvent::ShowAnnotation { value } => {
                        self.overlay.show_annotation(&value, surface);
                    }
                }
            }
        }
        dispatched
    }
}

enum ReaderState {
    Closed,
    Opening(SessionToken),
    Open(Box<Session>),
}

pub struct Reader {
    factory: Box<dyn ViewFactory>,
    decoder: Box<dyn HighlightDecoder>,
    settings: Settings,
    commands: CommandRegistry,
    state: ReaderState,
    next_token: u64,
}

impl Reader {
    pub fn new(
        factory: Box<dyn ViewFactory>,
        decoder: Box<dyn HighlightDecoder>,
        mut settings: Settings,
    ) -> Self {
        settings.normalize();
        Self {
            factory,
            decoder,
            settings,
            commands: CommandRegistry::default(),
            state: ReaderState::Closed,
            next_token: 0,
        }
    }

    pub fn with_commands(mut self, commands: CommandRegistry) -> Self {
        self.commands = commands;
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn commands(&self) -> &CommandRegistry {
        &self.commands
    }

    pub fn phase(&self) -> Phase {
        match self.state {
            ReaderState::Closed => Phase::Closed,
            ReaderState::Opening(_) => Phase::Opening,
            ReaderState::Open(_) => Phase::Open,
        }
    }

    pub fn session(&self) -> Option<&Session> {
        match &self.state {
            ReaderState::Open(session) => Some(session),
            _ => None,
        }
    }

    fn session_mut(&mut self) -> Result<&mut Session, ReaderError> {
        match &mut self.state {
            ReaderState::Open(session) => Ok(session),
            _ => Err(ReaderError::NotOpen),
        }
    }

    /// Drops the current session and starts a new open. Supersedes any pending open.
    pub fn begin_open(&mut self) -> SessionToken {
        match &self.state {
            ReaderState::Open(session) => log::info!("closing {}", session.info.title),
            ReaderState::Opening(token) => log::info!("superseding pending open {token:?}"),
            ReaderState::Closed => {}
        }
        self.next_token += 1;
        let token = SessionToken(self.next_token);
        self.state = ReaderState::Opening(token);
        token
    }

    /// Completes the open started by `begin_open`, unless a newer one replaced it.
    pub fn finish_open(
        &mut self,
        token: SessionToken,
        name: &str,
        loaded: anyhow::Result<LoadedSource>,
    ) -> Result<OpenOutcome, ReaderError> {
        if !matches!(self.state, ReaderState::Opening(current) if current == token) {
            log::debug!("ignoring stale open of {name} ({token:?})");
            return Ok(OpenOutcome::Superseded);
        }

        let result = self.install_session(token, name, loaded);
        if let Err(err) = &result {
            log::error!("open {name} failed: {}", error_chain(err));
            self.state = ReaderState::Closed;
        }
        result.map(|()| OpenOutcome::Opened)
    }

    /// Fetch and open in one step.
    pub fn open(
        &mut self,
        loader: &dyn SourceLoader,
        source: &str,
    ) -> Result<OpenOutcome, ReaderError> {
        let token = self.begin_open();
        let loaded = loader.load(source);
        self.finish_open(token, source, loaded)
    }

    fn install_session(
        &mut self,
        token: SessionToken,
        name: &str,
        loaded: anyhow::Result<LoadedSource>,
    ) -> Result<(), ReaderError> {
        let source = loaded.map_err(|source| ReaderError::Source {
            name: name.to_string(),
            source,
        })?;
        let source_name = source.name.clone();

        let mut view = self
            .factory
            .open(source)
            .map_err(|source| ReaderError::Render {
                name: source_name.clone(),
                source,
            })?;

        let index = match view.book().bookmark_source() {
            Some(bookmarks) => bookmarks
                .calibre_bookmarks()
                .and_then(|list| AnnotationIndex::build(&list, self.decoder.as_ref())),
            None => Ok(AnnotationIndex::new()),
        }
        .map_err(|source| ReaderError::Annotations {
            name: source_name.clone(),
            source,
        })?;

        let book = view.book();
        let cover = match book.cover_source().map(|cover| cover.cover()) {
            Some(Ok(cover)) => cover,
            Some(Err(err)) => {
                log::warn!("cover of {source_name} unavailable: {err:#}");
                None
            }
            None => None,
        };
        let info = BookInfo {
            title: book.metadata().display_title(),
            author: book.metadata().display_author(),
            source_name,
            direction: book.direction(),
            toc: book.toc().to_vec(),
            cover,
        };

        if let Some(target) = view.style_target() {
            target.set_styles(&self.settings.style.css());
        }
        view.set_flow(self.settings.flow);

        let mut navigation = NavigationController::new();
        navigation.load_section_fractions(view.as_ref());
        view.next();

        log::info!(
            "opened {} ({} highlights)",
            info.title,
            index.len()
        );
        self.state = ReaderState::Open(Box::new(Session {
            token,
            info,
            view,
            overlay: OverlayBridge::new(index),
            navigation,
            annotation_cursor: 0,
        }));
        Ok(())
    }

    /// Dispatch queued view events. Returns how many were handled.
    pub fn pump(&mut self, surface: &mut dyn NoteSurface) -> usize {
        match &mut self.state {
            ReaderState::Open(session) => session.dispatch(surface),
            _ => 0,
        }
    }

    pub fn go_left(&mut self) -> Result<(), ReaderError> {
        let session = self.session_mut()?;
        session.navigation.go_left(session.view.as_mut());
        Ok(())
    }

    pub fn go_right(&mut self) -> Result<(), ReaderError> {
        let session = self.session_mut()?;
        session.navigation.go_right(session.view.as_mut());
        Ok(())
    }

    pub fn go_to_fraction(&mut self, fraction: f64) -> Result<f64, ReaderError> {
        let session = self.session_mut()?;
        Ok(session
            .navigation
            .go_to_fraction(session.view.as_mut(), fraction))
    }

    pub fn go_to(&mut self, href: &str) -> Result<(), ReaderError> {
        let session = self.session_mut()?;
        session.navigation.go_to(session.view.as_mut(), href)?;
        Ok(())
    }

    pub fn set_flow(&mut self, flow: Flow) {
        self.settings.flow = flow;
        if let ReaderState::Open(session) = &mut self.state {
            session.view.set_flow(flow);
        }
    }

    pub fn toggle_sidebar(&mut self) -> bool {
        self.settings.toggle_sidebar();
        self.settings.show_sidebar
    }

    /// Activate the next highlight on screen, cycling. Returns whether a note surfaced.
    pub fn activate_next_annotation(
        &mut self,
        surface: &mut dyn NoteSurface,
    ) -> Result<bool, ReaderError> {
        let session = self.session_mut()?;
        let visible = session.view.visible_annotations();
        if visible.is_empty() {
            return Ok(false);
        }
        let value = &visible[session.annotation_cursor % visible.len()];
        session.annotation_cursor = (session.annotation_cursor + 1) % visible.len();
        session.view.activate_annotation(value);

        let mut collector: Vec<String> = Vec::new();
        session.dispatch(&mut collector);
        for note in &collector {
            surface.show_note(note);
        }
        Ok(!collector.is_empty())
    }

    /// Navigation keys first, then the command registry.
    pub fn handle_key(&mut self, key: Key, surface: &mut dyn NoteSurface) -> KeyOutcome {
        if let ReaderState::Open(session) = &mut self.state
            && session.navigation.handle_key(session.view.as_mut(), key)
        {
            return KeyOutcome::Handled;
        }
        match self.commands.lookup(key) {
            Some(command) => self.run_command(command, surface),
            None => KeyOutcome::Ignored,
        }
    }

    pub fn run_command(&mut self, command: Command, surface: &mut dyn NoteSurface) -> KeyOutcome {
        if !command.is_reader_command() {
            return KeyOutcome::Shell(command);
        }
        let result = match command {
            Command::GoLeft => self.go_left(),
            Command::GoRight => self.go_right(),
            Command::SetFlow(flow) => {
                self.set_flow(flow);
                Ok(())
            }
            Command::NextAnnotation => self.activate_next_annotation(surface).map(|_| ()),
            Command::ToggleSidebar | Command::OpenFile | Command::Quit => Ok(()),
        };
        match result {
            Ok(()) => KeyOutcome::Handled,
            Err(ReaderError::NotOpen) => KeyOutcome::Ignored,
            Err(err) => {
                log::error!("{command} failed: {err}");
                KeyOutcome::Handled
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeBook, FakeFactory, FakeView, PassthroughDecoder, source};
    use anyhow::Context as _;
    use pretty_assertions::assert_eq;
    use quire_core::{
        AnnotationValue, HighlightColor, HighlightStyle, LanguageMap, RawBookmark,
    };

    fn highlight(spine: usize, start: &str, which: &str, note: Option<&str>) -> RawBookmark {
        RawBookmark {
            kind: "highlight".to_string(),
            spine_index: Some(spine),
            start_cfi: Some(start.to_string()),
            end_cfi: Some(start.to_string()),
            style: Some(HighlightStyle {
                kind: Some("color".to_string()),
                which: Some(which.to_string()),
            }),
            notes: note.map(str::to_string),
            ..RawBookmark::default()
        }
    }

    fn reader_with(view: FakeView) -> Reader {
        Reader::new(
            Box::new(FakeFactory {
                view,
                reject: false,
            }),
            Box::new(PassthroughDecoder),
            Settings::default(),
        )
    }

    fn reader_with_bookmarks(bookmarks: Vec<RawBookmark>) -> Reader {
        reader_with(FakeView {
            book: FakeBook {
                bookmarks: Some(bookmarks),
                ..FakeBook::default()
            },
            ..FakeView::default()
        })
    }

    struct StaticLoader;

    impl SourceLoader for StaticLoader {
        fn load(&self, name: &str) -> anyhow::Result<LoadedSource> {
            if name.starts_with("missing") {
                anyhow::bail!("HTTP error! status: 404");
            }
            Ok(source(name))
        }
    }

    #[test]
    fn open_transitions_to_open() -> anyhow::Result<()> {
        let mut reader = reader_with(FakeView::default());
        assert_eq!(reader.phase(), Phase::Closed);
        let outcome = reader.open(&StaticLoader, "dune.json")?;
        assert_eq!(outcome, OpenOutcome::Opened);
        assert_eq!(reader.phase(), Phase::Open);

        let info = reader.session().map(|s| s.info().clone());
        assert_eq!(info.map(|i| i.title), Some("dune.json".to_string()));
        Ok(())
    }

    #[test]
    fn load_failure_returns_to_closed() {
        let mut reader = reader_with(FakeView::default());
        let err = reader.open(&StaticLoader, "missing.json").unwrap_err();
        assert!(matches!(err, ReaderError::Source { .. }));
        assert_eq!(reader.phase(), Phase::Closed);
    }

    #[test]
    fn render_rejection_returns_to_closed() {
        let mut reader = Reader::new(
            Box::new(FakeFactory {
                view: FakeView::default(),
                reject: true,
            }),
            Box::new(PassthroughDecoder),
            Settings::default(),
        );
        let err = reader.open(&StaticLoader, "book.cbz").unwrap_err();
        assert!(matches!(err, ReaderError::Render { .. }));
        assert_eq!(reader.phase(), Phase::Closed);
    }

    #[test]
    fn decoder_failure_fails_open() {
        let mut broken = highlight(1, "/2", "yellow", None);
        broken.start_cfi = None;
        let mut reader = reader_with_bookmarks(vec![broken]);
        let err = reader.open(&StaticLoader, "book.json").unwrap_err();
        assert!(matches!(err, ReaderError::Annotations { .. }));
        assert_eq!(reader.phase(), Phase::Closed);
    }

    #[test]
    fn stale_completion_is_ignored() -> anyhow::Result<()> {
        let mut reader = reader_with(FakeView::default());
        let first = reader.begin_open();
        let second = reader.begin_open();

        let outcome = reader.finish_open(first, "old.json", Ok(source("old.json")))?;
        assert_eq!(outcome, OpenOutcome::Superseded);
        assert_eq!(reader.phase(), Phase::Opening);

        let outcome = reader.finish_open(second, "new.json", Ok(source("new.json")))?;
        assert_eq!(outcome, OpenOutcome::Opened);
        let title = reader.session().map(|s| s.info().title.clone());
        assert_eq!(title.as_deref(), Some("new.json"));

        // A late failure for the superseded open must not close the new session.
        let late = reader.finish_open(first, "old.json", Err(anyhow::anyhow!("late")))?;
        assert_eq!(late, OpenOutcome::Superseded);
        assert_eq!(reader.phase(), Phase::Open);
        Ok(())
    }

    #[test]
    fn new_open_replaces_session() -> anyhow::Result<()> {
        let mut reader = reader_with_bookmarks(vec![highlight(0, "a", "yellow", None)]);
        reader.open(&StaticLoader, "one.json")?;
        let first_token = reader.session().map(Session::token);
        reader.open(&StaticLoader, "two.json")?;
        let session = reader.session().context("no open session")?;
        assert_ne!(Some(session.token()), first_token);
        assert_eq!(session.info().title, "two.json");
        assert_eq!(session.annotations().len(), 1);
        Ok(())
    }

    #[test]
    fn section_render_draws_stored_highlight() -> anyhow::Result<()> {
        let mut reader = reader_with_bookmarks(vec![
            highlight(2, "epubcfi(/6/6!/4,/1:0,/1:9)", "yellow", Some("check this")),
            RawBookmark {
                kind: "bookmark".to_string(),
                ..RawBookmark::default()
            },
        ]);
        reader.open(&StaticLoader, "book.json")?;
        let mut notes: Vec<String> = Vec::new();
        reader.pump(&mut notes);

        let session = reader.session().context("no open session")?;
        assert!(session.view().rendered().decorations.is_empty());

        reader.go_to("section:2")?;
        reader.pump(&mut notes);

        let decorations = reader.session().context("no open session")?.view().rendered().decorations;
        assert_eq!(decorations.len(), 1);
        assert_eq!(decorations[0].color, HighlightColor::Yellow);
        assert_eq!(
            decorations[0].value,
            AnnotationValue::new("epubcfi(/6/6!/4,/1:0,/1:9)")
        );

        assert!(reader.activate_next_annotation(&mut notes)?);
        assert_eq!(notes, vec!["check this".to_string()]);
        Ok(())
    }

    #[test]
    fn relocation_updates_progress() -> anyhow::Result<()> {
        let mut reader = reader_with(FakeView::default());
        reader.open(&StaticLoader, "book.json")?;
        reader.pump(&mut Vec::new());
        let progress = reader.session().context("no open session")?.progress().clone();
        assert!(progress.visible);
        assert_eq!(progress.label, "Loc 0");
        Ok(())
    }

    #[test]
    fn fraction_is_clamped_through_facade() -> anyhow::Result<()> {
        let mut reader = reader_with(FakeView::default());
        assert!(matches!(
            reader.go_to_fraction(0.5),
            Err(ReaderError::NotOpen)
        ));
        reader.open(&StaticLoader, "book.json")?;
        assert_eq!(reader.go_to_fraction(1.5)?, 1.0);
        assert_eq!(reader.go_to_fraction(-0.2)?, 0.0);
        Ok(())
    }

    #[test]
    fn keys_route_to_navigation_then_commands() -> anyhow::Result<()> {
        let mut reader = reader_with(FakeView::default());
        let mut notes: Vec<String> = Vec::new();
        assert_eq!(reader.handle_key(Key::Right, &mut notes), KeyOutcome::Ignored);

        reader.open(&StaticLoader, "book.json")?;
        assert_eq!(reader.handle_key(Key::Right, &mut notes), KeyOutcome::Handled);
        assert_eq!(
            reader.handle_key(Key::Char('s'), &mut notes),
            KeyOutcome::Handled
        );
        assert_eq!(reader.settings().flow, Flow::Scrolled);
        assert_eq!(
            reader.handle_key(Key::Char('t'), &mut notes),
            KeyOutcome::Shell(Command::ToggleSidebar)
        );
        assert_eq!(reader.handle_key(Key::Char('z'), &mut notes), KeyOutcome::Ignored);
        Ok(())
    }

    #[test]
    fn book_info_collected_on_open() -> anyhow::Result<()> {
        let mut reader = reader_with(FakeView {
            book: FakeBook {
                metadata: quire_core::BookMetadata {
                    title: Some(LanguageMap::Plain("Styled".to_string())),
                    ..Default::default()
                },
                cover: Some(vec![1, 2, 3]),
                ..FakeBook::default()
            },
            ..FakeView::default()
        });
        reader.open(&StaticLoader, "book.json")?;
        let session = reader.session().context("no open session")?;
        assert_eq!(session.info().title, "Styled");
        assert_eq!(session.info().cover, Some(vec![1, 2, 3]));
        Ok(())
    }

    #[test]
    fn styles_and_flow_applied_before_first_page() -> anyhow::Result<()> {
        let view = FakeView::default();
        let calls = view.calls.clone();
        let settings = Settings {
            flow: Flow::Scrolled,
            ..Settings::default()
        };
        let css = settings.style.css();
        let mut reader = Reader::new(
            Box::new(FakeFactory {
                view,
                reject: false,
            }),
            Box::new(PassthroughDecoder),
            settings,
        );

        reader.open(&StaticLoader, "book.json")?;
        assert_eq!(
            calls.borrow().clone(),
            vec![
                format!("styles {css}"),
                "flow scrolled".to_string(),
                "next".to_string(),
            ]
        );
        Ok(())
    }
}
