//! ratatui-based UI.

use std::collections::VecDeque;
use std::io::{self, Stdout};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

use anyhow::Context as _;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{event, terminal};
use quire_application::{
    Command, KeyOutcome, NoteSurface, OpenOutcome, Phase, Reader, SessionToken, SourceLoader,
    error_chain,
};
use quire_core::{HighlightColor, Key, LoadedSource, Settings, TocItem, flatten_toc};
use quire_engine::FileLoader;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{
    Block, Borders, Clear, Gauge, HighlightSpacing, List, ListItem, ListState, Paragraph, Wrap,
};
use unicode_width::{UnicodeWidthChar as _, UnicodeWidthStr};

const ACCENT: Color = Color::Yellow;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenedDocument {
    pub source: String,
    pub title: String,
}

#[derive(Debug, Clone)]
pub struct UiOutcome {
    pub settings: Settings,
    pub opened: Vec<OpenedDocument>,
}

struct LoadMessage {
    token: SessionToken,
    source: String,
    loaded: anyhow::Result<LoadedSource>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Focus {
    #[default]
    Body,
    Sidebar,
}

#[derive(Debug, Clone, Default)]
struct SidebarPanel {
    selected: usize,
}

#[derive(Debug, Clone, Default)]
struct OpenPrompt {
    open: bool,
    input: String,
    error: Option<String>,
    recent_cursor: Option<usize>,
}

/// Notes surfaced by activated highlights, shown one at a time.
#[derive(Debug, Clone, Default)]
struct NotePanel {
    queue: VecDeque<String>,
}

impl NotePanel {
    fn is_open(&self) -> bool {
        !self.queue.is_empty()
    }
}

impl NoteSurface for NotePanel {
    fn show_note(&mut self, note: &str) {
        self.queue.push_back(note.to_string());
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Status {
    text: String,
    error: bool,
}

pub struct Ui {
    reader: Reader,
    loader: FileLoader,
    startup: Option<String>,
    recent: Vec<String>,
    focus: Focus,
    sidebar: SidebarPanel,
    prompt: OpenPrompt,
    notes: NotePanel,
    status: Option<Status>,
    pending: Option<String>,
    opened: Vec<OpenedDocument>,
    tx: Sender<LoadMessage>,
    rx: Receiver<LoadMessage>,
}

impl Ui {
    pub fn new(reader: Reader) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            reader,
            loader: FileLoader,
            startup: None,
            recent: Vec::new(),
            focus: Focus::default(),
            sidebar: SidebarPanel::default(),
            prompt: OpenPrompt::default(),
            notes: NotePanel::default(),
            status: None,
            pending: None,
            opened: Vec::new(),
            tx,
            rx,
        }
    }

    /// Document to open as soon as the terminal is up.
    pub fn with_startup(mut self, source: Option<String>) -> Self {
        self.startup = source;
        self
    }

    /// Recent sources, most recent first; offered by the open prompt.
    pub fn with_recent(mut self, recent: Vec<String>) -> Self {
        self.recent = recent;
        self
    }

    pub fn run(mut self) -> anyhow::Result<UiOutcome> {
        let mut terminal = setup_terminal()?;
        terminal.clear().ok();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            self.event_loop(&mut terminal)
        }));
        let restore_result = restore_terminal(&mut terminal);

        match (result, restore_result) {
            (Ok(Ok(())), Ok(())) => Ok(self.into_outcome()),
            (Ok(Ok(())), Err(err)) => Err(err),
            (Ok(Err(err)), Ok(())) => Err(err),
            (Ok(Err(err)), Err(_)) => Err(err),
            (Err(panic), Ok(())) => Err(anyhow::anyhow!(panic_to_string(panic))),
            (Err(panic), Err(err)) => Err(anyhow::anyhow!(
                "{}\n(additionally failed to restore terminal: {err})",
                panic_to_string(panic)
            )),
        }
    }

    fn into_outcome(self) -> UiOutcome {
        UiOutcome {
            settings: self.reader.settings().clone(),
            opened: self.opened,
        }
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> anyhow::Result<()> {
        let tick_rate = Duration::from_millis(100);
        let mut needs_redraw = true;

        match self.startup.take() {
            Some(source) => self.start_open(source),
            None => self.open_prompt(),
        }

        loop {
            if self.drain_loads() {
                needs_redraw = true;
            }

            if needs_redraw {
                terminal.draw(|frame| self.draw(frame.area(), frame))?;
                needs_redraw = false;
            }

            if !event::poll(tick_rate)? {
                continue;
            }

            match event::read()? {
                Event::Resize(_, _) => needs_redraw = true,
                Event::Key(key) => {
                    if key.kind == KeyEventKind::Release {
                        continue;
                    }
                    needs_redraw = true;
                    if self.handle_key(key) == LoopControl::Quit {
                        return Ok(());
                    }
                }
                _ => {}
            }
        }
    }

    /// Fetch on a worker thread; the result comes back through `drain_loads`.
    fn start_open(&mut self, source: String) {
        let token = self.reader.begin_open();
        let tx = self.tx.clone();
        let loader = self.loader;
        let name = source.clone();
        log::info!("opening {source}");
        thread::spawn(move || {
            let loaded = loader.load(&name);
            // The receiver is gone only when the UI has exited.
            let _ = tx.send(LoadMessage {
                token,
                source: name,
                loaded,
            });
        });
        self.status = None;
        self.pending = Some(source);
    }

    fn drain_loads(&mut self) -> bool {
        let mut changed = false;
        while let Ok(message) = self.rx.try_recv() {
            self.apply_load(message);
            changed = true;
        }
        changed
    }

    fn apply_load(&mut self, message: LoadMessage) {
        let LoadMessage {
            token,
            source,
            loaded,
        } = message;
        match self.reader.finish_open(token, &source, loaded) {
            Ok(OpenOutcome::Superseded) => {}
            Ok(OpenOutcome::Opened) => {
                self.pending = None;
                self.reader.pump(&mut self.notes);
                let title = self
                    .reader
                    .session()
                    .map(|session| session.info().title.clone())
                    .unwrap_or_default();
                self.set_status(format!("Opened {title}"), false);
                self.opened.push(OpenedDocument {
                    source: source.clone(),
                    title,
                });
                self.recent.retain(|recent| recent != &source);
                self.recent.insert(0, source);
                self.sidebar.selected = self.active_toc_row().unwrap_or(0);
            }
            Err(err) => {
                self.pending = None;
                self.set_status(error_chain(&err), true);
            }
        }
    }

    fn set_status(&mut self, text: String, error: bool) {
        self.status = Some(Status { text, error });
    }

    fn open_prompt(&mut self) {
        self.prompt = OpenPrompt {
            open: true,
            input: self.recent.first().cloned().unwrap_or_default(),
            error: None,
            recent_cursor: None,
        };
    }

    fn handle_key(&mut self, key: KeyEvent) -> LoopControl {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return LoopControl::Quit;
        }
        if self.notes.is_open() {
            if matches!(key.code, KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q')) {
                self.notes.queue.pop_front();
            }
            return LoopControl::Continue;
        }
        if self.prompt.open {
            self.handle_prompt_key(key);
            return LoopControl::Continue;
        }

        let Some(key) = map_key(key) else {
            return LoopControl::Continue;
        };

        if self.focus == Focus::Sidebar && self.reader.settings().show_sidebar {
            if self.handle_sidebar_key(key) {
                return LoopControl::Continue;
            }
        } else if key == Key::Tab && self.reader.settings().show_sidebar {
            self.focus = Focus::Sidebar;
            return LoopControl::Continue;
        }

        if self.handle_jump_key(key) {
            self.reader.pump(&mut self.notes);
            return LoopControl::Continue;
        }

        let outcome = self.reader.handle_key(key, &mut self.notes);
        self.reader.pump(&mut self.notes);
        match outcome {
            KeyOutcome::Handled | KeyOutcome::Ignored => LoopControl::Continue,
            KeyOutcome::Shell(command) => self.run_shell_command(command),
        }
    }

    fn run_shell_command(&mut self, command: Command) -> LoopControl {
        match command {
            Command::Quit => return LoopControl::Quit,
            Command::OpenFile => self.open_prompt(),
            Command::ToggleSidebar => {
                let shown = self.reader.toggle_sidebar();
                self.focus = if shown { Focus::Sidebar } else { Focus::Body };
                if shown {
                    self.sidebar.selected = self.active_toc_row().unwrap_or(self.sidebar.selected);
                }
            }
            other => log::debug!("{other} is not a shell command"),
        }
        LoopControl::Continue
    }

    /// Progress-bar style jumps: Home/End and digits as tenths of the book.
    fn handle_jump_key(&mut self, key: Key) -> bool {
        let fraction = match key {
            Key::Home => 0.0,
            Key::End => 1.0,
            Key::Char(ch @ '0'..='9') => f64::from(ch as u8 - b'0') / 10.0,
            _ => return false,
        };
        match self.reader.go_to_fraction(fraction) {
            Ok(_) => true,
            Err(err) => {
                log::debug!("jump ignored: {err}");
                false
            }
        }
    }

    fn handle_sidebar_key(&mut self, key: Key) -> bool {
        let rows = self.toc_rows().len();
        match key {
            Key::Esc | Key::Tab => {
                self.focus = Focus::Body;
                true
            }
            Key::Up | Key::Char('k') => {
                self.sidebar.selected = self.sidebar.selected.saturating_sub(1);
                true
            }
            Key::Down | Key::Char('j') => {
                if rows > 0 {
                    self.sidebar.selected = (self.sidebar.selected + 1).min(rows - 1);
                }
                true
            }
            Key::Enter => {
                let href = self
                    .toc_rows()
                    .get(self.sidebar.selected)
                    .map(|(_, item)| item.href.clone());
                if let Some(href) = href {
                    match self.reader.go_to(&href) {
                        Ok(()) => {
                            self.reader.pump(&mut self.notes);
                            self.status = None;
                            self.close_sidebar();
                        }
                        Err(err) => self.set_status(error_chain(&err), true),
                    }
                }
                true
            }
            _ => false,
        }
    }

    fn close_sidebar(&mut self) {
        self.focus = Focus::Body;
        if self.reader.settings().show_sidebar {
            self.reader.toggle_sidebar();
        }
    }

    fn handle_prompt_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.prompt.open = false,
            KeyCode::Enter => {
                let input = self.prompt.input.trim().to_string();
                if input.is_empty() || input == "." {
                    self.prompt.error = Some("enter a path or file:// URL".to_string());
                    return;
                }
                self.prompt.open = false;
                self.start_open(input);
            }
            KeyCode::Up | KeyCode::Down if !self.recent.is_empty() => {
                let len = self.recent.len();
                let next = match (self.prompt.recent_cursor, key.code) {
                    (None, KeyCode::Down) => 0,
                    (None, _) => len - 1,
                    (Some(i), KeyCode::Down) => (i + 1) % len,
                    (Some(i), _) => (i + len - 1) % len,
                };
                self.prompt.recent_cursor = Some(next);
                self.prompt.input = self.recent[next].clone();
            }
            KeyCode::Backspace => {
                self.prompt.input.pop();
                self.prompt.error = None;
            }
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.prompt.input.clear();
                self.prompt.error = None;
            }
            KeyCode::Char(ch) if !ch.is_control() => {
                self.prompt.input.push(ch);
                self.prompt.error = None;
            }
            _ => {}
        }
    }

    fn toc_rows(&self) -> Vec<(usize, &TocItem)> {
        self.reader
            .session()
            .map(|session| flatten_toc(&session.info().toc))
            .unwrap_or_default()
    }

    fn active_toc_row(&self) -> Option<usize> {
        let session = self.reader.session()?;
        let active = session.progress().active_toc_href.as_deref()?;
        self.toc_rows()
            .iter()
            .position(|(_, item)| item.href == active)
    }

    fn draw(&self, area: Rect, frame: &mut ratatui::Frame) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(3),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .split(area);

        let main = if self.reader.settings().show_sidebar {
            let columns = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
                .split(rows[0]);
            self.draw_sidebar(columns[0], frame);
            columns[1]
        } else {
            rows[0]
        };
        self.draw_body(main, frame);
        self.draw_progress(rows[1], rows[2], frame);
        self.draw_footer(rows[3], frame);

        if self.prompt.open {
            self.draw_prompt(area, frame);
        }
        if let Some(note) = self.notes.queue.front() {
            self.draw_note(note, area, frame);
        }
    }

    fn draw_sidebar(&self, area: Rect, frame: &mut ratatui::Frame) {
        let focused = self.focus == Focus::Sidebar;
        let border_style = if focused {
            Style::default().fg(ACCENT)
        } else {
            Style::default()
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(Span::styled(
                "Contents",
                Style::default().add_modifier(Modifier::BOLD),
            ));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let Some(session) = self.reader.session() else {
            frame.render_widget(Paragraph::new("(no document)"), inner);
            return;
        };
        let info = session.info();

        let sections = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0)])
            .split(inner);

        let width = usize::from(sections[0].width);
        let mut header = vec![Line::from(Span::styled(
            truncate_to_width(&info.title, width),
            Style::default().add_modifier(Modifier::BOLD),
        ))];
        if !info.author.is_empty() {
            header.push(Line::raw(truncate_to_width(&info.author, width)));
        }
        frame.render_widget(Paragraph::new(Text::from(header)), sections[0]);

        let rows = flatten_toc(&info.toc);
        let active = session.progress().active_toc_href.as_deref();
        let list_width = usize::from(sections[1].width).saturating_sub(2);
        let items: Vec<ListItem> = if rows.is_empty() {
            vec![ListItem::new(Line::raw("(no contents)"))]
        } else {
            rows.iter()
                .map(|(depth, item)| {
                    let label = format!("{}{}", "  ".repeat((*depth).min(8)), item.label);
                    let mut style = Style::default();
                    if active == Some(item.href.as_str()) {
                        style = style.fg(ACCENT).add_modifier(Modifier::BOLD);
                    }
                    ListItem::new(Line::styled(truncate_to_width(&label, list_width), style))
                })
                .collect()
        };

        let list = List::new(items)
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol("> ")
            .highlight_spacing(HighlightSpacing::Always);
        let mut state = ListState::default();
        if focused && !rows.is_empty() {
            state.select(Some(self.sidebar.selected.min(rows.len() - 1)));
        }
        frame.render_stateful_widget(list, sections[1], &mut state);
    }

    fn draw_body(&self, area: Rect, frame: &mut ratatui::Frame) {
        let mut block = Block::default().borders(Borders::ALL);

        let body = match (self.reader.phase(), self.reader.session()) {
            (Phase::Open, Some(session)) => {
                block = block.title(Span::styled(
                    session.info().title.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                ));
                let page = session.view().rendered();
                if !page.decorations.is_empty() {
                    let mut spans = vec![Span::raw(" highlights ")];
                    for decoration in &page.decorations {
                        spans.push(Span::styled(
                            "■ ",
                            Style::default().fg(highlight_color(&decoration.color)),
                        ));
                    }
                    spans.push(Span::raw("(n to show) "));
                    block = block.title_bottom(Line::from(spans));
                }
                Paragraph::new(page.text).wrap(Wrap { trim: false })
            }
            (Phase::Opening, _) => {
                let source = self.pending.as_deref().unwrap_or("document");
                Paragraph::new(format!("Loading {source}…")).alignment(Alignment::Center)
            }
            _ => Paragraph::new(Text::from(vec![
                Line::raw(""),
                Line::from(Span::styled(
                    "Quire",
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::raw("Press o to open a document."),
            ]))
            .alignment(Alignment::Center),
        };

        frame.render_widget(body.block(block), area);
    }

    fn draw_progress(&self, bar: Rect, ticks: Rect, frame: &mut ratatui::Frame) {
        let Some(progress) = self
            .reader
            .session()
            .map(|session| session.progress())
            .filter(|progress| progress.visible)
        else {
            return;
        };

        let gauge = Gauge::default()
            .gauge_style(Style::default().fg(ACCENT).bg(Color::DarkGray))
            .ratio(progress.fraction.clamp(0.0, 1.0))
            .label(progress.tooltip.clone());
        frame.render_widget(gauge, bar);

        let marks = tick_line(&progress.section_fractions, usize::from(ticks.width));
        frame.render_widget(
            Paragraph::new(marks).style(Style::default().fg(Color::DarkGray)),
            ticks,
        );
    }

    fn draw_footer(&self, area: Rect, frame: &mut ratatui::Frame) {
        let line = match &self.status {
            Some(status) if status.error => Line::from(Span::styled(
                status.text.clone(),
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )),
            Some(status) => Line::raw(status.text.clone()),
            None => Line::raw(help_line(&self.reader.commands().char_bindings())),
        };
        frame.render_widget(Paragraph::new(line), area);
    }

    fn draw_prompt(&self, area: Rect, frame: &mut ratatui::Frame) {
        let popup_area = centered_rect(70, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().borders(Borders::ALL).title(Span::styled(
            "Open",
            Style::default().add_modifier(Modifier::BOLD),
        ));
        let mut lines = vec![
            Line::raw("Path or file:// URL. Enter open, ↑/↓ recent, Esc cancel."),
            Line::from(vec![
                Span::styled("> ", Style::default().fg(ACCENT)),
                Span::raw(self.prompt.input.clone()),
            ]),
        ];
        if let Some(err) = &self.prompt.error {
            lines.push(Line::from(Span::styled(
                err.clone(),
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )));
        }
        frame.render_widget(
            Paragraph::new(Text::from(lines))
                .block(block)
                .wrap(Wrap { trim: true }),
            popup_area,
        );
    }

    fn draw_note(&self, note: &str, area: Rect, frame: &mut ratatui::Frame) {
        let popup_area = centered_rect(60, 40, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(ACCENT))
            .title(Span::styled(
                "Note",
                Style::default().add_modifier(Modifier::BOLD),
            ))
            .title_bottom(Line::raw(" Enter/Esc close "));
        frame.render_widget(
            Paragraph::new(note.to_string())
                .block(block)
                .wrap(Wrap { trim: false }),
            popup_area,
        );
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopControl {
    Continue,
    Quit,
}

fn map_key(key: KeyEvent) -> Option<Key> {
    let mapped = match key.code {
        KeyCode::Left => Key::Left,
        KeyCode::Right => Key::Right,
        KeyCode::Up => Key::Up,
        KeyCode::Down => Key::Down,
        KeyCode::PageUp => Key::PageUp,
        KeyCode::PageDown => Key::PageDown,
        KeyCode::Home => Key::Home,
        KeyCode::End => Key::End,
        KeyCode::Enter => Key::Enter,
        KeyCode::Esc => Key::Esc,
        KeyCode::Tab => Key::Tab,
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Char(' ') => Key::PageDown,
        KeyCode::Char(ch)
            if !key
                .modifiers
                .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
        {
            Key::Char(ch)
        }
        _ => return None,
    };
    Some(mapped)
}

fn highlight_color(color: &HighlightColor) -> Color {
    match color {
        HighlightColor::Yellow => Color::Yellow,
        HighlightColor::Green => Color::Green,
        HighlightColor::Blue => Color::Blue,
        HighlightColor::Pink => Color::Magenta,
        HighlightColor::Purple => Color::LightMagenta,
        HighlightColor::Other(name) => name.parse().unwrap_or(Color::Gray),
    }
}

fn help_line(bindings: &[(char, Command)]) -> String {
    let mut parts = vec!["←/→ page".to_string(), "0-9 jump".to_string()];
    parts.extend(
        bindings
            .iter()
            .map(|(ch, command)| format!("{ch} {}", command.description())),
    );
    parts.join(" · ")
}

/// Section boundaries as `|` marks across `width` columns.
fn tick_line(fractions: &[f64], width: usize) -> String {
    if width == 0 {
        return String::new();
    }
    let mut cells = vec![' '; width];
    for fraction in fractions {
        if !fraction.is_finite() {
            continue;
        }
        let column = (fraction.clamp(0.0, 1.0) * (width - 1) as f64).round() as usize;
        cells[column.min(width - 1)] = '|';
    }
    cells.into_iter().collect()
}

fn truncate_to_width(text: &str, max_width: usize) -> String {
    if UnicodeWidthStr::width(text) <= max_width {
        return text.to_string();
    }
    if max_width == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut width = 0usize;
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if width + w > max_width - 1 {
            break;
        }
        out.push(ch);
        width += w;
    }
    out.push('…');
    out
}

fn setup_terminal() -> anyhow::Result<Terminal<CrosstermBackend<Stdout>>> {
    terminal::enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    crossterm::execute!(stdout, EnterAlternateScreen).context("enter alt screen")?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).context("create terminal")
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> anyhow::Result<()> {
    terminal::disable_raw_mode().context("disable raw mode")?;
    crossterm::execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("leave alt screen")?;
    Ok(())
}

fn panic_to_string(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("panic: {s}")
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("panic: {s}")
    } else {
        "panic: (unknown payload)".to_string()
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
