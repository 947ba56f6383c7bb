//! Named reader commands and their key bindings.

use std::collections::HashMap;

use quire_core::{Flow, Key};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    GoLeft,
    GoRight,
    SetFlow(Flow),
    ToggleSidebar,
    NextAnnotation,
    OpenFile,
    Quit,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::GoLeft => "go-left",
            Command::GoRight => "go-right",
            Command::SetFlow(Flow::Paginated) => "layout-paginated",
            Command::SetFlow(Flow::Scrolled) => "layout-scrolled",
            Command::ToggleSidebar => "toggle-sidebar",
            Command::NextAnnotation => "next-annotation",
            Command::OpenFile => "open-file",
            Command::Quit => "quit",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Command::GoLeft => "previous page",
            Command::GoRight => "next page",
            Command::SetFlow(Flow::Paginated) => "paginated layout",
            Command::SetFlow(Flow::Scrolled) => "scrolled layout",
            Command::ToggleSidebar => "contents",
            Command::NextAnnotation => "next highlight",
            Command::OpenFile => "open",
            Command::Quit => "quit",
        }
    }

    /// Commands the reader runs itself; the rest belong to the host shell.
    pub fn is_reader_command(&self) -> bool {
        matches!(
            self,
            Command::GoLeft | Command::GoRight | Command::SetFlow(_) | Command::NextAnnotation
        )
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Command {
    type Err = &'static str;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "go-left" => Ok(Command::GoLeft),
            "go-right" => Ok(Command::GoRight),
            "layout-paginated" => Ok(Command::SetFlow(Flow::Paginated)),
            "layout-scrolled" => Ok(Command::SetFlow(Flow::Scrolled)),
            "toggle-sidebar" => Ok(Command::ToggleSidebar),
            "next-annotation" => Ok(Command::NextAnnotation),
            "open-file" => Ok(Command::OpenFile),
            "quit" => Ok(Command::Quit),
            _ => Err("unknown command"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CommandRegistry {
    bindings: HashMap<Key, Command>,
}

impl Default for CommandRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.bind(Key::Char('p'), Command::SetFlow(Flow::Paginated));
        registry.bind(Key::Char('s'), Command::SetFlow(Flow::Scrolled));
        registry.bind(Key::Char('t'), Command::ToggleSidebar);
        registry.bind(Key::Char('n'), Command::NextAnnotation);
        registry.bind(Key::Char('o'), Command::OpenFile);
        registry.bind(Key::Char('q'), Command::Quit);
        registry
    }
}

impl CommandRegistry {
    pub fn empty() -> Self {
        Self {
            bindings: HashMap::new(),
        }
    }

    /// Returns the command previously bound to `key`.
    pub fn bind(&mut self, key: Key, command: Command) -> Option<Command> {
        self.bindings.insert(key, command)
    }

    pub fn unbind(&mut self, key: Key) -> Option<Command> {
        self.bindings.remove(&key)
    }

    pub fn lookup(&self, key: Key) -> Option<Command> {
        self.bindings.get(&key).copied()
    }

    /// Bound characters and their commands, sorted for help lines.
    pub fn char_bindings(&self) -> Vec<(char, Command)> {
        let mut out: Vec<(char, Command)> = self
            .bindings
            .iter()
            .filter_map(|(key, command)| match key {
                Key::Char(c) => Some((*c, *command)),
                _ => None,
            })
            .collect();
        out.sort_by_key(|(c, _)| *c);
        out
    }
}
