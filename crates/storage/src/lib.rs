//! Sqlite-backed persistence.

use std::path::Path;

use anyhow::Context as _;
use quire_core::{Flow, ReaderStyle, Settings};
use rusqlite::{Connection, OptionalExtension as _};

const RECENT_LIMIT: usize = 20;

#[derive(Debug)]
pub struct Storage {
    conn: Connection,
}

impl Storage {
    pub fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let conn = Connection::open(path.as_ref())
            .with_context(|| format!("open sqlite db at {}", path.as_ref().display()))?;
        let storage = Self { conn };
        storage.migrate()?;
        Ok(storage)
    }

    pub fn open_in_memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory sqlite db")?;
        let storage = Self { conn };
        storage.migrate()?;
        Ok(storage)
    }

    fn migrate(&self) -> anyhow::Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS settings (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                spacing REAL NOT NULL,
                justify INTEGER NOT NULL,
                hyphenate INTEGER NOT NULL,
                flow TEXT NOT NULL
            );
            INSERT OR IGNORE INTO settings (id, spacing, justify, hyphenate, flow)
            VALUES (1, 1.4, 1, 1, 'paginated');

            CREATE TABLE IF NOT EXISTS recent_documents (
                source TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                opened_at INTEGER NOT NULL DEFAULT (unixepoch())
            );
            "#,
        )?;

        self.add_column("lines_per_page INTEGER NOT NULL DEFAULT 30")?;
        self.add_column("show_sidebar INTEGER NOT NULL DEFAULT 0")?;
        Ok(())
    }

    fn add_column(&self, definition: &str) -> anyhow::Result<()> {
        match self
            .conn
            .execute(&format!("ALTER TABLE settings ADD COLUMN {definition}"), [])
        {
            Ok(_) => Ok(()),
            Err(err) if err.to_string().contains("duplicate column name") => Ok(()),
            Err(err) => Err(err).with_context(|| format!("add settings column {definition}")),
        }
    }

    pub fn load_settings(&self) -> anyhow::Result<Settings> {
        let row = self
            .conn
            .query_row(
                "SELECT spacing, justify, hyphenate, flow, lines_per_page, show_sidebar FROM settings WHERE id = 1",
                [],
                |row| {
                    let spacing: f64 = row.get(0)?;
                    let justify: bool = row.get(1)?;
                    let hyphenate: bool = row.get(2)?;
                    let flow: String = row.get(3)?;
                    let lines_per_page: i64 = row.get(4)?;
                    let show_sidebar: bool = row.get(5)?;
                    Ok((spacing, justify, hyphenate, flow, lines_per_page, show_sidebar))
                },
            )
            .optional()?;

        let Some((spacing, justify, hyphenate, flow, lines_per_page, show_sidebar)) = row else {
            return Ok(Settings::default());
        };

        let defaults = Settings::default();
        let mut settings = Settings {
            style: ReaderStyle {
                spacing: spacing as f32,
                justify,
                hyphenate,
            },
            flow: flow.parse::<Flow>().unwrap_or(defaults.flow),
            lines_per_page: usize::try_from(lines_per_page).unwrap_or(defaults.lines_per_page),
            show_sidebar,
        };
        settings.normalize();
        Ok(settings)
    }

    pub fn save_settings(&self, settings: &Settings) -> anyhow::Result<()> {
        let mut settings = settings.clone();
        settings.normalize();

        self.conn.execute(
            "UPDATE settings SET spacing = ?, justify = ?, hyphenate = ?, flow = ?, lines_per_page = ?, show_sidebar = ? WHERE id = 1",
            (
                f64::from(settings.style.spacing),
                settings.style.justify,
                settings.style.hyphenate,
                settings.flow.as_str(),
                settings.lines_per_page as i64,
                settings.show_sidebar,
            ),
        )?;
        Ok(())
    }

    /// Remember a successfully opened document; older entries are pruned.
    ///
    /// Re-opening moves the entry to the front. Entries opened within the same
    /// second keep insertion order, so the old row is replaced rather than updated.
    pub fn record_opened(&self, source: &str, title: &str) -> anyhow::Result<()> {
        self.conn
            .execute("DELETE FROM recent_documents WHERE source = ?", [source])?;
        self.conn.execute(
            "INSERT INTO recent_documents (source, title) VALUES (?, ?)",
            (source, title),
        )?;
        self.conn.execute(
            r#"
            DELETE FROM recent_documents WHERE source NOT IN (
                SELECT source FROM recent_documents
                ORDER BY opened_at DESC, rowid DESC LIMIT ?
            )
            "#,
            [RECENT_LIMIT as i64],
        )?;
        Ok(())
    }

    /// Most recent first.
    pub fn recent_documents(&self) -> anyhow::Result<Vec<RecentDocument>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT source, title, opened_at FROM recent_documents
            ORDER BY opened_at DESC, rowid DESC
            "#,
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(RecentDocument {
                source: row.get(0)?,
                title: row.get(1)?,
                opened_at: row.get(2)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentDocument {
    pub source: String,
    pub title: String,
    /// Unix seconds.
    pub opened_at: i64,
}
