use std::fs::{self, File};
use std::path::Path;

use anyhow::Context as _;
use directories::ProjectDirs;
use quire_application::Reader;
use quire_engine::{CalibreHighlightDecoder, ManifestViewFactory};
use quire_storage::Storage;
use quire_ui::Ui;

const FILE_PATH_ENV: &str = "QUIRE_FILE_PATH";

fn main() {
    if let Err(err) = run() {
        log::error!("{err:#}");
        eprintln!("{err:?}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let project_dirs = ProjectDirs::from("dev", "quire", "quire").context("resolve project dirs")?;

    let config_dir = project_dirs.config_dir();
    fs::create_dir_all(config_dir)
        .with_context(|| format!("create config dir {}", config_dir.display()))?;
    init_logging(config_dir)?;

    let storage = Storage::open(config_dir.join("quire.db"))?;
    let settings = storage.load_settings()?;
    let recent = storage
        .recent_documents()?
        .into_iter()
        .map(|doc| doc.source)
        .collect();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let startup = startup_source(&args, std::env::var(FILE_PATH_ENV).ok());
    log::info!(
        "starting; document {}",
        startup.as_deref().unwrap_or("(none)")
    );

    let reader = Reader::new(
        Box::new(ManifestViewFactory::new(settings.lines_per_page)),
        Box::new(CalibreHighlightDecoder),
        settings,
    );
    let outcome = Ui::new(reader)
        .with_startup(startup)
        .with_recent(recent)
        .run()?;

    storage.save_settings(&outcome.settings)?;
    for doc in &outcome.opened {
        storage.record_opened(&doc.source, &doc.title)?;
    }
    Ok(())
}

/// The terminal is in raw mode while the UI runs, so logs go to a file.
fn init_logging(config_dir: &Path) -> anyhow::Result<()> {
    let log_path = config_dir.join("quire.log");
    let file = File::create(&log_path)
        .with_context(|| format!("create log file {}", log_path.display()))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .try_init()
        .context("init logger")?;
    Ok(())
}

/// `--file-path <p>`, `--file-path=<p>` or the first positional argument,
/// falling back to the environment. `.` or an empty value means no document.
fn startup_source(args: &[String], env: Option<String>) -> Option<String> {
    let mut positional = None;
    let mut flagged = None;
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--file-path" {
            flagged = iter.next().cloned();
        } else if let Some(value) = arg.strip_prefix("--file-path=") {
            flagged = Some(value.to_string());
        } else if positional.is_none() && !arg.starts_with("--") {
            positional = Some(arg.clone());
        }
    }

    let chosen = flagged.or(positional).or(env)?;
    let chosen = chosen.trim();
    if chosen.is_empty() || chosen == "." {
        None
    } else {
        Some(chosen.to_string())
    }
}
