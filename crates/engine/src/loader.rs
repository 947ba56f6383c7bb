use std::fs;
use std::path::{Path, PathBuf};

use percent_encoding::percent_decode_str;
use quire_application::SourceLoader;
use quire_core::LoadedSource;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("unsupported source {0}; only paths and file:// URLs can be opened")]
    UnsupportedScheme(String),

    #[error("no document path given")]
    EmptySource,

    #[error("failed to read {}", path.display())]
    Fetch {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Epub,
    ComicArchive,
    Manifest,
    Unknown,
}

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const EPUB_MIMETYPE: &[u8] = b"application/epub+zip";

/// Guess the format from the leading bytes.
pub fn sniff(source: &LoadedSource) -> SourceKind {
    let bytes = source.bytes.as_slice();
    if bytes.starts_with(ZIP_MAGIC) {
        // EPUB stores an uncompressed `mimetype` entry first.
        let head = &bytes[..bytes.len().min(128)];
        if head.windows(EPUB_MIMETYPE.len()).any(|w| w == EPUB_MIMETYPE) {
            return SourceKind::Epub;
        }
        return SourceKind::ComicArchive;
    }
    let body = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match body.iter().find(|b| !b.is_ascii_whitespace()) {
        Some(b'{') => SourceKind::Manifest,
        _ => SourceKind::Unknown,
    }
}

/// Reads documents from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileLoader;

impl FileLoader {
    pub fn resolve(source: &str) -> Result<PathBuf, LoadError> {
        let source = source.trim();
        if source.is_empty() {
            return Err(LoadError::EmptySource);
        }
        if let Some(rest) = source.strip_prefix("file://") {
            let decoded = percent_decode_str(rest).decode_utf8_lossy();
            return Ok(PathBuf::from(decoded.as_ref()));
        }
        if source.contains("://") {
            return Err(LoadError::UnsupportedScheme(source.to_string()));
        }
        Ok(PathBuf::from(source))
    }

    pub fn load_path(&self, path: &Path) -> Result<LoadedSource, LoadError> {
        let bytes = fs::read(path).map_err(|source| LoadError::Fetch {
            path: path.to_path_buf(),
            source,
        })?;
        let name = path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        log::debug!("read {} bytes from {}", bytes.len(), path.display());
        Ok(LoadedSource {
            name,
            location: path.display().to_string(),
            bytes,
        })
    }
}

impl SourceLoader for FileLoader {
    fn load(&self, source: &str) -> anyhow::Result<LoadedSource> {
        let path = Self::resolve(source)?;
        Ok(self.load_path(&path)?)
    }
}
