//! Note files on disk.
//!
//! Notes are plain UTF-8 text. Reads fold Windows line endings to `\n` so
//! the rest of the core only ever sees one newline spelling; writes go
//! through a temp file in the target directory and an atomic rename so a
//! failed save never truncates the original.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::info;

/// The only user-visible error class in the core: a file that could not be
/// read or written. In-memory state is never touched by a failure.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("document has no file path")]
    NoPath,
}

/// Read a note, normalizing CRLF to LF.
pub fn read_text(path: impl AsRef<Path>) -> Result<String, PersistError> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).map_err(|source| PersistError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), bytes = raw.len(), "read note");
    if raw.contains('\r') {
        Ok(raw.replace("\r\n", "\n"))
    } else {
        Ok(raw)
    }
}

/// Write a note atomically: temp file in the same directory, flush, fsync,
/// rename over the target.
pub fn write_text(path: impl AsRef<Path>, text: &str) -> Result<(), PersistError> {
    let path = path.as_ref();
    let wrap = |source: io::Error| PersistError::Write {
        path: path.to_path_buf(),
        source,
    };

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(parent).map_err(wrap)?;
    tmp.write_all(text.as_bytes()).map_err(wrap)?;
    tmp.flush().map_err(wrap)?;
    // data must be on disk before the rename makes it the current version
    tmp.as_file().sync_all().map_err(wrap)?;
    tmp.persist(path).map_err(|e| wrap(e.error))?;
    info!(path = %path.display(), bytes = text.len(), "wrote note");
    Ok(())
}
