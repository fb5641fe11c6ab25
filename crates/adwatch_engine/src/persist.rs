use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("state directory missing or not writable: {0}")]
    Dir(String),
    #[error("failed to serialize state: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Directory a file at `path` lives in; a bare file name means the working directory.
fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    }
}

/// Ensure the directory holding `path` exists; create if missing.
pub fn ensure_parent_dir(path: &Path) -> Result<(), PersistError> {
    let dir = parent_dir(path);
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| PersistError::Dir(e.to_string()))?;
        if !meta.is_dir() {
            return Err(PersistError::Dir(format!("{} is not a directory", dir.display())));
        }
        Ok(())
    } else {
        fs::create_dir_all(dir).map_err(|e| PersistError::Dir(e.to_string()))
    }
}

/// Replace the file at `path` with `content` so that readers only ever see
/// the old or the new content.
///
/// The content goes to a temporary file in the same directory, is synced,
/// and is then renamed over the target.
pub fn write_atomically(path: &Path, content: &str) -> Result<(), PersistError> {
    ensure_parent_dir(path)?;

    let mut tmp = NamedTempFile::new_in(parent_dir(path))?;
    tmp.write_all(content.as_bytes())?;
    tmp.flush()?;
    tmp.as_file_mut().sync_all()?;
    tmp.persist(path).map_err(|e| PersistError::Io(e.error))?;
    Ok(())
}

/// Move an unreadable file out of the way as `<name>.<suffix>` and return
/// the new location.
pub fn set_aside(path: &Path, suffix: &str) -> Result<PathBuf, PersistError> {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".");
    name.push(suffix);
    let target = path.with_file_name(name);
    fs::rename(path, &target)?;
    Ok(target)
}
