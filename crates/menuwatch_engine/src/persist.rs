use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use menuwatch_core::{ContentHash, ImageContent};
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("reference directory missing or not writable: {0}")]
    Directory(String),
    #[error("reference path is not a regular file: {0}")]
    NotAFile(PathBuf),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Ensure the directory holding the reference image exists; create if missing.
pub fn ensure_parent_dir(dir: &Path) -> Result<(), PersistError> {
    if dir.as_os_str().is_empty() {
        return Ok(());
    }
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| PersistError::Directory(e.to_string()))?;
        if !meta.is_dir() {
            return Err(PersistError::Directory(format!(
                "{} is not a directory",
                dir.display()
            )));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| PersistError::Directory(e.to_string()))?;
    }
    Ok(())
}

/// The single last-published image, kept at a fixed path.
///
/// Replacement writes a temp file next to the target and renames it over the
/// old one, so readers see either the previous image or the new one in full.
#[derive(Debug, Clone)]
pub struct ReferenceStore {
    path: PathBuf,
}

impl ReferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored bytes, or `None` before the first publication.
    pub fn load(&self) -> Result<Option<ImageContent>, PersistError> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(ImageContent::new(bytes))),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => {
                if self.path.is_dir() {
                    return Err(PersistError::NotAFile(self.path.clone()));
                }
                Err(PersistError::Io(err))
            }
        }
    }

    pub fn current_hash(&self) -> Result<Option<ContentHash>, PersistError> {
        Ok(self.load()?.map(|content| content.hash()))
    }

    pub fn replace(&self, content: &ImageContent) -> Result<PathBuf, PersistError> {
        if self.path.is_dir() {
            return Err(PersistError::NotAFile(self.path.clone()));
        }
        let dir = self.parent_dir();
        ensure_parent_dir(&dir)?;

        let mut tmp = NamedTempFile::new_in(&dir)?;
        tmp.write_all(content.bytes())?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;

        tmp.persist(&self.path).map_err(|e| PersistError::Io(e.error))?;
        Ok(self.path.clone())
    }

    fn parent_dir(&self) -> PathBuf {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }
}
